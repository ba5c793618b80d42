//! Fallback Controller: runs normalize → anchor check → split → quality gate and
//! decides between schema output and the single `unknown` section.

use thiserror::Error;
use tracing::{info, warn};

use crate::extraction::ExtractionError;
use crate::models::section::SectionNode;
use crate::sectioning::diagnostics::{
    CompletedMode, DiagnosticsParams, ParseDiagnostics, ParseMode, SchemaSource,
};
use crate::sectioning::normalize::NormalizedText;
use crate::sectioning::quality::{
    assess_output, check_anchor_applicability, AnchorMatchReport, FallbackReason,
};
use crate::sectioning::schema::{Schema, SchemaError};
use crate::sectioning::spans::{build_spans, locate_groups, SplitError};
use crate::sectioning::tree::assemble;

/// Failures that make a parse return `ok: false`. Quality problems are not
/// errors; they end in `fallback_unknown` mode.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("parse failed: empty text")]
    EmptyInput,

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("schema splitter crashed: {0}")]
    SplitterCrash(String),

    #[error("extract failed: {0}")]
    Extraction(ExtractionError),
}

impl From<ExtractionError> for ParseError {
    fn from(e: ExtractionError) -> Self {
        match e {
            ExtractionError::Empty => ParseError::EmptyInput,
            other => ParseError::Extraction(other),
        }
    }
}

impl From<SplitError> for ParseError {
    fn from(e: SplitError) -> Self {
        ParseError::SplitterCrash(e.to_string())
    }
}

/// Outcome of a successful parse.
#[derive(Debug, Clone, PartialEq)]
pub struct Segmentation {
    pub mode: ParseMode,
    pub sections: Vec<SectionNode>,
    pub diagnostics: ParseDiagnostics,
}

/// Schema-driven split of an already normalized document. No quality checks.
pub fn split_by_schema(
    doc: &NormalizedText,
    schema: &Schema,
) -> Result<Vec<SectionNode>, SplitError> {
    let group_anchors = locate_groups(doc, schema);
    let spans = build_spans(doc, schema, &group_anchors)?;
    Ok(assemble(schema, &group_anchors, spans))
}

/// Segments `raw` with the given schema, or returns the whole document as one
/// `unknown` section when there is no schema or its output is not trustworthy.
pub fn segment(
    raw: &str,
    schema: Option<&Schema>,
    source: &SchemaSource,
) -> Result<Segmentation, ParseError> {
    if raw.trim().is_empty() {
        return Err(ParseError::EmptyInput);
    }

    let Some(schema) = schema else {
        info!("No schema provided - using fallback_unknown mode");
        return Ok(unknown_only(raw, source, None, None));
    };

    let doc = NormalizedText::new(raw);
    let (anchor_match, mismatch) = check_anchor_applicability(schema, &doc.index);
    info!(
        total = anchor_match.total,
        matched = anchor_match.matched,
        "Anchor check: {:.1}% of schema anchors found",
        anchor_match.match_ratio * 100.0
    );

    if let Some(reason) = mismatch {
        return Ok(fallback(raw, schema, source, anchor_match, &reason));
    }

    let sections = split_by_schema(&doc, schema)?;

    if let Err(reason) = assess_output(&sections) {
        return Ok(fallback(raw, schema, source, anchor_match, &reason));
    }

    let diagnostics = ParseDiagnostics::completed(DiagnosticsParams {
        sections: &sections,
        mode: CompletedMode::Schema,
        raw_chars: raw.chars().count(),
        source,
        anchor_match: Some(anchor_match),
        schema_locator: Some(schema.locator_stats.clone()),
        fallback: None,
    });
    info!(sections = sections.len(), mode = "schema", "{}", diagnostics.summary);

    Ok(Segmentation {
        mode: ParseMode::Schema,
        sections,
        diagnostics,
    })
}

fn fallback(
    raw: &str,
    schema: &Schema,
    source: &SchemaSource,
    anchor_match: AnchorMatchReport,
    reason: &FallbackReason,
) -> Segmentation {
    if reason.is_anchor_mismatch() {
        warn!(%reason, "Schema does not match document - using fallback_unknown mode");
    } else {
        warn!(%reason, "Schema output rejected - using fallback_unknown mode");
    }
    let seg = unknown_only(raw, source, Some(anchor_match), Some((schema, reason)));
    info!(mode = "fallback_unknown", "{}", seg.diagnostics.summary);
    seg
}

fn unknown_only(
    raw: &str,
    source: &SchemaSource,
    anchor_match: Option<AnchorMatchReport>,
    rejected: Option<(&Schema, &FallbackReason)>,
) -> Segmentation {
    let sections = vec![SectionNode::unknown(raw)];
    let diagnostics = ParseDiagnostics::completed(DiagnosticsParams {
        sections: &sections,
        mode: CompletedMode::FallbackUnknown,
        raw_chars: raw.chars().count(),
        source,
        anchor_match,
        schema_locator: rejected.map(|(schema, _)| schema.locator_stats.clone()),
        fallback: rejected.map(|(_, reason)| reason),
    });
    Segmentation {
        mode: ParseMode::FallbackUnknown,
        sections,
        diagnostics,
    }
}
