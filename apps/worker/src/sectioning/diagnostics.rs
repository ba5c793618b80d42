//! Structured report attached to every parse: counts, anchor statistics, mode,
//! and a one-line summary safe to show in a UI (never contains full paths).

use serde::{Deserialize, Serialize};

use crate::models::section::SectionNode;
use crate::sectioning::pipeline::ParseError;
use crate::sectioning::quality::{AnchorMatchReport, FallbackReason, NodeCounts};
use crate::sectioning::schema::{SchemaError, SchemaLocatorStats};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseMode {
    /// Schema-driven output was trusted.
    Schema,
    /// The whole document was returned as one `unknown` section.
    FallbackUnknown,
    /// The parse failed outright.
    Error,
}

/// Modes a parse can finish in with `ok: true`. Errors go through
/// [`ParseDiagnostics::failed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletedMode {
    Schema,
    FallbackUnknown,
}

impl From<CompletedMode> for ParseMode {
    fn from(mode: CompletedMode) -> Self {
        match mode {
            CompletedMode::Schema => ParseMode::Schema,
            CompletedMode::FallbackUnknown => ParseMode::FallbackUnknown,
        }
    }
}

/// Where the schema for a parse came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaSource {
    None,
    Inline,
    /// File name only; the directory is never reported.
    File(String),
}

impl SchemaSource {
    pub fn label(&self) -> String {
        match self {
            SchemaSource::None => "none".to_string(),
            SchemaSource::Inline => "inline".to_string(),
            SchemaSource::File(name) => format!("file:{name}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseStats {
    pub total_sections: usize,
    pub leaf_sections: usize,
    pub group_sections: usize,
    pub parsing_mode: ParseMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_anchor_total: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_anchor_matched: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_anchor_match_ratio: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_source: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseDiagnostics {
    pub warnings: Vec<String>,
    pub schema_issues: Vec<String>,
    pub stats: ParseStats,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor_match: Option<AnchorMatchReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_locator: Option<SchemaLocatorStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Inputs for diagnostics of a completed (ok) parse.
pub struct DiagnosticsParams<'a> {
    pub sections: &'a [SectionNode],
    pub mode: CompletedMode,
    pub raw_chars: usize,
    pub source: &'a SchemaSource,
    pub anchor_match: Option<AnchorMatchReport>,
    pub schema_locator: Option<SchemaLocatorStats>,
    pub fallback: Option<&'a FallbackReason>,
}

impl ParseDiagnostics {
    pub fn completed(params: DiagnosticsParams<'_>) -> Self {
        let DiagnosticsParams {
            sections,
            mode,
            raw_chars,
            source,
            anchor_match,
            schema_locator,
            fallback,
        } = params;

        let counts = NodeCounts::of(sections);
        let mut warnings = Vec::new();
        let mut schema_issues = Vec::new();

        let summary = match (mode, fallback) {
            (CompletedMode::FallbackUnknown, Some(reason)) => {
                warnings.push("Schema was provided but parsing quality was insufficient".to_string());
                schema_issues.push(reason.to_string());
                format!(
                    "Schema fallback: {reason}. Returned entire document as single UNKNOWN section."
                )
            }
            (CompletedMode::FallbackUnknown, None) => format!(
                "No schema provided - returned entire document as single UNKNOWN section (1 section, {raw_chars} chars)."
            ),
            (CompletedMode::Schema, _) => format!(
                "Parsed {} sections ({} leaf, {} groups) using schema.",
                counts.total, counts.leaves, counts.groups
            ),
        };

        ParseDiagnostics {
            warnings,
            schema_issues,
            stats: ParseStats {
                total_sections: counts.total,
                leaf_sections: counts.leaves,
                group_sections: counts.groups,
                parsing_mode: mode.into(),
                schema_anchor_total: anchor_match.as_ref().map(|a| a.total),
                schema_anchor_matched: anchor_match.as_ref().map(|a| a.matched),
                schema_anchor_match_ratio: anchor_match.as_ref().map(|a| a.match_ratio),
                schema_source: Some(source.label()),
            },
            summary,
            anchor_match,
            schema_locator,
            fallback_reason: fallback.map(ToString::to_string),
            error: None,
        }
    }

    /// Diagnostics for an outright failure (`ok: false`).
    pub fn failed(err: &ParseError, source: &SchemaSource) -> Self {
        let (warning, issue, summary) = match err {
            ParseError::EmptyInput => (
                "Document appears to be empty or unreadable",
                None,
                "Parse failed: empty or unreadable document".to_string(),
            ),
            ParseError::Extraction(e) => (
                "Could not read the document",
                None,
                format!("Parse failed: could not read the document: {e}"),
            ),
            ParseError::Schema(SchemaError::Parse(msg)) => (
                "Schema could not be decoded - check schema source",
                Some(msg.clone()),
                format!("Parse failed: schema could not be decoded: {}", truncate(msg, 100)),
            ),
            ParseError::Schema(SchemaError::Shape(msg)) => (
                "Schema is malformed - check schema structure",
                Some(msg.clone()),
                format!("Parse failed: schema is malformed: {}", truncate(msg, 100)),
            ),
            ParseError::SplitterCrash(msg) => (
                "Schema parsing crashed - check schema structure",
                Some(format!("Schema splitter error: {}", truncate(msg, 200))),
                format!("Schema parsing crashed: {}", truncate(msg, 100)),
            ),
        };

        ParseDiagnostics {
            warnings: vec![warning.to_string()],
            schema_issues: issue.into_iter().collect(),
            stats: ParseStats {
                total_sections: 0,
                leaf_sections: 0,
                group_sections: 0,
                parsing_mode: ParseMode::Error,
                schema_anchor_total: None,
                schema_anchor_matched: None,
                schema_anchor_match_ratio: None,
                schema_source: Some(source.label()),
            },
            summary,
            anchor_match: None,
            schema_locator: None,
            fallback_reason: None,
            error: Some(err.to_string()),
        }
    }
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
