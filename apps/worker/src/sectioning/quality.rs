//! Quality Gate: decides whether schema-driven output can be trusted.
//!
//! Checks run in order and the first failure wins:
//! 1. anchor applicability (before splitting)
//! 2. groups but no leaves
//! 3. too few non-empty leaves, or too little leaf text
//! 4. no nodes at all

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::section::SectionNode;
use crate::sectioning::normalize::NormIndex;
use crate::sectioning::schema::Schema;

pub const MIN_ANCHOR_MATCH_RATIO: f64 = 0.10;
pub const MIN_NON_EMPTY_LEAF_RATIO: f64 = 0.30;
pub const MIN_TOTAL_LEAF_CHARS: usize = 200;

/// Why schema output was replaced by the catch-all node. Not fatal: the parse
/// still succeeds in `fallback_unknown` mode.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FallbackReason {
    #[error("Schema has {total} anchors but NONE found in document - schema does not match document structure")]
    NoAnchorsFound { total: usize },

    #[error("Schema anchor match rate too low: {matched}/{total} ({:.1}%) - threshold: 10% - schema does not match document structure", percent(.matched, .total))]
    LowAnchorMatch { matched: usize, total: usize },

    #[error("Schema produced only group sections with no leaf content")]
    OnlyGroups,

    #[error("Schema produced {leaves} leaf sections but only {non_empty} ({:.1}%) have content (threshold: 30%) - extracted too little content", percent(.non_empty, .leaves))]
    SparseLeaves { leaves: usize, non_empty: usize },

    #[error("Schema extracted only {chars} chars from {leaves} leaf sections (threshold: 200 chars) - extracted too little content")]
    TooLittleText { chars: usize, leaves: usize },

    #[error("Schema produced no sections")]
    NoSections,
}

impl FallbackReason {
    /// True for the pre-split check: the schema does not describe this document.
    pub fn is_anchor_mismatch(&self) -> bool {
        matches!(self, Self::NoAnchorsFound { .. } | Self::LowAnchorMatch { .. })
    }
}

fn percent(part: &usize, whole: &usize) -> f64 {
    if *whole == 0 {
        0.0
    } else {
        *part as f64 * 100.0 / *whole as f64
    }
}

/// Result of the anchor-applicability check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorMatchReport {
    pub total: usize,
    pub matched: usize,
    pub match_ratio: f64,
    pub should_fallback: bool,
    pub reason: Option<String>,
}

/// Counts declared anchors that occur anywhere in the document. With no declared
/// anchors the check cannot judge and lets the schema through.
pub fn check_anchor_applicability(
    schema: &Schema,
    index: &NormIndex,
) -> (AnchorMatchReport, Option<FallbackReason>) {
    let total = schema.declared_anchors.len();
    let matched = schema
        .declared_anchors
        .iter()
        .filter(|anchor| index.contains(anchor))
        .count();
    let match_ratio = if total > 0 {
        matched as f64 / total as f64
    } else {
        0.0
    };

    let failure = if total == 0 {
        None
    } else if total >= 2 && matched == 0 {
        Some(FallbackReason::NoAnchorsFound { total })
    } else if match_ratio < MIN_ANCHOR_MATCH_RATIO {
        Some(FallbackReason::LowAnchorMatch { matched, total })
    } else {
        None
    };

    let report = AnchorMatchReport {
        total,
        matched,
        match_ratio,
        should_fallback: failure.is_some(),
        reason: failure.as_ref().map(ToString::to_string),
    };
    (report, failure)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeCounts {
    pub total: usize,
    pub leaves: usize,
    pub groups: usize,
}

impl NodeCounts {
    pub fn of(nodes: &[SectionNode]) -> Self {
        let groups = nodes.iter().filter(|n| n.is_group).count();
        Self {
            total: nodes.len(),
            leaves: nodes.len() - groups,
            groups,
        }
    }
}

/// Post-split checks on the assembled node list.
pub fn assess_output(nodes: &[SectionNode]) -> Result<(), FallbackReason> {
    let counts = NodeCounts::of(nodes);

    if counts.groups > 0 && counts.leaves == 0 {
        return Err(FallbackReason::OnlyGroups);
    }

    if counts.leaves > 0 {
        let leaf_texts: Vec<&str> = nodes
            .iter()
            .filter(|n| !n.is_group)
            .map(|n| n.text.trim())
            .collect();
        let non_empty = leaf_texts.iter().filter(|t| !t.is_empty()).count();
        let chars: usize = leaf_texts.iter().map(|t| t.chars().count()).sum();

        if (non_empty as f64 / counts.leaves as f64) < MIN_NON_EMPTY_LEAF_RATIO {
            return Err(FallbackReason::SparseLeaves {
                leaves: counts.leaves,
                non_empty,
            });
        }
        if chars < MIN_TOTAL_LEAF_CHARS {
            return Err(FallbackReason::TooLittleText {
                chars,
                leaves: counts.leaves,
            });
        }
    }

    if counts.total == 0 {
        return Err(FallbackReason::NoSections);
    }
    Ok(())
}
