//! Span Builder: one `[start, end)` slice of the cleaned text per schema leaf.
//!
//! A leaf is never dropped: when its own start anchor cannot be found it starts
//! just after its parent group's heading, or at the top of the document.

use std::collections::HashMap;

use thiserror::Error;
use tracing::debug;

use crate::sectioning::anchors::{find_anchor, resolve, resolve_scoped};
use crate::sectioning::heading::strip_restated_heading;
use crate::sectioning::normalize::NormalizedText;
use crate::sectioning::schema::{LeafDef, Schema};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SplitError {
    #[error("span {start}..{end} of section '{section_id}' is outside the text (len {len})")]
    SliceOutOfBounds {
        section_id: String,
        start: usize,
        end: usize,
        len: usize,
    },
}

/// A leaf's resolved slice. Lives only for one split.
#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub section_id: String,
    pub title: String,
    pub parent_id: Option<String>,
    pub start_idx: usize,
    pub end_idx: usize,
    pub text: String,
}

/// Resolved heading offset of each group, by id. `None` when the title was not found.
pub type GroupAnchors = HashMap<String, Option<usize>>;

/// Locates every group's title anywhere in the document.
pub fn locate_groups(doc: &NormalizedText, schema: &Schema) -> GroupAnchors {
    let mut anchors = GroupAnchors::new();
    for group in &schema.groups {
        let pos = find_anchor(&doc.index, &group.title, 0);
        // First declaration wins for duplicated ids.
        anchors.entry(group.id.clone()).or_insert(pos);
    }
    anchors
}

/// Builds the span for every leaf in schema order.
pub fn build_spans(
    doc: &NormalizedText,
    schema: &Schema,
    group_anchors: &GroupAnchors,
) -> Result<Vec<Span>, SplitError> {
    schema
        .leaves
        .iter()
        .map(|leaf| build_span(doc, leaf, group_anchors))
        .collect()
}

fn build_span(
    doc: &NormalizedText,
    leaf: &LeafDef,
    group_anchors: &GroupAnchors,
) -> Result<Span, SplitError> {
    let text = doc.text.as_str();
    let parent_anchor = leaf
        .parent_id
        .as_ref()
        .and_then(|p| group_anchors.get(p).copied().flatten());

    let start_hit = resolve_scoped(&doc.index, &leaf.start, parent_anchor);
    let start = match (start_hit, parent_anchor) {
        (Some(hit), _) => hit.offset,
        (None, Some(parent)) => skip_whitespace(text, parent),
        (None, None) => 0,
    };

    let end = resolve(&doc.index, &leaf.end, start + 1)
        .map(|hit| hit.offset)
        .or_else(|| next_group_anchor(group_anchors, start))
        .filter(|&end| end > start)
        .unwrap_or(text.len());

    let slice = text.get(start..end).ok_or_else(|| SplitError::SliceOutOfBounds {
        section_id: leaf.id.clone(),
        start,
        end,
        len: text.len(),
    })?;
    let span = Span {
        section_id: leaf.id.clone(),
        title: leaf.title.clone(),
        parent_id: leaf.parent_id.clone(),
        start_idx: start,
        end_idx: end,
        text: strip_restated_heading(slice, start_hit.map(|hit| hit.candidate)),
    };

    debug!(
        section = %span.section_id,
        start = span.start_idx,
        end = span.end_idx,
        anchor = ?start_hit.map(|hit| hit.candidate),
        chars = span.text.chars().count(),
        "Span resolved"
    );
    Ok(span)
}

/// Moves past whitespace only, so the heading's first character is kept.
fn skip_whitespace(text: &str, from: usize) -> usize {
    text.get(from..)
        .and_then(|rest| rest.find(|c: char| !c.is_whitespace()).map(|n| from + n))
        .unwrap_or(text.len())
}

/// Nearest group heading strictly after `start`.
fn next_group_anchor(group_anchors: &GroupAnchors, start: usize) -> Option<usize> {
    group_anchors
        .values()
        .filter_map(|pos| *pos)
        .filter(|&pos| pos > start)
        .min()
}
