//! Anchor Resolver: finds heading snippets in the cleaned text regardless of
//! whitespace or line breaks the extractor inserted inside them.

use crate::sectioning::normalize::{squash, NormIndex};

/// A resolved anchor: where it starts in the cleaned text and which candidate hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnchorHit<'a> {
    pub offset: usize,
    pub candidate: &'a str,
}

/// Finds `needle` at or after raw offset `from`. Returns the raw offset of the
/// first matching character.
pub fn find_anchor(index: &NormIndex, needle: &str, from: usize) -> Option<usize> {
    let needle = squash(needle);
    if needle.is_empty() {
        return None;
    }
    let start = index.to_norm(from);
    let pos = index.as_str().get(start..)?.find(&needle)?;
    index.to_raw(start + pos)
}

/// Tries `candidates` in schema order; the first one that occurs anywhere at or
/// after `from` wins, even if a later candidate occurs earlier in the text.
pub fn resolve<'a>(
    index: &NormIndex,
    candidates: &'a [String],
    from: usize,
) -> Option<AnchorHit<'a>> {
    candidates.iter().find_map(|candidate| {
        find_anchor(index, candidate, from).map(|offset| AnchorHit {
            offset,
            candidate: candidate.as_str(),
        })
    })
}

/// Two-phase resolution for leaf starts: search from the parent group's anchor
/// first, then retry from the top of the document.
pub fn resolve_scoped<'a>(
    index: &NormIndex,
    candidates: &'a [String],
    scope: Option<usize>,
) -> Option<AnchorHit<'a>> {
    match scope {
        Some(from) if from > 0 => {
            resolve(index, candidates, from).or_else(|| resolve(index, candidates, 0))
        }
        _ => resolve(index, candidates, 0),
    }
}
