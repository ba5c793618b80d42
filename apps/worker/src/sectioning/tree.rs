//! Tree Assembler: merges group nodes and leaf spans into one ordered,
//! de-duplicated node list.

use std::collections::{HashMap, HashSet};

use crate::models::section::SectionNode;
use crate::sectioning::schema::Schema;
use crate::sectioning::spans::{GroupAnchors, Span};

/// Orders nodes by first position in the document. At equal positions a group
/// sorts before a leaf; unresolved groups sort last.
pub fn assemble(
    schema: &Schema,
    group_anchors: &GroupAnchors,
    spans: Vec<Span>,
) -> Vec<SectionNode> {
    let mut earliest_child: HashMap<&str, usize> = HashMap::new();
    for span in &spans {
        if let Some(parent) = span.parent_id.as_deref() {
            earliest_child
                .entry(parent)
                .and_modify(|pos| *pos = (*pos).min(span.start_idx))
                .or_insert(span.start_idx);
        }
    }

    let mut positioned: Vec<(usize, SectionNode)> = schema
        .groups
        .iter()
        .map(|group| {
            let own = group_anchors.get(&group.id).copied().flatten();
            let child = earliest_child.get(group.id.as_str()).copied();
            let pos = own.into_iter().chain(child).min().unwrap_or(usize::MAX);
            (pos, SectionNode::group(&group.id, &group.title))
        })
        .collect();

    positioned.extend(spans.into_iter().map(|span| {
        // +1 so a leaf loses the tie against a group anchored at the same spot.
        let pos = span.start_idx.saturating_add(1);
        (
            pos,
            SectionNode::leaf(span.section_id, span.title, span.text, span.parent_id),
        )
    }));

    // Stable: equal keys keep schema order.
    positioned.sort_by_key(|(pos, node)| (*pos, !node.is_group));

    let mut seen: HashSet<(String, bool)> = HashSet::new();
    positioned
        .into_iter()
        .map(|(_, node)| node)
        .filter(|node| seen.insert((node.id.clone(), node.is_group)))
        .collect()
}
