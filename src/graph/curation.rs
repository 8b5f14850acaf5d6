//! Automatic curation: children that no Topics section lists are grouped by kind.

use std::collections::BTreeMap;

use crate::{
    graph::{DocumentationGraph, EdgeKind},
    markup::{
        ast::{Block, BlockKind, Inline, ListItem},
        TaskGroup,
    },
    node::{DocumentationKind, AUTOMATIC_CURATION_ORDER},
    reference::ResolvedTopicReference,
};

fn kind_rank(kind: DocumentationKind) -> usize {
    AUTOMATIC_CURATION_ORDER
        .iter()
        .position(|ordered| *ordered == kind)
        .unwrap_or(AUTOMATIC_CURATION_ORDER.len())
}

fn link_list(references: &[ResolvedTopicReference]) -> Block {
    let items = references
        .iter()
        .map(|reference| ListItem {
            blocks: vec![Block::new(
                BlockKind::Paragraph(vec![Inline::SymbolLink {
                    destination: reference.url().to_string(),
                    range: None,
                }]),
                None,
            )],
            range: None,
        })
        .collect();
    Block::new(
        BlockKind::List {
            ordered: false,
            items,
        },
        None,
    )
}

/// Generated task groups for the structural children of `parent` that no page curates.
pub fn automatic_task_groups(
    graph: &DocumentationGraph,
    parent: &ResolvedTopicReference,
) -> Vec<TaskGroup> {
    let mut by_kind: BTreeMap<(usize, DocumentationKind), Vec<ResolvedTopicReference>> =
        BTreeMap::new();
    for child in graph.children(parent, Some(EdgeKind::Child)) {
        if !graph.parents(&child, Some(EdgeKind::Curated)).is_empty() {
            continue;
        }
        let Some(node) = graph.get(&child) else {
            continue;
        };
        by_kind
            .entry((kind_rank(node.kind), node.kind))
            .or_default()
            .push(child);
    }
    by_kind
        .into_iter()
        .map(|((_, kind), references)| {
            TaskGroup::new(Some(kind.topic_group_title()), vec![link_list(&references)])
        })
        .collect()
}

/// Fill in [`crate::node::DocumentationNode::automatic_task_groups`] for every page of
/// `bundle_id`.
pub fn apply_automatic_curation(graph: &mut DocumentationGraph, bundle_id: &str) {
    let pages: Vec<ResolvedTopicReference> = graph
        .references()
        .into_iter()
        .filter(|reference| reference.bundle_id() == bundle_id)
        .collect();
    let mut generated = 0;
    for page in pages {
        let groups = automatic_task_groups(graph, &page);
        generated += groups.len();
        if let Some(node) = graph.get_mut(&page) {
            node.automatic_task_groups = groups;
        }
    }
    tracing::debug!(
        "[curation::apply_automatic_curation] {generated} generated task groups in {bundle_id}"
    );
}
