//! The documentation graph: nodes by reference plus the indices link resolution needs.

use parking_lot::RwLock;
use petgraph::{graph::NodeIndex, visit::EdgeRef, Direction, IntoWeightedEdge};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};

use crate::{
    node::{AnchorSection, DocumentationKind, DocumentationNode},
    paths::canonical_topic_path,
    reference::ResolvedTopicReference,
    resolve::external::ExternalEntity,
};

/// Length of the hash used to tell apart symbols of the same kind at the same path.
const DISAMBIGUATION_HASH_LEN: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    /// Structural: a symbol's member or a module's top level symbol.
    Child,
    /// A link in one of the parent's Topics task groups.
    Curated,
}

/// The short hash suffix of a precise identifier, e.g. `foo(_:)-3xk1p`.
pub fn disambiguation_hash(precise_id: &str) -> String {
    let digest = Sha256::digest(precise_id.as_bytes());
    let mut hash = hex::encode(digest);
    hash.truncate(DISAMBIGUATION_HASH_LEN);
    hash
}

/// Parent/child relations between references.
#[derive(Debug, Clone, Default)]
pub struct HierarchyGraph {
    graph: petgraph::Graph<ResolvedTopicReference, EdgeKind>,
    indices: BTreeMap<ResolvedTopicReference, NodeIndex>,
}

impl HierarchyGraph {
    pub fn from_edges<I>(iterable: I) -> Self
    where
        I: IntoIterator,
        I::Item: IntoWeightedEdge<EdgeKind, NodeId = ResolvedTopicReference>,
    {
        let mut hierarchy = HierarchyGraph::default();
        for (source, sink, kind) in iterable.into_iter().map(|edge| edge.into_weighted_edge()) {
            hierarchy.add_edge(&source, &sink, kind);
        }
        hierarchy
    }

    fn index_of(&mut self, reference: &ResolvedTopicReference) -> NodeIndex {
        if let Some(idx) = self.indices.get(reference) {
            return *idx;
        }
        let idx = self.graph.add_node(reference.clone());
        self.indices.insert(reference.clone(), idx);
        idx
    }

    /// Add an edge unless an identical one exists. Self edges are ignored.
    pub fn add_edge(
        &mut self,
        parent: &ResolvedTopicReference,
        child: &ResolvedTopicReference,
        kind: EdgeKind,
    ) -> bool {
        if parent == child {
            return false;
        }
        let source = self.index_of(parent);
        let sink = self.index_of(child);
        let exists = self
            .graph
            .edges_connecting(source, sink)
            .any(|edge| *edge.weight() == kind);
        if !exists {
            self.graph.add_edge(source, sink, kind);
        }
        !exists
    }

    fn neighbors(
        &self,
        reference: &ResolvedTopicReference,
        direction: Direction,
        kind: Option<EdgeKind>,
    ) -> Vec<ResolvedTopicReference> {
        let Some(idx) = self.indices.get(reference) else {
            return vec![];
        };
        let found: BTreeSet<ResolvedTopicReference> = self
            .graph
            .edges_directed(*idx, direction)
            .filter(|edge| kind.map_or(true, |kind| *edge.weight() == kind))
            .map(|edge| {
                let other = match direction {
                    Direction::Outgoing => edge.target(),
                    Direction::Incoming => edge.source(),
                };
                self.graph[other].clone()
            })
            .collect();
        found.into_iter().collect()
    }

    /// Children of `parent`, sorted. `None` means any edge kind.
    pub fn children(
        &self,
        parent: &ResolvedTopicReference,
        kind: Option<EdgeKind>,
    ) -> Vec<ResolvedTopicReference> {
        self.neighbors(parent, Direction::Outgoing, kind)
    }

    pub fn parents(
        &self,
        child: &ResolvedTopicReference,
        kind: Option<EdgeKind>,
    ) -> Vec<ResolvedTopicReference> {
        self.neighbors(child, Direction::Incoming, kind)
    }

    pub fn edges(&self) -> Vec<(ResolvedTopicReference, ResolvedTopicReference, EdgeKind)> {
        self.graph
            .raw_edges()
            .iter()
            .map(|edge| {
                (
                    self.graph[edge.source()].clone(),
                    self.graph[edge.target()].clone(),
                    edge.weight,
                )
            })
            .collect()
    }

    /// Keep only the edges for which `f` returns true. Orphaned nodes are dropped too.
    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&ResolvedTopicReference, &ResolvedTopicReference, EdgeKind) -> bool,
    {
        let kept = self
            .edges()
            .into_iter()
            .filter(|(source, sink, kind)| f(source, sink, *kind));
        *self = HierarchyGraph::from_edges(kept);
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

/// Result of looking a path up in the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathLookup {
    Found(ResolvedTopicReference),
    /// Several nodes share the path and nothing in it tells them apart.
    Ambiguous(Vec<ResolvedTopicReference>),
    NotFound,
}

type PathKey = (String, String);

#[derive(Debug, Default)]
pub struct DocumentationGraph {
    nodes: BTreeMap<ResolvedTopicReference, DocumentationNode>,
    hierarchy: HierarchyGraph,
    paths: BTreeMap<PathKey, ResolvedTopicReference>,
    /// Alternative spellings (undisambiguated path, kind suffix, hash suffix) to candidates.
    aliases: BTreeMap<PathKey, BTreeSet<ResolvedTopicReference>>,
    anchors: BTreeMap<ResolvedTopicReference, Vec<AnchorSection>>,
    externals: RwLock<BTreeMap<String, ExternalEntity>>,
    /// Node count per bundle.
    bundles: BTreeMap<String, usize>,
}

fn path_key(bundle_id: &str, path: &str) -> PathKey {
    (bundle_id.to_string(), canonical_topic_path(path))
}

impl DocumentationGraph {
    pub fn new() -> Self {
        DocumentationGraph::default()
    }

    /// Insert or replace a node, indexing its path and anchors.
    pub fn insert(&mut self, node: DocumentationNode) -> Option<DocumentationNode> {
        let reference = node.reference.clone();
        self.paths.insert(
            path_key(reference.bundle_id(), reference.path()),
            reference.clone(),
        );
        for redirect in node.redirects.iter() {
            self.paths
                .entry(path_key(reference.bundle_id(), redirect))
                .or_insert_with(|| reference.clone());
        }
        self.anchors
            .insert(reference.clone(), node.anchor_sections.clone());
        let bundle_id = reference.bundle_id().to_string();
        let replaced = self.nodes.insert(reference, node);
        if replaced.is_none() {
            *self.bundles.entry(bundle_id).or_default() += 1;
        }
        replaced
    }

    /// Register `alias` (a path, possibly relative to the bundle root) as another spelling of
    /// `reference`.
    pub fn add_alias(&mut self, alias: &str, reference: &ResolvedTopicReference) {
        self.aliases
            .entry(path_key(reference.bundle_id(), alias))
            .or_default()
            .insert(reference.clone());
    }

    /// Index the usual spellings of a symbol at `base_path`: the bare path, the kind suffixed
    /// path (also with a language prefix), and the hash suffixed path.
    pub fn add_symbol_aliases(
        &mut self,
        base_path: &str,
        kind: DocumentationKind,
        precise_id: &str,
        reference: &ResolvedTopicReference,
    ) {
        self.add_alias(base_path, reference);
        self.add_alias(&format!("{base_path}-{}", kind.id()), reference);
        for language in reference.source_languages() {
            self.add_alias(
                &format!(
                    "{base_path}-{}.{}",
                    language.link_disambiguation_id(),
                    kind.id()
                ),
                reference,
            );
        }
        self.add_alias(
            &format!("{base_path}-{}", disambiguation_hash(precise_id)),
            reference,
        );
    }

    pub fn lookup_path(&self, bundle_id: &str, path: &str) -> PathLookup {
        let key = path_key(bundle_id, path);
        if let Some(reference) = self.paths.get(&key) {
            return PathLookup::Found(reference.clone());
        }
        match self.aliases.get(&key) {
            Some(candidates) if candidates.len() == 1 => candidates
                .iter()
                .next()
                .cloned()
                .map(PathLookup::Found)
                .unwrap_or(PathLookup::NotFound),
            Some(candidates) if !candidates.is_empty() => {
                PathLookup::Ambiguous(candidates.iter().cloned().collect())
            }
            _ => PathLookup::NotFound,
        }
    }

    pub fn get(&self, reference: &ResolvedTopicReference) -> Option<&DocumentationNode> {
        self.nodes.get(reference)
    }

    pub fn get_mut(&mut self, reference: &ResolvedTopicReference) -> Option<&mut DocumentationNode> {
        self.nodes.get_mut(reference)
    }

    pub fn contains(&self, reference: &ResolvedTopicReference) -> bool {
        self.nodes.contains_key(reference)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in reference order.
    pub fn nodes(&self) -> impl Iterator<Item = &DocumentationNode> {
        self.nodes.values()
    }

    pub fn references(&self) -> Vec<ResolvedTopicReference> {
        self.nodes.keys().cloned().collect()
    }

    pub fn bundle_ids(&self) -> BTreeSet<String> {
        self.bundles.keys().cloned().collect()
    }

    pub fn has_bundle(&self, bundle_id: &str) -> bool {
        self.bundles.contains_key(bundle_id)
    }

    pub fn add_edge(
        &mut self,
        parent: &ResolvedTopicReference,
        child: &ResolvedTopicReference,
        kind: EdgeKind,
    ) -> bool {
        self.hierarchy.add_edge(parent, child, kind)
    }

    pub fn hierarchy(&self) -> &HierarchyGraph {
        &self.hierarchy
    }

    pub fn children(
        &self,
        parent: &ResolvedTopicReference,
        kind: Option<EdgeKind>,
    ) -> Vec<ResolvedTopicReference> {
        self.hierarchy.children(parent, kind)
    }

    pub fn parents(
        &self,
        child: &ResolvedTopicReference,
        kind: Option<EdgeKind>,
    ) -> Vec<ResolvedTopicReference> {
        self.hierarchy.parents(child, kind)
    }

    /// Last path components of the structural children of `parent`, for near-miss suggestions.
    pub fn child_names(&self, parent: &ResolvedTopicReference) -> Vec<String> {
        self.children(parent, Some(EdgeKind::Child))
            .iter()
            .map(|child| child.last_path_component().to_string())
            .collect()
    }

    pub fn anchors(&self, page: &ResolvedTopicReference) -> &[AnchorSection] {
        self.anchors
            .get(page)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Re-read a page's anchors after its discussion changed.
    pub fn refresh_anchors(&mut self, page: &ResolvedTopicReference) {
        if let Some(node) = self.nodes.get(page) {
            self.anchors
                .insert(page.clone(), node.anchor_sections.clone());
        }
    }

    pub fn cache_external(&self, entity: ExternalEntity) {
        self.externals.write().insert(entity.url.clone(), entity);
    }

    pub fn external(&self, url: &str) -> Option<ExternalEntity> {
        self.externals.read().get(url).cloned()
    }

    pub fn external_count(&self) -> usize {
        self.externals.read().len()
    }

    /// Drop every node, index entry and edge of `bundle_id`. Returns how many nodes went.
    pub fn remove_bundle(&mut self, bundle_id: &str) -> usize {
        let before = self.nodes.len();
        self.nodes
            .retain(|reference, _| reference.bundle_id() != bundle_id);
        self.paths.retain(|(bundle, _), _| bundle != bundle_id);
        self.aliases.retain(|(bundle, _), _| bundle != bundle_id);
        self.anchors
            .retain(|reference, _| reference.bundle_id() != bundle_id);
        self.hierarchy.retain(|parent, child, _| {
            parent.bundle_id() != bundle_id && child.bundle_id() != bundle_id
        });
        self.bundles.remove(bundle_id);
        let removed = before - self.nodes.len();
        tracing::debug!("[DocumentationGraph::remove_bundle] removed {removed} nodes of {bundle_id}");
        removed
    }
}
