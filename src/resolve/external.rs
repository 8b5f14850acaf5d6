//! Resolution outside the local bundles: pre-built archives of other bundles and an optional
//! out-of-process resolver.

use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fs::read_to_string, path::Path};

use crate::{
    error::TopicGraphError,
    node::DocumentationKind,
    paths::{canonical_topic_path, DOCUMENTATION_ROOT},
    reference::{SourceLanguageSet, UnresolvedTopicReference, DOC_SCHEME},
};

/// What is known about a topic that lives outside the local graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalEntity {
    /// Absolute `doc://` URL of the topic.
    pub url: String,
    pub title: String,
    pub kind: DocumentationKind,
    #[serde(default)]
    pub languages: SourceLanguageSet,
    #[serde(default)]
    pub abstract_text: Option<String>,
}

/// A read-only, pre-built link hierarchy of another documentation bundle.
pub trait ExternalArchive: Send + Sync {
    fn bundle_id(&self) -> &str;

    /// Look up an authored reference. `None` is a miss.
    fn lookup(&self, reference: &UnresolvedTopicReference) -> Option<ExternalEntity>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub title: String,
    pub kind: DocumentationKind,
    #[serde(default)]
    pub languages: SourceLanguageSet,
    #[serde(default)]
    pub abstract_text: Option<String>,
}

/// The JSON form of an archive: canonical topic paths to their metadata.
///
/// ```json
/// {
///   "bundle_id": "com.example.other",
///   "entries": {
///     "/documentation/Other/Thing": { "title": "Thing", "kind": "class", "languages": ["swift"] }
///   }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkHierarchySnapshot {
    pub bundle_id: String,
    pub entries: BTreeMap<String, SnapshotEntry>,
}

impl LinkHierarchySnapshot {
    pub fn from_json_str(content: &str) -> Result<LinkHierarchySnapshot, TopicGraphError> {
        let mut snapshot: LinkHierarchySnapshot = serde_json::from_str(content)?;
        if snapshot.bundle_id.trim().is_empty() {
            return Err(TopicGraphError::Serialization(
                "link hierarchy snapshot without a bundle_id".to_string(),
            ));
        }
        snapshot.entries = std::mem::take(&mut snapshot.entries)
            .into_iter()
            .map(|(path, entry)| (canonical_topic_path(&path), entry))
            .collect();
        Ok(snapshot)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<LinkHierarchySnapshot, TopicGraphError> {
        tracing::debug!("[LinkHierarchySnapshot::from_path] Reading {:?}", path.as_ref());
        let content = read_to_string(path)?;
        LinkHierarchySnapshot::from_json_str(&content)
    }

    pub fn to_json_string(&self) -> Result<String, TopicGraphError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn insert(&mut self, path: &str, entry: SnapshotEntry) {
        self.entries.insert(canonical_topic_path(path), entry);
    }

    fn entity(&self, path: &str, entry: &SnapshotEntry) -> ExternalEntity {
        ExternalEntity {
            url: format!("{DOC_SCHEME}://{}{path}", self.bundle_id),
            title: entry.title.clone(),
            kind: entry.kind,
            languages: entry.languages,
            abstract_text: entry.abstract_text.clone(),
        }
    }
}

impl ExternalArchive for LinkHierarchySnapshot {
    fn bundle_id(&self) -> &str {
        &self.bundle_id
    }

    /// Tries the path as written, then under `/documentation`, then any entry ending in the
    /// path (the first in path order). References naming another bundle never match.
    fn lookup(&self, reference: &UnresolvedTopicReference) -> Option<ExternalEntity> {
        if reference
            .bundle_id
            .as_deref()
            .is_some_and(|bundle| bundle != self.bundle_id)
        {
            return None;
        }
        let authored = reference.path.trim_matches('/');
        if authored.is_empty() {
            return None;
        }
        let exact = canonical_topic_path(authored);
        let rooted = canonical_topic_path(&format!("{DOCUMENTATION_ROOT}/{authored}"));
        for path in [&exact, &rooted] {
            if let Some(entry) = self.entries.get(path) {
                return Some(self.entity(path, entry));
            }
        }
        let suffix = format!("/{}", exact.trim_start_matches('/'));
        self.entries
            .iter()
            .find(|(path, _)| path.ends_with(&suffix))
            .map(|(path, entry)| self.entity(path, entry))
    }
}

/// What the out-of-process resolver is asked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverRequest {
    /// The link as authored.
    pub reference: String,
    /// `doc://` URL of the page the link is on.
    pub parent: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolverResponse {
    Resolved(ExternalEntity),
    Failure { message: String },
}

/// A resolver consulted after every local and archive lookup failed. The transport is up to the
/// implementation.
pub trait OutOfProcessResolver: Send + Sync {
    fn resolve(&self, request: &ResolverRequest) -> Result<ResolverResponse, TopicGraphError>;
}
