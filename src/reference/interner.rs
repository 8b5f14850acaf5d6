use parking_lot::Mutex;
use std::{collections::HashMap, sync::Arc};

use crate::{
    paths::{canonical_topic_path, url_readable_fragment},
    reference::{topic::ReferenceStorage, ResolvedTopicReference, SourceLanguageSet},
};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ReferenceKey {
    path: String,
    fragment: Option<String>,
    languages: SourceLanguageSet,
}

type ReferencePool = HashMap<ReferenceKey, ResolvedTopicReference>;

/// The interning registry for [`ResolvedTopicReference`]s.
///
/// One interner belongs to one graph construction session (see
/// [`crate::graph::DocumentationContext`]); it is passed explicitly wherever references are
/// created and dropped together with the session. Pools are kept per bundle so that
/// unregistering a bundle releases every reference it produced.
///
/// All reads and writes go through a single mutex.
#[derive(Debug, Default)]
pub struct ReferenceInterner {
    pools: Mutex<HashMap<String, ReferencePool>>,
}

impl ReferenceInterner {
    pub fn new() -> Self {
        ReferenceInterner::default()
    }

    /// Return the canonical reference for `(bundle_id, path, fragment, languages)`, creating it
    /// if needed.
    ///
    /// `path` is normalized with [`canonical_topic_path`] and `fragment` with
    /// [`url_readable_fragment`] before lookup.
    ///
    /// # Panics
    ///
    /// If `languages` is empty. A topic always exists in at least one language; an empty set is a
    /// bug in the caller, not an authoring problem.
    pub fn resolve(
        &self,
        bundle_id: &str,
        path: &str,
        fragment: Option<&str>,
        languages: SourceLanguageSet,
    ) -> ResolvedTopicReference {
        assert!(
            !languages.is_empty(),
            "[ReferenceInterner::resolve] reference to '{bundle_id}{path}' constructed without any \
             source language"
        );
        let path = canonical_topic_path(path);
        let fragment = fragment
            .map(url_readable_fragment)
            .filter(|frag| !frag.is_empty());
        let key = ReferenceKey {
            path,
            fragment,
            languages,
        };

        let mut pools = self.pools.lock();
        let pool = pools.entry(bundle_id.to_string()).or_default();
        if let Some(existing) = pool.get(&key) {
            return existing.clone();
        }
        let reference = ResolvedTopicReference(Arc::new(ReferenceStorage::new(
            bundle_id.to_string(),
            key.path.clone(),
            key.fragment.clone(),
            languages,
        )));
        pool.insert(key, reference.clone());
        reference
    }

    /// Number of interned references for a bundle.
    pub fn pool_size(&self, bundle_id: &str) -> usize {
        self.pools
            .lock()
            .get(bundle_id)
            .map(|pool| pool.len())
            .unwrap_or(0)
    }

    pub fn bundle_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.pools.lock().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Drop every reference interned for `bundle_id`. Returns how many were released.
    ///
    /// References already handed out stay valid, but new requests produce fresh allocations.
    pub fn purge_bundle(&self, bundle_id: &str) -> usize {
        let removed = self
            .pools
            .lock()
            .remove(bundle_id)
            .map(|pool| pool.len())
            .unwrap_or(0);
        tracing::debug!("[ReferenceInterner::purge_bundle] released {removed} references for {bundle_id}");
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::SourceLanguage;
    use std::thread;

    #[test]
    fn test_interned_references_share_storage() {
        let interner = ReferenceInterner::new();
        let a = interner.resolve("b", "/documentation/Kit/Foo", Some("x"), SourceLanguage::Swift.into());
        let b = interner.resolve("b", "/documentation/Kit/Foo", Some("x"), SourceLanguage::Swift.into());
        assert_eq!(a, b);
        assert!(a.shares_storage_with(&b));
        assert_eq!(interner.pool_size("b"), 1);
    }

    #[test]
    fn test_normalized_spellings_share_storage() {
        let interner = ReferenceInterner::new();
        let plain = interner.resolve("b", "/documentation/Kit/foo(_:)", None, SourceLanguage::Swift.into());
        let escaped = interner.resolve(
            "b",
            "documentation/Kit/foo%28_%3A%29",
            None,
            SourceLanguage::Swift.into(),
        );
        assert!(plain.shares_storage_with(&escaped));

        let spaced = interner.resolve("b", "/documentation/Kit/My Article", None, SourceLanguage::Swift.into());
        assert_eq!(spaced.path(), "/documentation/Kit/My-Article");
    }

    #[test]
    fn test_purge_bundle_releases_pool() {
        let interner = ReferenceInterner::new();
        let before = interner.resolve("one", "/documentation/A", None, SourceLanguage::Swift.into());
        interner.resolve("one", "/documentation/B", None, SourceLanguage::Swift.into());
        interner.resolve("two", "/documentation/C", None, SourceLanguage::Swift.into());

        assert_eq!(interner.purge_bundle("one"), 2);
        assert_eq!(interner.pool_size("one"), 0);
        assert_eq!(interner.pool_size("two"), 1);
        assert_eq!(interner.bundle_ids(), vec!["two".to_string()]);

        let after = interner.resolve("one", "/documentation/A", None, SourceLanguage::Swift.into());
        assert_eq!(before, after);
        assert!(!before.shares_storage_with(&after));
    }

    #[test]
    fn test_concurrent_resolution_yields_one_instance() {
        let interner = ReferenceInterner::new();
        let refs: Vec<ResolvedTopicReference> = thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(|| {
                        interner.resolve("b", "/documentation/Kit", None, SourceLanguage::C.into())
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        for reference in &refs {
            assert!(reference.shares_storage_with(&refs[0]));
        }
    }

    #[test]
    #[should_panic(expected = "without any source language")]
    fn test_empty_language_set_is_fatal() {
        let interner = ReferenceInterner::new();
        interner.resolve("b", "/documentation/Kit", None, SourceLanguageSet::empty());
    }
}
