use serde::{ser::SerializeStruct, Deserialize, Serialize, Serializer};
use std::{
    cmp::Ordering,
    fmt::{Display, Formatter},
    hash::{Hash, Hasher},
    sync::Arc,
};

use crate::{
    error::TopicGraphError,
    paths::{url_readable_fragment, TopicPath},
    reference::{ReferenceInterner, SourceLanguage, SourceLanguageSet},
};

/// URL scheme of documentation links.
pub const DOC_SCHEME: &str = "doc";

#[derive(Debug)]
pub(crate) struct ReferenceStorage {
    pub(crate) bundle_id: String,
    pub(crate) path: String,
    pub(crate) fragment: Option<String>,
    pub(crate) source_languages: SourceLanguageSet,
    pub(crate) url: String,
}

impl ReferenceStorage {
    pub(crate) fn new(
        bundle_id: String,
        path: String,
        fragment: Option<String>,
        source_languages: SourceLanguageSet,
    ) -> ReferenceStorage {
        let url = match &fragment {
            Some(frag) => format!("{DOC_SCHEME}://{bundle_id}{path}#{frag}"),
            None => format!("{DOC_SCHEME}://{bundle_id}{path}"),
        };
        ReferenceStorage {
            bundle_id,
            path,
            fragment,
            source_languages,
            url,
        }
    }
}

/// A reference to a topic that exists in a registered bundle.
///
/// Instances are only produced by a [`ReferenceInterner`], which hands out clones of one shared
/// allocation per `(bundle, path, fragment, languages)`. Equality, ordering and hashing consider
/// `(bundle, path, fragment)` only: the same topic in different language variants is the same
/// reference.
#[derive(Clone)]
pub struct ResolvedTopicReference(pub(crate) Arc<ReferenceStorage>);

impl ResolvedTopicReference {
    pub fn bundle_id(&self) -> &str {
        &self.0.bundle_id
    }

    /// The url-readable topic path, always absolute (`/documentation/Kit/Foo`).
    pub fn path(&self) -> &str {
        &self.0.path
    }

    pub fn fragment(&self) -> Option<&str> {
        self.0.fragment.as_deref()
    }

    pub fn source_languages(&self) -> SourceLanguageSet {
        self.0.source_languages
    }

    /// The primary language of the reference. Swift wins when present, otherwise the first
    /// language in declaration order.
    pub fn source_language(&self) -> SourceLanguage {
        if self.0.source_languages.contains(SourceLanguage::Swift) {
            SourceLanguage::Swift
        } else {
            self.0
                .source_languages
                .iter()
                .next()
                .unwrap_or(SourceLanguage::Swift)
        }
    }

    /// The absolute `doc://` URL of this reference.
    pub fn url(&self) -> &str {
        &self.0.url
    }

    pub fn path_components(&self) -> Vec<&str> {
        TopicPath::new(self.path()).components()
    }

    pub fn last_path_component(&self) -> &str {
        TopicPath::new(self.path()).last_component().unwrap_or("")
    }

    /// Whether `other` is the very same interned allocation, not merely an equal reference.
    pub fn shares_storage_with(&self, other: &ResolvedTopicReference) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// The same page, without any fragment.
    pub fn page(&self, interner: &ReferenceInterner) -> ResolvedTopicReference {
        if self.fragment().is_none() {
            return self.clone();
        }
        self.with_fragment(None, interner)
    }

    pub fn with_fragment(
        &self,
        fragment: Option<&str>,
        interner: &ReferenceInterner,
    ) -> ResolvedTopicReference {
        interner.resolve(
            self.bundle_id(),
            self.path(),
            fragment,
            self.source_languages(),
        )
    }

    /// Append a single path component. The component is made url-readable, and the fragment of
    /// the receiver is dropped.
    pub fn appending_path(
        &self,
        component: &str,
        interner: &ReferenceInterner,
    ) -> ResolvedTopicReference {
        let path = format!(
            "{}/{}",
            self.path().trim_end_matches('/'),
            component.trim_matches('/')
        );
        interner.resolve(self.bundle_id(), &path, None, self.source_languages())
    }

    /// Compose the path (and fragment) of an unresolved reference onto this one.
    pub fn appending_path_of_reference(
        &self,
        reference: &UnresolvedTopicReference,
        interner: &ReferenceInterner,
    ) -> ResolvedTopicReference {
        let relative = reference.path.trim_start_matches('/');
        let path = if relative.is_empty() {
            self.path().to_string()
        } else {
            TopicPath::new(self.path()).join(relative)
        };
        interner.resolve(
            self.bundle_id(),
            &path,
            reference.fragment.as_deref(),
            self.source_languages(),
        )
    }

    pub fn removing_last_path_component(
        &self,
        interner: &ReferenceInterner,
    ) -> ResolvedTopicReference {
        let parent = TopicPath::new(self.path()).parent();
        interner.resolve(self.bundle_id(), parent, None, self.source_languages())
    }

    pub fn adding_source_languages(
        &self,
        languages: SourceLanguageSet,
        interner: &ReferenceInterner,
    ) -> ResolvedTopicReference {
        if self.source_languages().is_superset(languages) {
            return self.clone();
        }
        interner.resolve(
            self.bundle_id(),
            self.path(),
            self.fragment(),
            self.source_languages() | languages,
        )
    }

    fn identity(&self) -> (&str, &str, Option<&str>) {
        (self.bundle_id(), self.path(), self.fragment())
    }
}

impl PartialEq for ResolvedTopicReference {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.identity() == other.identity()
    }
}

impl Eq for ResolvedTopicReference {}

impl Hash for ResolvedTopicReference {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}

impl PartialOrd for ResolvedTopicReference {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ResolvedTopicReference {
    fn cmp(&self, other: &Self) -> Ordering {
        self.identity().cmp(&other.identity())
    }
}

impl std::fmt::Debug for ResolvedTopicReference {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "ResolvedTopicReference({})", self.url())
    }
}

impl Display for ResolvedTopicReference {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.url())
    }
}

impl Serialize for ResolvedTopicReference {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ResolvedTopicReference", 4)?;
        state.serialize_field("url", self.url())?;
        state.serialize_field("bundle_id", self.bundle_id())?;
        state.serialize_field("path", self.path())?;
        state.serialize_field("languages", &self.source_languages())?;
        state.end()
    }
}

/// An authored reference that has not been resolved yet.
///
/// Authored forms: `doc://bundle.id/documentation/Kit/Foo#frag`, `doc:Foo/bar`, and bare
/// (possibly relative) paths such as `Foo/bar(_:)` or `../Sibling`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnresolvedTopicReference {
    /// The bundle named in the authority of a `doc://` URL, if any.
    pub bundle_id: Option<String>,
    /// The authored path, percent-decoded but otherwise as written.
    pub path: String,
    pub fragment: Option<String>,
    /// Optional link title supplied by the author.
    pub title: Option<String>,
    /// The destination as written, kept for diagnostics.
    pub authored: String,
}

impl UnresolvedTopicReference {
    pub fn parse(destination: &str) -> Result<UnresolvedTopicReference, TopicGraphError> {
        let trimmed = destination.trim();
        let doc_prefix = format!("{DOC_SCHEME}:");
        let (bundle_id, rest) = match trimmed.strip_prefix(&doc_prefix) {
            Some(after_scheme) if after_scheme.starts_with("//") => {
                let url = url::Url::parse(trimmed)?;
                let bundle = url.host_str().map(|host| host.to_string());
                let mut rest = percent_encoding::percent_decode_str(url.path())
                    .decode_utf8_lossy()
                    .to_string();
                if let Some(frag) = url.fragment() {
                    rest.push('#');
                    rest.push_str(frag);
                }
                (bundle, rest)
            }
            Some(after_scheme) => (None, after_scheme.to_string()),
            None => (None, trimmed.to_string()),
        };
        let tp = TopicPath::new(&rest);
        let path = tp.path_part().to_string();
        let fragment = tp.fragment().map(|frag| frag.to_string());
        if path.is_empty() && fragment.is_none() {
            return Err(TopicGraphError::InvalidReference(format!(
                "'{destination}' does not name a topic"
            )));
        }
        Ok(UnresolvedTopicReference {
            bundle_id,
            path,
            fragment,
            title: None,
            authored: destination.to_string(),
        })
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// The url-readable fragment, if the author wrote one.
    pub fn readable_fragment(&self) -> Option<String> {
        self.fragment
            .as_deref()
            .map(url_readable_fragment)
            .filter(|frag| !frag.is_empty())
    }
}

impl Display for UnresolvedTopicReference {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.authored)
    }
}

/// Either side of the resolution boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TopicReference {
    Unresolved(UnresolvedTopicReference),
    Resolved(ResolvedTopicReference),
}

impl TopicReference {
    pub fn is_resolved(&self) -> bool {
        matches!(self, TopicReference::Resolved(_))
    }

    pub fn as_resolved(&self) -> Option<&ResolvedTopicReference> {
        match self {
            TopicReference::Resolved(resolved) => Some(resolved),
            TopicReference::Unresolved(_) => None,
        }
    }
}

impl From<ResolvedTopicReference> for TopicReference {
    fn from(resolved: ResolvedTopicReference) -> Self {
        TopicReference::Resolved(resolved)
    }
}

impl From<UnresolvedTopicReference> for TopicReference {
    fn from(unresolved: UnresolvedTopicReference) -> Self {
        TopicReference::Unresolved(unresolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of<T: Hash>(value: &T) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_equality_ignores_languages() {
        let interner = ReferenceInterner::new();
        let swift = interner.resolve(
            "com.example.kit",
            "/documentation/Kit/Foo",
            None,
            SourceLanguage::Swift.into(),
        );
        let both = interner.resolve(
            "com.example.kit",
            "/documentation/Kit/Foo",
            None,
            SourceLanguage::Swift | SourceLanguage::ObjectiveC,
        );
        assert_eq!(swift, both);
        assert_eq!(hash_of(&swift), hash_of(&both));
        assert!(!swift.shares_storage_with(&both));
        assert_eq!(swift.cmp(&both), Ordering::Equal);
    }

    #[test]
    fn test_fragment_participates_in_identity() {
        let interner = ReferenceInterner::new();
        let page = interner.resolve("b", "/documentation/Kit", None, SourceLanguage::Swift.into());
        let anchor = page.with_fragment(Some("Getting Started"), &interner);
        assert_ne!(page, anchor);
        assert_eq!(anchor.fragment(), Some("Getting-Started"));
        assert_eq!(anchor.url(), "doc://b/documentation/Kit#Getting-Started");
        assert_eq!(anchor.page(&interner), page);
        assert!(anchor.page(&interner).shares_storage_with(&page));
    }

    #[test]
    fn test_derived_references() {
        let interner = ReferenceInterner::new();
        let kit = interner.resolve("b", "/documentation/Kit", None, SourceLanguage::Swift.into());
        let foo = kit.appending_path("Foo", &interner);
        assert_eq!(foo.path(), "/documentation/Kit/Foo");
        assert_eq!(foo.last_path_component(), "Foo");
        assert!(foo
            .removing_last_path_component(&interner)
            .shares_storage_with(&kit));

        let relative = UnresolvedTopicReference::parse("../Bar#Overview").unwrap();
        let bar = foo.appending_path_of_reference(&relative, &interner);
        assert_eq!(bar.path(), "/documentation/Kit/Bar");
        assert_eq!(bar.fragment(), Some("Overview"));

        let mixed = foo.adding_source_languages(SourceLanguage::ObjectiveC.into(), &interner);
        assert_eq!(mixed, foo);
        assert_eq!(
            mixed.source_languages(),
            SourceLanguage::Swift | SourceLanguage::ObjectiveC
        );
        assert!(foo
            .adding_source_languages(SourceLanguage::Swift.into(), &interner)
            .shares_storage_with(&foo));
    }

    #[test]
    fn test_parse_unresolved() {
        let absolute =
            UnresolvedTopicReference::parse("doc://com.example.kit/documentation/Kit/Foo#Bar")
                .unwrap();
        assert_eq!(absolute.bundle_id.as_deref(), Some("com.example.kit"));
        assert_eq!(absolute.path, "/documentation/Kit/Foo");
        assert_eq!(absolute.fragment.as_deref(), Some("Bar"));

        let doc = UnresolvedTopicReference::parse("doc:Getting-Started").unwrap();
        assert_eq!(doc.bundle_id, None);
        assert_eq!(doc.path, "Getting-Started");

        let symbol = UnresolvedTopicReference::parse("Foo/bar(_:)").unwrap();
        assert_eq!(symbol.path, "Foo/bar(_:)");
        assert_eq!(symbol.fragment, None);

        let anchor = UnresolvedTopicReference::parse("#Some Heading").unwrap();
        assert_eq!(anchor.path, "");
        assert_eq!(anchor.readable_fragment().as_deref(), Some("Some-Heading"));

        assert!(UnresolvedTopicReference::parse("doc:").is_err());
        assert!(UnresolvedTopicReference::parse("   ").is_err());
    }
}
