use std::sync::Arc;

use crate::{
    config::{ResolverConfig, TieBreak},
    diagnostic::{Replacement, Solution, SourceRange},
    graph::{DocumentationGraph, PathLookup},
    markup::{ast::inlines_plain_text, Inline},
    paths::{TopicPath, DOCUMENTATION_ROOT, TUTORIALS_ROOT},
    reference::{
        ReferenceInterner, ResolvedTopicReference, SourceLanguageSet, UnresolvedTopicReference,
    },
    resolve::{
        external::{
            ExternalArchive, ExternalEntity, OutOfProcessResolver, ResolverRequest,
            ResolverResponse,
        },
        near_miss::near_misses,
    },
};

/// A suggested fix for a link: the path that should have been written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestedReplacement {
    pub summary: String,
    /// Link path, without any link syntax.
    pub path: String,
}

/// Why a link didn't resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub message: String,
    pub note: Option<String>,
    pub suggestions: Vec<SuggestedReplacement>,
}

/// How an authored link is spelled, so suggestions can be written back the same way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkStyle {
    /// ` ``path`` `
    SymbolLink,
    /// `<doc:path>`
    Autolink,
    /// `[text](doc:path)`
    Link { text: String },
}

impl LinkStyle {
    /// The style of a link inline. Non-link inlines are treated as symbol links.
    pub fn of(inline: &Inline) -> LinkStyle {
        match inline {
            Inline::Link {
                destination,
                content,
                ..
            } => {
                let text = inlines_plain_text(content);
                if text == *destination {
                    LinkStyle::Autolink
                } else {
                    LinkStyle::Link { text }
                }
            }
            _ => LinkStyle::SymbolLink,
        }
    }

    pub fn format(&self, path: &str) -> String {
        match self {
            LinkStyle::SymbolLink => format!("``{path}``"),
            LinkStyle::Autolink => format!("<doc:{path}>"),
            LinkStyle::Link { text } => format!("[{text}](doc:{path})"),
        }
    }
}

impl ErrorInfo {
    pub fn new(message: impl Into<String>) -> Self {
        ErrorInfo {
            message: message.into(),
            note: None,
            suggestions: vec![],
        }
    }

    /// Solutions replacing the text at `range`. Without a range nothing can be replaced.
    pub fn solutions(&self, range: Option<SourceRange>, style: &LinkStyle) -> Vec<Solution> {
        let Some(range) = range else {
            return vec![];
        };
        self.suggestions
            .iter()
            .map(|suggestion| {
                Solution::new(
                    suggestion.summary.clone(),
                    vec![Replacement::new(range, style.format(&suggestion.path))],
                )
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopicReferenceResolutionResult {
    Success(ResolvedTopicReference),
    Failure(UnresolvedTopicReference, ErrorInfo),
}

impl TopicReferenceResolutionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, TopicReferenceResolutionResult::Success(_))
    }

    pub fn resolved(&self) -> Option<&ResolvedTopicReference> {
        match self {
            TopicReferenceResolutionResult::Success(reference) => Some(reference),
            TopicReferenceResolutionResult::Failure(..) => None,
        }
    }
}

/// Outcome of one local lookup step.
enum Local {
    Found(ResolvedTopicReference),
    Failed(ErrorInfo),
    Missing,
}

/// Resolves authored references against a read-only graph.
///
/// A resolver only reads: resolving one link never changes what another resolves to, so any
/// number of links can be resolved in any order or in parallel.
pub struct LinkResolver<'a> {
    pub graph: &'a DocumentationGraph,
    pub interner: &'a ReferenceInterner,
    pub config: &'a ResolverConfig,
    pub externals: &'a [Arc<dyn ExternalArchive>],
    pub out_of_process: Option<&'a dyn OutOfProcessResolver>,
    /// Languages given to external references that don't declare any.
    pub default_languages: SourceLanguageSet,
}

impl<'a> LinkResolver<'a> {
    /// Resolve `unresolved`, authored on the page `parent`.
    pub fn resolve(
        &self,
        unresolved: &UnresolvedTopicReference,
        parent: &ResolvedTopicReference,
    ) -> TopicReferenceResolutionResult {
        let local = match unresolved.bundle_id.as_deref() {
            Some(bundle_id) if self.graph.has_bundle(bundle_id) => {
                self.from_lookup(unresolved, self.graph.lookup_path(bundle_id, &unresolved.path))
            }
            Some(_) => Local::Missing,
            None if unresolved.path.is_empty() => {
                self.with_fragment(unresolved, parent.page(self.interner))
            }
            None => self.resolve_relative(unresolved, parent),
        };
        match local {
            Local::Found(reference) => return TopicReferenceResolutionResult::Success(reference),
            Local::Failed(info) => {
                return TopicReferenceResolutionResult::Failure(unresolved.clone(), info)
            }
            Local::Missing => {}
        }

        if let Some(reference) = self.resolve_external(unresolved, parent) {
            return TopicReferenceResolutionResult::Success(reference);
        }

        tracing::debug!(
            "[LinkResolver::resolve] '{}' not found from {}",
            unresolved.authored,
            parent
        );
        TopicReferenceResolutionResult::Failure(
            unresolved.clone(),
            self.not_found(unresolved, parent),
        )
    }

    /// Paths an unqualified link may mean, most specific first: relative to the page and each
    /// of its ancestors, then from the documentation and tutorials roots.
    fn candidate_paths(&self, path: &str, parent: &ResolvedTopicReference) -> Vec<String> {
        let tp = TopicPath::new(path);
        if tp.is_absolute() {
            let normalized = tp.normalize();
            let rooted = [DOCUMENTATION_ROOT, TUTORIALS_ROOT].iter().any(|root| {
                normalized
                    .strip_prefix(root)
                    .is_some_and(|rest| rest.is_empty() || rest.starts_with(['/', '#']))
            });
            if rooted {
                return vec![normalized];
            }
            // `/Kit/Foo` names a symbol page relative to the documentation root.
            let under_root = format!("{DOCUMENTATION_ROOT}{normalized}");
            return vec![normalized, under_root];
        }
        let mut candidates: Vec<String> = TopicPath::new(parent.path())
            .ancestors()
            .into_iter()
            .map(|ancestor| TopicPath::new(ancestor).join(path))
            .collect();
        for root in [DOCUMENTATION_ROOT, TUTORIALS_ROOT] {
            candidates.push(TopicPath::new(root).join(path));
        }
        let mut seen = std::collections::BTreeSet::new();
        candidates.retain(|candidate| seen.insert(candidate.clone()));
        candidates
    }

    fn lookup_relative(&self, path: &str, parent: &ResolvedTopicReference) -> PathLookup {
        for candidate in self.candidate_paths(path, parent) {
            match self.graph.lookup_path(parent.bundle_id(), &candidate) {
                PathLookup::NotFound => continue,
                found => return found,
            }
        }
        PathLookup::NotFound
    }

    fn resolve_relative(
        &self,
        unresolved: &UnresolvedTopicReference,
        parent: &ResolvedTopicReference,
    ) -> Local {
        let lookup = self.lookup_relative(&unresolved.path, parent);
        self.from_lookup(unresolved, lookup)
    }

    fn from_lookup(&self, unresolved: &UnresolvedTopicReference, lookup: PathLookup) -> Local {
        match lookup {
            PathLookup::Found(reference) => self.with_fragment(unresolved, reference),
            PathLookup::Ambiguous(candidates) => match self.disambiguate(&candidates) {
                Ok(reference) => self.with_fragment(unresolved, reference),
                Err(remaining) => Local::Failed(self.ambiguity(unresolved, &remaining)),
            },
            PathLookup::NotFound => Local::Missing,
        }
    }

    /// Attach the authored fragment, if any, after checking the page has such an anchor.
    fn with_fragment(
        &self,
        unresolved: &UnresolvedTopicReference,
        page: ResolvedTopicReference,
    ) -> Local {
        let Some(fragment) = unresolved.readable_fragment() else {
            return Local::Found(page);
        };
        let anchors = self.graph.anchors(&page);
        if let Some(anchor) = anchors
            .iter()
            .find(|anchor| anchor.reference.fragment() == Some(fragment.as_str()))
        {
            return Local::Found(anchor.reference.clone());
        }
        let names: Vec<&str> = anchors
            .iter()
            .filter_map(|anchor| anchor.reference.fragment())
            .collect();
        let base = unresolved.authored.split('#').next().unwrap_or("");
        let suggestions = near_misses(
            &fragment,
            &names,
            self.config.near_miss_limit,
            self.config.near_miss_threshold,
        )
        .into_iter()
        .map(|name| SuggestedReplacement {
            summary: format!("Replace '{fragment}' with '{name}'"),
            path: format!("{base}#{name}"),
        })
        .collect();
        Local::Failed(ErrorInfo {
            message: format!("'{fragment}' isn't an anchor on '{}'", page.path()),
            note: None,
            suggestions,
        })
    }

    /// Apply the ambiguity policy. `Err` carries the candidates that are still tied.
    fn disambiguate(
        &self,
        candidates: &[ResolvedTopicReference],
    ) -> Result<ResolvedTopicReference, Vec<ResolvedTopicReference>> {
        let policy = &self.config.ambiguity;
        let kind_of = |reference: &ResolvedTopicReference| {
            self.graph.get(reference).map(|node| node.kind)
        };
        let Some(expected) = policy
            .preferred_kinds
            .iter()
            .find(|kind| candidates.iter().any(|c| kind_of(c) == Some(**kind)))
        else {
            return Err(candidates.to_vec());
        };
        let mut matching: Vec<ResolvedTopicReference> = candidates
            .iter()
            .filter(|c| kind_of(c) == Some(*expected))
            .cloned()
            .collect();
        match (matching.len(), policy.tie_break) {
            (1, _) => Ok(matching.remove(0)),
            (_, TieBreak::FirstByPath) => {
                matching.sort_by(|a, b| a.path().cmp(b.path()));
                Ok(matching.remove(0))
            }
            (_, TieBreak::Fail) => Err(matching),
        }
    }

    fn ambiguity(
        &self,
        unresolved: &UnresolvedTopicReference,
        candidates: &[ResolvedTopicReference],
    ) -> ErrorInfo {
        let authored = TopicPath::new(&unresolved.path);
        let prefix = authored.parent();
        let suggestions = candidates
            .iter()
            .map(|candidate| {
                let name = candidate.last_path_component();
                let path = if prefix.is_empty() {
                    name.to_string()
                } else {
                    format!("{prefix}/{name}")
                };
                let kind = self
                    .graph
                    .get(candidate)
                    .map(|node| node.kind.name())
                    .unwrap_or("topic");
                SuggestedReplacement {
                    summary: format!("Insert disambiguation for {kind} '{name}'"),
                    path,
                }
            })
            .collect();
        ErrorInfo {
            message: format!("'{}' is ambiguous", unresolved.path),
            note: Some(format!(
                "{} candidates share this path; add a disambiguation suffix",
                candidates.len()
            )),
            suggestions,
        }
    }

    fn resolve_external(
        &self,
        unresolved: &UnresolvedTopicReference,
        parent: &ResolvedTopicReference,
    ) -> Option<ResolvedTopicReference> {
        for archive in self.externals {
            if let Some(entity) = archive.lookup(unresolved) {
                tracing::debug!(
                    "[LinkResolver::resolve_external] '{}' found in {}",
                    unresolved.authored,
                    archive.bundle_id()
                );
                return self.intern_external(entity);
            }
        }
        let resolver = self.out_of_process?;
        let request = ResolverRequest {
            reference: unresolved.authored.clone(),
            parent: Some(parent.url().to_string()),
        };
        match resolver.resolve(&request) {
            Ok(ResolverResponse::Resolved(entity)) => self.intern_external(entity),
            Ok(ResolverResponse::Failure { message }) => {
                tracing::debug!(
                    "[LinkResolver::resolve_external] out-of-process miss for '{}': {message}",
                    unresolved.authored
                );
                None
            }
            Err(err) => {
                tracing::warn!(
                    "[LinkResolver::resolve_external] out-of-process resolver failed for '{}': {err}",
                    unresolved.authored
                );
                None
            }
        }
    }

    fn intern_external(&self, entity: ExternalEntity) -> Option<ResolvedTopicReference> {
        let parsed = match UnresolvedTopicReference::parse(&entity.url) {
            Ok(parsed) => parsed,
            Err(err) => {
                tracing::warn!("[LinkResolver::intern_external] {err}");
                return None;
            }
        };
        let bundle_id = parsed.bundle_id.as_deref()?;
        let languages = if entity.languages.is_empty() {
            self.default_languages
        } else {
            entity.languages
        };
        let reference = self.interner.resolve(
            bundle_id,
            &parsed.path,
            parsed.fragment.as_deref(),
            languages,
        );
        self.graph.cache_external(entity);
        Some(reference)
    }

    /// The failure for a link nothing resolved, with near misses among the children of the
    /// deepest part of the link that does resolve.
    fn not_found(
        &self,
        unresolved: &UnresolvedTopicReference,
        parent: &ResolvedTopicReference,
    ) -> ErrorInfo {
        let message = format!(
            "'{}' doesn't exist at '{}'",
            unresolved.path,
            parent.path()
        );
        if unresolved.bundle_id.as_deref().is_some_and(|b| !self.graph.has_bundle(b)) {
            return ErrorInfo {
                message,
                note: Some(format!(
                    "No bundle or external archive named '{}' is registered",
                    unresolved.bundle_id.as_deref().unwrap_or_default()
                )),
                suggestions: vec![],
            };
        }

        let authored = unresolved.path.trim_end_matches('/');
        let components: Vec<&str> = authored.split('/').collect();
        let resolved_prefix = (1..components.len()).rev().find_map(|len| {
            let prefix = components[..len].join("/");
            let lookup = match unresolved.bundle_id.as_deref() {
                Some(bundle_id) => self.graph.lookup_path(bundle_id, &prefix),
                None => self.lookup_relative(&prefix, parent),
            };
            match lookup {
                PathLookup::Found(reference) => Some((len, prefix, reference)),
                _ => None,
            }
        });

        let (missing, written_prefix, names) = match resolved_prefix {
            Some((len, prefix, reference)) => {
                let names = self.graph.child_names(&reference);
                (components[len], Some(prefix), names)
            }
            None => {
                let mut names: Vec<String> = TopicPath::new(parent.path())
                    .ancestors()
                    .into_iter()
                    .filter_map(|ancestor| {
                        match self.graph.lookup_path(parent.bundle_id(), ancestor) {
                            PathLookup::Found(reference) => Some(self.graph.child_names(&reference)),
                            _ => None,
                        }
                    })
                    .flatten()
                    .collect();
                names.sort();
                names.dedup();
                (components[0], None, names)
            }
        };

        let suggestions = near_misses(
            missing,
            &names,
            self.config.near_miss_limit,
            self.config.near_miss_threshold,
        )
        .into_iter()
        .map(|name| {
            let path = match &written_prefix {
                Some(prefix) => format!("{prefix}/{name}"),
                None => name.clone(),
            };
            SuggestedReplacement {
                summary: format!("Replace '{missing}' with '{name}'"),
                path,
            }
        })
        .collect();
        ErrorInfo {
            message,
            note: None,
            suggestions,
        }
    }
}
