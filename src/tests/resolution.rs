//! Link resolution against a registered bundle

use super::helpers::*;
use crate::{
    concurrency::{BatchConfig, Parallelism},
    config::{ConvertConfig, TieBreak},
    error::TopicGraphError,
    graph::{DocumentationContext, PathLookup},
    node::DocumentationKind,
    reference::{ResolvedTopicReference, SourceLanguage, SourceLanguageSet, UnresolvedTopicReference},
    resolve::{
        resolve_links, ErrorInfo, ExternalEntity, LinkHierarchySnapshot, OutOfProcessResolver,
        ResolverRequest, ResolverResponse, SnapshotEntry, TopicReferenceResolutionResult,
    },
};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use test_log::test;

fn kit_context(config: ConvertConfig) -> DocumentationContext {
    let mut context = DocumentationContext::new(config);
    context.register(&kit_provider()).unwrap();
    context
}

fn page(context: &DocumentationContext, path: &str) -> ResolvedTopicReference {
    match context.graph().lookup_path(KIT_BUNDLE, path) {
        PathLookup::Found(reference) => reference,
        other => panic!("{path} is not a single page: {other:?}"),
    }
}

fn resolve(
    context: &DocumentationContext,
    link: &str,
    parent: &ResolvedTopicReference,
) -> TopicReferenceResolutionResult {
    context.resolve(&UnresolvedTopicReference::parse(link).unwrap(), parent)
}

fn resolved_path(context: &DocumentationContext, link: &str, parent: &ResolvedTopicReference) -> String {
    match resolve(context, link, parent) {
        TopicReferenceResolutionResult::Success(reference) => reference.path().to_string(),
        TopicReferenceResolutionResult::Failure(_, info) => {
            panic!("'{link}' did not resolve: {}", info.message)
        }
    }
}

fn failure(context: &DocumentationContext, link: &str, parent: &ResolvedTopicReference) -> ErrorInfo {
    match resolve(context, link, parent) {
        TopicReferenceResolutionResult::Failure(_, info) => info,
        TopicReferenceResolutionResult::Success(reference) => {
            panic!("'{link}' unexpectedly resolved to {reference}")
        }
    }
}

#[test]
fn test_relative_and_absolute_links() {
    let context = kit_context(sequential_config());
    let gadget = page(&context, "/documentation/Kit/Gadget");
    let widget = page(&context, "/documentation/Kit/Widget");

    assert_eq!(resolved_path(&context, "Widget", &gadget), "/documentation/Kit/Widget");
    assert_eq!(resolved_path(&context, "Kit/Widget", &gadget), "/documentation/Kit/Widget");
    assert_eq!(
        resolved_path(&context, "resize(to:)", &widget),
        "/documentation/Kit/Widget/resize(to:)"
    );
    assert_eq!(
        resolved_path(&context, "Gadget", &widget),
        "/documentation/Kit/Gadget"
    );
    assert_eq!(
        resolved_path(&context, "/documentation/Kit/Gadget", &widget),
        "/documentation/Kit/Gadget"
    );
    assert_eq!(
        resolved_path(&context, "doc://com.example.kit/documentation/Kit/Widget/size", &gadget),
        "/documentation/Kit/Widget/size"
    );
    assert_eq!(
        resolved_path(&context, "doc:GettingStarted", &widget),
        "/documentation/Kit/GettingStarted"
    );
}

#[test]
fn test_absolute_symbol_paths_under_documentation_root() {
    let context = kit_context(sequential_config());
    let gadget = page(&context, "/documentation/Kit/Gadget");

    assert_eq!(resolved_path(&context, "/Kit/Widget", &gadget), "/documentation/Kit/Widget");
    assert_eq!(
        resolved_path(&context, "/Kit/Widget/resize(to:)", &gadget),
        "/documentation/Kit/Widget/resize(to:)"
    );
    // An explicit root is never prefixed a second time.
    assert!(failure(&context, "/documentation/Widget", &gadget)
        .message
        .contains("Widget"));
}

#[test]
fn test_resolved_references_are_interned() {
    let context = kit_context(sequential_config());
    let gadget = page(&context, "/documentation/Kit/Gadget");
    let first = resolve(&context, "Widget", &gadget);
    let second = resolve(&context, "Kit/Widget", &gadget);
    let (Some(first), Some(second)) = (first.resolved(), second.resolved()) else {
        panic!("Widget did not resolve");
    };
    assert!(first.shares_storage_with(second));
    assert_eq!(first.url(), "doc://com.example.kit/documentation/Kit/Widget");
}

#[test]
fn test_kind_collisions_get_kind_suffixes() {
    let context = kit_context(sequential_config());
    let gadget = page(&context, "/documentation/Kit/Gadget");

    let class = page(&context, "/documentation/Kit/Shape-class");
    let protocol = page(&context, "/documentation/Kit/Shape-protocol");
    assert_eq!(context.graph().get(&class).unwrap().kind, DocumentationKind::Class);
    assert_eq!(
        context.graph().get(&protocol).unwrap().kind,
        DocumentationKind::Protocol
    );

    // Classes come before protocols in the default preferred kinds.
    assert_eq!(resolved_path(&context, "Shape", &gadget), class.path());
    assert_eq!(resolved_path(&context, "Shape-protocol", &gadget), protocol.path());
    assert_eq!(resolved_path(&context, "Shape-swift.protocol", &gadget), protocol.path());
}

#[test]
fn test_overloads_of_one_kind_are_ambiguous() {
    let context = kit_context(sequential_config());
    let widget = page(&context, "/documentation/Kit/Widget");

    let PathLookup::Ambiguous(candidates) =
        context.graph().lookup_path(KIT_BUNDLE, "/documentation/Kit/Widget/draw(_:)")
    else {
        panic!("draw(_:) should have two candidates");
    };
    assert_eq!(candidates.len(), 2);

    let info = failure(&context, "Widget/draw(_:)", &widget);
    assert!(info.message.contains("ambiguous"), "{}", info.message);
    assert!(info.note.is_some());
    let mut suggested: Vec<&str> = info.suggestions.iter().map(|s| s.path.as_str()).collect();
    suggested.sort();
    let mut expected: Vec<String> = candidates
        .iter()
        .map(|candidate| format!("Widget/{}", candidate.last_path_component()))
        .collect();
    expected.sort();
    assert_eq!(suggested, expected);

    // A hash suffix picks one overload.
    let hashed = format!("Widget/{}", candidates[1].last_path_component());
    assert_eq!(resolved_path(&context, &hashed, &widget), candidates[1].path());
}

#[test]
fn test_first_by_path_breaks_ties() {
    let mut config = sequential_config();
    config.resolver.ambiguity.tie_break = TieBreak::FirstByPath;
    let context = kit_context(config);
    let widget = page(&context, "/documentation/Kit/Widget");

    let PathLookup::Ambiguous(mut candidates) =
        context.graph().lookup_path(KIT_BUNDLE, "/documentation/Kit/Widget/draw(_:)")
    else {
        panic!("draw(_:) should have two candidates");
    };
    candidates.sort_by(|a, b| a.path().cmp(b.path()));
    assert_eq!(resolved_path(&context, "draw(_:)", &widget), candidates[0].path());
}

#[test]
fn test_no_preferred_kind_means_ambiguous() {
    let mut config = sequential_config();
    config.resolver.ambiguity.preferred_kinds = vec![DocumentationKind::Enumeration];
    let context = kit_context(config);
    let gadget = page(&context, "/documentation/Kit/Gadget");
    let info = failure(&context, "Shape", &gadget);
    assert_eq!(info.suggestions.len(), 2);
    assert!(info
        .suggestions
        .iter()
        .all(|suggestion| suggestion.path.starts_with("Shape-")));
}

#[test]
fn test_fragments_are_checked_against_anchors() {
    let context = kit_context(sequential_config());
    let gadget = page(&context, "/documentation/Kit/Gadget");
    let widget = page(&context, "/documentation/Kit/Widget");

    let result = resolve(&context, "Widget#Sizing", &gadget);
    let anchor = result.resolved().unwrap();
    assert_eq!(anchor.path(), "/documentation/Kit/Widget");
    assert_eq!(anchor.fragment(), Some("Sizing"));

    let local = resolve(&context, "#Sizing", &widget);
    assert_eq!(local.resolved().unwrap().fragment(), Some("Sizing"));

    let info = failure(&context, "Widget#Sizng", &gadget);
    assert_eq!(info.suggestions[0].path, "Widget#Sizing");
}

#[test]
fn test_near_miss_suggestions() {
    let context = kit_context(sequential_config());
    let article = page(&context, "/documentation/Kit/GettingStarted");
    let widget = page(&context, "/documentation/Kit/Widget");

    let info = failure(&context, "Widgte", &article);
    assert_eq!(info.suggestions[0].path, "Widget");
    assert!(info.suggestions.len() <= context.config().resolver.near_miss_limit);

    let info = failure(&context, "Widget/rezise(to:)", &widget);
    assert_eq!(info.suggestions[0].path, "Widget/resize(to:)");
    assert_eq!(info.suggestions[0].summary, "Replace 'rezise(to:)' with 'resize(to:)'");
}

#[test]
fn test_unknown_bundle_is_not_found() {
    let context = kit_context(sequential_config());
    let widget = page(&context, "/documentation/Kit/Widget");
    let info = failure(&context, "doc://com.example.nowhere/documentation/Kit/Widget", &widget);
    assert!(info.suggestions.is_empty());
    assert!(info.note.unwrap().contains("com.example.nowhere"));
}

fn other_archive() -> LinkHierarchySnapshot {
    let mut archive = LinkHierarchySnapshot {
        bundle_id: "com.example.other".to_string(),
        ..Default::default()
    };
    archive.insert(
        "/documentation/Other/Thing",
        SnapshotEntry {
            title: "Thing".to_string(),
            kind: DocumentationKind::Class,
            languages: SourceLanguage::ObjectiveC.into(),
            abstract_text: None,
        },
    );
    archive
}

#[test]
fn test_external_archives_after_local_lookup() {
    let mut context = kit_context(sequential_config());
    context.add_external_archive(Arc::new(other_archive()));
    let widget = page(&context, "/documentation/Kit/Widget");

    let url = "doc://com.example.other/documentation/Other/Thing";
    let result = resolve(&context, url, &widget);
    let thing = result.resolved().unwrap();
    assert_eq!(thing.url(), url);
    assert_eq!(
        thing.source_languages(),
        SourceLanguageSet::only(SourceLanguage::ObjectiveC)
    );
    assert_eq!(context.graph().external(url).unwrap().title, "Thing");

    // A bare name falls through to the archive when nothing local matches.
    assert_eq!(resolved_path(&context, "Thing", &widget), "/documentation/Other/Thing");
    // Local pages win over archive entries.
    assert_eq!(resolved_path(&context, "Gadget", &widget), "/documentation/Kit/Gadget");
}

struct CountingResolver {
    calls: AtomicUsize,
}

impl OutOfProcessResolver for CountingResolver {
    fn resolve(&self, request: &ResolverRequest) -> Result<ResolverResponse, TopicGraphError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if request.reference == "Remote" {
            return Ok(ResolverResponse::Resolved(ExternalEntity {
                url: "doc://com.example.remote/documentation/Remote".to_string(),
                title: "Remote".to_string(),
                kind: DocumentationKind::Article,
                languages: Default::default(),
                abstract_text: None,
            }));
        }
        if request.reference == "Broken" {
            return Err(TopicGraphError::ExternalResolver("connection reset".to_string()));
        }
        Ok(ResolverResponse::Failure {
            message: format!("no '{}'", request.reference),
        })
    }
}

#[test]
fn test_out_of_process_resolver_is_last() {
    let mut context = kit_context(sequential_config());
    let resolver = Arc::new(CountingResolver {
        calls: AtomicUsize::new(0),
    });
    context.set_out_of_process_resolver(resolver.clone());
    let widget = page(&context, "/documentation/Kit/Widget");

    assert_eq!(resolved_path(&context, "Gadget", &widget), "/documentation/Kit/Gadget");
    assert_eq!(resolver.calls.load(Ordering::SeqCst), 0);

    let result = resolve(&context, "Remote", &widget);
    let remote = result.resolved().unwrap();
    assert_eq!(remote.bundle_id(), "com.example.remote");
    // Entities without languages get the configured default.
    assert_eq!(
        remote.source_languages(),
        SourceLanguageSet::only(SourceLanguage::Swift)
    );

    let info = failure(&context, "Elsewhere", &widget);
    assert!(info.message.contains("Elsewhere"));
    // Transport errors are a miss, not a build failure.
    failure(&context, "Broken", &widget);
    assert_eq!(resolver.calls.load(Ordering::SeqCst), 3);
}

#[test]
fn test_link_pass_is_order_independent() {
    let sequential = kit_context(sequential_config());
    let mut parallel_config = sequential_config();
    parallel_config.batching = BatchConfig {
        parallelism: Parallelism::Available,
        min_batch_size: 1,
        batches_per_core: 2,
        max_workers: Some(4),
    };
    let parallel = kit_context(parallel_config.clone());

    let pages = sequential.graph().references();
    let mut reversed = pages.clone();
    reversed.reverse();

    let forward = resolve_links(
        &sequential.resolver(),
        &pages,
        &BatchConfig::sequential(),
        None,
    )
    .unwrap();
    let threaded = resolve_links(&parallel.resolver(), &pages, &parallel_config.batching, None)
        .unwrap();
    let mut backward =
        resolve_links(&sequential.resolver(), &reversed, &BatchConfig::sequential(), None)
            .unwrap();
    backward.reverse();

    assert_eq!(forward.len(), pages.len());
    for ((a, b), c) in forward.iter().zip(threaded.iter()).zip(backward.iter()) {
        assert_eq!(a.reference, b.reference);
        assert_eq!(a.reference, c.reference);
        assert_eq!(a.markup, b.markup);
        assert_eq!(a.markup, c.markup);
        assert_eq!(a.curated, b.curated);
        assert_eq!(a.problems, c.problems);
    }

    // The whole registration gives the same problems either way.
    assert_eq!(sequential.problems(), parallel.problems());
}
