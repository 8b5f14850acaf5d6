mod common;

use common::{init_logging, located_symbol, sequential_config};
use std::{fs, sync::Arc};
use tempfile::TempDir;
use test_log::test;
use topicgraph::{
    diagnostic::SourceLocation,
    graph::DocumentationContext,
    node::DocumentationKind,
    reference::{SourceLanguage, UnresolvedTopicReference},
    resolve::{pass::UNRESOLVED_TOPIC, LinkHierarchySnapshot, SnapshotEntry},
    symbol::InMemoryProvider,
    TopicGraphError,
};

const OTHER_BUNDLE: &str = "com.example.other";

fn write_snapshot(temp_dir: &TempDir) -> std::path::PathBuf {
    let mut snapshot = LinkHierarchySnapshot {
        bundle_id: OTHER_BUNDLE.to_string(),
        ..Default::default()
    };
    snapshot.insert(
        "/documentation/Other",
        SnapshotEntry {
            title: "Other".to_string(),
            kind: DocumentationKind::Module,
            languages: SourceLanguage::Swift.into(),
            abstract_text: None,
        },
    );
    snapshot.insert(
        "documentation/Other/Thing",
        SnapshotEntry {
            title: "Thing".to_string(),
            kind: DocumentationKind::Class,
            languages: SourceLanguage::Swift.into(),
            abstract_text: Some("A thing.".to_string()),
        },
    );
    let path = temp_dir.path().join("other.linkhierarchy.json");
    fs::write(&path, snapshot.to_json_string().unwrap()).unwrap();
    path
}

fn kit() -> InMemoryProvider {
    InMemoryProvider::new("com.example.kit").with_module(
        "Kit",
        vec![located_symbol(
            "Kit",
            "s:3Kit6WidgetC",
            "swift.class",
            &["Widget"],
            "A widget.\n\nBuilt on ``Other/Thing`` and <doc://com.example.other/documentation/Other>.",
            SourceLocation::new(1, 1),
        )],
    )
}

#[test]
fn test_links_resolve_through_a_snapshot_file() {
    init_logging();
    let temp_dir = TempDir::new().unwrap();
    let archive = LinkHierarchySnapshot::from_path(write_snapshot(&temp_dir)).unwrap();
    assert_eq!(archive.entries.len(), 2);

    let mut context = DocumentationContext::new(sequential_config());
    context.add_external_archive(Arc::new(archive));
    context.register(&kit()).unwrap();

    assert!(
        !context.problems().iter().any(|problem| problem.is(UNRESOLVED_TOPIC)),
        "{:?}",
        context.problems()
    );
    let thing = context
        .graph()
        .external("doc://com.example.other/documentation/Other/Thing")
        .unwrap();
    assert_eq!(thing.title, "Thing");
    assert_eq!(thing.abstract_text.as_deref(), Some("A thing."));
    assert!(context
        .graph()
        .external("doc://com.example.other/documentation/Other")
        .is_some());
    // Archives never contribute pages.
    assert_eq!(context.graph().len(), 2);
}

#[test]
fn test_local_pages_win_over_archives() {
    let temp_dir = TempDir::new().unwrap();
    let mut archive = LinkHierarchySnapshot::from_path(write_snapshot(&temp_dir)).unwrap();
    archive.insert(
        "/documentation/Other/Widget",
        SnapshotEntry {
            title: "Widget".to_string(),
            kind: DocumentationKind::Class,
            languages: SourceLanguage::Swift.into(),
            abstract_text: None,
        },
    );
    let mut context = DocumentationContext::new(sequential_config());
    context.add_external_archive(Arc::new(archive));
    context.register(&kit()).unwrap();

    let widget = match context.graph().lookup_path("com.example.kit", "/documentation/Kit/Widget")
    {
        topicgraph::graph::PathLookup::Found(reference) => reference,
        other => panic!("{other:?}"),
    };
    let result = context.resolve(&UnresolvedTopicReference::parse("Widget").unwrap(), &widget);
    assert_eq!(result.resolved(), Some(&widget));
    assert!(context
        .graph()
        .external("doc://com.example.other/documentation/Other/Widget")
        .is_none());
}

#[test]
fn test_missing_and_malformed_snapshots() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("missing.json");
    assert!(matches!(
        LinkHierarchySnapshot::from_path(&missing),
        Err(TopicGraphError::NotFound(_))
    ));

    let malformed = temp_dir.path().join("malformed.json");
    fs::write(&malformed, "{\"entries\": {}}").unwrap();
    assert!(matches!(
        LinkHierarchySnapshot::from_path(&malformed),
        Err(TopicGraphError::Serialization(_))
    ));

    let anonymous = temp_dir.path().join("anonymous.json");
    fs::write(&anonymous, "{\"bundle_id\": \" \", \"entries\": {}}").unwrap();
    assert!(matches!(
        LinkHierarchySnapshot::from_path(&anonymous),
        Err(TopicGraphError::Serialization(_))
    ));
}
