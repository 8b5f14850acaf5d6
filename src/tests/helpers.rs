//! Shared fixtures for the unit tests

use crate::{
    concurrency::BatchConfig,
    config::ConvertConfig,
    symbol::{
        Article, DeclarationKind, DocComment, FunctionSignature, InMemoryProvider,
        SignatureParameter, Symbol, SymbolVariant,
    },
    reference::SourceLanguage,
};

pub const KIT_BUNDLE: &str = "com.example.kit";

/// Initialize logging for tests
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

/// A Swift-only symbol of `kind` (e.g. `swift.class`) at `path` inside its module.
pub fn swift_symbol(precise_id: &str, kind: &str, path: &[&str], doc: &str) -> Symbol {
    Symbol {
        precise_id: precise_id.to_string(),
        kind: DeclarationKind::new(kind, kind),
        title: path.last().copied().unwrap_or_default().to_string(),
        path_components: path.iter().map(|component| component.to_string()).collect(),
        availability: vec![],
        variants: vec![SymbolVariant {
            language: SourceLanguage::Swift,
            signature: None,
            declaration: None,
        }],
        doc_comment: (!doc.is_empty()).then(|| DocComment::from_text(doc)),
    }
}

pub fn with_signature(mut symbol: Symbol, parameters: Vec<SignatureParameter>) -> Symbol {
    for variant in symbol.variants.iter_mut() {
        variant.signature = Some(FunctionSignature {
            parameters: parameters.clone(),
            returns: None,
            is_throwing: false,
        });
    }
    symbol
}

/// Config whose bulk passes run on the calling thread.
pub fn sequential_config() -> ConvertConfig {
    ConvertConfig {
        batching: BatchConfig::sequential(),
        ..Default::default()
    }
}

pub const WIDGET_DOC: &str = "A widget.

## Overview

Widgets can be resized with ``Widget/resize(to:)``.

### Sizing

Sizes are in points.

## Topics

### Essentials

- ``resize(to:)``
- ``Gadget``";

pub const GETTING_STARTED: &str = "# Getting Started

Start with ``Widget``.

## Overview

Read about <doc:Missing> and ``Widgte``.";

/// The `Kit` module used across the unit tests:
///
/// - `Widget` (class) with `init()`, `size`, `resize(to:)` and two `draw(_:)` overloads
/// - `Gadget` (struct), linking to `Widget` and one of its anchors
/// - `Shape`, declared both as a class and as a protocol
/// - the `GettingStarted` article, with two broken links
pub fn kit_provider() -> InMemoryProvider {
    InMemoryProvider::new(KIT_BUNDLE)
        .with_module(
            "Kit",
            vec![
                swift_symbol("s:3Kit6WidgetC", "swift.class", &["Widget"], WIDGET_DOC),
                swift_symbol(
                    "s:3Kit6WidgetCACycfc",
                    "swift.init",
                    &["Widget", "init()"],
                    "Creates a widget.",
                ),
                swift_symbol(
                    "s:3Kit6WidgetC4sizeSivp",
                    "swift.property",
                    &["Widget", "size"],
                    "The size.",
                ),
                with_signature(
                    swift_symbol(
                        "s:3Kit6WidgetC6resize2toySi_tF",
                        "swift.method",
                        &["Widget", "resize(to:)"],
                        "Resizes the widget.\n\n- Parameter size: The new size.",
                    ),
                    vec![SignatureParameter::named("size").with_external_name("to")],
                ),
                swift_symbol(
                    "s:3Kit6WidgetC4drawyySiF",
                    "swift.method",
                    &["Widget", "draw(_:)"],
                    "Draws an integer.",
                ),
                swift_symbol(
                    "s:3Kit6WidgetC4drawyySSF",
                    "swift.method",
                    &["Widget", "draw(_:)"],
                    "Draws a string.",
                ),
                swift_symbol(
                    "s:3Kit6GadgetV",
                    "swift.struct",
                    &["Gadget"],
                    "A gadget.\n\nUnlike ``Widget``, it has no [sizing](doc:Widget#Sizing).",
                ),
                swift_symbol("s:3Kit5ShapeC", "swift.class", &["Shape"], "A shape class."),
                swift_symbol("s:3Kit5ShapeP", "swift.protocol", &["Shape"], "A shape protocol."),
            ],
        )
        .with_article(Article::parse("GettingStarted", GETTING_STARTED, None))
}
