//! # topicgraph
//!
//! Builds a documentation graph from symbol declarations and authored markup, and resolves the
//! topic links between its pages.
//!
//! ## Overview
//!
//! A documentation bundle is a set of symbols (with their doc comments and per-language
//! signatures) plus free-standing articles. topicgraph turns a bundle into pages, places them in a
//! graph keyed by topic reference, and then runs three passes over it:
//!
//! - **Link resolution**: every ``` ``Symbol`` ``` and `<doc:Article>` link is resolved against
//!   the local graph, then against external archives, then against an optional out-of-process
//!   resolver. Links that fail become placeholders with near-miss suggestions.
//! - **Curation**: links in Topics task groups become curation edges; children nobody curates are
//!   grouped into generated task groups by kind.
//! - **Validation**: documented parameters and returns are checked against each language
//!   variant's signature.
//!
//! Authored-content problems never abort a build. They are collected as
//! [`diagnostic::Problem`]s, each with the source range it applies to and possible fixes.
//!
//! ## Architecture
//!
//! - **[`reference`]**: topic reference identity and the session's reference interner
//! - **[`paths`]**: topic path arithmetic and URL-readable normalization
//! - **[`markup`]**: markdown to the block/inline tree and documentation sections
//! - **[`symbol`]**: the input model (symbols, articles, the provider trait)
//! - **[`node`]**: documentation nodes and their kinds
//! - **[`graph`]**: the graph and the [`graph::DocumentationContext`] session that builds it
//! - **[`resolve`]**: link resolution, external archives, near-miss suggestions
//! - **[`validate`]**: parameter and return validation
//! - **[`diagnostic`]**: problems, solutions and the diagnostic engine
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use topicgraph::{
//!     config::ConvertConfig,
//!     graph::DocumentationContext,
//!     symbol::{Article, InMemoryProvider},
//! };
//!
//! fn main() -> Result<(), topicgraph::TopicGraphError> {
//!     let modules = std::fs::read_to_string("symbols.json")?;
//!     let provider = InMemoryProvider::new("com.example.kit")
//!         .with_modules_json(&modules)?
//!         .with_article(Article::parse(
//!             "GettingStarted",
//!             "# Getting Started\n\nUse ``Kit/Widget`` to begin.",
//!             None,
//!         ));
//!
//!     let mut context = DocumentationContext::new(ConvertConfig::default());
//!     context.register(&provider)?;
//!
//!     for problem in context.problems() {
//!         println!("{problem}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! [`config::ConvertConfig`] is read from TOML. Every field has a default, so an empty file is a
//! valid configuration.

pub mod concurrency;
pub mod config;
pub mod diagnostic;
pub mod error;
pub mod graph;
pub mod markup;
pub mod node;
pub mod paths;
pub mod reference;
pub mod resolve;
pub mod symbol;
#[cfg(test)]
mod tests;
pub mod validate;

pub use error::*;
