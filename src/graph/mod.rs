//! The documentation graph and the session that builds it.
//!
//! [`DocumentationContext::register`] turns a provider's symbols and articles into
//! [`DocumentationNode`](crate::node::DocumentationNode)s, places them in a
//! [`DocumentationGraph`], and runs the link, curation, and validation passes over them.

pub mod base;
pub mod context;
pub mod curation;

pub use base::{disambiguation_hash, DocumentationGraph, EdgeKind, HierarchyGraph, PathLookup};
pub use context::{DocumentationContext, RegistrationSummary, RenderConsumer};
pub use curation::{apply_automatic_curation, automatic_task_groups};
