//! Topic reference identity.
//!
//! - [`language`]: the closed set of source languages a topic can exist in
//! - [`topic`]: resolved and unresolved topic references
//! - [`interner`]: the session-owned registry that hands out shared reference instances

pub mod interner;
pub mod language;
pub mod topic;

pub use interner::ReferenceInterner;
pub use language::{SourceLanguage, SourceLanguageSet};
pub use topic::{ResolvedTopicReference, TopicReference, UnresolvedTopicReference, DOC_SCHEME};
