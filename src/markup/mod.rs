//! Markup front end: from authored text to documentation sections.
//!
//! - [`parse`]: text to the [`ast`] block/inline tree
//! - [`sections`]: the section state machine
//! - [`tags`]: parameter, return and throws tags
//! - [`task_group`]: Topics and See Also groups
//! - [`metadata`]: article metadata directives

pub mod ast;
pub mod metadata;
pub mod parse;
pub mod sections;
pub mod tags;
pub mod task_group;

pub use ast::{Block, BlockKind, Directive, DirectiveArgument, Inline, ListItem};
pub use metadata::{ArticleMetadata, MergeBehavior};
pub use parse::Document;
pub use sections::{
    AbstractSection, DeprecatedSection, DeprecationOrigin, DiscussionSection,
    DocumentationMarkup, ParserSection, SeeAlsoSection, TopicsSection,
};
pub use tags::{Parameter, Return, TaggedContent, Throw};
pub use task_group::{TaskGroup, TaskGroupLink};
