//! Topic link resolution.
//!
//! A link is looked up in the local graph first (absolute, then relative to the page it is
//! authored on), then in each registered [`ExternalArchive`], then through the
//! [`OutOfProcessResolver`] if one is set. Failures carry near-miss suggestions.

pub mod external;
pub mod near_miss;
pub mod pass;
pub mod resolver;

pub use external::{
    ExternalArchive, ExternalEntity, LinkHierarchySnapshot, OutOfProcessResolver, ResolverRequest,
    ResolverResponse, SnapshotEntry,
};
pub use near_miss::{near_miss_score, near_misses};
pub use pass::{apply_link_updates, resolve_links, resolve_node_links, NodeLinkUpdate};
pub use resolver::{
    ErrorInfo, LinkResolver, LinkStyle, SuggestedReplacement, TopicReferenceResolutionResult,
};
