pub mod path;
pub mod readable;

pub use path::{canonical_topic_path, TopicPath, DOCUMENTATION_ROOT, TUTORIALS_ROOT};
pub use readable::{url_readable_fragment, url_readable_path};
