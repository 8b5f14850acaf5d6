use std::fmt::{Display, Formatter};

use crate::paths::url_readable_path;

/// Root path component under which symbol and article pages live.
pub const DOCUMENTATION_ROOT: &str = "/documentation";

/// Root path component under which tutorial pages live.
pub const TUTORIALS_ROOT: &str = "/tutorials";

/// A borrowed view over a topic path of the form `/documentation/Module/Type/member#fragment`.
///
/// Unlike file paths, topic path components never carry extensions, so the only separator of
/// interest besides `/` is the `#` that starts the fragment.
#[derive(Debug, Clone, Copy)]
pub struct TopicPath<'a> {
    pub path: &'a str,
    /// Index of '#' separating the path from its fragment
    frag_sep: Option<usize>,
}

impl<'a> TopicPath<'a> {
    pub fn new(path: &'a str) -> TopicPath<'a> {
        TopicPath {
            path,
            frag_sep: path.find('#'),
        }
    }

    pub fn is_absolute(&self) -> bool {
        self.path.starts_with('/')
    }

    /// True if the path is only a fragment (`#section`).
    pub fn is_fragment_only(&self) -> bool {
        self.frag_sep == Some(0)
    }

    /// Everything before the fragment separator.
    pub fn path_part(&self) -> &'a str {
        &self.path[0..self.frag_sep.unwrap_or(self.path.len())]
    }

    pub fn fragment(&self) -> Option<&'a str> {
        self.frag_sep
            .map(|idx| &self.path[idx + 1..])
            .filter(|frag| !frag.is_empty())
    }

    /// Non-empty path components, in order.
    pub fn components(&self) -> Vec<&'a str> {
        self.path_part()
            .split('/')
            .filter(|part| !part.is_empty())
            .collect()
    }

    pub fn last_component(&self) -> Option<&'a str> {
        self.components().last().copied()
    }

    /// The path with its last component removed. The parent of a single component path is the
    /// root (`/`) for absolute paths and the empty string otherwise.
    pub fn parent(&self) -> &'a str {
        let path = self.path_part().trim_end_matches('/');
        match path.rfind('/') {
            Some(0) => &self.path[0..1],
            Some(idx) => &path[0..idx],
            None => "",
        }
    }

    /// All ancestors of this path, starting with the path itself and ending at the root.
    ///
    /// `/documentation/Kit/Foo` yields `/documentation/Kit/Foo`, `/documentation/Kit`,
    /// `/documentation`, `/`.
    pub fn ancestors(&self) -> Vec<&'a str> {
        let mut res = Vec::new();
        let mut current = self.path_part().trim_end_matches('/');
        while !current.is_empty() {
            res.push(current);
            let parent = TopicPath::new(current).parent();
            if parent == current {
                break;
            }
            current = parent;
        }
        if self.is_absolute() && res.last() != Some(&"/") {
            res.push(&self.path[0..1]);
        }
        res
    }

    /// Compose `end` onto this path as a URL would: absolute paths replace the base, fragment-only
    /// paths replace the fragment, everything else is appended and normalized.
    pub fn join<E: AsRef<str>>(&self, end_ref: E) -> String {
        let end = TopicPath::new(end_ref.as_ref());
        if end.is_absolute() {
            return end.normalize();
        }
        if end.path.is_empty() {
            return self.to_string();
        }
        if end.is_fragment_only() {
            return match end.fragment() {
                Some(frag) => format!("{}#{}", self.path_part(), frag),
                None => self.path_part().to_string(),
            };
        }
        let base = self.path_part().trim_end_matches('/');
        let joined = if base.is_empty() {
            end.path.to_string()
        } else {
            format!("{}/{}", base, end.path)
        };
        TopicPath::new(&joined).normalize()
    }

    /// Normalize a topic path by resolving `.` and `..` components and collapsing repeated
    /// separators.
    ///
    /// `..` that would climb above the root of an absolute path is dropped. Relative paths keep
    /// leading `..` components, callers resolve them against a base with [`TopicPath::join`].
    pub fn normalize(&self) -> String {
        let absolute = self.is_absolute();
        let mut components: Vec<&str> = Vec::new();
        for part in self.path_part().split('/') {
            match part {
                "" | "." => {}
                ".." => {
                    if components.last().is_some_and(|last| *last != "..") {
                        components.pop();
                    } else if !absolute {
                        components.push("..");
                    }
                }
                _ => components.push(part),
            }
        }
        let mut res = components.join("/");
        if absolute {
            res.insert(0, '/');
        }
        if let Some(frag) = self.fragment() {
            res.push('#');
            res.push_str(frag);
        }
        res
    }
}

/// The form under which a topic path is interned and indexed: url-readable, normalized and
/// absolute. Fragments are not allowed here, pass them separately.
pub fn canonical_topic_path(path: &str) -> String {
    let readable = url_readable_path(path);
    let mut path = TopicPath::new(&readable).normalize();
    if !path.starts_with('/') {
        path.insert(0, '/');
    }
    path
}

impl<'a, T: AsRef<str> + ?Sized> From<&'a T> for TopicPath<'a> {
    fn from(s: &'a T) -> TopicPath<'a> {
        TopicPath::new(s.as_ref())
    }
}

impl<'a> AsRef<str> for TopicPath<'a> {
    fn as_ref(&self) -> &str {
        self.path
    }
}

impl<'a> Display for TopicPath<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path)
    }
}
