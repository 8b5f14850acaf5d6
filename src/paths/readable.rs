//! "URL-readable" normalization of topic paths and fragments.
//!
//! Reference pools are keyed by the normalized forms, so two authored spellings of the same
//! location (`foo(_:)` vs. `foo%28_%3A%29`, `Some Heading` vs. `Some%20Heading`) collapse onto one
//! interned reference.

use percent_encoding::percent_decode_str;
use unicode_normalization::UnicodeNormalization;

/// ASCII punctuation permitted in the path component of a URL.
const PATH_ALLOWED: &str = "-._~!$&'()*+,;=:@/";

/// ASCII punctuation permitted in the fragment component of a URL.
const FRAGMENT_ALLOWED: &str = "-._~!$&'()*+,;=:@/?";

/// Normalize a topic path so it can be used verbatim in a URL path.
///
/// Percent escapes are decoded first, whitespace runs and disallowed characters become a single
/// hyphen. The function is idempotent.
pub fn url_readable_path(path: &str) -> String {
    readable(path, PATH_ALLOWED)
}

/// Normalize an anchor/fragment. Same rules as [`url_readable_path`], except that `?` is kept and
/// `#` is not.
pub fn url_readable_fragment(fragment: &str) -> String {
    readable(fragment.trim_start_matches('#'), FRAGMENT_ALLOWED)
}

fn readable(raw: &str, allowed: &str) -> String {
    let decoded = percent_decode_str(raw).decode_utf8_lossy();
    let composed: String = decoded.nfc().collect();
    let mut res = String::with_capacity(composed.len());
    let mut last_was_hyphen = false;
    for c in composed.trim().chars() {
        let keep = !c.is_whitespace()
            && (c.is_alphanumeric() || (c.is_ascii_punctuation() && allowed.contains(c)));
        let c = if keep { c } else { '-' };
        if c == '-' {
            if last_was_hyphen {
                continue;
            }
            last_was_hyphen = true;
        } else {
            last_was_hyphen = false;
        }
        res.push(c);
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_normalization() {
        assert_eq!(
            url_readable_path("/documentation/MyKit/foo(_:)"),
            "/documentation/MyKit/foo(_:)"
        );
        assert_eq!(url_readable_path("Some   Article Name"), "Some-Article-Name");
        assert_eq!(url_readable_path("generic<T>"), "generic-T-");
        assert_eq!(url_readable_path("a#b"), "a-b");
        assert_eq!(url_readable_path("  padded  "), "padded");
    }

    #[test]
    fn test_percent_escapes_collapse_to_same_key() {
        assert_eq!(
            url_readable_path("foo%28_%3A%29"),
            url_readable_path("foo(_:)")
        );
        assert_eq!(
            url_readable_path("Some%20Article"),
            url_readable_path("Some Article")
        );
        assert_eq!(
            url_readable_fragment("Getting%20Started"),
            url_readable_fragment("Getting Started")
        );
    }

    #[test]
    fn test_fragment_normalization() {
        assert_eq!(url_readable_fragment("#Getting Started"), "Getting-Started");
        assert_eq!(url_readable_fragment("What's new?"), "What's-new?");
        assert_eq!(url_readable_fragment("Tabs\tand\nnewlines"), "Tabs-and-newlines");
        assert_eq!(url_readable_fragment("a [b] c"), "a-b-c");
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let samples = [
            "foo%2520bar",
            "Some -- Heading!!",
            "  x  y  ",
            "init(frame:)",
            "ünïcödé wörds",
            "%E2%9C%93 done",
            "tabs\t\tand spaces",
            "<T: Equatable>",
        ];
        for sample in samples {
            let once = url_readable_path(sample);
            assert_eq!(url_readable_path(&once), once, "path: {sample}");
            let once = url_readable_fragment(sample);
            assert_eq!(url_readable_fragment(&once), once, "fragment: {sample}");
        }
    }
}
