//! Metadata directives of documentation extension files and articles.

use serde::{Deserialize, Serialize};

use crate::markup::ast::{Block, Directive};

/// How a documentation extension combines with the in-source comment of its symbol.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergeBehavior {
    /// Extension content is appended after the comment.
    #[default]
    Append,
    /// Extension content replaces the comment.
    Override,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleMetadata {
    pub merge_behavior: MergeBehavior,
    /// Previous paths of the page, from `@Redirected(from:)`.
    pub redirects: Vec<String>,
    /// `@DisplayName` override of the page title.
    pub display_name: Option<String>,
}

impl ArticleMetadata {
    /// Collect metadata from the top-level directives of a document.
    ///
    /// Recognized forms:
    /// - `@Metadata { @DocumentationExtension(mergeBehavior: override) }`
    /// - `@Options(behavior: override)`
    /// - `@Redirected(from: old/path)`, top level or inside `@Metadata`
    /// - `@DisplayName("Title")` inside `@Metadata`
    pub fn from_blocks(blocks: &[Block]) -> ArticleMetadata {
        let mut metadata = ArticleMetadata::default();
        for directive in blocks.iter().filter_map(Block::directive) {
            match directive.name.as_str() {
                "Metadata" => {
                    for child in directive.children.iter().filter_map(Block::directive) {
                        metadata.apply(child);
                    }
                }
                "Options" => {
                    if is_override(directive.argument("behavior")) {
                        metadata.merge_behavior = MergeBehavior::Override;
                    }
                }
                _ => metadata.apply(directive),
            }
        }
        metadata
    }

    fn apply(&mut self, directive: &Directive) {
        match directive.name.as_str() {
            "DocumentationExtension" => {
                if is_override(directive.argument("mergeBehavior")) {
                    self.merge_behavior = MergeBehavior::Override;
                }
            }
            "Redirected" => {
                if let Some(from) = directive.argument("from") {
                    self.redirects.push(from.to_string());
                }
            }
            "DisplayName" => {
                self.display_name = directive
                    .arguments
                    .first()
                    .map(|argument| argument.value.clone());
            }
            _ => {}
        }
    }
}

fn is_override(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.eq_ignore_ascii_case("override"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::parse::Document;

    #[test]
    fn test_metadata_directives() {
        let doc = Document::parse(
            "\
# ``Kit/Foo``

@Metadata {
  @DocumentationExtension(mergeBehavior: override)
  @DisplayName(\"Foo Type\")
}

@Redirected(from: /documentation/Kit/OldFoo)
",
            None,
        );
        let metadata = ArticleMetadata::from_blocks(&doc.blocks);
        assert_eq!(metadata.merge_behavior, MergeBehavior::Override);
        assert_eq!(metadata.display_name.as_deref(), Some("Foo Type"));
        assert_eq!(metadata.redirects, vec!["/documentation/Kit/OldFoo".to_string()]);
    }

    #[test]
    fn test_options_behavior_and_default() {
        let doc = Document::parse("@Options(behavior: override)\n\nText.\n", None);
        assert_eq!(
            ArticleMetadata::from_blocks(&doc.blocks).merge_behavior,
            MergeBehavior::Override
        );
        let plain = Document::parse("# Title\n\nText.\n", None);
        assert_eq!(ArticleMetadata::from_blocks(&plain.blocks), ArticleMetadata::default());
    }
}
