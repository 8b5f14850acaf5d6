//! Splits a parsed comment or article into its documentation sections.
//!
//! The parser is a forward-only state machine over the top-level blocks:
//!
//! ```text
//! Title -> Abstract -> Discussion -> Topics -> SeeAlso -> End
//! ```
//!
//! A state can be skipped but never re-entered, which is what makes
//! [`DocumentationMarkup::parse_up_to`] safe: stopping early yields exactly the sections a full
//! parse would have produced up to that point.

use serde::{Deserialize, Serialize};

use crate::markup::{
    ast::{blocks_plain_text, inlines_plain_text, Block, BlockKind},
    tags::{extract_tags, TaggedContent},
    task_group::{task_groups, TaskGroup, TaskGroupLink},
};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum ParserSection {
    Title,
    Abstract,
    Discussion,
    Topics,
    SeeAlso,
    End,
}

/// Directives that may sit between the title and the abstract without ending it.
const ABSTRACT_TRANSPARENT_DIRECTIVES: [&str; 3] = ["Comment", "Metadata", "Options"];
const DEPRECATION_SUMMARY_DIRECTIVE: &str = "DeprecationSummary";
const TOPICS_HEADING: &str = "Topics";
const SEE_ALSO_HEADING: &str = "See Also";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbstractSection {
    pub paragraph: Block,
}

impl AbstractSection {
    pub fn text(&self) -> String {
        self.paragraph.plain_text()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscussionSection {
    pub content: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicsSection {
    /// Everything from the first level-3 heading on.
    pub content: Vec<Block>,
}

impl TopicsSection {
    pub fn task_groups(&self) -> Vec<TaskGroup> {
        task_groups(&self.content)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeeAlsoSection {
    pub content: Vec<Block>,
}

impl SeeAlsoSection {
    pub fn task_group(&self) -> TaskGroup {
        TaskGroup::new(Some(SEE_ALSO_HEADING), self.content.clone())
    }

    pub fn links(&self) -> Vec<TaskGroupLink> {
        self.task_group().links()
    }
}

/// Where a deprecation notice came from. Authored notices win over derived ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeprecationOrigin {
    Authored,
    Availability,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeprecatedSection {
    pub content: Vec<Block>,
    pub origin: DeprecationOrigin,
}

impl DeprecatedSection {
    pub fn text(&self) -> String {
        blocks_plain_text(&self.content)
    }
}

/// The sections of one markup source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentationMarkup {
    pub title: Option<Block>,
    pub abstract_section: Option<AbstractSection>,
    pub discussion: Option<DiscussionSection>,
    pub topics: Option<TopicsSection>,
    pub see_also: Option<SeeAlsoSection>,
    pub deprecation: Option<DeprecatedSection>,
    /// Parameters, returns and throws pulled out of the discussion.
    pub tags: TaggedContent,
}

impl DocumentationMarkup {
    pub fn parse(blocks: &[Block]) -> DocumentationMarkup {
        DocumentationMarkup::parse_up_to(blocks, ParserSection::End)
    }

    /// Parse sections up to and including `up_to`. Later sections are not materialized.
    pub fn parse_up_to(blocks: &[Block], up_to: ParserSection) -> DocumentationMarkup {
        let mut markup = DocumentationMarkup::default();
        let mut section = ParserSection::Title;
        let mut discussion: Vec<Block> = vec![];
        let mut topics: Vec<Block> = vec![];
        let mut has_task_group = false;
        let mut see_also: Vec<Block> = vec![];

        'blocks: for block in blocks {
            // A block may be looked at by several states until one of them consumes it.
            loop {
                if section > up_to {
                    break 'blocks;
                }
                match section {
                    ParserSection::Title => {
                        section = ParserSection::Abstract;
                        if block.is_heading(1) {
                            markup.title = Some(block.clone());
                            continue 'blocks;
                        }
                    }
                    ParserSection::Abstract => {
                        match &block.kind {
                            BlockKind::Paragraph(_) if markup.abstract_section.is_none() => {
                                markup.abstract_section = Some(AbstractSection {
                                    paragraph: block.clone(),
                                });
                                continue 'blocks;
                            }
                            BlockKind::Directive(directive)
                                if directive.name == DEPRECATION_SUMMARY_DIRECTIVE =>
                            {
                                markup.deprecation = Some(DeprecatedSection {
                                    content: directive.children.clone(),
                                    origin: DeprecationOrigin::Authored,
                                });
                                continue 'blocks;
                            }
                            BlockKind::Directive(directive)
                                if ABSTRACT_TRANSPARENT_DIRECTIVES
                                    .contains(&directive.name.as_str()) =>
                            {
                                continue 'blocks;
                            }
                            BlockKind::Html(_) => continue 'blocks,
                            _ => section = ParserSection::Discussion,
                        }
                    }
                    ParserSection::Discussion => {
                        match level_two_title(block).as_deref() {
                            Some(TOPICS_HEADING) => section = ParserSection::Topics,
                            Some(SEE_ALSO_HEADING) => section = ParserSection::SeeAlso,
                            _ => discussion.push(block.clone()),
                        }
                        continue 'blocks;
                    }
                    ParserSection::Topics => {
                        if level_two_title(block).as_deref() == Some(SEE_ALSO_HEADING) {
                            section = ParserSection::SeeAlso;
                            continue 'blocks;
                        }
                        has_task_group |= block.is_heading(3);
                        if has_task_group {
                            topics.push(block.clone());
                        }
                        continue 'blocks;
                    }
                    ParserSection::SeeAlso => {
                        if block.heading().is_some() {
                            section = ParserSection::End;
                        } else {
                            see_also.push(block.clone());
                        }
                        continue 'blocks;
                    }
                    ParserSection::End => break 'blocks,
                }
            }
        }

        if up_to >= ParserSection::Discussion {
            let (content, tags) = extract_tags(discussion);
            markup.tags = tags;
            if !content.is_empty() {
                markup.discussion = Some(DiscussionSection { content });
            }
        }
        if up_to >= ParserSection::Topics && has_task_group {
            markup.topics = Some(TopicsSection { content: topics });
        }
        if up_to >= ParserSection::SeeAlso && !see_also.is_empty() {
            markup.see_also = Some(SeeAlsoSection { content: see_also });
        }
        markup
    }

    /// A copy without the sections that come after `up_to`.
    pub fn truncated(&self, up_to: ParserSection) -> DocumentationMarkup {
        let mut markup = self.clone();
        if up_to < ParserSection::Abstract {
            markup.abstract_section = None;
            markup.deprecation = None;
        }
        if up_to < ParserSection::Discussion {
            markup.discussion = None;
            markup.tags = TaggedContent::default();
        }
        if up_to < ParserSection::Topics {
            markup.topics = None;
        }
        if up_to < ParserSection::SeeAlso {
            markup.see_also = None;
        }
        markup
    }

    pub fn title_text(&self) -> Option<String> {
        self.title.as_ref().and_then(|title| match &title.kind {
            BlockKind::Heading { content, .. } => Some(inlines_plain_text(content)),
            _ => None,
        })
    }

    pub fn abstract_text(&self) -> Option<String> {
        self.abstract_section.as_ref().map(AbstractSection::text)
    }

    /// Every block that can carry links, in document order.
    pub fn content_blocks(&self) -> Vec<&Block> {
        let mut blocks: Vec<&Block> = vec![];
        blocks.extend(self.abstract_section.iter().map(|a| &a.paragraph));
        blocks.extend(self.deprecation.iter().flat_map(|d| d.content.iter()));
        blocks.extend(self.discussion.iter().flat_map(|d| d.content.iter()));
        blocks.extend(self.tags.parameters.iter().flat_map(|p| p.contents.iter()));
        blocks.extend(self.tags.returns.iter().flat_map(|r| r.contents.iter()));
        blocks.extend(self.tags.throws.iter().flat_map(|t| t.contents.iter()));
        blocks.extend(self.topics.iter().flat_map(|t| t.content.iter()));
        blocks.extend(self.see_also.iter().flat_map(|s| s.content.iter()));
        blocks
    }

    /// Mutable counterpart of [`DocumentationMarkup::content_blocks`], same order.
    pub fn for_each_content_block_mut<F: FnMut(&mut Block)>(&mut self, mut f: F) {
        if let Some(abstract_section) = self.abstract_section.as_mut() {
            f(&mut abstract_section.paragraph);
        }
        let DocumentationMarkup {
            deprecation,
            discussion,
            tags,
            topics,
            see_also,
            ..
        } = self;
        let groups = deprecation
            .iter_mut()
            .map(|d| &mut d.content)
            .chain(discussion.iter_mut().map(|d| &mut d.content))
            .chain(tags.parameters.iter_mut().map(|p| &mut p.contents))
            .chain(tags.returns.iter_mut().map(|r| &mut r.contents))
            .chain(tags.throws.iter_mut().map(|t| &mut t.contents))
            .chain(topics.iter_mut().map(|t| &mut t.content))
            .chain(see_also.iter_mut().map(|s| &mut s.content));
        for blocks in groups {
            for block in blocks.iter_mut() {
                f(block);
            }
        }
    }
}

fn level_two_title(block: &Block) -> Option<String> {
    block
        .heading()
        .filter(|(level, _)| *level == 2)
        .map(|(_, title)| title)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::{ast::Inline, parse::Document};

    const FULL: &str = "\
# Foo
Abstract.
## Discussion
More text.
## Topics
### Group
- ``Bar``
## See Also
- <doc:Baz>";

    fn markup(text: &str) -> DocumentationMarkup {
        DocumentationMarkup::parse(&Document::parse(text, None).blocks)
    }

    #[test]
    fn test_end_to_end_sections() {
        let markup = markup(FULL);
        assert_eq!(markup.title_text().as_deref(), Some("Foo"));
        assert_eq!(markup.abstract_text().as_deref(), Some("Abstract."));

        let discussion = markup.discussion.as_ref().unwrap();
        assert!(blocks_plain_text(&discussion.content).contains("More text."));

        let groups = markup.topics.as_ref().unwrap().task_groups();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].title().as_deref(), Some("Group"));
        let links = groups[0].links();
        assert_eq!(links.len(), 1);
        assert!(links[0].is_symbol_link);
        assert_eq!(links[0].destination, "Bar");

        let see_also = markup.see_also.as_ref().unwrap().links();
        assert_eq!(see_also.len(), 1);
        assert_eq!(see_also[0].destination, "doc:Baz");
    }

    #[test]
    fn test_partial_parse_matches_truncated_full_parse() {
        let documents = [
            FULL,
            "No title here.\n\nSecond paragraph.\n\n- Returns: Nothing.\n",
            "# T\n\n@DeprecationSummary {\n  Gone.\n}\n\nAbstract.\n\n## Topics\n\nstray\n\n### A\n\n- ``X``\n",
            "# T\n\n## See Also\n\n- ``Y``\n\n## Trailing\n\nIgnored.\n",
            "",
        ];
        let sections = [
            ParserSection::Title,
            ParserSection::Abstract,
            ParserSection::Discussion,
            ParserSection::Topics,
            ParserSection::SeeAlso,
            ParserSection::End,
        ];
        for text in documents {
            let blocks = Document::parse(text, None).blocks;
            let full = DocumentationMarkup::parse(&blocks);
            for section in sections {
                assert_eq!(
                    DocumentationMarkup::parse_up_to(&blocks, section),
                    full.truncated(section),
                    "partial parse up to {section:?} of {text:?}"
                );
            }
        }
    }

    #[test]
    fn test_abstract_skips_metadata_and_captures_deprecation() {
        let markup = markup(
            "\
# Title

@Metadata {
  @DocumentationExtension(mergeBehavior: override)
}

<!-- a comment -->

@DeprecationSummary {
  Use ``Other`` instead.
}

The abstract.

The discussion.
",
        );
        assert_eq!(markup.abstract_text().as_deref(), Some("The abstract."));
        let deprecation = markup.deprecation.unwrap();
        assert_eq!(deprecation.origin, DeprecationOrigin::Authored);
        assert_eq!(deprecation.text(), "Use Other instead.");
        assert_eq!(
            blocks_plain_text(&markup.discussion.unwrap().content),
            "The discussion."
        );
    }

    #[test]
    fn test_topics_need_a_task_group_heading() {
        let markup = markup("Abstract.\n\n## Topics\n\nJust prose.\n");
        assert!(markup.topics.is_none());
        assert!(markup.discussion.is_none());
    }

    #[test]
    fn test_discussion_tags_are_extracted() {
        let markup = markup("Abstract.\n\nDetails.\n\n- Parameter x: The x.\n- Returns: A value.\n");
        assert_eq!(markup.tags.parameters[0].name, "x");
        assert_eq!(markup.tags.returns.len(), 1);
        let discussion = markup.discussion.unwrap();
        assert_eq!(discussion.content.len(), 1);
    }

    #[test]
    fn test_content_blocks_visit_in_order() {
        let mut markup = markup(FULL);
        let before = markup.content_blocks().len();
        let mut visited = 0;
        markup.for_each_content_block_mut(|block| {
            visited += 1;
            block.visit_inlines_mut(&mut |inline| {
                if let Inline::SymbolLink { destination, .. } = inline {
                    destination.push_str("-resolved");
                }
            });
        });
        assert_eq!(visited, before);
        let groups = markup.topics.unwrap().task_groups();
        assert_eq!(groups[0].links()[0].destination, "Bar-resolved");
    }
}
