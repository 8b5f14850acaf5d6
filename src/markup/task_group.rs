//! Task groups: the `### Heading` + link list units of a Topics or See Also section.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{
    diagnostic::{Diagnostic, Problem, Replacement, Solution, SourceRange},
    markup::ast::{Block, BlockKind, Inline, ListItem},
};

/// A curated group of links.
///
/// `links`, `abstract_paragraph` and `discussion` are computed from `content` on every call:
/// content keeps changing while the graph is built (links get rewritten to their resolved form),
/// so nothing is cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskGroup {
    pub heading: Option<Block>,
    pub content: Vec<Block>,
}

/// A link found in a task group list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskGroupLink {
    pub destination: String,
    pub range: Option<SourceRange>,
    pub is_symbol_link: bool,
}

/// Split content at level-3 headings. Content before the first heading is not part of any group.
pub fn task_groups(content: &[Block]) -> Vec<TaskGroup> {
    let mut groups: Vec<TaskGroup> = Vec::new();
    for block in content {
        if block.is_heading(3) {
            groups.push(TaskGroup {
                heading: Some(block.clone()),
                content: vec![],
            });
        } else if let Some(group) = groups.last_mut() {
            group.content.push(block.clone());
        }
    }
    groups
}

fn first_link(inlines: &[Inline]) -> Option<&Inline> {
    inlines.iter().find(|inline| {
        matches!(
            inline,
            Inline::Link { .. } | Inline::SymbolLink { .. } | Inline::Unresolved { .. }
        )
    })
}

fn is_whitespace_inline(inline: &Inline) -> bool {
    match inline {
        Inline::Text(text) => text.trim().is_empty(),
        Inline::SoftBreak | Inline::LineBreak => true,
        _ => false,
    }
}

impl TaskGroup {
    pub fn new(title: Option<&str>, content: Vec<Block>) -> TaskGroup {
        TaskGroup {
            heading: title.map(|title| {
                Block::new(
                    BlockKind::Heading {
                        level: 3,
                        content: vec![Inline::text(title)],
                    },
                    None,
                )
            }),
            content,
        }
    }

    pub fn title(&self) -> Option<String> {
        self.heading
            .as_ref()
            .and_then(|heading| heading.heading())
            .map(|(_, title)| title)
    }

    fn list_items(&self) -> impl Iterator<Item = &ListItem> {
        self.content.iter().flat_map(|block| match &block.kind {
            BlockKind::List { items, .. } => items.as_slice(),
            _ => &[] as &[ListItem],
        })
    }

    /// The first link of every list item, in order. Items that failed to resolve are skipped.
    pub fn links(&self) -> Vec<TaskGroupLink> {
        self.list_items()
            .filter_map(|item| match &item.blocks.first()?.kind {
                BlockKind::Paragraph(inlines) => match first_link(inlines)? {
                    Inline::Link {
                        destination, range, ..
                    } => Some(TaskGroupLink {
                        destination: destination.clone(),
                        range: *range,
                        is_symbol_link: false,
                    }),
                    Inline::SymbolLink { destination, range } => Some(TaskGroupLink {
                        destination: destination.clone(),
                        range: *range,
                        is_symbol_link: true,
                    }),
                    _ => None,
                },
                _ => None,
            })
            .collect()
    }

    /// The first paragraph before any list.
    pub fn abstract_paragraph(&self) -> Option<&Block> {
        self.content
            .iter()
            .take_while(|block| !matches!(block.kind, BlockKind::List { .. }))
            .find(|block| matches!(block.kind, BlockKind::Paragraph(_)))
    }

    /// Prose blocks other than the abstract.
    pub fn discussion(&self) -> Vec<&Block> {
        let abstract_paragraph = self.abstract_paragraph();
        self.content
            .iter()
            .filter(|block| !matches!(block.kind, BlockKind::List { .. }))
            .filter(|block| !abstract_paragraph.is_some_and(|a| std::ptr::eq(a, *block)))
            .collect()
    }

    /// Warn about list items that aren't a lone link.
    pub fn validate(&self, source: Option<&Path>) -> Vec<Problem> {
        let mut problems = vec![];
        for item in self.list_items() {
            let inlines = match item.blocks.first().map(|block| &block.kind) {
                Some(BlockKind::Paragraph(inlines)) => inlines.as_slice(),
                _ => &[] as &[Inline],
            };
            let leading = inlines
                .iter()
                .position(|inline| !is_whitespace_inline(inline));
            let link = leading
                .map(|idx| &inlines[idx])
                .filter(|inline| first_link(std::slice::from_ref(*inline)).is_some());

            let Some(link) = link else {
                let solutions = item
                    .range
                    .map(|range| {
                        vec![Solution::new(
                            "Remove non-link item",
                            vec![Replacement::removal(range)],
                        )]
                    })
                    .unwrap_or_default();
                problems.push(Problem::new(
                    Diagnostic::warning(
                        "UnexpectedTaskGroupItem",
                        "Only links are allowed in task group list items",
                    )
                    .with_source(source.map(Path::to_path_buf))
                    .with_range(item.range),
                    solutions,
                ));
                continue;
            };

            let idx = leading.unwrap_or(0);
            let extraneous = inlines[idx + 1..]
                .iter()
                .any(|inline| !is_whitespace_inline(inline))
                || item.blocks.len() > 1;
            if !extraneous {
                continue;
            }
            let solutions = match (link.range(), item.range) {
                (Some(link_range), Some(item_range)) => vec![Solution::new(
                    "Remove extraneous content",
                    vec![Replacement::removal(SourceRange::new(
                        link_range.end,
                        item_range.end,
                    ))],
                )],
                _ => vec![],
            };
            problems.push(Problem::new(
                Diagnostic::warning(
                    "ExtraneousTaskGroupItemContent",
                    "Extraneous content found after link",
                )
                .with_explanation("Task group list items can only contain a single link.")
                .with_source(source.map(Path::to_path_buf))
                .with_range(item.range),
                solutions,
            ));
        }
        problems
    }
}
