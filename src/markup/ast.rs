//! The closed block/inline tree every documentation source is parsed into.
//!
//! Ranges are optional because synthesized content (generated parameter descriptions, automatic
//! task groups) has no place in any source file.

use serde::{Deserialize, Serialize};

use crate::diagnostic::SourceRange;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub kind: BlockKind,
    pub range: Option<SourceRange>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockKind {
    Heading { level: u8, content: Vec<Inline> },
    Paragraph(Vec<Inline>),
    List {
        ordered: bool,
        items: Vec<ListItem>,
    },
    CodeBlock {
        language: Option<String>,
        code: String,
    },
    BlockQuote(Vec<Block>),
    Html(String),
    ThematicBreak,
    Directive(Directive),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListItem {
    pub blocks: Vec<Block>,
    pub range: Option<SourceRange>,
}

/// A block directive: `@Name(label: value, ...)` with an optional `{ ... }` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directive {
    pub name: String,
    pub arguments: Vec<DirectiveArgument>,
    pub children: Vec<Block>,
}

/// One directive argument. Unlabeled arguments have an empty `label`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectiveArgument {
    pub label: String,
    pub value: String,
}

impl Directive {
    pub fn argument(&self, label: &str) -> Option<&str> {
        self.arguments
            .iter()
            .find(|arg| arg.label == label)
            .map(|arg| arg.value.as_str())
    }

    /// Directive children, searched recursively, with the given name.
    pub fn child_directives<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Directive> {
        self.children.iter().filter_map(move |block| match &block.kind {
            BlockKind::Directive(directive) if directive.name == name => Some(directive),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Inline {
    Text(String),
    Code(String),
    /// A double-backtick symbol link, ``` ``Kit/Foo`` ```.
    SymbolLink {
        destination: String,
        range: Option<SourceRange>,
    },
    Link {
        destination: String,
        title: Option<String>,
        content: Vec<Inline>,
        range: Option<SourceRange>,
    },
    Emphasis(Vec<Inline>),
    Strong(Vec<Inline>),
    Strikethrough(Vec<Inline>),
    Image {
        source: String,
        title: Option<String>,
        alt: Vec<Inline>,
    },
    InlineHtml(String),
    SoftBreak,
    LineBreak,
    /// Placeholder for a link that failed to resolve. Renderers show the authored text without a
    /// destination.
    Unresolved {
        authored: String,
        title: Option<String>,
        range: Option<SourceRange>,
    },
}

impl Inline {
    pub fn text(text: impl Into<String>) -> Inline {
        Inline::Text(text.into())
    }

    pub fn range(&self) -> Option<SourceRange> {
        match self {
            Inline::SymbolLink { range, .. }
            | Inline::Link { range, .. }
            | Inline::Unresolved { range, .. } => *range,
            _ => None,
        }
    }

    /// True for links that point at a documentation topic, as opposed to web links.
    pub fn is_topic_link(&self) -> bool {
        match self {
            Inline::SymbolLink { .. } => true,
            Inline::Link { destination, .. } => destination.starts_with("doc:"),
            _ => false,
        }
    }

    pub fn plain_text(&self, out: &mut String) {
        match self {
            Inline::Text(text) | Inline::Code(text) | Inline::InlineHtml(text) => out.push_str(text),
            Inline::SymbolLink { destination, .. } => out.push_str(destination),
            Inline::Link { content, .. }
            | Inline::Emphasis(content)
            | Inline::Strong(content)
            | Inline::Strikethrough(content) => {
                for inline in content {
                    inline.plain_text(out);
                }
            }
            Inline::Image { alt, .. } => {
                for inline in alt {
                    inline.plain_text(out);
                }
            }
            Inline::SoftBreak | Inline::LineBreak => out.push(' '),
            Inline::Unresolved { authored, title, .. } => {
                out.push_str(title.as_deref().unwrap_or(authored))
            }
        }
    }

    fn children_mut(&mut self) -> Option<&mut Vec<Inline>> {
        match self {
            Inline::Link { content, .. }
            | Inline::Emphasis(content)
            | Inline::Strong(content)
            | Inline::Strikethrough(content) => Some(content),
            Inline::Image { alt, .. } => Some(alt),
            _ => None,
        }
    }

    fn children(&self) -> Option<&Vec<Inline>> {
        match self {
            Inline::Link { content, .. }
            | Inline::Emphasis(content)
            | Inline::Strong(content)
            | Inline::Strikethrough(content) => Some(content),
            Inline::Image { alt, .. } => Some(alt),
            _ => None,
        }
    }

    fn remap_ranges<F: Fn(SourceRange) -> SourceRange>(&mut self, f: &F) {
        match self {
            Inline::SymbolLink { range, .. }
            | Inline::Link { range, .. }
            | Inline::Unresolved { range, .. } => *range = range.map(f),
            _ => {}
        }
        if let Some(children) = self.children_mut() {
            for child in children {
                child.remap_ranges(f);
            }
        }
    }
}

/// Concatenated text of a run of inlines.
pub fn inlines_plain_text(inlines: &[Inline]) -> String {
    let mut out = String::new();
    for inline in inlines {
        inline.plain_text(&mut out);
    }
    out
}

impl Block {
    pub fn new(kind: BlockKind, range: Option<SourceRange>) -> Block {
        Block { kind, range }
    }

    pub fn paragraph(text: impl Into<String>) -> Block {
        Block::new(BlockKind::Paragraph(vec![Inline::Text(text.into())]), None)
    }

    /// `(level, title)` if this block is a heading.
    pub fn heading(&self) -> Option<(u8, String)> {
        match &self.kind {
            BlockKind::Heading { level, content } => Some((*level, inlines_plain_text(content))),
            _ => None,
        }
    }

    pub fn is_heading(&self, level: u8) -> bool {
        matches!(&self.kind, BlockKind::Heading { level: l, .. } if *l == level)
    }

    pub fn directive(&self) -> Option<&Directive> {
        match &self.kind {
            BlockKind::Directive(directive) => Some(directive),
            _ => None,
        }
    }

    pub fn plain_text(&self) -> String {
        match &self.kind {
            BlockKind::Heading { content, .. } | BlockKind::Paragraph(content) => {
                inlines_plain_text(content)
            }
            BlockKind::List { items, .. } => items
                .iter()
                .map(|item| blocks_plain_text(&item.blocks))
                .collect::<Vec<String>>()
                .join("\n"),
            BlockKind::CodeBlock { code, .. } => code.clone(),
            BlockKind::BlockQuote(blocks) => blocks_plain_text(blocks),
            BlockKind::Directive(directive) => blocks_plain_text(&directive.children),
            BlockKind::Html(_) | BlockKind::ThematicBreak => String::new(),
        }
    }

    /// Visit every inline of this block, depth first, in document order.
    pub fn visit_inlines<'a, F: FnMut(&'a Inline)>(&'a self, f: &mut F) {
        fn walk<'a, F: FnMut(&'a Inline)>(inlines: &'a [Inline], f: &mut F) {
            for inline in inlines {
                f(inline);
                if let Some(children) = inline.children() {
                    walk(children, f);
                }
            }
        }
        match &self.kind {
            BlockKind::Heading { content, .. } | BlockKind::Paragraph(content) => walk(content, f),
            BlockKind::List { items, .. } => {
                for item in items {
                    for block in &item.blocks {
                        block.visit_inlines(f);
                    }
                }
            }
            BlockKind::BlockQuote(blocks) => {
                for block in blocks {
                    block.visit_inlines(f);
                }
            }
            BlockKind::Directive(directive) => {
                for block in &directive.children {
                    block.visit_inlines(f);
                }
            }
            BlockKind::CodeBlock { .. } | BlockKind::Html(_) | BlockKind::ThematicBreak => {}
        }
    }

    /// Mutable counterpart of [`Block::visit_inlines`]. Children of an inline are visited after
    /// `f` has seen (and possibly replaced) the inline itself.
    pub fn visit_inlines_mut<F: FnMut(&mut Inline)>(&mut self, f: &mut F) {
        fn walk<F: FnMut(&mut Inline)>(inlines: &mut [Inline], f: &mut F) {
            for inline in inlines.iter_mut() {
                f(inline);
                if let Some(children) = inline.children_mut() {
                    walk(children, f);
                }
            }
        }
        match &mut self.kind {
            BlockKind::Heading { content, .. } | BlockKind::Paragraph(content) => walk(content, f),
            BlockKind::List { items, .. } => {
                for item in items {
                    for block in item.blocks.iter_mut() {
                        block.visit_inlines_mut(f);
                    }
                }
            }
            BlockKind::BlockQuote(blocks) => {
                for block in blocks.iter_mut() {
                    block.visit_inlines_mut(f);
                }
            }
            BlockKind::Directive(directive) => {
                for block in directive.children.iter_mut() {
                    block.visit_inlines_mut(f);
                }
            }
            BlockKind::CodeBlock { .. } | BlockKind::Html(_) | BlockKind::ThematicBreak => {}
        }
    }

    /// Every topic link (symbol links and `doc:` links) in document order.
    pub fn topic_links(&self) -> Vec<&Inline> {
        let mut links = Vec::new();
        self.visit_inlines(&mut |inline| {
            if inline.is_topic_link() {
                links.push(inline);
            }
        });
        links
    }

    /// Rewrite every source range in this block, e.g. to move from comment-relative to
    /// file-absolute coordinates.
    pub fn remap_ranges<F: Fn(SourceRange) -> SourceRange>(&mut self, f: &F) {
        self.range = self.range.map(f);
        match &mut self.kind {
            BlockKind::Heading { content, .. } | BlockKind::Paragraph(content) => {
                for inline in content {
                    inline.remap_ranges(f);
                }
            }
            BlockKind::List { items, .. } => {
                for item in items {
                    item.range = item.range.map(f);
                    for block in item.blocks.iter_mut() {
                        block.remap_ranges(f);
                    }
                }
            }
            BlockKind::BlockQuote(blocks) => {
                for block in blocks.iter_mut() {
                    block.remap_ranges(f);
                }
            }
            BlockKind::Directive(directive) => {
                for block in directive.children.iter_mut() {
                    block.remap_ranges(f);
                }
            }
            BlockKind::CodeBlock { .. } | BlockKind::Html(_) | BlockKind::ThematicBreak => {}
        }
    }
}

pub fn blocks_plain_text(blocks: &[Block]) -> String {
    blocks
        .iter()
        .map(Block::plain_text)
        .filter(|text| !text.is_empty())
        .collect::<Vec<String>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::SourceLocation;

    fn range(line: usize) -> Option<SourceRange> {
        Some(SourceRange::new(
            SourceLocation::new(line, 1),
            SourceLocation::new(line, 10),
        ))
    }

    fn sample() -> Block {
        Block::new(
            BlockKind::Paragraph(vec![
                Inline::text("See "),
                Inline::SymbolLink {
                    destination: "Kit/Foo".to_string(),
                    range: range(1),
                },
                Inline::Emphasis(vec![Inline::Link {
                    destination: "doc:Getting-Started".to_string(),
                    title: None,
                    content: vec![Inline::text("the guide")],
                    range: range(1),
                }]),
                Inline::Link {
                    destination: "https://example.com".to_string(),
                    title: None,
                    content: vec![Inline::text("web")],
                    range: range(1),
                },
            ]),
            range(1),
        )
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(sample().plain_text(), "See Kit/Foothe guideweb");
    }

    #[test]
    fn test_topic_links_skip_web_links() {
        let block = sample();
        let links = block.topic_links();
        assert_eq!(links.len(), 2);
        assert!(matches!(links[1], Inline::Link { destination, .. } if destination == "doc:Getting-Started"));
    }

    #[test]
    fn test_remap_ranges_reaches_nested_inlines() {
        let mut block = sample();
        block.remap_ranges(&|r: SourceRange| r.offset_lines(4));
        assert_eq!(block.range.map(|r| r.start.line), Some(5));
        let lines: Vec<usize> = block
            .topic_links()
            .iter()
            .filter_map(|link| link.range().map(|r| r.start.line))
            .collect();
        assert_eq!(lines, vec![5, 5]);
    }
}
