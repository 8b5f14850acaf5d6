//! Bridge from authored markup text to the [`Block`] tree.
//!
//! CommonMark parsing is delegated to `pulldown-cmark`. Block directives are not CommonMark, so a
//! line-level pass runs first: it cuts the text into markdown runs and `@Name(args) { ... }`
//! directives, parses the markdown runs with pulldown-cmark and recurses into directive bodies.
//! Every piece keeps a table from its own byte offsets back to the original text, so ranges are
//! always reported against the text handed to [`Document::parse`].

use pulldown_cmark::{CodeBlockKind, Event as MdEvent, Options, Parser as MdParser, Tag as MdTag};
use serde::{Deserialize, Serialize};
use std::{ops::Range, path::PathBuf};

use crate::{
    diagnostic::{SourceLocation, SourceRange},
    markup::ast::{Block, BlockKind, Directive, DirectiveArgument, Inline, ListItem},
};

pub fn topicgraph_md_options() -> Options {
    let mut md_options = Options::empty();
    md_options.insert(Options::ENABLE_STRIKETHROUGH);
    md_options
}

/// A parsed markup source: a documentation comment or an article.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub blocks: Vec<Block>,
    pub source: Option<PathBuf>,
}

impl Document {
    pub fn parse(text: &str, source: Option<PathBuf>) -> Document {
        let index = LineIndex::new(text);
        let snippet = Snippet::whole(text);
        Document {
            blocks: parse_snippet(&snippet, &index),
            source,
        }
    }
}

/// Byte offset to 1-based line/column conversion for the original text.
struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(text: &str) -> LineIndex {
        let mut starts = vec![0];
        starts.extend(text.match_indices('\n').map(|(idx, _)| idx + 1));
        LineIndex { starts }
    }

    fn location(&self, offset: usize) -> SourceLocation {
        let line = self.starts.partition_point(|start| *start <= offset).max(1);
        SourceLocation::new(line, offset - self.starts[line - 1] + 1)
    }
}

/// A piece of the original text, possibly dedented.
struct Snippet {
    text: String,
    /// `(offset in text, offset in the original)` for the start of every line.
    line_origins: Vec<(usize, usize)>,
}

impl Snippet {
    fn whole(text: &str) -> Snippet {
        let line_origins = LineIndex::new(text)
            .starts
            .into_iter()
            .map(|start| (start, start))
            .collect();
        Snippet {
            text: text.to_string(),
            line_origins,
        }
    }

    fn original_offset(&self, offset: usize) -> usize {
        let idx = self
            .line_origins
            .partition_point(|(start, _)| *start <= offset)
            .saturating_sub(1);
        let (start, origin) = self.line_origins[idx];
        origin + offset.saturating_sub(start)
    }

    /// Line spans as `start..end` byte ranges of this snippet, without the newline.
    fn lines(&self) -> Vec<Range<usize>> {
        let mut res = Vec::new();
        let mut start = 0;
        for (idx, _) in self.text.match_indices('\n') {
            res.push(start..idx);
            start = idx + 1;
        }
        if start < self.text.len() {
            res.push(start..self.text.len());
        }
        res
    }

    /// A new snippet made of `lines`, each with up to `dedent` leading whitespace bytes removed.
    fn sub(&self, lines: &[Range<usize>], dedent: usize) -> Snippet {
        let mut text = String::new();
        let mut line_origins = Vec::with_capacity(lines.len());
        for line in lines {
            let content = &self.text[line.clone()];
            let removable = content.len() - content.trim_start_matches([' ', '\t']).len();
            let removed = removable.min(dedent);
            line_origins.push((text.len(), self.original_offset(line.start + removed)));
            text.push_str(&content[removed..]);
            text.push('\n');
        }
        Snippet { text, line_origins }
    }

    fn slice(&self, range: Range<usize>) -> Snippet {
        Snippet {
            line_origins: vec![(0, self.original_offset(range.start))],
            text: self.text[range].to_string(),
        }
    }

    fn source_range(&self, index: &LineIndex, range: &Range<usize>) -> Option<SourceRange> {
        Some(SourceRange::new(
            index.location(self.original_offset(range.start)),
            index.location(self.original_offset(range.end)),
        ))
    }
}

fn indentation(line: &str) -> usize {
    line.chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .map(|c| if c == '\t' { 4 } else { 1 })
        .sum()
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// Returns the fence marker if `line` opens a fenced code block.
fn fence_marker(line: &str) -> Option<(char, usize)> {
    if indentation(line) >= 4 {
        return None;
    }
    let trimmed = line.trim_start();
    let marker = trimmed.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let count = trimmed.chars().take_while(|c| *c == marker).count();
    (count >= 3).then_some((marker, count))
}

fn closes_fence(line: &str, (marker, count): (char, usize)) -> bool {
    let trimmed = line.trim();
    trimmed.chars().take_while(|c| *c == marker).count() >= count
        && trimmed.chars().all(|c| c == marker)
}

#[derive(Debug, PartialEq, Eq)]
enum Opening {
    /// `@Name(args)` on its own.
    None,
    /// `@Name(args) { content }`; byte range of `content` within the line.
    SameLine(Range<usize>),
    /// `@Name(args) {` with the body on the following lines.
    Block,
}

#[derive(Debug)]
struct DirectiveHeader {
    name: String,
    arguments: Vec<DirectiveArgument>,
    opening: Opening,
}

impl DirectiveHeader {
    fn parse(line: &str) -> Option<DirectiveHeader> {
        if indentation(line) >= 4 {
            return None;
        }
        let lead = line.len() - line.trim_start().len();
        let rest = line[lead..].strip_prefix('@')?;
        let name: String = rest
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
            .collect();
        // Directive names are upper camel case, which keeps `@objc(Name)` out.
        if !name.chars().next().is_some_and(|c| c.is_ascii_uppercase()) {
            return None;
        }
        let mut cursor = &rest[name.len()..];
        let mut arguments = vec![];
        let mut has_argument_list = false;
        if let Some(open) = cursor.trim_start().strip_prefix('(') {
            let close = matching_paren(open)?;
            arguments = parse_arguments(&open[..close]);
            cursor = &open[close + 1..];
            has_argument_list = true;
        }
        let remaining = cursor.trim();
        let remaining_start = line.len() - cursor.len() + (cursor.len() - cursor.trim_start().len());
        let opening = if remaining.is_empty() {
            // A bare `@MainActor` is an attribute in prose.
            if !has_argument_list {
                return None;
            }
            Opening::None
        } else if remaining == "{" {
            Opening::Block
        } else if remaining.len() >= 2 && remaining.starts_with('{') && remaining.ends_with('}') {
            Opening::SameLine(remaining_start + 1..remaining_start + remaining.len() - 1)
        } else {
            return None;
        };
        Some(DirectiveHeader {
            name,
            arguments,
            opening,
        })
    }
}

/// Index of the `)` closing an argument list that starts right after `(`.
fn matching_paren(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_quotes = false;
    for (idx, c) in text.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            '(' if !in_quotes => depth += 1,
            ')' if !in_quotes => {
                if depth == 0 {
                    return Some(idx);
                }
                depth -= 1;
            }
            _ => {}
        }
    }
    None
}

fn parse_arguments(text: &str) -> Vec<DirectiveArgument> {
    let mut parts = vec![];
    let mut current = String::new();
    let mut depth = 0usize;
    let mut in_quotes = false;
    for c in text.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            '(' if !in_quotes => depth += 1,
            ')' if !in_quotes => depth = depth.saturating_sub(1),
            ',' if !in_quotes && depth == 0 => {
                parts.push(std::mem::take(&mut current));
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    parts.push(current);
    parts
        .into_iter()
        .filter(|part| !part.trim().is_empty())
        .map(|part| {
            let (label, value) = match split_label(&part) {
                Some((label, value)) => (label.trim().to_string(), value),
                None => (String::new(), part.as_str()),
            };
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value);
            DirectiveArgument {
                label,
                value: value.to_string(),
            }
        })
        .collect()
}

/// Split `label: value` at the first colon outside quotes, if the part before it is a plain
/// identifier.
fn split_label(part: &str) -> Option<(&str, &str)> {
    let idx = part.find(':')?;
    let label = part[..idx].trim();
    let is_identifier = !label.is_empty()
        && !label.contains('"')
        && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    is_identifier.then(|| (&part[..idx], &part[idx + 1..]))
}

fn parse_snippet(snippet: &Snippet, index: &LineIndex) -> Vec<Block> {
    let lines = snippet.lines();
    let mut blocks = Vec::new();
    let mut markdown_start = 0;
    let mut fence: Option<(char, usize)> = None;
    let mut idx = 0;
    while idx < lines.len() {
        let line = &snippet.text[lines[idx].clone()];
        if let Some(open) = fence {
            if closes_fence(line, open) {
                fence = None;
            }
            idx += 1;
            continue;
        }
        if let Some(open) = fence_marker(line) {
            fence = Some(open);
            idx += 1;
            continue;
        }
        let Some(header) = DirectiveHeader::parse(line) else {
            idx += 1;
            continue;
        };

        blocks.extend(markdown_blocks(snippet, &lines[markdown_start..idx], index));
        let (children, last_line) = match &header.opening {
            Opening::None => (vec![], idx),
            Opening::SameLine(inner) => {
                let start = lines[idx].start + inner.start;
                let end = lines[idx].start + inner.end;
                (parse_snippet(&snippet.slice(start..end), index), idx)
            }
            Opening::Block => {
                let close = closing_line(snippet, &lines, idx + 1);
                let body = &lines[idx + 1..close.min(lines.len())];
                let dedent = body
                    .iter()
                    .map(|range| &snippet.text[range.clone()])
                    .filter(|line| !is_blank(line))
                    .map(|line| line.len() - line.trim_start_matches([' ', '\t']).len())
                    .min()
                    .unwrap_or(0);
                (
                    parse_snippet(&snippet.sub(body, dedent), index),
                    close.min(lines.len() - 1),
                )
            }
        };
        let range = lines[idx].start..lines[last_line].end;
        blocks.push(Block::new(
            BlockKind::Directive(Directive {
                name: header.name,
                arguments: header.arguments,
                children,
            }),
            snippet.source_range(index, &range),
        ));
        idx = last_line + 1;
        markdown_start = idx;
    }
    blocks.extend(markdown_blocks(snippet, &lines[markdown_start..], index));
    blocks
}

/// Index of the line closing a directive body that starts at `first`, or `lines.len()` if the
/// body runs to the end of the text.
fn closing_line(snippet: &Snippet, lines: &[Range<usize>], first: usize) -> usize {
    let mut depth = 1usize;
    let mut fence: Option<(char, usize)> = None;
    for (idx, range) in lines.iter().enumerate().skip(first) {
        let line = &snippet.text[range.clone()];
        if let Some(open) = fence {
            if closes_fence(line, open) {
                fence = None;
            }
            continue;
        }
        if let Some(open) = fence_marker(line) {
            fence = Some(open);
        } else if line.trim() == "}" {
            depth -= 1;
            if depth == 0 {
                return idx;
            }
        } else if DirectiveHeader::parse(line).is_some_and(|h| h.opening == Opening::Block) {
            depth += 1;
        }
    }
    lines.len()
}

fn markdown_blocks(snippet: &Snippet, lines: &[Range<usize>], index: &LineIndex) -> Vec<Block> {
    if lines
        .iter()
        .all(|range| is_blank(&snippet.text[range.clone()]))
    {
        return vec![];
    }
    let markdown = snippet.sub(lines, 0);
    let events: Vec<(MdEvent<'_>, Range<usize>)> =
        MdParser::new_ext(&markdown.text, topicgraph_md_options())
            .into_offset_iter()
            .collect();
    let mut bridge = Bridge {
        events,
        pos: 0,
        snippet: &markdown,
        index,
    };
    bridge.blocks()
}

/// Folds the flat pulldown-cmark event stream into the block/inline tree.
struct Bridge<'s> {
    events: Vec<(MdEvent<'s>, Range<usize>)>,
    pos: usize,
    snippet: &'s Snippet,
    index: &'s LineIndex,
}

impl<'s> Bridge<'s> {
    fn next(&mut self) -> Option<(MdEvent<'s>, Range<usize>)> {
        let next = self.events.get(self.pos).cloned();
        self.pos += 1;
        next
    }

    fn range(&self, range: &Range<usize>) -> Option<SourceRange> {
        self.snippet.source_range(self.index, range)
    }

    /// Consume events up to the end tag of the current container.
    fn skip(&mut self) {
        let mut depth = 0usize;
        while let Some((event, _)) = self.next() {
            match event {
                MdEvent::Start(_) => depth += 1,
                MdEvent::End(_) if depth == 0 => return,
                MdEvent::End(_) => depth -= 1,
                _ => {}
            }
        }
    }

    /// Blocks up to (and including) the end tag of the current container. Inline content directly
    /// inside a container, as in tight list items, is wrapped in an implicit paragraph.
    fn blocks(&mut self) -> Vec<Block> {
        let mut blocks = Vec::new();
        let mut loose: Vec<Inline> = Vec::new();
        let mut loose_range: Option<Range<usize>> = None;
        let flush = |blocks: &mut Vec<Block>,
                     loose: &mut Vec<Inline>,
                     loose_range: &mut Option<Range<usize>>,
                     bridge: &Bridge<'s>| {
            if !loose.is_empty() {
                let range = loose_range.take().and_then(|r| bridge.range(&r));
                blocks.push(Block::new(
                    BlockKind::Paragraph(merge_text(std::mem::take(loose))),
                    range,
                ));
            }
        };
        while let Some((event, range)) = self.next() {
            match event {
                MdEvent::End(_) => break,
                MdEvent::Start(tag) if !is_inline_tag(&tag) => {
                    flush(&mut blocks, &mut loose, &mut loose_range, self);
                    if let Some(block) = self.block(tag, range) {
                        blocks.push(block);
                    }
                }
                MdEvent::Rule => {
                    flush(&mut blocks, &mut loose, &mut loose_range, self);
                    blocks.push(Block::new(BlockKind::ThematicBreak, self.range(&range)));
                }
                event => {
                    loose_range = Some(match loose_range {
                        Some(existing) => existing.start..range.end,
                        None => range.clone(),
                    });
                    if let Some(inline) = self.inline(event, range) {
                        loose.push(inline);
                    }
                }
            }
        }
        flush(&mut blocks, &mut loose, &mut loose_range, self);
        blocks
    }

    fn block(&mut self, tag: MdTag<'s>, range: Range<usize>) -> Option<Block> {
        let kind = match tag {
            MdTag::Paragraph => BlockKind::Paragraph(merge_text(self.inlines())),
            MdTag::Heading { level, .. } => BlockKind::Heading {
                level: level as u8,
                content: merge_text(self.inlines()),
            },
            MdTag::BlockQuote(_) => BlockKind::BlockQuote(self.blocks()),
            MdTag::CodeBlock(kind) => {
                let language = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .map(|lang| lang.to_string()),
                    CodeBlockKind::Indented => None,
                };
                BlockKind::CodeBlock {
                    language,
                    code: self.raw_text(),
                }
            }
            MdTag::HtmlBlock => BlockKind::Html(self.raw_text()),
            MdTag::List(start) => {
                let mut items = Vec::new();
                while let Some((event, item_range)) = self.next() {
                    match event {
                        MdEvent::Start(MdTag::Item) => items.push(ListItem {
                            blocks: self.blocks(),
                            range: self.range(&item_range),
                        }),
                        MdEvent::End(_) => break,
                        _ => {}
                    }
                }
                BlockKind::List {
                    ordered: start.is_some(),
                    items,
                }
            }
            _ => {
                tracing::debug!("[Bridge::block] Skipping unsupported block {tag:?}");
                self.skip();
                return None;
            }
        };
        Some(Block::new(kind, self.range(&range)))
    }

    /// Concatenate text and html events up to the end tag.
    fn raw_text(&mut self) -> String {
        let mut text = String::new();
        while let Some((event, _)) = self.next() {
            match event {
                MdEvent::End(_) => break,
                MdEvent::Text(t) | MdEvent::Html(t) => text.push_str(&t),
                _ => {}
            }
        }
        text
    }

    fn inlines(&mut self) -> Vec<Inline> {
        let mut inlines = Vec::new();
        while let Some((event, range)) = self.next() {
            if let MdEvent::End(_) = event {
                break;
            }
            if let Some(inline) = self.inline(event, range) {
                inlines.push(inline);
            }
        }
        inlines
    }

    fn inline(&mut self, event: MdEvent<'s>, range: Range<usize>) -> Option<Inline> {
        let inline = match event {
            MdEvent::Text(text) => Inline::Text(text.to_string()),
            MdEvent::Code(code) => {
                let is_symbol_link = self
                    .snippet
                    .text
                    .get(range.clone())
                    .is_some_and(|raw| raw.starts_with("``"));
                if is_symbol_link {
                    Inline::SymbolLink {
                        destination: code.trim().to_string(),
                        range: self.range(&range),
                    }
                } else {
                    Inline::Code(code.to_string())
                }
            }
            MdEvent::InlineHtml(html) | MdEvent::Html(html) => Inline::InlineHtml(html.to_string()),
            MdEvent::SoftBreak => Inline::SoftBreak,
            MdEvent::HardBreak => Inline::LineBreak,
            MdEvent::Start(MdTag::Emphasis) => Inline::Emphasis(merge_text(self.inlines())),
            MdEvent::Start(MdTag::Strong) => Inline::Strong(merge_text(self.inlines())),
            MdEvent::Start(MdTag::Strikethrough) => {
                Inline::Strikethrough(merge_text(self.inlines()))
            }
            MdEvent::Start(MdTag::Link {
                dest_url, title, ..
            }) => Inline::Link {
                destination: dest_url.to_string(),
                title: (!title.is_empty()).then(|| title.to_string()),
                content: merge_text(self.inlines()),
                range: self.range(&range),
            },
            MdEvent::Start(MdTag::Image {
                dest_url, title, ..
            }) => Inline::Image {
                source: dest_url.to_string(),
                title: (!title.is_empty()).then(|| title.to_string()),
                alt: merge_text(self.inlines()),
            },
            MdEvent::Start(_) => {
                self.skip();
                return None;
            }
            _ => return None,
        };
        Some(inline)
    }
}

fn is_inline_tag(tag: &MdTag<'_>) -> bool {
    matches!(
        tag,
        MdTag::Emphasis
            | MdTag::Strong
            | MdTag::Strikethrough
            | MdTag::Superscript
            | MdTag::Subscript
            | MdTag::Link { .. }
            | MdTag::Image { .. }
    )
}

/// pulldown-cmark splits text at every potential delimiter; join adjacent runs back up.
fn merge_text(inlines: Vec<Inline>) -> Vec<Inline> {
    let mut merged: Vec<Inline> = Vec::with_capacity(inlines.len());
    for inline in inlines {
        match (merged.last_mut(), inline) {
            (Some(Inline::Text(existing)), Inline::Text(next)) => existing.push_str(&next),
            (_, inline) => merged.push(inline),
        }
    }
    merged
}
