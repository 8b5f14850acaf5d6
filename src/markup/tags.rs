//! Extraction of tag-style list items (`- Parameter x:`, `- Parameters:`, `- Returns:`,
//! `- Throws:`) out of discussion content.

use serde::{Deserialize, Serialize};

use crate::{
    diagnostic::{SourceLocation, SourceRange},
    markup::ast::{Block, BlockKind, Inline, ListItem},
};

/// A documented parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub contents: Vec<Block>,
    /// Range of the whole list item.
    pub range: Option<SourceRange>,
    /// Range of just the parameter name.
    pub name_range: Option<SourceRange>,
    /// `- Parameter x:` rather than an entry of a `- Parameters:` outline.
    pub is_standalone: bool,
}

impl Parameter {
    pub fn new(name: impl Into<String>, contents: Vec<Block>) -> Parameter {
        Parameter {
            name: name.into(),
            contents,
            range: None,
            name_range: None,
            is_standalone: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Return {
    pub contents: Vec<Block>,
    pub range: Option<SourceRange>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Throw {
    pub contents: Vec<Block>,
    pub range: Option<SourceRange>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedContent {
    pub parameters: Vec<Parameter>,
    pub returns: Vec<Return>,
    pub throws: Vec<Throw>,
}

impl TaggedContent {
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty() && self.returns.is_empty() && self.throws.is_empty()
    }
}

enum Tag {
    Parameter(Parameter),
    Parameters(Vec<Parameter>),
    Returns(Return),
    Throws(Throw),
}

/// Remove tag items from the top level lists of `blocks`. Lists left empty are dropped.
pub fn extract_tags(blocks: Vec<Block>) -> (Vec<Block>, TaggedContent) {
    let mut tags = TaggedContent::default();
    let mut remaining = Vec::with_capacity(blocks.len());
    for mut block in blocks {
        let BlockKind::List { items, .. } = &mut block.kind else {
            remaining.push(block);
            continue;
        };
        let had_items = !items.is_empty();
        let mut kept = Vec::with_capacity(items.len());
        for item in items.drain(..) {
            match item_tag(&item) {
                Some(Tag::Parameter(param)) => tags.parameters.push(param),
                Some(Tag::Parameters(params)) => tags.parameters.extend(params),
                Some(Tag::Returns(ret)) => tags.returns.push(ret),
                Some(Tag::Throws(throw)) => tags.throws.push(throw),
                None => kept.push(item),
            }
        }
        if kept.is_empty() && had_items {
            continue;
        }
        *items = kept;
        remaining.push(block);
    }
    (remaining, tags)
}

/// The leading text of an item's first paragraph, split at the first colon.
struct TagLine<'a> {
    label: &'a str,
    paragraph: &'a Block,
    after_colon: &'a str,
    rest: &'a [Inline],
}

fn tag_line(blocks: &[Block]) -> Option<TagLine<'_>> {
    let paragraph = blocks.first()?;
    let BlockKind::Paragraph(inlines) = &paragraph.kind else {
        return None;
    };
    let Some(Inline::Text(text)) = inlines.first() else {
        return None;
    };
    let (label, after_colon) = text.split_once(':')?;
    Some(TagLine {
        label,
        paragraph,
        after_colon,
        rest: &inlines[1..],
    })
}

fn item_tag(item: &ListItem) -> Option<Tag> {
    let line = tag_line(&item.blocks)?;
    let label = line.label.trim();
    let lowered = label.to_lowercase();
    match lowered.as_str() {
        "returns" | "return" => Some(Tag::Returns(Return {
            contents: tag_contents(&line, &item.blocks[1..]),
            range: item.range,
        })),
        "throws" | "throw" => Some(Tag::Throws(Throw {
            contents: tag_contents(&line, &item.blocks[1..]),
            range: item.range,
        })),
        "parameters" => {
            let mut params = vec![];
            for block in &item.blocks[1..] {
                if let BlockKind::List { items, .. } = &block.kind {
                    params.extend(items.iter().filter_map(outline_parameter));
                }
            }
            Some(Tag::Parameters(params))
        }
        _ => {
            let prefix_len = "parameter".len();
            let is_parameter = label
                .get(..prefix_len)
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case("parameter"))
                && label[prefix_len..].starts_with(char::is_whitespace);
            if !is_parameter {
                return None;
            }
            let name = label[prefix_len..].trim();
            if name.is_empty() || name.contains(char::is_whitespace) {
                return None;
            }
            let name_start = line.label.find(name).unwrap_or(0);
            Some(Tag::Parameter(Parameter {
                name: name.to_string(),
                contents: tag_contents(&line, &item.blocks[1..]),
                range: item.range,
                name_range: name_range(line.paragraph, name_start, name.len()),
                is_standalone: true,
            }))
        }
    }
}

fn outline_parameter(item: &ListItem) -> Option<Parameter> {
    let line = tag_line(&item.blocks)?;
    let name = line.label.trim();
    if name.is_empty() || name.contains(char::is_whitespace) {
        return None;
    }
    let name_start = line.label.find(name).unwrap_or(0);
    Some(Parameter {
        name: name.to_string(),
        contents: tag_contents(&line, &item.blocks[1..]),
        range: item.range,
        name_range: name_range(line.paragraph, name_start, name.len()),
        is_standalone: false,
    })
}

/// The description after the colon, followed by any further blocks of the item.
fn tag_contents(line: &TagLine<'_>, trailing: &[Block]) -> Vec<Block> {
    let mut inlines = Vec::with_capacity(line.rest.len() + 1);
    let first = line.after_colon.trim_start();
    if !first.is_empty() {
        inlines.push(Inline::Text(first.to_string()));
    }
    inlines.extend(line.rest.iter().cloned());
    let mut contents = Vec::with_capacity(trailing.len() + 1);
    if !inlines.is_empty() {
        contents.push(Block::new(
            BlockKind::Paragraph(inlines),
            line.paragraph.range,
        ));
    }
    contents.extend(trailing.iter().cloned());
    contents
}

/// Tag text starts at the paragraph start, so the name sits `offset` bytes to its right.
fn name_range(paragraph: &Block, offset: usize, len: usize) -> Option<SourceRange> {
    paragraph.range.map(|range| {
        let start = SourceLocation::new(range.start.line, range.start.column + offset);
        SourceRange::new(start, SourceLocation::new(start.line, start.column + len))
    })
}
