use serde::Serialize;

use crate::{
    markup::ast::Block,
    reference::{ReferenceInterner, ResolvedTopicReference},
};

/// A linkable in-page section, made from a level 2 or 3 heading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnchorSection {
    /// The page reference with the heading's url-readable title as fragment.
    pub reference: ResolvedTopicReference,
    pub title: String,
}

/// Anchor sections for the headings in `blocks`, in document order. Duplicate titles produce a
/// single anchor.
pub fn anchor_sections<'a, I>(
    page: &ResolvedTopicReference,
    blocks: I,
    interner: &ReferenceInterner,
) -> Vec<AnchorSection>
where
    I: IntoIterator<Item = &'a Block>,
{
    let mut anchors: Vec<AnchorSection> = vec![];
    for block in blocks {
        let Some((level, title)) = block.heading() else {
            continue;
        };
        if !(2..=3).contains(&level) || title.trim().is_empty() {
            continue;
        }
        let reference = page.with_fragment(Some(&title), interner);
        if anchors.iter().any(|anchor| anchor.reference == reference) {
            continue;
        }
        anchors.push(AnchorSection { reference, title });
    }
    anchors
}
