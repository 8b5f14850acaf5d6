//! The documentation node: everything known about one page of the graph.

pub mod anchor;
pub mod availability;
pub mod kind;

pub use anchor::{anchor_sections, AnchorSection};
pub use availability::{availability_deprecation, is_deprecated};
pub use kind::{DocumentationKind, AUTOMATIC_CURATION_ORDER};

use serde::Serialize;
use std::path::PathBuf;

use crate::{
    diagnostic::SourceRange,
    markup::{
        ast::{Block, BlockKind},
        ArticleMetadata, DeprecatedSection, DeprecationOrigin, DocumentationMarkup, MergeBehavior,
        Parameter, Return, TaskGroup,
    },
    reference::{ReferenceInterner, ResolvedTopicReference, SourceLanguage, SourceLanguageSet},
    symbol::{Article, Symbol},
};

/// How a node is named on its page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum NodeName {
    Conceptual(String),
    Symbol {
        title: String,
        /// The declaration of the primary language variant.
        declaration: Option<String>,
    },
}

impl NodeName {
    pub fn title(&self) -> &str {
        match self {
            NodeName::Conceptual(title) => title,
            NodeName::Symbol { title, .. } => title,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ChunkSource {
    /// An in-source documentation comment.
    SourceComment {
        file: Option<PathBuf>,
        location: Option<SourceRange>,
    },
    /// A standalone markup file: a documentation extension or an article.
    DocumentationExtension { file: Option<PathBuf> },
}

impl ChunkSource {
    pub fn file(&self) -> Option<&PathBuf> {
        match self {
            ChunkSource::SourceComment { file, .. } => file.as_ref(),
            ChunkSource::DocumentationExtension { file } => file.as_ref(),
        }
    }
}

/// One source of a node's content. Merged into [`DocumentationNode::markup`], but kept so that
/// diagnostics can name the file content came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentationChunk {
    pub source: ChunkSource,
    pub blocks: Vec<Block>,
}

/// Parameters and returns that apply to one language representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariantSections {
    pub language: SourceLanguage,
    pub parameters: Vec<Parameter>,
    pub returns: Vec<Return>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentationNode {
    pub reference: ResolvedTopicReference,
    pub kind: DocumentationKind,
    pub source_language: SourceLanguage,
    pub available_source_languages: SourceLanguageSet,
    pub name: NodeName,
    pub markup: DocumentationMarkup,
    pub symbol: Option<Symbol>,
    pub chunks: Vec<DocumentationChunk>,
    pub anchor_sections: Vec<AnchorSection>,
    /// Former paths that should keep pointing here.
    pub redirects: Vec<String>,
    /// Filled in by parameter validation; empty until then.
    pub variant_sections: Vec<VariantSections>,
    /// Generated groups for children no Topics section curates.
    pub automatic_task_groups: Vec<TaskGroup>,
    pub display_name: Option<String>,
}

impl DocumentationNode {
    /// A node for a symbol, merging its doc comment with an optional documentation extension.
    ///
    /// An extension replaces the comment when it asks to (`mergeBehavior: override`) or when
    /// there is no comment. Otherwise the comment comes first and everything after the
    /// extension's title is appended to it.
    pub fn from_symbol(
        reference: ResolvedTopicReference,
        symbol: Symbol,
        extension: Option<&Article>,
        target_platform: Option<&str>,
        interner: &ReferenceInterner,
    ) -> DocumentationNode {
        let kind = DocumentationKind::from_symbol_kind(&symbol.kind.identifier);
        let mut chunks = vec![];
        if let Some(comment) = symbol.doc_comment.as_ref().filter(|doc| !doc.is_empty()) {
            let location = match (comment.lines.first(), comment.lines.last()) {
                (Some(first), Some(last)) => first
                    .range
                    .zip(last.range)
                    .map(|(first, last)| SourceRange::new(first.start, last.end)),
                _ => None,
            };
            chunks.push(DocumentationChunk {
                source: ChunkSource::SourceComment {
                    file: comment.source.clone(),
                    location,
                },
                blocks: comment.parse().blocks,
            });
        }
        let metadata = extension
            .map(|article| ArticleMetadata::from_blocks(article.blocks()))
            .unwrap_or_default();
        if let Some(article) = extension {
            chunks.push(DocumentationChunk {
                source: ChunkSource::DocumentationExtension {
                    file: article.document.source.clone(),
                },
                blocks: article.blocks().to_vec(),
            });
        }
        let (blocks, extension_deprecation) = merged_blocks(&chunks, metadata.merge_behavior);
        let mut markup = DocumentationMarkup::parse(&blocks);
        if extension_deprecation.is_some() {
            markup.deprecation = extension_deprecation;
        }
        if markup.deprecation.is_none() {
            markup.deprecation = availability_deprecation(&symbol.availability, target_platform);
        }

        let languages: SourceLanguageSet = symbol.languages().into_iter().collect();
        let languages = if languages.is_empty() {
            reference.source_languages()
        } else {
            languages
        };
        let source_language = reference.source_language();
        let name = NodeName::Symbol {
            title: symbol.title.clone(),
            declaration: symbol
                .variant(source_language)
                .or(symbol.variants.first())
                .and_then(|variant| variant.declaration.clone()),
        };
        tracing::debug!(
            "[DocumentationNode::from_symbol] {} as {:?} from {} chunk(s)",
            reference,
            kind,
            chunks.len()
        );
        let mut node = DocumentationNode {
            reference,
            kind,
            source_language,
            available_source_languages: languages,
            name,
            markup,
            symbol: Some(symbol),
            chunks,
            anchor_sections: vec![],
            redirects: metadata.redirects,
            variant_sections: vec![],
            automatic_task_groups: vec![],
            display_name: metadata.display_name,
        };
        node.regenerate_anchor_sections(interner);
        node
    }

    /// A conceptual article page.
    pub fn from_article(
        reference: ResolvedTopicReference,
        article: &Article,
        interner: &ReferenceInterner,
    ) -> DocumentationNode {
        let metadata = ArticleMetadata::from_blocks(article.blocks());
        let markup = DocumentationMarkup::parse(article.blocks());
        let title = markup.title_text().unwrap_or_else(|| article.name.clone());
        let mut node = DocumentationNode {
            source_language: reference.source_language(),
            available_source_languages: reference.source_languages(),
            reference,
            kind: DocumentationKind::Article,
            name: NodeName::Conceptual(title),
            markup,
            symbol: None,
            chunks: vec![DocumentationChunk {
                source: ChunkSource::DocumentationExtension {
                    file: article.document.source.clone(),
                },
                blocks: article.blocks().to_vec(),
            }],
            anchor_sections: vec![],
            redirects: metadata.redirects,
            variant_sections: vec![],
            automatic_task_groups: vec![],
            display_name: metadata.display_name,
        };
        node.regenerate_anchor_sections(interner);
        node
    }

    /// The root page of a module, optionally extended by an article titled with the module's
    /// symbol link.
    pub fn module(
        reference: ResolvedTopicReference,
        module_name: &str,
        extension: Option<&Article>,
        interner: &ReferenceInterner,
    ) -> DocumentationNode {
        let metadata = extension
            .map(|article| ArticleMetadata::from_blocks(article.blocks()))
            .unwrap_or_default();
        let chunks: Vec<DocumentationChunk> = extension
            .map(|article| DocumentationChunk {
                source: ChunkSource::DocumentationExtension {
                    file: article.document.source.clone(),
                },
                blocks: article.blocks().to_vec(),
            })
            .into_iter()
            .collect();
        let (blocks, _) = merged_blocks(&chunks, metadata.merge_behavior);
        let mut node = DocumentationNode {
            source_language: reference.source_language(),
            available_source_languages: reference.source_languages(),
            reference,
            kind: DocumentationKind::Module,
            name: NodeName::Symbol {
                title: module_name.to_string(),
                declaration: None,
            },
            markup: DocumentationMarkup::parse(&blocks),
            symbol: None,
            chunks,
            anchor_sections: vec![],
            redirects: metadata.redirects,
            variant_sections: vec![],
            automatic_task_groups: vec![],
            display_name: metadata.display_name,
        };
        node.regenerate_anchor_sections(interner);
        node
    }

    pub fn title(&self) -> &str {
        self.display_name
            .as_deref()
            .unwrap_or_else(|| self.name.title())
    }

    pub fn abstract_text(&self) -> Option<String> {
        self.markup.abstract_text()
    }

    pub fn is_deprecated(&self) -> bool {
        self.markup.deprecation.is_some()
    }

    /// Rebuild [`DocumentationNode::anchor_sections`] from the current discussion.
    pub fn regenerate_anchor_sections(&mut self, interner: &ReferenceInterner) {
        let blocks = self
            .markup
            .discussion
            .iter()
            .flat_map(|discussion| discussion.content.iter());
        self.anchor_sections = anchor_sections(&self.reference, blocks, interner);
    }

    /// Documented parameters for `language`: the validated per-language list when there is
    /// one, the authored list otherwise.
    pub fn parameters_for(&self, language: SourceLanguage) -> &[Parameter] {
        self.variant_sections
            .iter()
            .find(|sections| sections.language == language)
            .map(|sections| sections.parameters.as_slice())
            .unwrap_or(&self.markup.tags.parameters)
    }

    pub fn returns_for(&self, language: SourceLanguage) -> &[Return] {
        self.variant_sections
            .iter()
            .find(|sections| sections.language == language)
            .map(|sections| sections.returns.as_slice())
            .unwrap_or(&self.markup.tags.returns)
    }

    /// The file a piece of content at `range` was authored in.
    ///
    /// Comment ranges are file-absolute, so a range inside the comment's span belongs to the
    /// comment; anything else belongs to the extension file.
    pub fn source_file(&self, range: Option<SourceRange>) -> Option<PathBuf> {
        let in_comment = |location: &Option<SourceRange>| match (location, range) {
            (Some(location), Some(range)) => {
                location.start <= range.start && range.start <= location.end
            }
            _ => false,
        };
        self.chunks
            .iter()
            .find(|chunk| match &chunk.source {
                ChunkSource::SourceComment { location, .. } => {
                    self.chunks.len() == 1 || in_comment(location)
                }
                ChunkSource::DocumentationExtension { .. } => true,
            })
            .and_then(|chunk| chunk.source.file().cloned())
    }
}

/// Extension directives that describe the page rather than add content to it.
const PAGE_DIRECTIVES: [&str; 5] = ["Comment", "DeprecationSummary", "Metadata", "Options", "Redirected"];

/// The blocks a symbol page is parsed from, plus the deprecation summary an appended
/// extension authored.
///
/// Appended extension blocks follow the comment's discussion, so page directives are taken
/// out of them first.
fn merged_blocks(
    chunks: &[DocumentationChunk],
    behavior: MergeBehavior,
) -> (Vec<Block>, Option<DeprecatedSection>) {
    let comment = chunks
        .iter()
        .find(|chunk| matches!(chunk.source, ChunkSource::SourceComment { .. }));
    let extension = chunks
        .iter()
        .find(|chunk| matches!(chunk.source, ChunkSource::DocumentationExtension { .. }));
    match (comment, extension) {
        (Some(comment), Some(extension)) if behavior == MergeBehavior::Append => {
            let mut blocks = comment.blocks.clone();
            let mut deprecation = None;
            let skip = usize::from(extension.blocks.first().is_some_and(|b| b.is_heading(1)));
            for block in &extension.blocks[skip..] {
                match &block.kind {
                    BlockKind::Directive(directive)
                        if PAGE_DIRECTIVES.contains(&directive.name.as_str()) =>
                    {
                        if directive.name == "DeprecationSummary" {
                            deprecation = Some(DeprecatedSection {
                                content: directive.children.clone(),
                                origin: DeprecationOrigin::Authored,
                            });
                        }
                    }
                    _ => blocks.push(block.clone()),
                }
            }
            (blocks, deprecation)
        }
        (_, Some(extension)) => (extension.blocks.clone(), None),
        (Some(comment), None) => (comment.blocks.clone(), None),
        (None, None) => (vec![], None),
    }
}
