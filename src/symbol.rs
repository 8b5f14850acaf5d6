//! Symbol declarations and documentation extension articles, as handed over by a
//! [`DocumentationProvider`].

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::{
    diagnostic::{SourceLocation, SourceRange},
    error::TopicGraphError,
    markup::{ast::Block, parse::Document, BlockKind, Inline},
    reference::SourceLanguage,
};

/// Return types that mean "returns nothing".
const VOID_RETURN_TYPES: [&str; 3] = ["void", "Void", "()"];

/// Declaration kind as it appears in symbol inputs, e.g. `swift.method`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclarationKind {
    pub identifier: String,
    pub display_name: String,
}

impl DeclarationKind {
    pub fn new(identifier: impl Into<String>, display_name: impl Into<String>) -> Self {
        DeclarationKind {
            identifier: identifier.into(),
            display_name: display_name.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlatformVersion {
    pub major: u32,
    #[serde(default)]
    pub minor: u32,
    #[serde(default)]
    pub patch: u32,
}

/// One availability attribute. `domain == None` applies to every platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AvailabilityItem {
    pub domain: Option<String>,
    pub introduced: Option<PlatformVersion>,
    pub deprecated: Option<PlatformVersion>,
    pub obsoleted: Option<PlatformVersion>,
    pub message: Option<String>,
    pub renamed: Option<String>,
    pub is_unconditionally_deprecated: bool,
    pub is_unconditionally_unavailable: bool,
}

impl AvailabilityItem {
    /// Whether this item on its own marks the symbol deprecated.
    pub fn is_deprecated(&self) -> bool {
        self.deprecated.is_some()
            || self.obsoleted.is_some()
            || self.is_unconditionally_deprecated
            || self.is_unconditionally_unavailable
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureParameter {
    /// Internal name. `None` or `_` for unnamed (C style) parameters.
    pub name: Option<String>,
    /// Argument label, when it differs from the internal name.
    #[serde(default)]
    pub external_name: Option<String>,
}

impl SignatureParameter {
    pub fn named(name: impl Into<String>) -> Self {
        SignatureParameter {
            name: Some(name.into()),
            external_name: None,
        }
    }

    pub fn unnamed() -> Self {
        SignatureParameter {
            name: None,
            external_name: None,
        }
    }

    pub fn with_external_name(mut self, external_name: impl Into<String>) -> Self {
        self.external_name = Some(external_name.into());
        self
    }

    /// The internal name, if the parameter has a usable one.
    pub fn internal_name(&self) -> Option<&str> {
        self.name
            .as_deref()
            .filter(|name| !name.is_empty() && *name != "_")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FunctionSignature {
    pub parameters: Vec<SignatureParameter>,
    /// The return type, spelled as in the declaration.
    pub returns: Option<String>,
    pub is_throwing: bool,
}

impl FunctionSignature {
    pub fn returns_void(&self) -> bool {
        match self.returns.as_deref() {
            None => true,
            Some(returns) => VOID_RETURN_TYPES.contains(&returns.trim()),
        }
    }
}

/// One language representation of a symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolVariant {
    pub language: SourceLanguage,
    #[serde(default)]
    pub signature: Option<FunctionSignature>,
    /// Declaration fragments joined into a single line, used as the symbol name.
    #[serde(default)]
    pub declaration: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocCommentLine {
    pub text: String,
    /// Where this line's text sits in the source file.
    pub range: Option<SourceRange>,
}

/// A documentation comment, line by line, with the position of every line in its file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocComment {
    pub lines: Vec<DocCommentLine>,
    pub source: Option<PathBuf>,
}

impl DocComment {
    /// A comment without position information.
    pub fn from_text(text: &str) -> DocComment {
        DocComment {
            lines: text
                .lines()
                .map(|line| DocCommentLine {
                    text: line.to_string(),
                    range: None,
                })
                .collect(),
            source: None,
        }
    }

    /// A comment whose first line starts at `start` in `source`, each further line one line
    /// below it at the same column.
    pub fn located(text: &str, source: impl Into<PathBuf>, start: SourceLocation) -> DocComment {
        DocComment {
            lines: text
                .lines()
                .enumerate()
                .map(|(idx, line)| {
                    let begin = SourceLocation::new(start.line + idx, start.column);
                    DocCommentLine {
                        text: line.to_string(),
                        range: Some(SourceRange::new(
                            begin,
                            SourceLocation::new(begin.line, begin.column + line.len()),
                        )),
                    }
                })
                .collect(),
            source: Some(source.into()),
        }
    }

    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|line| line.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn is_empty(&self) -> bool {
        self.lines.iter().all(|line| line.text.trim().is_empty())
    }

    /// Map a location in the comment text to the file. `None` if the line has no recorded
    /// position.
    pub fn absolute_location(&self, location: SourceLocation) -> Option<SourceLocation> {
        let line = self.lines.get(location.line.checked_sub(1)?)?;
        let start = line.range?.start;
        Some(SourceLocation::new(
            start.line,
            start.column + location.column.saturating_sub(1),
        ))
    }

    /// Map a comment-relative range to file coordinates. An end past the last line is clamped
    /// to the end of the comment.
    pub fn absolute_range(&self, range: SourceRange) -> Option<SourceRange> {
        let start = self.absolute_location(range.start)?;
        let end = self
            .absolute_location(range.end)
            .or_else(|| self.lines.last()?.range.map(|last| last.end))
            .unwrap_or(start);
        Some(SourceRange::new(start, end))
    }

    /// Parse the comment, with every range already in file coordinates.
    pub fn parse(&self) -> Document {
        let mut document = Document::parse(&self.text(), self.source.clone());
        if self.lines.iter().all(|line| line.range.is_none()) {
            return document;
        }
        for block in document.blocks.iter_mut() {
            block.remap_ranges(&|range| self.absolute_range(range).unwrap_or(range));
        }
        document
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    /// Unique, language independent identifier (a USR).
    pub precise_id: String,
    pub kind: DeclarationKind,
    pub title: String,
    /// Path of the symbol inside its module, e.g. `["Foo", "bar(_:)"]`.
    pub path_components: Vec<String>,
    #[serde(default)]
    pub availability: Vec<AvailabilityItem>,
    pub variants: Vec<SymbolVariant>,
    #[serde(default)]
    pub doc_comment: Option<DocComment>,
}

impl Symbol {
    pub fn languages(&self) -> Vec<SourceLanguage> {
        self.variants.iter().map(|variant| variant.language).collect()
    }

    pub fn variant(&self, language: SourceLanguage) -> Option<&SymbolVariant> {
        self.variants.iter().find(|variant| variant.language == language)
    }

    /// Signatures of every variant that has one.
    pub fn signatures(&self) -> impl Iterator<Item = (SourceLanguage, &FunctionSignature)> {
        self.variants
            .iter()
            .filter_map(|variant| Some((variant.language, variant.signature.as_ref()?)))
    }

    pub fn has_doc_comment(&self) -> bool {
        self.doc_comment.as_ref().is_some_and(|doc| !doc.is_empty())
    }
}

/// A standalone markup file: either a documentation extension for a symbol or a conceptual
/// article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    /// File stem, used as the last path component of conceptual articles.
    pub name: String,
    pub document: Document,
}

impl Article {
    pub fn new(name: impl Into<String>, document: Document) -> Self {
        Article {
            name: name.into(),
            document,
        }
    }

    pub fn parse(name: impl Into<String>, text: &str, source: Option<PathBuf>) -> Self {
        Article::new(name, Document::parse(text, source))
    }

    /// The symbol path named by a `# ``Kit/Foo`` ` title, if this article extends a symbol.
    pub fn extended_symbol(&self) -> Option<&str> {
        let title = self.document.blocks.first()?;
        match &title.kind {
            BlockKind::Heading { level: 1, content } => match content.as_slice() {
                [Inline::SymbolLink { destination, .. }] => Some(destination.as_str()),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.document.blocks
    }
}

/// The symbols of one module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleSymbols {
    pub module_name: String,
    pub symbols: Vec<Symbol>,
}

/// The input collaborator: supplies the symbols and articles of one documentation bundle.
pub trait DocumentationProvider: Send + Sync {
    fn bundle_id(&self) -> &str;

    fn modules(&self) -> Result<Vec<ModuleSymbols>, TopicGraphError>;

    fn articles(&self) -> Result<Vec<Article>, TopicGraphError>;
}

/// A provider over values already in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProvider {
    pub bundle_id: String,
    pub modules: Vec<ModuleSymbols>,
    pub articles: Vec<Article>,
}

impl InMemoryProvider {
    pub fn new(bundle_id: impl Into<String>) -> Self {
        InMemoryProvider {
            bundle_id: bundle_id.into(),
            ..Default::default()
        }
    }

    pub fn with_module(mut self, module_name: impl Into<String>, symbols: Vec<Symbol>) -> Self {
        self.modules.push(ModuleSymbols {
            module_name: module_name.into(),
            symbols,
        });
        self
    }

    pub fn with_article(mut self, article: Article) -> Self {
        self.articles.push(article);
        self
    }

    /// Read modules from the JSON form of `Vec<ModuleSymbols>`.
    pub fn with_modules_json(mut self, json: &str) -> Result<Self, TopicGraphError> {
        let modules: Vec<ModuleSymbols> = serde_json::from_str(json)?;
        self.modules.extend(modules);
        Ok(self)
    }
}

impl DocumentationProvider for InMemoryProvider {
    fn bundle_id(&self) -> &str {
        &self.bundle_id
    }

    fn modules(&self) -> Result<Vec<ModuleSymbols>, TopicGraphError> {
        Ok(self.modules.clone())
    }

    fn articles(&self) -> Result<Vec<Article>, TopicGraphError> {
        Ok(self.articles.clone())
    }
}
