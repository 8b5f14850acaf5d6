use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::reference::SourceLanguage;

/// The logical kind of a documentation node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentationKind {
    // Conceptual pages
    Article,
    Tutorial,
    TutorialArticle,
    Technology,
    Volume,
    Chapter,
    /// An in-page section (heading anchor); addressable but not a page.
    Landmark,

    // Symbols
    Module,
    Class,
    Structure,
    Enumeration,
    Protocol,
    Actor,
    Union,
    Namespace,
    Extension,
    TypeAlias,
    Typedef,
    AssociatedType,
    Macro,
    Initializer,
    Deinitializer,
    InstanceMethod,
    InstanceProperty,
    InstanceSubscript,
    InstanceVariable,
    TypeMethod,
    TypeProperty,
    TypeSubscript,
    EnumerationCase,
    Function,
    Operator,
    GlobalVariable,
    Dictionary,
    /// A symbol whose declaration kind isn't in the mapping table.
    UnknownSymbol,

    Unknown,
}

/// Order of the generated task groups of automatic curation.
pub const AUTOMATIC_CURATION_ORDER: [DocumentationKind; 28] = [
    DocumentationKind::Article,
    DocumentationKind::Module,
    DocumentationKind::Namespace,
    DocumentationKind::Class,
    DocumentationKind::Actor,
    DocumentationKind::Protocol,
    DocumentationKind::Structure,
    DocumentationKind::Union,
    DocumentationKind::Enumeration,
    DocumentationKind::Dictionary,
    DocumentationKind::TypeAlias,
    DocumentationKind::Typedef,
    DocumentationKind::AssociatedType,
    DocumentationKind::Macro,
    DocumentationKind::EnumerationCase,
    DocumentationKind::Initializer,
    DocumentationKind::Deinitializer,
    DocumentationKind::InstanceProperty,
    DocumentationKind::InstanceVariable,
    DocumentationKind::InstanceMethod,
    DocumentationKind::InstanceSubscript,
    DocumentationKind::TypeProperty,
    DocumentationKind::TypeMethod,
    DocumentationKind::TypeSubscript,
    DocumentationKind::Operator,
    DocumentationKind::Function,
    DocumentationKind::GlobalVariable,
    DocumentationKind::Extension,
];

/// Language prefixes of symbol kind identifiers (`swift.method`, `c.func`).
const KIND_LANGUAGE_PREFIXES: [&str; 5] = ["objective-c", "c++", "cpp", "js", "objc"];

impl DocumentationKind {
    /// Map a declaration kind identifier to a kind. Total: unknown identifiers map to
    /// [`DocumentationKind::UnknownSymbol`].
    pub fn from_symbol_kind(identifier: &str) -> DocumentationKind {
        match strip_language_prefix(identifier) {
            "associatedtype" => DocumentationKind::AssociatedType,
            "actor" => DocumentationKind::Actor,
            "class" => DocumentationKind::Class,
            "deinit" => DocumentationKind::Deinitializer,
            "dictionary" => DocumentationKind::Dictionary,
            "enum" => DocumentationKind::Enumeration,
            "enum.case" => DocumentationKind::EnumerationCase,
            "extension" => DocumentationKind::Extension,
            "func" => DocumentationKind::Function,
            "func.op" => DocumentationKind::Operator,
            "init" => DocumentationKind::Initializer,
            "ivar" => DocumentationKind::InstanceVariable,
            "macro" => DocumentationKind::Macro,
            "method" => DocumentationKind::InstanceMethod,
            "module" => DocumentationKind::Module,
            "namespace" => DocumentationKind::Namespace,
            "property" => DocumentationKind::InstanceProperty,
            "protocol" => DocumentationKind::Protocol,
            "struct" => DocumentationKind::Structure,
            "subscript" => DocumentationKind::InstanceSubscript,
            "type.method" => DocumentationKind::TypeMethod,
            "type.property" => DocumentationKind::TypeProperty,
            "type.subscript" => DocumentationKind::TypeSubscript,
            "typealias" => DocumentationKind::TypeAlias,
            "typedef" => DocumentationKind::Typedef,
            "union" => DocumentationKind::Union,
            "var" => DocumentationKind::GlobalVariable,
            _ => DocumentationKind::UnknownSymbol,
        }
    }

    /// Short identifier used as a path disambiguation suffix, e.g. `foo-method`.
    pub fn id(&self) -> &'static str {
        match self {
            DocumentationKind::Article => "article",
            DocumentationKind::Tutorial => "tutorial",
            DocumentationKind::TutorialArticle => "tutorial-article",
            DocumentationKind::Technology => "technology",
            DocumentationKind::Volume => "volume",
            DocumentationKind::Chapter => "chapter",
            DocumentationKind::Landmark => "landmark",
            DocumentationKind::Module => "module",
            DocumentationKind::Class => "class",
            DocumentationKind::Structure => "struct",
            DocumentationKind::Enumeration => "enum",
            DocumentationKind::Protocol => "protocol",
            DocumentationKind::Actor => "actor",
            DocumentationKind::Union => "union",
            DocumentationKind::Namespace => "namespace",
            DocumentationKind::Extension => "extension",
            DocumentationKind::TypeAlias => "typealias",
            DocumentationKind::Typedef => "typedef",
            DocumentationKind::AssociatedType => "associatedtype",
            DocumentationKind::Macro => "macro",
            DocumentationKind::Initializer => "init",
            DocumentationKind::Deinitializer => "deinit",
            DocumentationKind::InstanceMethod => "method",
            DocumentationKind::InstanceProperty => "property",
            DocumentationKind::InstanceSubscript => "subscript",
            DocumentationKind::InstanceVariable => "ivar",
            DocumentationKind::TypeMethod => "type.method",
            DocumentationKind::TypeProperty => "type.property",
            DocumentationKind::TypeSubscript => "type.subscript",
            DocumentationKind::EnumerationCase => "enum.case",
            DocumentationKind::Function => "func",
            DocumentationKind::Operator => "func.op",
            DocumentationKind::GlobalVariable => "var",
            DocumentationKind::Dictionary => "dictionary",
            DocumentationKind::UnknownSymbol => "unknown-symbol",
            DocumentationKind::Unknown => "unknown",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DocumentationKind::Article => "Article",
            DocumentationKind::Tutorial => "Tutorial",
            DocumentationKind::TutorialArticle => "Tutorial Article",
            DocumentationKind::Technology => "Technology",
            DocumentationKind::Volume => "Volume",
            DocumentationKind::Chapter => "Chapter",
            DocumentationKind::Landmark => "Landmark",
            DocumentationKind::Module => "Framework",
            DocumentationKind::Class => "Class",
            DocumentationKind::Structure => "Structure",
            DocumentationKind::Enumeration => "Enumeration",
            DocumentationKind::Protocol => "Protocol",
            DocumentationKind::Actor => "Actor",
            DocumentationKind::Union => "Union",
            DocumentationKind::Namespace => "Namespace",
            DocumentationKind::Extension => "Extension",
            DocumentationKind::TypeAlias => "Type Alias",
            DocumentationKind::Typedef => "Type Definition",
            DocumentationKind::AssociatedType => "Associated Type",
            DocumentationKind::Macro => "Macro",
            DocumentationKind::Initializer => "Initializer",
            DocumentationKind::Deinitializer => "Deinitializer",
            DocumentationKind::InstanceMethod => "Instance Method",
            DocumentationKind::InstanceProperty => "Instance Property",
            DocumentationKind::InstanceSubscript => "Instance Subscript",
            DocumentationKind::InstanceVariable => "Instance Variable",
            DocumentationKind::TypeMethod => "Type Method",
            DocumentationKind::TypeProperty => "Type Property",
            DocumentationKind::TypeSubscript => "Type Subscript",
            DocumentationKind::EnumerationCase => "Case",
            DocumentationKind::Function => "Function",
            DocumentationKind::Operator => "Operator",
            DocumentationKind::GlobalVariable => "Global Variable",
            DocumentationKind::Dictionary => "Dictionary",
            DocumentationKind::UnknownSymbol => "Symbol",
            DocumentationKind::Unknown => "Unknown",
        }
    }

    /// Heading of the automatic task group collecting children of this kind.
    pub fn topic_group_title(&self) -> &'static str {
        match self {
            DocumentationKind::Article => "Articles",
            DocumentationKind::Module => "Modules",
            DocumentationKind::Namespace => "Namespaces",
            DocumentationKind::Class => "Classes",
            DocumentationKind::Actor => "Actors",
            DocumentationKind::Protocol => "Protocols",
            DocumentationKind::Structure => "Structures",
            DocumentationKind::Union => "Unions",
            DocumentationKind::Enumeration => "Enumerations",
            DocumentationKind::Dictionary => "Dictionaries",
            DocumentationKind::TypeAlias => "Type Aliases",
            DocumentationKind::Typedef => "Type Definitions",
            DocumentationKind::AssociatedType => "Associated Types",
            DocumentationKind::Macro => "Macros",
            DocumentationKind::EnumerationCase => "Enumeration Cases",
            DocumentationKind::Initializer => "Initializers",
            DocumentationKind::Deinitializer => "Deinitializers",
            DocumentationKind::InstanceProperty => "Instance Properties",
            DocumentationKind::InstanceVariable => "Instance Variables",
            DocumentationKind::InstanceMethod => "Instance Methods",
            DocumentationKind::InstanceSubscript => "Subscripts",
            DocumentationKind::TypeProperty => "Type Properties",
            DocumentationKind::TypeMethod => "Type Methods",
            DocumentationKind::TypeSubscript => "Type Subscripts",
            DocumentationKind::Operator => "Operators",
            DocumentationKind::Function => "Functions",
            DocumentationKind::GlobalVariable => "Variables",
            DocumentationKind::Extension => "Extensions",
            _ => "Topics",
        }
    }

    pub fn is_page(&self) -> bool {
        !matches!(self, DocumentationKind::Landmark)
    }

    pub fn is_symbol(&self) -> bool {
        !matches!(
            self,
            DocumentationKind::Article
                | DocumentationKind::Tutorial
                | DocumentationKind::TutorialArticle
                | DocumentationKind::Technology
                | DocumentationKind::Volume
                | DocumentationKind::Chapter
                | DocumentationKind::Landmark
                | DocumentationKind::Unknown
        )
    }

    /// Kinds whose declarations have a function signature that parameters can be checked
    /// against.
    pub fn is_callable(&self) -> bool {
        matches!(
            self,
            DocumentationKind::Initializer
                | DocumentationKind::InstanceMethod
                | DocumentationKind::InstanceSubscript
                | DocumentationKind::TypeMethod
                | DocumentationKind::TypeSubscript
                | DocumentationKind::Function
                | DocumentationKind::Operator
                | DocumentationKind::Macro
        )
    }
}

impl Display for DocumentationKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

fn strip_language_prefix(identifier: &str) -> &str {
    let Some((prefix, rest)) = identifier.split_once('.') else {
        return identifier;
    };
    let is_language =
        SourceLanguage::from_id(prefix).is_some() || KIND_LANGUAGE_PREFIXES.contains(&prefix);
    if is_language && !rest.is_empty() {
        rest
    } else {
        identifier
    }
}
