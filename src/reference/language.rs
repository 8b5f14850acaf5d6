use enumset::{EnumSet, EnumSetType};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// A programming language a documented entity can be represented in.
///
/// One documented entity can have several representations (an Objective-C class that is also
/// exposed to Swift). Reference identity deliberately ignores this: see
/// [`crate::reference::ResolvedTopicReference`].
#[derive(Debug, Default, Serialize, Deserialize, PartialOrd, Ord, Hash, EnumSetType)]
#[enumset(serialize_repr = "list")]
#[serde(rename_all = "kebab-case")]
pub enum SourceLanguage {
    #[default]
    Swift,
    ObjectiveC,
    C,
    Cpp,
    #[serde(rename = "javascript")]
    JavaScript,
    Data,
    Metal,
}

pub type SourceLanguageSet = EnumSet<SourceLanguage>;

impl SourceLanguage {
    /// Stable identifier used in symbol inputs and configuration.
    pub fn id(&self) -> &'static str {
        match self {
            SourceLanguage::Swift => "swift",
            SourceLanguage::ObjectiveC => "occ",
            SourceLanguage::C => "c",
            SourceLanguage::Cpp => "cpp",
            SourceLanguage::JavaScript => "javascript",
            SourceLanguage::Data => "data",
            SourceLanguage::Metal => "metal",
        }
    }

    /// Identifier used in link disambiguation suffixes (`-swift.method`, `-objc.property`).
    pub fn link_disambiguation_id(&self) -> &'static str {
        match self {
            SourceLanguage::ObjectiveC => "objc",
            SourceLanguage::JavaScript => "js",
            other => other.id(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SourceLanguage::Swift => "Swift",
            SourceLanguage::ObjectiveC => "Objective-C",
            SourceLanguage::C => "C",
            SourceLanguage::Cpp => "C++",
            SourceLanguage::JavaScript => "JavaScript",
            SourceLanguage::Data => "Data",
            SourceLanguage::Metal => "Metal",
        }
    }

    /// Accepts the stable id, the link disambiguation id, and a few common aliases.
    pub fn from_id(id: &str) -> Option<SourceLanguage> {
        match id.trim().to_lowercase().as_str() {
            "swift" => Some(SourceLanguage::Swift),
            "occ" | "objc" | "objective-c" | "objectivec" => Some(SourceLanguage::ObjectiveC),
            "c" => Some(SourceLanguage::C),
            "cpp" | "c++" | "objective-c++" => Some(SourceLanguage::Cpp),
            "javascript" | "js" => Some(SourceLanguage::JavaScript),
            "data" => Some(SourceLanguage::Data),
            "metal" => Some(SourceLanguage::Metal),
            _ => None,
        }
    }

    /// Languages whose symbol representations use C-style declarations, where parameters may be
    /// declared without names.
    pub fn is_c_family(&self) -> bool {
        matches!(
            self,
            SourceLanguage::ObjectiveC | SourceLanguage::C | SourceLanguage::Cpp
        )
    }
}

impl Display for SourceLanguage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
