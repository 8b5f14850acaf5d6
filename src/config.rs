//! Session configuration, loadable from TOML.
//!
//! ```toml
//! default_language = "swift"
//! target_platform = "macOS"
//!
//! [resolver]
//! near_miss_limit = 10
//! near_miss_threshold = 0.25
//!
//! [resolver.ambiguity]
//! tie_break = "fail"
//!
//! [batching]
//! parallelism = "available"
//! min_batch_size = 20
//! batches_per_core = 10
//!
//! [diagnostics]
//! minimum_severity = "warning"
//! warnings_as_errors = false
//! ```
//!
//! Every field has a default, so partial files are fine.

use serde::{Deserialize, Serialize};
use std::{fs::read_to_string, path::Path};

use crate::{
    concurrency::BatchConfig, diagnostic::Severity, error::TopicGraphError,
    node::DocumentationKind, reference::SourceLanguage,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    /// Language assumed for articles and for symbols that don't declare one.
    pub default_language: SourceLanguage,
    /// Platform used when deciding whether availability makes a symbol deprecated.
    pub target_platform: Option<String>,
    pub resolver: ResolverConfig,
    pub batching: BatchConfig,
    pub diagnostics: DiagnosticConfig,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        ConvertConfig {
            default_language: SourceLanguage::Swift,
            target_platform: None,
            resolver: ResolverConfig::default(),
            batching: BatchConfig::default(),
            diagnostics: DiagnosticConfig::default(),
        }
    }
}

impl ConvertConfig {
    pub fn from_toml_str(content: &str) -> Result<ConvertConfig, TopicGraphError> {
        let config: ConvertConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<ConvertConfig, TopicGraphError> {
        tracing::debug!("[ConvertConfig::from_path] Reading {:?}", path.as_ref());
        let content = read_to_string(path)?;
        ConvertConfig::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String, TopicGraphError> {
        Ok(toml::to_string(self)?)
    }

    fn validate(&self) -> Result<(), TopicGraphError> {
        if !(0.0..=1.0).contains(&self.resolver.near_miss_threshold) {
            return Err(TopicGraphError::Config(format!(
                "resolver.near_miss_threshold must be within 0.0..=1.0, got {}",
                self.resolver.near_miss_threshold
            )));
        }
        if self.batching.min_batch_size == 0 || self.batching.batches_per_core == 0 {
            return Err(TopicGraphError::Config(
                "batching.min_batch_size and batching.batches_per_core must be positive"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Maximum number of "did you mean" suggestions for an unresolved link.
    pub near_miss_limit: usize,
    /// Suggestions scoring below this fraction of the best score are dropped.
    pub near_miss_threshold: f64,
    pub ambiguity: AmbiguityPolicy,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolverConfig {
            near_miss_limit: 10,
            near_miss_threshold: 0.25,
            ambiguity: AmbiguityPolicy::default(),
        }
    }
}

/// How a link that matches several overloads without a disambiguating suffix is resolved.
///
/// The expected kind is the first entry of `preferred_kinds` that occurs among the candidates.
/// If exactly one candidate has that kind it wins. If several do, `tie_break` decides. If none of
/// the preferred kinds occur, the link is ambiguous.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmbiguityPolicy {
    pub preferred_kinds: Vec<DocumentationKind>,
    pub tie_break: TieBreak,
}

impl Default for AmbiguityPolicy {
    fn default() -> Self {
        AmbiguityPolicy {
            preferred_kinds: vec![
                DocumentationKind::Class,
                DocumentationKind::Structure,
                DocumentationKind::Enumeration,
                DocumentationKind::Protocol,
                DocumentationKind::TypeAlias,
                DocumentationKind::InstanceMethod,
                DocumentationKind::InstanceProperty,
                DocumentationKind::Initializer,
                DocumentationKind::Function,
                DocumentationKind::EnumerationCase,
                DocumentationKind::TypeMethod,
                DocumentationKind::TypeProperty,
            ],
            tie_break: TieBreak::Fail,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TieBreak {
    /// Report the link as ambiguous.
    #[default]
    Fail,
    /// Pick the candidate with the lexicographically smallest path.
    FirstByPath,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticConfig {
    /// Problems below this severity are dropped.
    pub minimum_severity: Severity,
    pub warnings_as_errors: bool,
}

impl Default for DiagnosticConfig {
    fn default() -> Self {
        DiagnosticConfig {
            minimum_severity: Severity::Warning,
            warnings_as_errors: false,
        }
    }
}
