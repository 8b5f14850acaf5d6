use std::{fmt, io};

use serde::{Deserialize, Serialize};
use serde_json::Error as JsonError;
use thiserror::Error;
use url::ParseError as UrlParseError;

/// Errors raised by the graph construction session itself.
///
/// Problems found in authored content are not errors: they are reported as
/// [`crate::diagnostic::Problem`] values through the diagnostic engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
pub enum TopicGraphError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Custom error: {0}")]
    Custom(String),
    #[error("External link resolver error: {0}")]
    ExternalResolver(String),
    #[error("Invalid topic reference: {0}")]
    InvalidReference(String),
    #[error("File System error: {0}")]
    Io(String),
    #[error("Item Not Found: {0}")]
    NotFound(String),
    #[error("Operation cancelled")]
    OperationCancelled,
    #[error("(De)Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for TopicGraphError {
    fn from(src: toml::de::Error) -> TopicGraphError {
        TopicGraphError::Serialization(format!("Toml deserialization error: {src}"))
    }
}

impl From<toml::ser::Error> for TopicGraphError {
    fn from(src: toml::ser::Error) -> TopicGraphError {
        TopicGraphError::Serialization(format!("Toml serialization error: {src}"))
    }
}

impl From<JsonError> for TopicGraphError {
    fn from(src: JsonError) -> TopicGraphError {
        TopicGraphError::Serialization(format!("JSON (de)serialization error: {src}"))
    }
}

impl From<UrlParseError> for TopicGraphError {
    fn from(src: UrlParseError) -> TopicGraphError {
        TopicGraphError::InvalidReference(format!("Invalid URL: {src}"))
    }
}

impl From<io::Error> for TopicGraphError {
    fn from(x: io::Error) -> Self {
        match x.kind() {
            io::ErrorKind::NotFound => TopicGraphError::NotFound(format!("{x}")),
            _ => TopicGraphError::Io(format!("IOError: {}: {x}", x.kind())),
        }
    }
}

impl From<fmt::Error> for TopicGraphError {
    fn from(x: fmt::Error) -> Self {
        TopicGraphError::Custom(format!("{x}"))
    }
}
