//! Domain error types
//!
//! This module defines the error hierarchy for phimask.
//! All errors are domain-specific and don't expose third-party types.

use thiserror::Error;

/// Main phimask error type
///
/// Every variant except `Configuration` and `Input` is scoped to a single
/// document: the batch runner records it against that document and moves on.
#[derive(Debug, Error)]
pub enum PhimaskError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The masking rule set could not be read or is invalid
    #[error("Failed to load rule set {path}: {reason}")]
    RuleSetLoad { path: String, reason: String },

    /// The mapping store is missing or unparsable
    #[error("Failed to load mapping store {path}: {reason}")]
    MappingLoad { path: String, reason: String },

    /// The mapping store could not be persisted
    #[error("Failed to write mapping store {path}: {reason}")]
    MappingWrite { path: String, reason: String },

    /// The input is not a well-formed document
    #[error("Failed to parse document {path}: {source}")]
    DocumentParse {
        path: String,
        #[source]
        source: DocumentError,
    },

    /// The output document could not be written
    #[error("Failed to write document {path}: {reason}")]
    DocumentWrite { path: String, reason: String },

    /// A generated token is already mapped to a different original value
    #[error("Token collision: {token} (group {group_id}, field {field_id}) is already mapped to a different value")]
    TokenCollision {
        token: String,
        group_id: String,
        field_id: String,
    },

    /// Input path errors (not a file or directory, no documents found)
    #[error("Input error: {0}")]
    Input(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// XML document errors
///
/// Raised by the document reader and writer. Positions are byte offsets into
/// the input.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Markup that the XML reader rejects
    #[error("malformed XML at byte {position}: {message}")]
    Malformed { position: u64, message: String },

    /// Input bytes are not valid UTF-8
    #[error("document is not valid UTF-8: {0}")]
    Encoding(String),

    /// No root element was found
    #[error("document has no root element")]
    MissingRoot,

    /// An element was still open at end of input
    #[error("unclosed element <{0}>")]
    Unclosed(String),

    /// Attribute or text escape could not be decoded
    #[error("invalid content in <{element}>: {message}")]
    InvalidContent { element: String, message: String },

    /// Failure reading the document from disk
    #[error("{0}")]
    Io(String),

    /// Failure serializing the document
    #[error("failed to serialize document: {0}")]
    Serialize(String),
}

impl PhimaskError {
    /// Short category name used in summaries and audit output
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::RuleSetLoad { .. } => "rule_set_load",
            Self::MappingLoad { .. } => "mapping_load",
            Self::MappingWrite { .. } => "mapping_write",
            Self::DocumentParse { .. } => "document_parse",
            Self::DocumentWrite { .. } => "document_write",
            Self::TokenCollision { .. } => "token_collision",
            Self::Input(_) => "input",
            Self::Serialization(_) => "serialization",
            Self::Io(_) => "io",
            Self::Other(_) => "other",
        }
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for PhimaskError {
    fn from(err: std::io::Error) -> Self {
        PhimaskError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for PhimaskError {
    fn from(err: serde_json::Error) -> Self {
        PhimaskError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for PhimaskError {
    fn from(err: toml::de::Error) -> Self {
        PhimaskError::Configuration(format!("TOML parse error: {err}"))
    }
}
