use jsv_pointer::JsonPointerError;
use thiserror::Error;

/// Structural and configuration faults.
///
/// These abort the current call. An instance that merely fails a schema is
/// never reported through this type; see [`crate::ValidationResult`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("cannot resolve reference '{reference}' against base '{base}'")]
    UnresolvableReference { reference: String, base: String },

    #[error("keyword '{keyword}' expects {expected}, found {found}")]
    InvalidKeyword {
        keyword: String,
        expected: &'static str,
        found: String,
    },

    #[error("invalid regular expression '{pattern}': {reason}")]
    InvalidRegex { pattern: String, reason: String },

    #[error("unknown format '{0}'")]
    UnknownFormat(String),

    #[error("unknown content encoding '{0}'")]
    UnknownContentEncoding(String),

    #[error("required vocabulary '{0}' is not supported")]
    UnknownVocabulary(String),

    #[error("invalid URI '{uri}': {reason}")]
    InvalidUri { uri: String, reason: String },

    #[error("invalid JSON pointer: {0}")]
    InvalidPointer(String),

    #[error("extension mismatch: {0}")]
    ExtensionMismatch(String),

    #[error("failed to retrieve '{uri}': {reason}")]
    Retrieval { uri: String, reason: String },
}

impl SchemaError {
    pub(crate) fn invalid_keyword(
        keyword: &str,
        expected: &'static str,
        found: &serde_json::Value,
    ) -> Self {
        SchemaError::InvalidKeyword {
            keyword: keyword.to_string(),
            expected,
            found: found.to_string(),
        }
    }
}

impl From<JsonPointerError> for SchemaError {
    fn from(err: JsonPointerError) -> Self {
        SchemaError::InvalidPointer(err.to_string())
    }
}
