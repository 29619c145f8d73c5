use thiserror::Error;

pub type Result<T> = std::result::Result<T, AdmissionError>;

/// Errors surfaced by the admission core.
///
/// Every failure is scoped to the single `decide` / `record` call that produced it.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AdmissionError {
    /// Empty user id / category / item id, or an otherwise malformed event.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The engagement store could not read or write the record.
    #[error("Engagement store unavailable: {0}")]
    StoreUnavailable(String),

    /// Sentiment outside [-1, 1]. Recovered by clamping; only used for reporting.
    #[error("Sentiment {value} outside [-1, 1]")]
    OutOfRange { value: f64 },
}

impl AdmissionError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        AdmissionError::InvalidArgument(msg.into())
    }

    pub fn store(msg: impl Into<String>) -> Self {
        AdmissionError::StoreUnavailable(msg.into())
    }

    /// Whether the caller may retry the call unchanged.
    pub fn is_transient(&self) -> bool {
        matches!(self, AdmissionError::StoreUnavailable(_))
    }
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Environment error: {0}")]
    Env(#[from] envy::Error),

    #[error("Failed to read lexicon file {path}: {source}")]
    LexiconIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse lexicon: {0}")]
    LexiconParse(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
