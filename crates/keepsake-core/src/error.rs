//! Error types for keepsake operations.
//!
//! Each variant carries a structured [`ErrorCode`] so callers can react
//! programmatically, plus an optional suggestion for resolution.

use std::collections::HashMap;
use thiserror::Error;

/// Result type alias for keepsake operations.
pub type KeepsakeResult<T> = Result<T, KeepsakeError>;

/// Main error type for all keepsake operations.
#[derive(Error, Debug)]
pub enum KeepsakeError {
    /// The mood classifier could not produce a reading.
    #[error("Mood classification unavailable: {message}")]
    ClassificationUnavailable {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Fact retrieval failed while building a memory reply.
    #[error("Retrieval error: {message}")]
    Retrieval {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The suggestion provider failed.
    #[error("Suggestion error: {message}")]
    Suggestion { message: String, code: ErrorCode },

    /// The response renderer failed to draft text.
    #[error("Render error: {message}")]
    Render { message: String, code: ErrorCode },

    /// The content filter could not review a draft.
    #[error("Content filter unavailable: {message}")]
    FilterUnavailable {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Durable write of the fact collection failed.
    ///
    /// The in-memory store still holds the appended record.
    #[error("Persistence error: {message}")]
    Persistence {
        message: String,
        code: ErrorCode,
        fact_id: Option<u64>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Input validation failed.
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        code: ErrorCode,
        details: HashMap<String, String>,
        suggestion: Option<String>,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Scheduler lifecycle error.
    #[error("Scheduler error: {message}")]
    Scheduler { message: String, code: ErrorCode },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error codes for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Classification (MOOD_xxx)
    MoodClassifierFailed,
    MoodInvalidLabel,

    // Retrieval (RET_xxx)
    RetSourceUnavailable,

    // Suggestion (SUG_xxx)
    SugProviderFailed,

    // Rendering (RND_xxx)
    RndRendererFailed,

    // Content filter (FLT_xxx)
    FltUnavailable,

    // Persistence (PER_xxx)
    PerWriteFailed,
    PerReadFailed,

    // Validation (VAL_xxx)
    ValInvalidInput,
    ValOutOfRange,
    ValMissingField,

    // Scheduler (SCH_xxx)
    SchNoRuntime,

    // Internal
    Internal,
}

impl ErrorCode {
    /// Get the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::MoodClassifierFailed => "MOOD_001",
            ErrorCode::MoodInvalidLabel => "MOOD_002",
            ErrorCode::RetSourceUnavailable => "RET_001",
            ErrorCode::SugProviderFailed => "SUG_001",
            ErrorCode::RndRendererFailed => "RND_001",
            ErrorCode::FltUnavailable => "FLT_001",
            ErrorCode::PerWriteFailed => "PER_001",
            ErrorCode::PerReadFailed => "PER_002",
            ErrorCode::ValInvalidInput => "VAL_001",
            ErrorCode::ValOutOfRange => "VAL_002",
            ErrorCode::ValMissingField => "VAL_003",
            ErrorCode::SchNoRuntime => "SCH_001",
            ErrorCode::Internal => "INT_001",
        }
    }
}

impl KeepsakeError {
    /// Create a classification error.
    pub fn classification(message: impl Into<String>) -> Self {
        Self::ClassificationUnavailable {
            message: message.into(),
            code: ErrorCode::MoodClassifierFailed,
            source: None,
        }
    }

    /// Create a retrieval error.
    pub fn retrieval(message: impl Into<String>) -> Self {
        Self::Retrieval {
            message: message.into(),
            code: ErrorCode::RetSourceUnavailable,
            source: None,
        }
    }

    /// Create a suggestion error.
    pub fn suggestion_failed(message: impl Into<String>) -> Self {
        Self::Suggestion {
            message: message.into(),
            code: ErrorCode::SugProviderFailed,
        }
    }

    /// Create a render error.
    pub fn render(message: impl Into<String>) -> Self {
        Self::Render {
            message: message.into(),
            code: ErrorCode::RndRendererFailed,
        }
    }

    /// Create a content filter error.
    pub fn filter_unavailable(message: impl Into<String>) -> Self {
        Self::FilterUnavailable {
            message: message.into(),
            code: ErrorCode::FltUnavailable,
            source: None,
        }
    }

    /// Create a persistence error for a failed durable write.
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence {
            message: message.into(),
            code: ErrorCode::PerWriteFailed,
            fact_id: None,
            source: None,
        }
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            code: ErrorCode::ValInvalidInput,
            details: HashMap::new(),
            suggestion: None,
        }
    }

    /// Create an out-of-range validation error with a suggestion.
    pub fn out_of_range(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            code: ErrorCode::ValOutOfRange,
            details: HashMap::new(),
            suggestion: Some(suggestion.into()),
        }
    }

    /// Create a validation error for a required value that is missing or blank.
    pub fn missing_field(field: impl Into<String>) -> Self {
        let field = field.into();
        let mut details = HashMap::new();
        details.insert("field".to_string(), field.clone());
        Self::Validation {
            message: format!("Missing required value: {}", field),
            code: ErrorCode::ValMissingField,
            details,
            suggestion: None,
        }
    }

    /// Create an error for a mood label no classifier knows.
    pub fn invalid_mood(label: impl Into<String>) -> Self {
        Self::ClassificationUnavailable {
            message: format!("Unknown mood label '{}'", label.into()),
            code: ErrorCode::MoodInvalidLabel,
            source: None,
        }
    }

    /// Create a scheduler error raised outside a tokio runtime.
    pub fn no_runtime(message: impl Into<String>) -> Self {
        Self::Scheduler {
            message: message.into(),
            code: ErrorCode::SchNoRuntime,
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Attach the id of the record that stayed in memory to a persistence error.
    pub fn with_fact_id(self, id: u64) -> Self {
        match self {
            Self::Persistence {
                message,
                code,
                source,
                ..
            } => Self::Persistence {
                message,
                code,
                fact_id: Some(id),
                source,
            },
            other => other,
        }
    }

    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::ClassificationUnavailable { code, .. } => *code,
            Self::Retrieval { code, .. } => *code,
            Self::Suggestion { code, .. } => *code,
            Self::Render { code, .. } => *code,
            Self::FilterUnavailable { code, .. } => *code,
            Self::Persistence { code, .. } => *code,
            Self::Validation { code, .. } => *code,
            Self::Scheduler { code, .. } => *code,
            Self::Io(_) => ErrorCode::PerReadFailed,
            _ => ErrorCode::Internal,
        }
    }

    /// Get a user-friendly suggestion for resolving this error.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Persistence { .. } => {
                Some("The fact is kept for this session; check the facts file path and permissions")
            }
            Self::FilterUnavailable { .. } => Some("Check the content filter configuration"),
            Self::Validation { suggestion, .. } => suggestion.as_deref(),
            Self::Scheduler { .. } => Some("Arm the inactivity scheduler from inside a tokio runtime"),
            Self::Configuration(_) => Some("Check the keepsake configuration and lexicon files"),
            _ => None,
        }
    }

    /// Whether the router may recover from this error by falling back.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::FilterUnavailable { .. })
    }
}

impl From<toml::de::Error> for KeepsakeError {
    fn from(err: toml::de::Error) -> Self {
        Self::Configuration(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error() {
        let err = KeepsakeError::validation("Invalid input");
        assert_eq!(err.code(), ErrorCode::ValInvalidInput);
        assert!(err.to_string().contains("Invalid input"));
    }

    #[test]
    fn test_persistence_error_keeps_fact_id() {
        let err = KeepsakeError::persistence("disk full").with_fact_id(7);
        assert_eq!(err.code(), ErrorCode::PerWriteFailed);
        assert!(err.suggestion().is_some());
        match err {
            KeepsakeError::Persistence { fact_id, .. } => assert_eq!(fact_id, Some(7)),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_filter_error_is_not_recoverable() {
        assert!(!KeepsakeError::filter_unavailable("down").is_recoverable());
        assert!(KeepsakeError::retrieval("down").is_recoverable());
    }

    #[test]
    fn test_error_code_as_str() {
        assert_eq!(ErrorCode::MoodClassifierFailed.as_str(), "MOOD_001");
        assert_eq!(ErrorCode::PerWriteFailed.as_str(), "PER_001");
    }
}
