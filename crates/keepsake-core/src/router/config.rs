//! Router settings.

use serde::{Deserialize, Serialize};

use crate::error::{KeepsakeError, KeepsakeResult};

/// Default number of facts fetched for a memory reply.
pub const DEFAULT_RETRIEVAL_K: usize = 2;

/// Largest accepted retrieval size.
pub const MAX_RETRIEVAL_K: usize = 10;

/// Phrases that signal the user is asking about the past.
///
/// Mixes English with romanized Nepali ("yaad" = remember, "kura" = talk,
/// "gareko"/"garya" = did).
pub const DEFAULT_MEMORY_MARKERS: &[&str] = &[
    "first", "remember", "yaad", "start", "began", "when", "how", "facebook", "message", "kura",
    "gareko", "garya",
];

/// Text returned when the content filter cannot review a draft.
pub const DEFAULT_SAFE_FALLBACK: &str =
    "Sorry, I can't reply to that properly right now. Can you say it another way?";

/// Draft used when the renderer fails.
pub const DEFAULT_DRAFT_FALLBACK: &str = "I'm here and listening. Tell me more?";

/// Configuration for [`ConversationRouter`](super::ConversationRouter).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Facts retrieved for a memory reply (1..=10, default 2).
    pub retrieval_k: usize,
    /// Case-insensitive substrings that route a message to a memory reply.
    pub memory_markers: Vec<String>,
    /// Final text when the content filter is unavailable.
    pub safe_fallback: String,
    /// Draft text when the renderer fails.
    pub draft_fallback: String,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            retrieval_k: DEFAULT_RETRIEVAL_K,
            memory_markers: DEFAULT_MEMORY_MARKERS.iter().map(|m| m.to_string()).collect(),
            safe_fallback: DEFAULT_SAFE_FALLBACK.to_string(),
            draft_fallback: DEFAULT_DRAFT_FALLBACK.to_string(),
        }
    }
}

impl RouterConfig {
    pub fn with_retrieval_k(mut self, k: usize) -> Self {
        self.retrieval_k = k;
        self
    }

    pub fn with_memory_markers<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.memory_markers = markers.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_safe_fallback(mut self, text: impl Into<String>) -> Self {
        self.safe_fallback = text.into();
        self
    }

    /// Validate ranges and required text.
    pub fn validate(&self) -> KeepsakeResult<()> {
        if !(1..=MAX_RETRIEVAL_K).contains(&self.retrieval_k) {
            return Err(KeepsakeError::out_of_range(
                format!(
                    "retrieval_k must be between 1 and {}, got {}",
                    MAX_RETRIEVAL_K, self.retrieval_k
                ),
                "Memory replies read best with 2 or 3 facts",
            ));
        }
        if self.memory_markers.iter().any(|m| m.trim().is_empty()) {
            return Err(KeepsakeError::validation("memory markers must not be empty"));
        }
        if self.safe_fallback.trim().is_empty() {
            return Err(KeepsakeError::missing_field("router.safe_fallback"));
        }
        if self.draft_fallback.trim().is_empty() {
            return Err(KeepsakeError::missing_field("router.draft_fallback"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_defaults_valid() {
        let config = RouterConfig::default();
        assert_eq!(config.retrieval_k, 2);
        assert!(config.memory_markers.iter().any(|m| m == "yaad"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_k_out_of_range() {
        let err = RouterConfig::default().with_retrieval_k(0).validate().unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValOutOfRange);
        assert!(err.suggestion().is_some());
        assert!(RouterConfig::default().with_retrieval_k(11).validate().is_err());
        assert!(RouterConfig::default().with_retrieval_k(10).validate().is_ok());
    }

    #[test]
    fn test_blank_fallback_rejected() {
        let err = RouterConfig::default().with_safe_fallback("  ").validate().unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValMissingField);
    }

    #[test]
    fn test_blank_marker_rejected() {
        let config = RouterConfig::default().with_memory_markers(["first", ""]);
        assert!(config.validate().is_err());
    }
}
