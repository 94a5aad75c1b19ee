//! Content filter trait and verdict type.

use serde::{Deserialize, Serialize};

use crate::error::KeepsakeResult;

/// Result of reviewing a drafted reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterVerdict {
    /// Text to send, possibly rewritten by the filter.
    pub final_text: String,
    /// Whether `final_text` meets the filter's threshold.
    pub passed: bool,
    /// Quality score in 0..=100.
    pub score: u8,
}

impl FilterVerdict {
    /// A verdict that accepts `text` unchanged.
    pub fn pass(text: impl Into<String>, score: u8) -> Self {
        Self {
            final_text: text.into(),
            passed: true,
            score: score.min(100),
        }
    }
}

/// Reviews drafted text before it reaches the user.
///
/// The router calls this on every turn and always substitutes
/// [`FilterVerdict::final_text`] for its draft.
#[cfg_attr(test, mockall::automock)]
pub trait ContentFilter: Send + Sync {
    /// Review `text`, returning the possibly rewritten text and a verdict.
    fn review_and_fix(&self, text: &str) -> KeepsakeResult<FilterVerdict>;
}
