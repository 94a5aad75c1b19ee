//! Suggestion provider trait.

use serde::{Deserialize, Serialize};

use crate::error::KeepsakeResult;
use crate::types::Mood;

/// A mood-appropriate activity idea.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    /// Short title.
    pub title: String,
    /// One-line description.
    pub description: String,
    /// Ordered steps to carry it out.
    #[serde(default)]
    pub steps: Vec<String>,
    /// Extra tips.
    #[serde(default)]
    pub tips: Vec<String>,
}

impl Suggestion {
    /// Create a suggestion without steps or tips.
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            steps: Vec::new(),
            tips: Vec::new(),
        }
    }

    /// Append steps.
    pub fn with_steps<I, S>(mut self, steps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.steps.extend(steps.into_iter().map(Into::into));
        self
    }

    /// Append tips.
    pub fn with_tips<I, S>(mut self, tips: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tips.extend(tips.into_iter().map(Into::into));
        self
    }
}

/// Supplies activity ideas for a mood.
#[cfg_attr(test, mockall::automock)]
pub trait SuggestionProvider: Send + Sync {
    /// Best suggestion for `mood`, or `None` when nothing fits.
    fn suggest_for(&self, mood: Mood) -> KeepsakeResult<Option<Suggestion>>;
}

/// A provider that never has anything to suggest.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSuggestions;

impl SuggestionProvider for NoSuggestions {
    fn suggest_for(&self, _mood: Mood) -> KeepsakeResult<Option<Suggestion>> {
        Ok(None)
    }
}
