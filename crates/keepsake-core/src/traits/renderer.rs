//! Response renderer trait.
//!
//! The core never writes user-facing prose itself: it picks a path and the
//! facts, and a renderer turns that decision into text.

use crate::error::KeepsakeResult;
use crate::scheduler::OutreachEvent;
use crate::types::{FactRecord, Mood};

use super::suggestion::Suggestion;

/// Turns routing decisions into drafted text.
#[cfg_attr(test, mockall::automock)]
pub trait ResponseRenderer: Send + Sync {
    /// Draft a reply from the mood, the message and any retrieved facts.
    ///
    /// `facts` is empty for direct replies.
    fn render(&self, mood: Mood, message: &str, facts: &[FactRecord]) -> KeepsakeResult<String>;

    /// Draft a reply presenting a suggestion.
    fn render_suggestion(
        &self,
        mood: Mood,
        message: &str,
        suggestion: &Suggestion,
    ) -> KeepsakeResult<String> {
        let _ = (mood, message);
        Ok(format!("{}\n\n{}", suggestion.title, suggestion.description))
    }

    /// Draft an unsolicited message after a silence window.
    fn render_outreach(&self, event: &OutreachEvent) -> KeepsakeResult<String> {
        let _ = event;
        Ok("Still there? I'm around whenever you want to talk.".to_string())
    }
}
