//! Mood classifier trait.

use crate::error::KeepsakeResult;
use crate::types::MoodReading;

/// Classifies the emotional tone of a message.
///
/// Implementations may fail (a remote model being down, for example); the
/// router then continues with [`MoodReading::neutral`].
#[cfg_attr(test, mockall::automock)]
pub trait MoodClassifier: Send + Sync {
    /// Classify a message.
    fn classify(&self, text: &str) -> KeepsakeResult<MoodReading>;
}
