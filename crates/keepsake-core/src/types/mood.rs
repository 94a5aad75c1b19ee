//! Mood labels and their affect classes.
//!
//! The router only cares about the affect class of a mood; the label itself
//! is passed through to the renderer and recorded on the turn outcome.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

use crate::error::{KeepsakeError, KeepsakeResult};

/// Emotional tone detected in a message.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    Happy,
    Sad,
    Stressed,
    Romantic,
    Playful,
    Angry,
    #[default]
    Neutral,
}

/// Coarse affect class driving route selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Affect {
    Negative,
    Positive,
    Neutral,
}

impl Mood {
    /// Affect class of this mood.
    pub fn affect(&self) -> Affect {
        match self {
            Mood::Sad | Mood::Stressed | Mood::Angry => Affect::Negative,
            Mood::Happy | Mood::Playful => Affect::Positive,
            Mood::Romantic | Mood::Neutral => Affect::Neutral,
        }
    }

    /// Parse a mood label, ignoring case.
    pub fn parse_label(label: &str) -> KeepsakeResult<Self> {
        label
            .trim()
            .parse()
            .map_err(|_| KeepsakeError::invalid_mood(label.trim()))
    }

    /// All mood labels as static strings.
    pub fn all_names() -> Vec<&'static str> {
        Self::iter().map(|m| m.into()).collect()
    }
}

/// Output of a mood classifier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoodReading {
    /// Detected mood label.
    pub mood: Mood,
    /// Optional intensity in [0, 1].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intensity: Option<f32>,
}

impl MoodReading {
    /// A reading without intensity.
    pub fn new(mood: Mood) -> Self {
        Self {
            mood,
            intensity: None,
        }
    }

    /// The reading used when classification is unavailable.
    pub fn neutral() -> Self {
        Self::new(Mood::Neutral)
    }

    /// Attach an intensity, clamped to [0, 1].
    pub fn with_intensity(mut self, intensity: f32) -> Self {
        self.intensity = Some(intensity.clamp(0.0, 1.0));
        self
    }
}
