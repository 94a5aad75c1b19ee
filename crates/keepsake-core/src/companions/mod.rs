//! Reference collaborators for the conversation core.
//!
//! These cover the external contracts with simple, deterministic
//! implementations: keyword mood detection, a regex content filter, a fixed
//! activity catalog and template wording. Any of them can be swapped for a
//! model-backed implementation through the traits in [`crate::traits`].

mod mood;
mod renderer;
mod safety;
mod suggestions;

pub use mood::KeywordMoodClassifier;
pub use renderer::{DayPart, TemplateRenderer};
pub use safety::{PatternContentFilter, SafetyIssue, SafetyReport, Strictness};
pub use suggestions::SuggestionCatalog;
