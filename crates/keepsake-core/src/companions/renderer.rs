//! Plain template renderer.

use chrono::{Local, Timelike};
use serde::{Deserialize, Serialize};
use strum::{Display, IntoStaticStr};

use crate::error::KeepsakeResult;
use crate::scheduler::OutreachEvent;
use crate::traits::{ResponseRenderer, Suggestion};
use crate::types::{Affect, FactRecord, Mood};

/// Steps shown when presenting a suggestion.
const MAX_STEPS: usize = 3;

/// Part of the day used to pick outreach wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DayPart {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl DayPart {
    /// Bucket an hour of the day (0-23).
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=11 => DayPart::Morning,
            12..=16 => DayPart::Afternoon,
            17..=20 => DayPart::Evening,
            _ => DayPart::Night,
        }
    }
}

/// Renders replies from fixed, neutral templates.
///
/// Memory replies quote the retrieved facts, suggestion replies list the
/// first few steps, and outreach lines depend on the local time of day.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateRenderer;

impl TemplateRenderer {
    pub fn new() -> Self {
        Self
    }

    fn mood_line(mood: Mood) -> &'static str {
        match mood {
            Mood::Happy => "You seem happy and cheerful!",
            Mood::Sad => "You seem a bit down. I'm here for you.",
            Mood::Stressed => "You seem stressed. Let's slow down for a moment.",
            Mood::Romantic => "You're in a romantic mood.",
            Mood::Playful => "You're being playful today!",
            Mood::Angry => "You seem upset. Want to talk about it?",
            Mood::Neutral => "I'm listening.",
        }
    }

    /// Outreach wording for a part of the day and the last detected mood.
    pub fn outreach_line(part: DayPart, last_mood: Mood) -> String {
        let base = match part {
            DayPart::Morning => "Good morning! How is your day starting?",
            DayPart::Afternoon => "Hey, did you get a chance to eat lunch?",
            DayPart::Evening => "How did your day go? I'd love to hear about it.",
            DayPart::Night => "Still awake? Don't sleep without saying good night.",
        };
        match last_mood.affect() {
            Affect::Negative => format!("{} I hope you're feeling a little better.", base),
            _ => base.to_string(),
        }
    }
}

fn sentence(text: &str) -> &str {
    text.trim().trim_end_matches(&['.', '!', '?'][..])
}

impl ResponseRenderer for TemplateRenderer {
    fn render(&self, mood: Mood, _message: &str, facts: &[FactRecord]) -> KeepsakeResult<String> {
        let mut text = Self::mood_line(mood).to_string();
        if let Some((top, rest)) = facts.split_first() {
            text.push_str(&format!(" I remember: {}.", sentence(&top.content)));
            for fact in rest {
                text.push_str(&format!(" Also, {}.", sentence(&fact.content)));
            }
        }
        Ok(text)
    }

    fn render_suggestion(
        &self,
        _mood: Mood,
        _message: &str,
        suggestion: &Suggestion,
    ) -> KeepsakeResult<String> {
        let mut text = format!(
            "How about this: {}. {}.",
            suggestion.title,
            sentence(&suggestion.description)
        );
        for (i, step) in suggestion.steps.iter().take(MAX_STEPS).enumerate() {
            text.push_str(&format!("\n{}. {}", i + 1, step));
        }
        Ok(text)
    }

    fn render_outreach(&self, event: &OutreachEvent) -> KeepsakeResult<String> {
        let hour = event.fired_at.with_timezone(&Local).hour();
        Ok(Self::outreach_line(DayPart::from_hour(hour), event.last_mood))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_parts() {
        assert_eq!(DayPart::from_hour(4), DayPart::Night);
        assert_eq!(DayPart::from_hour(5), DayPart::Morning);
        assert_eq!(DayPart::from_hour(12), DayPart::Afternoon);
        assert_eq!(DayPart::from_hour(17), DayPart::Evening);
        assert_eq!(DayPart::from_hour(21), DayPart::Night);
        assert_eq!(DayPart::from_hour(0), DayPart::Night);
    }

    #[test]
    fn test_memory_reply_cites_facts() {
        let facts = vec![
            FactRecord::new(2, "first_contact", "We met on a Friday message.", "2023-01-06"),
            FactRecord::new(4, "special_moments", "The rooftop night", "2023-03-02"),
        ];
        let text = TemplateRenderer::new()
            .render(Mood::Sad, "remember?", &facts)
            .unwrap();
        assert_eq!(
            text,
            "You seem a bit down. I'm here for you. I remember: We met on a Friday message. Also, The rooftop night."
        );
    }

    #[test]
    fn test_direct_reply() {
        let text = TemplateRenderer::new().render(Mood::Neutral, "ok", &[]).unwrap();
        assert_eq!(text, "I'm listening.");
    }

    #[test]
    fn test_suggestion_lists_three_steps() {
        let suggestion = Suggestion::new("Game Night", "Play games together")
            .with_steps(["one", "two", "three", "four"]);
        let text = TemplateRenderer::new()
            .render_suggestion(Mood::Happy, "yay", &suggestion)
            .unwrap();
        assert!(text.starts_with("How about this: Game Night. Play games together."));
        assert!(text.contains("\n3. three"));
        assert!(!text.contains("four"));
    }

    #[test]
    fn test_outreach_mentions_mood() {
        let line = TemplateRenderer::outreach_line(DayPart::Evening, Mood::Stressed);
        assert!(line.starts_with("How did your day go?"));
        assert!(line.ends_with("feeling a little better."));
        assert!(!TemplateRenderer::outreach_line(DayPart::Morning, Mood::Happy).contains("better"));
    }
}
