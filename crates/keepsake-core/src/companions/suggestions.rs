//! Built-in catalog of shared-activity ideas.

use crate::error::KeepsakeResult;
use crate::traits::{Suggestion, SuggestionProvider};
use crate::types::Mood;

const UPBEAT_IDEAS: &[&str] = &["game_night", "cooking_together"];
const ROMANTIC_IDEAS: &[&str] = &["movie_night", "stargazing"];
const CALMING_IDEAS: &[&str] = &["stargazing", "museum_tour"];
const COMFORT_IDEAS: &[&str] = &["movie_night", "cooking_together"];

/// Activity ideas keyed by a short identifier.
#[derive(Debug, Clone)]
pub struct SuggestionCatalog {
    ideas: Vec<(String, Suggestion)>,
}

impl Default for SuggestionCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl SuggestionCatalog {
    /// An empty catalog.
    pub fn empty() -> Self {
        Self { ideas: Vec::new() }
    }

    /// The stock long-distance activity ideas.
    pub fn builtin() -> Self {
        Self::empty()
            .with_idea(
                "movie_night",
                Suggestion::new("Movie Night", "Watch a movie together over video call")
                    .with_steps([
                        "Pick a movie you both want to watch",
                        "Start a video call",
                        "Hit play at the same time",
                        "Share reactions and commentary",
                    ])
                    .with_tips(["Have the same snacks", "Dim the lights for a cozy feel"]),
            )
            .with_idea(
                "cooking_together",
                Suggestion::new("Cook Together", "Make the same recipe together over video")
                    .with_steps([
                        "Choose a recipe you both like",
                        "Get the same ingredients",
                        "Start the call in the kitchen",
                        "Cook step by step and eat together",
                    ])
                    .with_tips(["Try a favorite dish", "Set the table nicely"]),
            )
            .with_idea(
                "stargazing",
                Suggestion::new("Virtual Stargazing", "Look at the stars together")
                    .with_steps([
                        "Check the weather for clear skies",
                        "Open a stargazing app",
                        "Go outside at the same time",
                        "Stay on the call and share what you see",
                    ])
                    .with_tips(["Learn a constellation together", "Talk about the future"]),
            )
            .with_idea(
                "game_night",
                Suggestion::new("Online Game Night", "Play games together")
                    .with_steps([
                        "Choose an online multiplayer game",
                        "Set up voice chat",
                        "Play a few rounds",
                        "Loser does something sweet for the winner",
                    ])
                    .with_tips(["Keep it fun, not too competitive"]),
            )
            .with_idea(
                "museum_tour",
                Suggestion::new("Virtual Museum Tour", "Explore world museums online")
                    .with_steps([
                        "Pick a museum with an online collection",
                        "Screen share on a video call",
                        "Explore the exhibits together",
                    ])
                    .with_tips(["Each pick a favorite piece"]),
            )
    }

    /// Add or replace an idea.
    pub fn with_idea(mut self, key: impl Into<String>, suggestion: Suggestion) -> Self {
        let key = key.into();
        match self.ideas.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = suggestion,
            None => self.ideas.push((key, suggestion)),
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&Suggestion> {
        self.ideas.iter().find(|(k, _)| k == key).map(|(_, s)| s)
    }

    pub fn len(&self) -> usize {
        self.ideas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ideas.is_empty()
    }

    fn keys_for(mood: Mood) -> Option<&'static [&'static str]> {
        match mood {
            Mood::Happy | Mood::Playful => Some(UPBEAT_IDEAS),
            Mood::Romantic => Some(ROMANTIC_IDEAS),
            Mood::Stressed => Some(CALMING_IDEAS),
            Mood::Sad => Some(COMFORT_IDEAS),
            Mood::Angry | Mood::Neutral => None,
        }
    }

    /// Ideas that suit `mood`, best first. Moods without a mapping get the
    /// whole catalog.
    pub fn ideas_for(&self, mood: Mood) -> Vec<&Suggestion> {
        match Self::keys_for(mood) {
            Some(keys) => keys.iter().filter_map(|k| self.get(k)).collect(),
            None => self.ideas.iter().map(|(_, s)| s).collect(),
        }
    }
}

impl SuggestionProvider for SuggestionCatalog {
    fn suggest_for(&self, mood: Mood) -> KeepsakeResult<Option<Suggestion>> {
        Ok(self.ideas_for(mood).first().map(|s| (*s).clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mood_mapping() {
        let catalog = SuggestionCatalog::builtin();
        let titles = |mood| {
            catalog
                .ideas_for(mood)
                .iter()
                .map(|s| s.title.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(titles(Mood::Playful), vec!["Online Game Night", "Cook Together"]);
        assert_eq!(titles(Mood::Stressed), vec!["Virtual Stargazing", "Virtual Museum Tour"]);
        assert_eq!(titles(Mood::Neutral).len(), 5);
    }

    #[test]
    fn test_suggest_first_match() {
        let catalog = SuggestionCatalog::builtin();
        let idea = catalog.suggest_for(Mood::Happy).unwrap().unwrap();
        assert_eq!(idea.title, "Online Game Night");
        assert!(!idea.steps.is_empty());
    }

    #[test]
    fn test_empty_catalog_suggests_nothing() {
        let catalog = SuggestionCatalog::empty();
        assert!(catalog.suggest_for(Mood::Happy).unwrap().is_none());
        assert!(catalog.suggest_for(Mood::Neutral).unwrap().is_none());
    }

    #[test]
    fn test_with_idea_replaces() {
        let catalog = SuggestionCatalog::builtin()
            .with_idea("game_night", Suggestion::new("Chess", "A quiet game of chess"));
        assert_eq!(catalog.len(), 5);
        assert_eq!(catalog.suggest_for(Mood::Playful).unwrap().unwrap().title, "Chess");
    }
}
