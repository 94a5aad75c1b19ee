//! Per-turn routing types.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use super::fact::FactRecord;
use super::mood::Mood;

/// A stage of the per-turn state machine.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RouteStage {
    Start,
    MoodDetected,
    DirectReply,
    MemoryReply,
    SuggestionReply,
    SafetyReviewed,
    Done,
}

/// The reply strategy chosen after mood detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyPath {
    Direct,
    Memory,
    Suggestion,
}

impl ReplyPath {
    /// The route stage that corresponds to this path.
    pub fn stage(&self) -> RouteStage {
        match self {
            ReplyPath::Direct => RouteStage::DirectReply,
            ReplyPath::Memory => RouteStage::MemoryReply,
            ReplyPath::Suggestion => RouteStage::SuggestionReply,
        }
    }
}

/// Working state for one message; dropped once the outcome is produced.
#[derive(Debug, Clone)]
pub struct ConversationTurn {
    /// The message as received.
    pub raw_message: String,
    /// Mood detected for the message.
    pub detected_mood: Mood,
    /// Facts retrieved for a memory reply, best first.
    pub retrieved_facts: Vec<FactRecord>,
    /// Stages visited so far.
    pub route_path: Vec<RouteStage>,
}

impl ConversationTurn {
    /// Begin a turn at [`RouteStage::Start`].
    pub fn start(message: impl Into<String>) -> Self {
        Self {
            raw_message: message.into(),
            detected_mood: Mood::Neutral,
            retrieved_facts: Vec::new(),
            route_path: vec![RouteStage::Start],
        }
    }

    /// Record a stage transition.
    pub fn visit(&mut self, stage: RouteStage) {
        self.route_path.push(stage);
    }
}

/// What the caller receives for one processed message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnOutcome {
    /// Reviewed text to show the user.
    pub final_text: String,
    /// Mood used for routing.
    pub mood: Mood,
    /// Facts the reply was drafted from.
    pub facts_used: Vec<FactRecord>,
    /// Every stage the turn passed through, in order.
    pub route_path: Vec<RouteStage>,
    /// Whether the content filter passed the final text.
    pub safe: bool,
    /// Score reported by the content filter (0 when it was unavailable).
    pub safety_score: u8,
}

impl TurnOutcome {
    /// Route path rendered as `start -> mood_detected -> ...`.
    pub fn route_summary(&self) -> String {
        self.route_path
            .iter()
            .map(|stage| stage.to_string())
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_starts_at_start() {
        let mut turn = ConversationTurn::start("hi");
        turn.visit(RouteStage::MoodDetected);
        assert_eq!(
            turn.route_path,
            vec![RouteStage::Start, RouteStage::MoodDetected]
        );
    }

    #[test]
    fn test_route_summary() {
        let outcome = TurnOutcome {
            final_text: "ok".to_string(),
            mood: Mood::Neutral,
            facts_used: Vec::new(),
            route_path: vec![RouteStage::Start, RouteStage::SafetyReviewed, RouteStage::Done],
            safe: true,
            safety_score: 100,
        };
        assert_eq!(outcome.route_summary(), "start -> safety_reviewed -> done");
    }

    #[test]
    fn test_reply_path_stage() {
        assert_eq!(ReplyPath::Memory.stage(), RouteStage::MemoryReply);
        assert_eq!(ReplyPath::Suggestion.stage(), RouteStage::SuggestionReply);
    }
}
