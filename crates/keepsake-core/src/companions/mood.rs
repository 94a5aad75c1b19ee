//! Keyword-based mood classifier.

use tracing::trace;

use crate::error::KeepsakeResult;
use crate::traits::MoodClassifier;
use crate::types::{Mood, MoodReading};

/// Keyword hits at which intensity saturates.
const SATURATION_HITS: usize = 3;

/// Keywords per mood, in tie-break order.
const MOOD_KEYWORDS: &[(Mood, &[&str])] = &[
    (
        Mood::Happy,
        &["happy", "great", "wonderful", "amazing", "excited", "love", "yay", "😊", "😄", "❤️"],
    ),
    (
        Mood::Sad,
        &["sad", "miss", "lonely", "down", "unhappy", "cry", "😢", "😭"],
    ),
    (
        Mood::Stressed,
        &["stress", "tired", "exhausted", "overwhelm", "busy", "anxious", "😰", "😫"],
    ),
    (
        Mood::Romantic,
        &["love", "kiss", "hug", "cuddle", "romance", "date", "💕", "💖", "😘"],
    ),
    (
        Mood::Playful,
        &["haha", "lol", "fun", "play", "tease", "silly", "😜", "😝", "🤪"],
    ),
    (
        Mood::Angry,
        &["angry", "mad", "upset", "annoyed", "frustrated", "😠", "😡"],
    ),
];

/// Counts keyword hits per mood and picks the mood with the most.
///
/// Ties go to the mood listed first (happy, sad, stressed, romantic,
/// playful, angry). A message without hits is neutral.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordMoodClassifier;

impl KeywordMoodClassifier {
    pub fn new() -> Self {
        Self
    }

    fn hits(message_lower: &str, keywords: &[&str]) -> usize {
        keywords.iter().filter(|k| message_lower.contains(*k)).count()
    }
}

impl MoodClassifier for KeywordMoodClassifier {
    fn classify(&self, text: &str) -> KeepsakeResult<MoodReading> {
        let lower = text.to_lowercase();

        let mut best: Option<(Mood, usize)> = None;
        for (mood, keywords) in MOOD_KEYWORDS {
            let hits = Self::hits(&lower, keywords);
            if hits > 0 && best.map_or(true, |(_, top)| hits > top) {
                best = Some((*mood, hits));
            }
        }

        let reading = match best {
            Some((mood, hits)) => MoodReading::new(mood)
                .with_intensity(hits.min(SATURATION_HITS) as f32 / SATURATION_HITS as f32),
            None => MoodReading::neutral(),
        };
        trace!(mood = %reading.mood, "Classified message");
        Ok(reading)
    }
}
