//! Regex-based style and appropriateness filter.
//!
//! Scores start at 100 and lose points per issue:
//! - each inappropriate pattern: -15
//! - each cringe pattern: -10
//! - each over-intense pattern: -8
//! - fewer than 20 characters: -10
//! - more than 30% capital letters: -5
//! - more than three `!`/`?`: -5
//!
//! A draft below the strictness threshold is auto-fixed and scored again.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::debug;

use crate::error::KeepsakeResult;
use crate::traits::{ContentFilter, FilterVerdict};

static INAPPROPRIATE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)\bsex\b").unwrap(),
        Regex::new(r"(?i)\bsexy\b").unwrap(),
        Regex::new(r"(?i)\bhot\b").unwrap(),
        Regex::new(r"(?i)\bbody\b").unwrap(),
        Regex::new(r"(?i)\bphysical\b.*\battraction\b").unwrap(),
    ]
});

static CRINGE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)m'lady").unwrap(),
        Regex::new(r"(?i)\*tips hat\*").unwrap(),
        Regex::new(r"(?i)\*blushes\*").unwrap(),
        Regex::new(r"(?i)uwu").unwrap(),
        Regex::new(r"(?i)owo").unwrap(),
        Regex::new(r"(?i)\*nuzzles\*").unwrap(),
        Regex::new(r"(?i)your highness").unwrap(),
        Regex::new(r"(?i)my queen").unwrap(),
    ]
});

static INTENSITY_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)\bdie for you\b").unwrap(),
        Regex::new(r"(?i)\bcan't live without\b").unwrap(),
        Regex::new(r"(?i)\bobsessed\b").unwrap(),
        Regex::new(r"(?i)\bcrazily\b").unwrap(),
        Regex::new(r"(?i)\bdie without you\b").unwrap(),
    ]
});

static ACTION_TEXT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*[^*]+\*").unwrap());
static REPEATED_BANG: Lazy<Regex> = Lazy::new(|| Regex::new(r"!{2,}").unwrap());
static REPEATED_QUESTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\?{2,}").unwrap());

const MIN_LENGTH: usize = 20;
const MAX_CAPS_RATIO: f64 = 0.3;
const MAX_MARKS: usize = 3;

/// How strictly drafts are judged.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Strictness {
    Low,
    #[default]
    Medium,
    High,
}

impl Strictness {
    /// Minimum passing score.
    pub fn threshold(&self) -> u8 {
        match self {
            Strictness::Low => 60,
            Strictness::Medium => 75,
            Strictness::High => 85,
        }
    }
}

/// A problem found in a draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyIssue {
    Inappropriate(usize),
    Cringe(usize),
    Intense(usize),
    TooShort,
    ExcessiveCaps,
    ExcessivePunctuation,
}

/// Score and issues for one piece of text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyReport {
    pub score: u8,
    pub passed: bool,
    pub issues: Vec<SafetyIssue>,
}

/// [`ContentFilter`] built on fixed regex families and simple style checks.
#[derive(Debug, Clone, Default)]
pub struct PatternContentFilter {
    strictness: Strictness,
}

impl PatternContentFilter {
    pub fn new(strictness: Strictness) -> Self {
        Self { strictness }
    }

    pub fn strictness(&self) -> Strictness {
        self.strictness
    }

    /// Score `text` without changing it.
    pub fn check(&self, text: &str) -> SafetyReport {
        let mut issues = Vec::new();
        let mut score: i32 = 100;

        let inappropriate = count_hits(&INAPPROPRIATE_PATTERNS, text);
        let cringe = count_hits(&CRINGE_PATTERNS, text);
        let intense = count_hits(&INTENSITY_PATTERNS, text);
        let penalties = [
            (inappropriate, 15, SafetyIssue::Inappropriate(inappropriate)),
            (cringe, 10, SafetyIssue::Cringe(cringe)),
            (intense, 8, SafetyIssue::Intense(intense)),
        ];
        for (hits, penalty, issue) in penalties {
            if hits > 0 {
                issues.push(issue);
                score -= hits as i32 * penalty;
            }
        }

        if text.trim().chars().count() < MIN_LENGTH {
            issues.push(SafetyIssue::TooShort);
            score -= 10;
        }

        let total = text.chars().count().max(1);
        let caps = text.chars().filter(|c| c.is_uppercase()).count();
        if caps as f64 / total as f64 > MAX_CAPS_RATIO {
            issues.push(SafetyIssue::ExcessiveCaps);
            score -= 5;
        }

        let marks = text.chars().filter(|c| *c == '!' || *c == '?').count();
        if marks > MAX_MARKS {
            issues.push(SafetyIssue::ExcessivePunctuation);
            score -= 5;
        }

        let score = score.clamp(0, 100) as u8;
        SafetyReport {
            score,
            passed: score >= self.strictness.threshold(),
            issues,
        }
    }

    /// Strip roleplay action text, collapse repeated marks and tone down
    /// shouted words.
    pub fn auto_fix(text: &str) -> String {
        let text = ACTION_TEXT.replace_all(text, "");
        let text = REPEATED_BANG.replace_all(&text, "!");
        let text = REPEATED_QUESTION.replace_all(&text, "?");

        text.split_whitespace()
            .map(|word| {
                if is_shouted(word) && word.chars().count() > 3 {
                    capitalize(word)
                } else {
                    word.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
            .trim()
            .to_string()
    }
}

fn count_hits(patterns: &[Regex], text: &str) -> usize {
    patterns.iter().filter(|p| p.is_match(text)).count()
}

fn is_shouted(word: &str) -> bool {
    word.chars().any(char::is_uppercase) && !word.chars().any(char::is_lowercase)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

impl ContentFilter for PatternContentFilter {
    fn review_and_fix(&self, text: &str) -> KeepsakeResult<FilterVerdict> {
        let report = self.check(text);
        if report.passed {
            return Ok(FilterVerdict::pass(text, report.score));
        }

        let fixed = Self::auto_fix(text);
        let fixed_report = self.check(&fixed);
        debug!(
            original_score = report.score,
            fixed_score = fixed_report.score,
            issues = ?report.issues,
            "Draft auto-fixed"
        );

        Ok(FilterVerdict {
            final_text: fixed,
            passed: fixed_report.passed,
            score: fixed_report.score,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_message_passes() {
        let filter = PatternContentFilter::default();
        let report = filter.check("I love you so much! You make every day better 💕");
        assert_eq!(report.score, 100);
        assert!(report.passed);
        assert!(report.issues.is_empty());
    }

    #[test]
    fn test_penalties_accumulate() {
        let filter = PatternContentFilter::default();
        let report = filter.check("*blushes* uwu my queen, I'm obsessed with you");
        // cringe x3 (-30), intense x1 (-8)
        assert_eq!(report.score, 62);
        assert!(!report.passed);
        assert!(report.issues.contains(&SafetyIssue::Cringe(3)));
        assert!(report.issues.contains(&SafetyIssue::Intense(1)));
    }

    #[test]
    fn test_style_checks() {
        let filter = PatternContentFilter::default();
        let report = filter.check("HEY!!!!");
        assert!(report.issues.contains(&SafetyIssue::TooShort));
        assert!(report.issues.contains(&SafetyIssue::ExcessiveCaps));
        assert!(report.issues.contains(&SafetyIssue::ExcessivePunctuation));
        assert_eq!(report.score, 80);
    }

    #[test]
    fn test_strictness_thresholds() {
        assert_eq!(Strictness::Low.threshold(), 60);
        assert_eq!(Strictness::Medium.threshold(), 75);
        assert_eq!(Strictness::High.threshold(), 85);
        assert_eq!("HIGH".parse::<Strictness>().unwrap(), Strictness::High);

        // cringe (-10) and short (-10)
        let text = "my queen ok";
        assert!(PatternContentFilter::new(Strictness::Low).check(text).passed);
        assert!(PatternContentFilter::new(Strictness::Medium).check(text).passed);
        assert!(!PatternContentFilter::new(Strictness::High).check(text).passed);
    }

    #[test]
    fn test_auto_fix() {
        let fixed = PatternContentFilter::auto_fix("*tips hat* Hello THERE friend!!! How are you??");
        assert_eq!(fixed, "Hello There friend! How are you?");
    }

    #[test]
    fn test_review_rewrites_failing_draft() {
        let filter = PatternContentFilter::new(Strictness::High);
        let verdict = filter
            .review_and_fix("*nuzzles* I MISSED YOU SO MUCH TODAY!!!!")
            .unwrap();
        assert_eq!(verdict.final_text, "I Missed YOU SO Much Today!");
        assert!(verdict.passed);
        assert_eq!(verdict.score, 95);
    }

    #[test]
    fn test_review_keeps_passing_draft() {
        let filter = PatternContentFilter::default();
        let text = "That sounds like a lovely plan for tonight.";
        let verdict = filter.review_and_fix(text).unwrap();
        assert_eq!(verdict.final_text, text);
        assert!(verdict.passed);
    }
}
