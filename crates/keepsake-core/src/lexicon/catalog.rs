//! Lexicon catalog loading, validation and lookup.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{KeepsakeError, KeepsakeResult};

/// Lexicon format version this build understands.
pub const LEXICON_VERSION: u32 = 1;

const BUILTIN_LEXICON: &str = include_str!("../../lexicon/default.toml");

/// A named topic group used to boost relevance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LexiconGroup {
    /// Group identifier.
    pub name: String,
    /// Phrases that activate the group when found in a query.
    pub trigger_phrases: Vec<String>,
    /// Fact categories receiving `boost` when the group is active.
    #[serde(default)]
    pub matching_categories: Vec<String>,
    /// Substrings that add a per-match increment when found in fact content.
    #[serde(default)]
    pub content_substrings: Vec<String>,
    /// Weight added once per active group for a matching category.
    pub boost: u32,
}

impl LexiconGroup {
    /// Whether any trigger phrase occurs in the lowercased query.
    pub fn is_triggered_by(&self, query_lower: &str) -> bool {
        self.trigger_phrases
            .iter()
            .any(|phrase| query_lower.contains(phrase.as_str()))
    }

    /// Whether `category` receives this group's boost.
    pub fn matches_category(&self, category: &str) -> bool {
        self.matching_categories.iter().any(|c| c == category)
    }

    /// Number of content substrings found in the lowercased content.
    pub fn content_hits(&self, content_lower: &str) -> usize {
        self.content_substrings
            .iter()
            .filter(|s| content_lower.contains(s.as_str()))
            .count()
    }
}

/// A priority rule that bypasses scoring for identity-class questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideRule {
    /// Rule identifier.
    pub name: String,
    /// Phrases that select this rule.
    pub trigger_phrases: Vec<String>,
    /// Categories whose facts are returned directly.
    pub categories: Vec<String>,
}

impl OverrideRule {
    /// Whether any trigger phrase occurs in the lowercased query.
    pub fn is_triggered_by(&self, query_lower: &str) -> bool {
        self.trigger_phrases
            .iter()
            .any(|phrase| query_lower.contains(phrase.as_str()))
    }
}

#[derive(Debug, Deserialize)]
struct LexiconFile {
    version: u32,
    #[serde(default)]
    overrides: Vec<OverrideRule>,
    #[serde(default)]
    groups: Vec<LexiconGroup>,
}

/// Immutable table of lexicon groups and override rules.
///
/// Phrases are stored lowercased; lookups expect callers to pass any casing.
#[derive(Debug, Clone)]
pub struct LexiconCatalog {
    version: u32,
    overrides: Vec<OverrideRule>,
    groups: Vec<LexiconGroup>,
}

impl LexiconCatalog {
    /// The lexicon shipped with the crate.
    pub fn builtin() -> KeepsakeResult<Self> {
        Self::from_toml_str(BUILTIN_LEXICON)
    }

    /// Load a lexicon from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> KeepsakeResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let catalog = Self::from_toml_str(&content)?;
        info!(
            path = %path.display(),
            groups = catalog.groups.len(),
            overrides = catalog.overrides.len(),
            "Loaded lexicon"
        );
        Ok(catalog)
    }

    /// Parse and validate a lexicon document.
    pub fn from_toml_str(content: &str) -> KeepsakeResult<Self> {
        let file: LexiconFile = toml::from_str(content)?;
        Self::new(file.version, file.overrides, file.groups)
    }

    /// Build a catalog from parts, validating every entry.
    pub fn new(
        version: u32,
        overrides: Vec<OverrideRule>,
        groups: Vec<LexiconGroup>,
    ) -> KeepsakeResult<Self> {
        if version != LEXICON_VERSION {
            return Err(KeepsakeError::Configuration(format!(
                "Unsupported lexicon version {} (expected {})",
                version, LEXICON_VERSION
            )));
        }

        let mut names = HashSet::new();
        let groups = groups
            .into_iter()
            .map(|group| {
                check_entry(&mut names, &group.name, &group.trigger_phrases)?;
                if group.boost == 0 {
                    return Err(KeepsakeError::Configuration(format!(
                        "Lexicon group '{}' must have a positive boost",
                        group.name
                    )));
                }
                Ok(LexiconGroup {
                    trigger_phrases: lowercase_all(group.trigger_phrases),
                    content_substrings: lowercase_all(group.content_substrings),
                    ..group
                })
            })
            .collect::<KeepsakeResult<Vec<_>>>()?;

        let overrides = overrides
            .into_iter()
            .map(|rule| {
                check_entry(&mut names, &rule.name, &rule.trigger_phrases)?;
                if rule.categories.is_empty() {
                    return Err(KeepsakeError::Configuration(format!(
                        "Override rule '{}' names no categories",
                        rule.name
                    )));
                }
                Ok(OverrideRule {
                    trigger_phrases: lowercase_all(rule.trigger_phrases),
                    ..rule
                })
            })
            .collect::<KeepsakeResult<Vec<_>>>()?;

        debug!(
            groups = groups.len(),
            overrides = overrides.len(),
            "Lexicon validated"
        );

        Ok(Self {
            version,
            overrides,
            groups,
        })
    }

    /// Format version of the loaded lexicon.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// All groups in declaration order.
    pub fn groups(&self) -> &[LexiconGroup] {
        &self.groups
    }

    /// All override rules in declaration order.
    pub fn overrides(&self) -> &[OverrideRule] {
        &self.overrides
    }

    /// Groups activated by `query`, in declaration order.
    pub fn activated_groups(&self, query: &str) -> Vec<&LexiconGroup> {
        let query_lower = query.to_lowercase();
        self.groups
            .iter()
            .filter(|g| g.is_triggered_by(&query_lower))
            .collect()
    }

    /// The first override rule matched by `query`, if any.
    pub fn override_for(&self, query: &str) -> Option<&OverrideRule> {
        let query_lower = query.to_lowercase();
        self.overrides
            .iter()
            .find(|rule| rule.is_triggered_by(&query_lower))
    }

    /// Smallest group boost, `None` for a catalog without groups.
    pub fn min_boost(&self) -> Option<u32> {
        self.groups.iter().map(|g| g.boost).min()
    }
}

fn check_entry(
    names: &mut HashSet<String>,
    name: &str,
    triggers: &[String],
) -> KeepsakeResult<()> {
    if name.trim().is_empty() {
        return Err(KeepsakeError::Configuration(
            "Lexicon entry with empty name".to_string(),
        ));
    }
    if !names.insert(name.to_string()) {
        return Err(KeepsakeError::Configuration(format!(
            "Duplicate lexicon entry '{}'",
            name
        )));
    }
    if triggers.is_empty() || triggers.iter().any(|t| t.trim().is_empty()) {
        return Err(KeepsakeError::Configuration(format!(
            "Lexicon entry '{}' needs non-empty trigger phrases",
            name
        )));
    }
    Ok(())
}

fn lowercase_all(values: Vec<String>) -> Vec<String> {
    values.into_iter().map(|v| v.to_lowercase()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(name: &str, triggers: &[&str], boost: u32) -> LexiconGroup {
        LexiconGroup {
            name: name.to_string(),
            trigger_phrases: triggers.iter().map(|s| s.to_string()).collect(),
            matching_categories: vec![name.to_string()],
            content_substrings: Vec::new(),
            boost,
        }
    }

    #[test]
    fn test_builtin_lexicon_loads() {
        let catalog = LexiconCatalog::builtin().unwrap();
        assert_eq!(catalog.version(), LEXICON_VERSION);
        assert!(catalog.groups().iter().any(|g| g.name == "first_contact"));
        assert!(catalog.overrides().iter().any(|r| r.name == "identity"));
    }

    #[test]
    fn test_multiple_groups_activate() {
        let catalog = LexiconCatalog::builtin().unwrap();
        let names: Vec<_> = catalog
            .activated_groups("Do you REMEMBER our first dinner date?")
            .iter()
            .map(|g| g.name.as_str())
            .collect();
        assert!(names.contains(&"first_contact"));
        assert!(names.contains(&"first_date"));
        assert!(names.contains(&"special_moments"));
    }

    #[test]
    fn test_no_group_for_unrelated_query() {
        let catalog = LexiconCatalog::builtin().unwrap();
        assert!(catalog.activated_groups("ok").is_empty());
        assert!(catalog.activated_groups("").is_empty());
    }

    #[test]
    fn test_override_lookup_case_insensitive() {
        let catalog = LexiconCatalog::builtin().unwrap();
        let rule = catalog.override_for("Hey, WHO IS MY GIRLFRIEND?").unwrap();
        assert_eq!(rule.categories, vec!["identity".to_string()]);
        assert!(catalog.override_for("who is coming tonight").is_none());
    }

    #[test]
    fn test_phrases_are_lowercased_on_load() {
        let catalog =
            LexiconCatalog::new(LEXICON_VERSION, Vec::new(), vec![group("stars", &["ORION"], 5)])
                .unwrap();
        assert_eq!(catalog.activated_groups("look, orion!").len(), 1);
    }

    #[test]
    fn test_rejects_unknown_version() {
        let err = LexiconCatalog::from_toml_str("version = 7\n").unwrap_err();
        assert!(matches!(err, KeepsakeError::Configuration(_)));
    }

    #[test]
    fn test_rejects_zero_boost() {
        let result = LexiconCatalog::new(LEXICON_VERSION, Vec::new(), vec![group("a", &["x"], 0)]);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_duplicate_names() {
        let result = LexiconCatalog::new(
            LEXICON_VERSION,
            Vec::new(),
            vec![group("a", &["x"], 5), group("a", &["y"], 5)],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_empty_triggers() {
        let result = LexiconCatalog::new(LEXICON_VERSION, Vec::new(), vec![group("a", &[], 5)]);
        assert!(result.is_err());

        let rule = OverrideRule {
            name: "identity".to_string(),
            trigger_phrases: vec!["who is".to_string()],
            categories: Vec::new(),
        };
        assert!(LexiconCatalog::new(LEXICON_VERSION, vec![rule], Vec::new()).is_err());
    }

    #[test]
    fn test_malformed_toml() {
        let err = LexiconCatalog::from_toml_str("version = ").unwrap_err();
        assert!(matches!(err, KeepsakeError::Configuration(_)));
    }
}
