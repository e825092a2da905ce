//! Recurrence tagging from transaction text
//!
//! Rules are grouped by frequency and visited in a fixed order: every monthly
//! rule first, then weekly, then daily. Within a frequency, rules are tried in
//! list order. The first rule whose pattern matches the joined
//! `description merchant` text decides the tag.
//!
//! This is a vocabulary heuristic. It does not look at transaction history, so a
//! tag means "the text sounds recurring", not "this charge was observed to
//! repeat". Patterns match anywhere in the text, so `emi` also fires on
//! "premium" and `rent` on "current".

use std::sync::OnceLock;

use regex::{Regex, RegexBuilder};

use crate::error::Result;
use crate::models::{Frequency, RecurrenceTag};

/// Recurrence patterns, in match order
pub const RECURRENCE_PATTERNS: &[(Frequency, &[&str])] = &[
    (
        Frequency::Monthly,
        &[
            "rent",
            "emi",
            "salary",
            "monthly",
            "subscription",
            "netflix",
            "prime",
            "spotify",
        ],
    ),
    (Frequency::Weekly, &["weekly", "allowance"]),
    (Frequency::Daily, &["daily", "commute"]),
];

/// A compiled, case-insensitive recurrence rule
#[derive(Debug, Clone)]
pub struct RecurrenceRule {
    pub frequency: Frequency,
    source: String,
    regex: Regex,
}

impl RecurrenceRule {
    pub fn new(frequency: Frequency, source: &str) -> Result<Self> {
        let regex = RegexBuilder::new(source).case_insensitive(true).build()?;
        Ok(Self {
            frequency,
            source: source.to_string(),
            regex,
        })
    }

    /// Pattern source as written in the table
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Regex-literal form stored on tagged transactions
    pub fn descriptor(&self) -> String {
        format!("/{}/i", self.source)
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

/// Ordered recurrence rule list
#[derive(Debug, Clone)]
pub struct RecurrenceDetector {
    rules: Vec<RecurrenceRule>,
}

impl Default for RecurrenceDetector {
    fn default() -> Self {
        builtin().clone()
    }
}

impl RecurrenceDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile a table; frequencies and patterns keep their given order
    pub fn from_table(table: &[(Frequency, &[&str])]) -> Result<Self> {
        let mut rules = Vec::new();
        for (frequency, patterns) in table {
            for pattern in patterns.iter() {
                rules.push(RecurrenceRule::new(*frequency, pattern)?);
            }
        }
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[RecurrenceRule] {
        &self.rules
    }

    /// Tag from the first matching rule, or `None`
    pub fn detect(&self, description: &str, merchant: &str) -> Option<RecurrenceTag> {
        let text = format!("{} {}", description, merchant).to_lowercase();

        self.rules
            .iter()
            .find(|rule| rule.is_match(&text))
            .map(|rule| RecurrenceTag {
                frequency: rule.frequency,
                pattern: rule.descriptor(),
            })
    }
}

fn builtin() -> &'static RecurrenceDetector {
    static BUILTIN: OnceLock<RecurrenceDetector> = OnceLock::new();
    BUILTIN.get_or_init(|| {
        RecurrenceDetector::from_table(RECURRENCE_PATTERNS).expect("valid regex")
    })
}

/// Detect recurrence with the built-in rule table
pub fn detect_recurrence(description: &str, merchant: &str) -> Option<RecurrenceTag> {
    builtin().detect(description, merchant)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monthly_netflix_subscription() {
        // "monthly" is tested before "subscription" and "netflix"
        let tag = detect_recurrence("Monthly Netflix subscription", "").unwrap();
        assert_eq!(tag.frequency, Frequency::Monthly);
        assert_eq!(tag.pattern, "/monthly/i");
    }

    #[test]
    fn test_netflix_alone() {
        let tag = detect_recurrence("NETFLIX.COM", "Netflix").unwrap();
        assert_eq!(tag.frequency, Frequency::Monthly);
        assert_eq!(tag.pattern, "/netflix/i");
    }

    #[test]
    fn test_weekly_and_daily() {
        let tag = detect_recurrence("Pocket money", "Weekly allowance").unwrap();
        assert_eq!(tag.frequency, Frequency::Weekly);
        assert_eq!(tag.pattern, "/weekly/i");

        let tag = detect_recurrence("Office commute", "Metro").unwrap();
        assert_eq!(tag.frequency, Frequency::Daily);
        assert_eq!(tag.pattern, "/commute/i");
    }

    #[test]
    fn test_frequency_order_beats_pattern_order() {
        // Contains a daily word and a monthly word; monthly is visited first
        let tag = detect_recurrence("Daily rent top-up", "").unwrap();
        assert_eq!(tag.frequency, Frequency::Monthly);
        assert_eq!(tag.pattern, "/rent/i");
    }

    #[test]
    fn test_no_recurrence() {
        assert!(detect_recurrence("Swiggy order", "Swiggy").is_none());
    }

    #[test]
    fn test_substring_heuristic() {
        let tag = detect_recurrence("Spotify Premium", "").unwrap();
        // "premium" contains "emi", which precedes "spotify"
        assert_eq!(tag.pattern, "/emi/i");
    }

    #[test]
    fn test_custom_table_and_invalid_pattern() {
        let detector =
            RecurrenceDetector::from_table(&[(Frequency::Weekly, &[r"every\s+friday"])]).unwrap();
        let tag = detector.detect("Paid EVERY Friday", "").unwrap();
        assert_eq!(tag.frequency, Frequency::Weekly);
        assert_eq!(tag.pattern, r"/every\s+friday/i");

        assert!(RecurrenceDetector::from_table(&[(Frequency::Daily, &["("])]).is_err());
    }

    #[test]
    fn test_builtin_rule_order() {
        let detector = RecurrenceDetector::new();
        let frequencies: Vec<Frequency> = detector.rules().iter().map(|r| r.frequency).collect();
        assert_eq!(frequencies.first(), Some(&Frequency::Monthly));
        assert_eq!(frequencies.last(), Some(&Frequency::Daily));
        assert_eq!(detector.rules().len(), 12);
        assert_eq!(detector.rules()[0].source(), "rent");
    }
}
