//! Tunable parser settings.

use serde::{Deserialize, Serialize};

use crate::rows::DEFAULT_ROW_THRESHOLD;
use crate::types::{Confidence, TimeOfDay, TimeSlot};

/// Settings for one [`TimetableParser`](crate::TimetableParser).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Vertical tolerance for grouping tokens into rows, normalised.
    pub row_threshold: f64,

    /// Tokens above this normalised `y` are header candidates.
    pub header_band: f64,

    /// Band used instead when nothing time-like sits inside `header_band`.
    pub widened_header_band: f64,

    /// Number of leading tokens the metadata extractor reads.
    pub metadata_token_limit: usize,

    /// Confidence given to entries read from a classified table.
    pub table_confidence: Confidence,

    /// Confidence given to entries read from an unclassified table.
    pub generic_confidence: Confidence,

    pub default_blocks: DefaultBlockPolicy,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            row_threshold: DEFAULT_ROW_THRESHOLD,
            header_band: 0.35,
            widened_header_band: 0.5,
            metadata_token_limit: 10,
            table_confidence: Confidence::clamped(0.85),
            generic_confidence: Confidence::clamped(0.7),
            default_blocks: DefaultBlockPolicy::default(),
        }
    }
}

/// Fixed daily blocks added to every day that has entries.
///
/// The defaults describe one primary school's day (registration, morning
/// break, lunch, end-of-day story). Timetables from elsewhere should turn
/// this off or supply their own blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultBlockPolicy {
    pub enabled: bool,
    pub confidence: Confidence,
    pub blocks: Vec<CanonicalBlock>,
}

impl Default for DefaultBlockPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            confidence: Confidence::clamped(0.7),
            blocks: CanonicalBlock::school_day(),
        }
    }
}

impl DefaultBlockPolicy {
    /// A policy that never injects anything.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

/// One canonical block and the words that show it is already present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalBlock {
    pub activity: String,
    pub start: TimeOfDay,
    pub end: TimeOfDay,
    /// Words or phrases; an overlapping entry whose activity contains any of
    /// them as whole words counts as this block.
    pub keywords: Vec<String>,
}

impl CanonicalBlock {
    fn new(activity: &str, start: (u32, u32), end: (u32, u32), keywords: &[&str]) -> Option<Self> {
        Some(Self {
            activity: activity.to_string(),
            start: TimeOfDay::new(start.0, start.1)?,
            end: TimeOfDay::new(end.0, end.1)?,
            keywords: keywords.iter().map(ToString::to_string).collect(),
        })
    }

    /// Registration, break, lunch and storytime.
    #[must_use]
    pub fn school_day() -> Vec<Self> {
        [
            Self::new(
                "Registration and Early Morning Work",
                (8, 35),
                (8, 50),
                &["registration", "register", "early morning"],
            ),
            Self::new("Break", (10, 20), (10, 35), &["break", "playtime", "recess"]),
            Self::new("Lunch", (12, 0), (13, 0), &["lunch"]),
            Self::new("Storytime", (15, 0), (15, 15), &["story", "storytime"]),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// The block's window as a time slot.
    #[must_use]
    pub fn slot(&self) -> TimeSlot {
        TimeSlot::range(
            self.start,
            self.end,
            format!("{}-{}", self.start, self.end),
        )
    }

    /// Whether `activity` names this block.
    ///
    /// Case-insensitive, on whole words: "break" matches "Lunch Break" but
    /// not "Breakfast Club".
    #[must_use]
    pub fn matches(&self, activity: &str) -> bool {
        let activity = words(activity);
        self.keywords.iter().any(|keyword| {
            let phrase = words(keyword);
            !phrase.is_empty()
                && activity
                    .windows(phrase.len())
                    .any(|window| window == phrase.as_slice())
        })
    }
}

fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ParserConfig::default();
        assert!((config.row_threshold - 0.02).abs() < f64::EPSILON);
        assert_eq!(config.metadata_token_limit, 10);
        assert!(config.default_blocks.enabled);
        assert_eq!(config.default_blocks.blocks.len(), 4);
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let config: ParserConfig =
            serde_json::from_str(r#"{"default_blocks": {"enabled": false}}"#).unwrap();
        assert!(!config.default_blocks.enabled);
        assert_eq!(config.default_blocks.blocks.len(), 4);
        assert_eq!(config.metadata_token_limit, 10);
    }

    #[test]
    fn block_keywords_match_case_insensitively() {
        let lunch = &CanonicalBlock::school_day()[2];
        assert!(lunch.matches("Lunch Break"));
        assert!(!lunch.matches("Maths"));
        assert_eq!(lunch.slot().to_string(), "12:00-13:00");
    }

    #[test]
    fn block_keywords_match_whole_words_only() {
        let blocks = CanonicalBlock::school_day();
        let (registration, playtime, story) = (&blocks[0], &blocks[1], &blocks[3]);
        assert!(story.matches("Storytime"));
        assert!(story.matches("Class story"));
        assert!(!story.matches("History"));
        assert!(playtime.matches("Morning break"));
        assert!(!playtime.matches("Breakfast club"));
        assert!(registration.matches("Early morning work"));
        assert!(!registration.matches("Morning"));
        assert!(registration.matches(&registration.activity));
    }
}
