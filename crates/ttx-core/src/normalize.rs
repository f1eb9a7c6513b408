//! Activity text clean-up.

use regex::Regex;

use crate::document::TimetableEntry;

/// Separator written between merged activities.
pub const MERGE_SEPARATOR: &str = " / ";

/// Rewrites activity names to their canonical spelling and moves merged
/// extras into notes.
#[derive(Debug, Clone)]
pub struct ActivityNormalizer {
    synonyms: Vec<(Regex, &'static str)>,
}

impl Default for ActivityNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivityNormalizer {
    /// # Panics
    ///
    /// Never in practice: all patterns are fixed literals.
    #[must_use]
    pub fn new() -> Self {
        let table: [(&str, &str); 4] = [
            (r"(?i)\bmaths?\b", "Maths"),
            (r"(?i)\b(?:physical\s+education|phys\.?\s+ed|pe)\b", "PE"),
            (r"(?i)\b(?:religious\s+education|re)\b", "RE"),
            (r"(?i)\bcomp\b", "Computing"),
        ];
        Self {
            synonyms: table
                .into_iter()
                .map(|(pattern, replacement)| {
                    (
                        Regex::new(pattern).expect("synonym pattern is a valid regex"),
                        replacement,
                    )
                })
                .collect(),
        }
    }

    /// Collapses whitespace, drops NUL characters and applies synonyms.
    #[must_use]
    pub fn normalize_text(&self, text: &str) -> String {
        let cleaned = text
            .replace('\0', "")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        self.synonyms
            .iter()
            .fold(cleaned, |acc, (pattern, replacement)| {
                pattern.replace_all(&acc, *replacement).into_owned()
            })
    }

    /// Returns the entries with normalised activities.
    ///
    /// A merged activity (`"A / B"`) keeps `A` and moves the rest to notes,
    /// unless the entry already has notes.
    #[must_use]
    pub fn apply(&self, entries: Vec<TimetableEntry>) -> Vec<TimetableEntry> {
        entries
            .into_iter()
            .map(|mut entry| {
                entry.activity = self.normalize_text(&entry.activity);
                if entry.notes.is_none() {
                    if let Some((first, rest)) = entry.activity.split_once(MERGE_SEPARATOR) {
                        entry.notes = Some(rest.to_string());
                        entry.activity = first.to_string();
                    }
                }
                entry
            })
            .collect()
    }
}
