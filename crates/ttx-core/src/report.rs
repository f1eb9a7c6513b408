//! Quality checks and statistics over a finished document.

use std::fmt;

use crate::document::{TimetableDocument, TimetableEntry};
use crate::weekday::Weekday;

/// Scores below this count as low confidence.
pub const LOW_CONFIDENCE: f32 = 0.5;

/// Scores at or above this count as high confidence.
pub const HIGH_CONFIDENCE: f32 = 0.8;

/// Number of entries shown in a summary.
pub const SAMPLE_SIZE: usize = 3;

/// A problem worth showing to whoever reviews an extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Issue {
    NoEntries,
    MissingWeekday(usize),
    MissingTimeslot(usize),
    LowConfidence(usize),
    ShortActivity(usize),
    NoClassName,
    NoTeacherName,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoEntries => write!(f, "No timetable entries were extracted"),
            Self::MissingWeekday(n) => write!(f, "{n} entries missing weekday information"),
            Self::MissingTimeslot(n) => write!(f, "{n} entries missing timeslot information"),
            Self::LowConfidence(n) => write!(f, "{n} entries have low confidence (< 50%)"),
            Self::ShortActivity(n) => write!(f, "{n} entries have very short activity text"),
            Self::NoClassName => write!(f, "Class name not detected"),
            Self::NoTeacherName => write!(f, "Teacher name not detected"),
        }
    }
}

/// Lists the document's quality issues. An empty list means nothing stood
/// out; an empty document reports only [`Issue::NoEntries`].
#[must_use]
pub fn validate_document(document: &TimetableDocument) -> Vec<Issue> {
    if document.is_empty() {
        return vec![Issue::NoEntries];
    }

    let count = |predicate: fn(&TimetableEntry) -> bool| {
        document.entries.iter().filter(|e| predicate(e)).count()
    };
    let counted: [(usize, fn(usize) -> Issue); 4] = [
        (count(|e| e.weekday.is_none()), Issue::MissingWeekday),
        (count(|e| e.timeslot.is_none()), Issue::MissingTimeslot),
        (
            count(|e| e.confidence.value() < LOW_CONFIDENCE),
            Issue::LowConfidence,
        ),
        (
            count(|e| e.activity.trim().chars().count() < 2),
            Issue::ShortActivity,
        ),
    ];

    let mut issues: Vec<Issue> = counted
        .into_iter()
        .filter(|(n, _)| *n > 0)
        .map(|(n, issue)| issue(n))
        .collect();
    if document.metadata.class_name.is_none() {
        issues.push(Issue::NoClassName);
    }
    if document.metadata.teacher_name.is_none() {
        issues.push(Issue::NoTeacherName);
    }
    issues
}

/// Statistics over the positive confidence scores of a document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceSummary {
    pub average: f32,
    pub min: f32,
    pub max: f32,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl ConfidenceSummary {
    /// Returns `None` when no entry has a positive score.
    #[must_use]
    #[expect(
        clippy::cast_precision_loss,
        reason = "entry counts are far below f32 precision limits"
    )]
    pub fn from_entries(entries: &[TimetableEntry]) -> Option<Self> {
        let scores: Vec<f32> = entries
            .iter()
            .map(|e| e.confidence.value())
            .filter(|&s| s > 0.0)
            .collect();
        if scores.is_empty() {
            return None;
        }

        let sum: f32 = scores.iter().sum();
        Some(Self {
            average: sum / scores.len() as f32,
            min: scores.iter().copied().fold(f32::INFINITY, f32::min),
            max: scores.iter().copied().fold(f32::NEG_INFINITY, f32::max),
            high: scores.iter().filter(|&&s| s >= HIGH_CONFIDENCE).count(),
            medium: scores
                .iter()
                .filter(|&&s| (LOW_CONFIDENCE..HIGH_CONFIDENCE).contains(&s))
                .count(),
            low: scores.iter().filter(|&&s| s < LOW_CONFIDENCE).count(),
        })
    }
}

/// Headline facts about a document.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSummary<'a> {
    pub total: usize,
    /// Entry counts for days that have entries, Monday first.
    pub per_day: Vec<(Weekday, usize)>,
    /// The first few entries in document order.
    pub sample: &'a [TimetableEntry],
}

impl<'a> DocumentSummary<'a> {
    #[must_use]
    pub fn of(document: &'a TimetableDocument) -> Self {
        let per_day = Weekday::ALL
            .iter()
            .map(|&day| (day, document.entries_for(day).count()))
            .filter(|(_, n)| *n > 0)
            .collect();
        Self {
            total: document.len(),
            per_day,
            sample: &document.entries[..document.len().min(SAMPLE_SIZE)],
        }
    }

    /// Entries not shown in the sample.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.total.saturating_sub(self.sample.len())
    }
}
