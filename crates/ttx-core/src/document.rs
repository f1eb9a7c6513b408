//! Timetable entries and the document they are collected into.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Confidence, TimeSlot};
use crate::weekday::Weekday;

/// One scheduled activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimetableEntry {
    /// Absent only while a builder has not yet assigned a day.
    pub weekday: Option<Weekday>,

    pub timeslot: Option<TimeSlot>,

    pub activity: String,

    #[serde(default)]
    pub notes: Option<String>,

    #[serde(default)]
    pub subject: Option<String>,

    #[serde(default)]
    pub location: Option<String>,

    #[serde(rename = "confidence_score", default)]
    pub confidence: Confidence,
}

impl TimetableEntry {
    /// Creates an entry with no notes, subject or location.
    #[must_use]
    pub fn new(
        weekday: Weekday,
        timeslot: Option<TimeSlot>,
        activity: impl Into<String>,
        confidence: Confidence,
    ) -> Self {
        Self {
            weekday: Some(weekday),
            timeslot,
            activity: activity.into(),
            notes: None,
            subject: None,
            location: None,
            confidence,
        }
    }

    /// Resolved start time, if any.
    #[must_use]
    pub fn start(&self) -> Option<crate::TimeOfDay> {
        self.timeslot.as_ref().and_then(|slot| slot.start)
    }

    /// Resolved end time, if any.
    #[must_use]
    pub fn end(&self) -> Option<crate::TimeOfDay> {
        self.timeslot.as_ref().and_then(|slot| slot.end)
    }
}

/// Document-level facts read from the page header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub class_name: Option<String>,
    pub teacher_name: Option<String>,
    pub term: Option<String>,
    pub school_name: Option<String>,
}

/// The result of one parse.
///
/// Entries are not required to be unique; the post-processor rebuilds the
/// sequence per weekday.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimetableDocument {
    /// Identifier of the source file.
    #[serde(alias = "file_path")]
    pub source: String,

    #[serde(default)]
    pub metadata: DocumentMetadata,

    /// Wall-clock time of extraction. Not semantic; excluded from comparisons
    /// in tests.
    #[serde(rename = "extraction_timestamp")]
    pub extracted_at: DateTime<Utc>,

    #[serde(default)]
    pub entries: Vec<TimetableEntry>,
}

impl TimetableDocument {
    /// Creates an empty document stamped with the current time.
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            metadata: DocumentMetadata::default(),
            extracted_at: Utc::now(),
            entries: Vec::new(),
        }
    }

    /// Entries for one weekday, in document order.
    pub fn entries_for(&self, weekday: Weekday) -> impl Iterator<Item = &TimetableEntry> {
        self.entries
            .iter()
            .filter(move |entry| entry.weekday == Some(weekday))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
