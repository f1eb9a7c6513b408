//! Core value types with validation.

use std::fmt;

use chrono::{NaiveTime, TimeDelta, Timelike};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Span assumed when an interval has a start but no usable end.
pub const DEFAULT_SPAN_MINUTES: i64 = 60;

/// Validation errors raised at construction boundaries.
///
/// The parsing pipeline itself never fails; these errors only decide which
/// producer records are skipped before parsing starts.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// The confidence value was out of range.
    #[error("confidence must be between 0.0 and 1.0, got {value}")]
    ConfidenceOutOfRange { value: f32 },

    /// The confidence value was missing or not a number.
    #[error("confidence is not numeric: {raw}")]
    NonNumericConfidence { raw: String },

    /// A bounding box that cannot describe a region.
    #[error("degenerate bounding box: {reason}")]
    DegenerateBox { reason: &'static str },
}

/// A confidence score in the range \[0.0, 1.0\].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Confidence(f32);

impl Confidence {
    /// The maximum confidence value (1.0).
    pub const MAX: Self = Self(1.0);

    /// The minimum confidence value (0.0).
    pub const MIN: Self = Self(0.0);

    /// Creates a new confidence value after validation.
    ///
    /// Returns an error if the value is outside \[0.0, 1.0\] or is NaN.
    pub fn new(value: f32) -> Result<Self, ValidationError> {
        if value.is_nan() || !(0.0..=1.0).contains(&value) {
            return Err(ValidationError::ConfidenceOutOfRange { value });
        }
        Ok(Self(value))
    }

    /// Creates a confidence value, clamping to \[0.0, 1.0\].
    ///
    /// NaN values become 0.0.
    #[must_use]
    pub const fn clamped(value: f32) -> Self {
        if value.is_nan() || value < 0.0 {
            Self(0.0)
        } else if value > 1.0 {
            Self(1.0)
        } else {
            Self(value)
        }
    }

    /// Returns the inner f32 value.
    #[must_use]
    pub const fn value(self) -> f32 {
        self.0
    }

    /// Returns the larger of two confidences.
    #[must_use]
    pub fn max(self, other: Self) -> Self {
        if other.0 > self.0 { other } else { self }
    }

    /// Mean of the given confidences, `None` when there are none.
    pub fn mean<I: IntoIterator<Item = Self>>(values: I) -> Option<Self> {
        let (sum, count) = values
            .into_iter()
            .fold((0.0_f32, 0_u16), |(sum, count), c| {
                (sum + c.0, count.saturating_add(1))
            });
        (count > 0).then(|| Self::clamped(sum / f32::from(count)))
    }
}

impl Default for Confidence {
    fn default() -> Self {
        Self::MIN
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl TryFrom<f32> for Confidence {
    type Error = ValidationError;

    fn try_from(value: f32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Confidence> for f32 {
    fn from(c: Confidence) -> Self {
        c.0
    }
}

impl Serialize for Confidence {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Confidence {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = f32::deserialize(deserializer)?;
        // Clamp on deserialization to be lenient with external data
        Ok(Self::clamped(value))
    }
}

/// A wall-clock time without date or timezone.
///
/// Serialized in ISO form (`"09:30:00"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeOfDay(NaiveTime);

impl TimeOfDay {
    /// Creates a time from hour (0-23) and minute (0-59).
    #[must_use]
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }

    #[must_use]
    pub fn hour(self) -> u32 {
        self.0.hour()
    }

    #[must_use]
    pub fn minute(self) -> u32 {
        self.0.minute()
    }

    /// Minutes elapsed since midnight.
    #[must_use]
    pub fn minutes_from_midnight(self) -> i64 {
        i64::from(self.hour() * 60 + self.minute())
    }

    /// Adds minutes, wrapping around midnight.
    #[must_use]
    pub fn plus_minutes(self, minutes: i64) -> Self {
        let (time, _) = self
            .0
            .overflowing_add_signed(TimeDelta::minutes(minutes));
        Self(time)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

/// A parsed or partially parsed time interval plus the text it came from.
///
/// When both ends are present the end lies after the start; constructors
/// replace an end at or before the start with a one-hour span.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeSlot {
    #[serde(rename = "start_time")]
    pub start: Option<TimeOfDay>,

    #[serde(rename = "end_time")]
    pub end: Option<TimeOfDay>,

    #[serde(default)]
    pub raw_text: String,
}

impl TimeSlot {
    /// A slot with both ends, correcting an end that is not after the start.
    #[must_use]
    pub fn range(start: TimeOfDay, end: TimeOfDay, raw_text: impl Into<String>) -> Self {
        Self {
            start: Some(start),
            end: Some(end_after(start, end)),
            raw_text: raw_text.into(),
        }
    }

    /// A slot with a start only.
    #[must_use]
    pub fn starting_at(start: TimeOfDay, raw_text: impl Into<String>) -> Self {
        Self {
            start: Some(start),
            end: None,
            raw_text: raw_text.into(),
        }
    }

    /// A slot that records time-like text it could not interpret.
    #[must_use]
    pub fn text_only(raw_text: impl Into<String>) -> Self {
        Self {
            start: None,
            end: None,
            raw_text: raw_text.into(),
        }
    }

    /// Whether a start time was resolved.
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        self.start.is_some()
    }

    /// Returns the slot with `end` filled in, keeping the start and text.
    ///
    /// Has no effect on a slot without a start.
    #[must_use]
    pub fn with_end(self, end: TimeOfDay) -> Self {
        match self.start {
            Some(start) => Self::range(start, end, self.raw_text),
            None => self,
        }
    }

    /// Whether two fully resolved slots share any time, treating both as
    /// half-open intervals.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        match (self.start, self.end, other.start, other.end) {
            (Some(a_start), Some(a_end), Some(b_start), Some(b_end)) => {
                a_start < b_end && b_start < a_end
            }
            _ => false,
        }
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.start, self.end) {
            (Some(start), Some(end)) => write!(f, "{start}-{end}"),
            _ => write!(f, "{}", self.raw_text),
        }
    }
}

/// Returns `end`, or `start` plus the default span when `end` is not after it.
#[must_use]
pub fn end_after(start: TimeOfDay, end: TimeOfDay) -> TimeOfDay {
    if end <= start {
        start.plus_minutes(DEFAULT_SPAN_MINUTES)
    } else {
        end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(hour: u32, minute: u32) -> TimeOfDay {
        TimeOfDay::new(hour, minute).unwrap()
    }

    #[test]
    fn confidence_validates_range() {
        assert!(Confidence::new(0.0).is_ok());
        assert!(Confidence::new(0.5).is_ok());
        assert!(Confidence::new(1.0).is_ok());
        assert!(Confidence::new(-0.1).is_err());
        assert!(Confidence::new(1.1).is_err());
        assert!(Confidence::new(f32::NAN).is_err());
    }

    #[test]
    #[expect(
        clippy::float_cmp,
        reason = "exact equality intended for boundary tests"
    )]
    fn confidence_clamped_handles_edge_cases() {
        assert_eq!(Confidence::clamped(-1.0).value(), 0.0);
        assert_eq!(Confidence::clamped(2.0).value(), 1.0);
        assert_eq!(Confidence::clamped(f32::NAN).value(), 0.0);
        assert_eq!(Confidence::clamped(0.5).value(), 0.5);
    }

    #[test]
    fn confidence_mean_and_max() {
        let values = [Confidence::clamped(0.5), Confidence::clamped(0.9)];
        let mean = Confidence::mean(values).unwrap();
        assert!((mean.value() - 0.7).abs() < 1e-6);
        assert!(Confidence::mean(Vec::new()).is_none());
        assert_eq!(values[0].max(values[1]), values[1]);
    }

    #[test]
    fn confidence_serde_clamps_out_of_range() {
        let parsed: Confidence = serde_json::from_str("1.5").unwrap();
        assert_eq!(parsed, Confidence::MAX);
    }

    #[test]
    fn time_of_day_rejects_invalid_values() {
        assert!(TimeOfDay::new(24, 0).is_none());
        assert!(TimeOfDay::new(9, 60).is_none());
        assert_eq!(t(9, 5).to_string(), "09:05");
    }

    #[test]
    fn plus_minutes_wraps_at_midnight() {
        assert_eq!(t(23, 30).plus_minutes(60), t(0, 30));
        assert_eq!(t(9, 45).plus_minutes(30), t(10, 15));
    }

    #[test]
    fn range_corrects_end_not_after_start() {
        let slot = TimeSlot::range(t(10, 0), t(9, 0), "10-9");
        assert_eq!(slot.end, Some(t(11, 0)));

        let slot = TimeSlot::range(t(10, 0), t(10, 0), "10-10");
        assert_eq!(slot.end, Some(t(11, 0)));
    }

    #[test]
    fn overlaps_is_half_open() {
        let a = TimeSlot::range(t(9, 0), t(9, 30), "");
        let b = TimeSlot::range(t(9, 30), t(10, 0), "");
        let c = TimeSlot::range(t(9, 15), t(9, 45), "");
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(!a.overlaps(&TimeSlot::text_only("am")));
    }

    #[test]
    fn time_slot_serializes_iso_times() {
        let slot = TimeSlot::range(t(9, 0), t(9, 30), "9:00-9:30");
        let json = serde_json::to_string(&slot).unwrap();
        assert_eq!(
            json,
            r#"{"start_time":"09:00:00","end_time":"09:30:00","raw_text":"9:00-9:30"}"#
        );
        let parsed: TimeSlot = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, slot);
    }

    #[test]
    fn display_prefers_resolved_range() {
        assert_eq!(
            TimeSlot::range(t(13, 0), t(14, 0), "1 - 2pm").to_string(),
            "13:00-14:00"
        );
        assert_eq!(TimeSlot::text_only("after lunch pm").to_string(), "after lunch pm");
    }
}
