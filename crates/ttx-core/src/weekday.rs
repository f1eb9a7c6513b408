//! Weekday enum and the alias table used to recognise day names in free text.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Days of the week, ordered Monday first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    /// All days in canonical order.
    pub const ALL: [Self; 7] = [
        Self::Monday,
        Self::Tuesday,
        Self::Wednesday,
        Self::Thursday,
        Self::Friday,
        Self::Saturday,
        Self::Sunday,
    ];

    /// Full English name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Monday => "Monday",
            Self::Tuesday => "Tuesday",
            Self::Wednesday => "Wednesday",
            Self::Thursday => "Thursday",
            Self::Friday => "Friday",
            Self::Saturday => "Saturday",
            Self::Sunday => "Sunday",
        }
    }

    /// Resolves a weekday from free text such as `"Mon"`, `"TH"` or `"Thursday"`.
    ///
    /// Matching is case-insensitive on the whole trimmed text, with a trailing
    /// `.` or `:` ignored. Returns `None` for anything else.
    #[must_use]
    pub fn resolve(text: &str) -> Option<Self> {
        let key = text
            .trim()
            .trim_end_matches(['.', ':'])
            .trim()
            .to_ascii_uppercase();
        let day = match key.as_str() {
            "M" | "MON" | "MONDAY" => Self::Monday,
            "TU" | "TUE" | "TUES" | "TUESDAY" => Self::Tuesday,
            "W" | "WED" | "WEDS" | "WEDNESDAY" => Self::Wednesday,
            "TH" | "THU" | "THUR" | "THURS" | "THURSDAY" => Self::Thursday,
            "F" | "FRI" | "FRIDAY" => Self::Friday,
            "SA" | "SAT" | "SATURDAY" => Self::Saturday,
            "SU" | "SUN" | "SUNDAY" => Self::Sunday,
            _ => return None,
        };
        Some(day)
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Weekday {
    type Err = UnknownWeekday;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::resolve(s).ok_or_else(|| UnknownWeekday(s.to_string()))
    }
}

impl Serialize for Weekday {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Weekday {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Error type for text that names no weekday.
#[derive(Debug, Clone)]
pub struct UnknownWeekday(String);

impl fmt::Display for UnknownWeekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown weekday: {}", self.0)
    }
}

impl std::error::Error for UnknownWeekday {}
