//! Time expression parsing.
//!
//! Turns free text such as `"9:00-9:30"`, `"1 - 2pm"` or `"10.45 – 11.00"`
//! into a [`TimeSlot`]. The text is first normalised (dash variants, dotted
//! minutes, OCR `O`-for-zero, whitespace), then handed to an ordered list of
//! [`Strategy`] values. The first strategy to resolve wins.
//!
//! # Hour disambiguation
//!
//! School timetables rarely carry am/pm. An hour without a meridiem is
//! resolved in this order:
//! 1. am/pm written on the other side of a range is borrowed
//! 2. the 12- or 24-hour reading closest to a reference start time
//! 3. 7-11 stay morning, 12 stays noon, 1-6 move to the afternoon

use regex::{Captures, Regex};

use crate::types::{TimeOfDay, TimeSlot};

/// Resolution strategies in precedence order.
///
/// Range detection runs before bare-token detection; the other way round a
/// range like `"9:00-9:30"` would be split into two unrelated times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// `H[:MM][am|pm] (-|to) H[:MM][am|pm]`
    ExplicitRange,
    /// Two or more separate clock readings; the first two form the range.
    BareTokens,
    /// Exactly one clock reading; start only.
    SingleToken,
    /// No number, but am/pm text: keep the text, resolve nothing.
    TimeWords,
}

impl Strategy {
    pub const PRECEDENCE: [Self; 4] = [
        Self::ExplicitRange,
        Self::BareTokens,
        Self::SingleToken,
        Self::TimeWords,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ExplicitRange => "explicit_range",
            Self::BareTokens => "bare_tokens",
            Self::SingleToken => "single_token",
            Self::TimeWords => "time_words",
        }
    }
}

/// Outcome of one strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A start time was found. Stops the search.
    Resolved(TimeSlot),
    /// Time-like text without a usable time. Kept as a fallback while later
    /// strategies are tried; a later pass with more context may resolve it.
    NeedsContext(TimeSlot),
    /// The strategy does not apply.
    Unresolved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Meridiem {
    Am,
    Pm,
}

impl Meridiem {
    fn parse(text: &str) -> Option<Self> {
        match text.to_ascii_lowercase().as_str() {
            "am" => Some(Self::Am),
            "pm" => Some(Self::Pm),
            _ => None,
        }
    }

    const fn opposite(self) -> Self {
        match self {
            Self::Am => Self::Pm,
            Self::Pm => Self::Am,
        }
    }
}

/// One clock reading as written, before hour disambiguation.
#[derive(Debug, Clone, Copy)]
struct Clock {
    hour: u32,
    minute: u32,
    meridiem: Option<Meridiem>,
}

impl Clock {
    fn from_parts(hour: &str, minute: Option<&str>, meridiem: Option<&str>) -> Option<Self> {
        let hour: u32 = hour.parse().ok()?;
        let minute: u32 = minute.map_or(Ok(0), str::parse).ok()?;
        if hour > 23 || minute > 59 {
            return None;
        }
        Some(Self {
            hour,
            minute,
            meridiem: meridiem.and_then(Meridiem::parse),
        })
    }

    fn with_meridiem(self, meridiem: Meridiem) -> Option<TimeOfDay> {
        let hour = if self.hour > 12 {
            self.hour
        } else {
            match meridiem {
                Meridiem::Am => self.hour % 12,
                Meridiem::Pm => self.hour % 12 + 12,
            }
        };
        TimeOfDay::new(hour, self.minute)
    }

    fn in_context(self, references: &[TimeSlot]) -> Option<TimeOfDay> {
        if let Some(meridiem) = self.meridiem {
            return self.with_meridiem(meridiem);
        }
        let hour = nearest_reference_hour(self.hour, self.minute, references)
            .unwrap_or_else(|| default_hour(self.hour));
        TimeOfDay::new(hour, self.minute)
    }
}

/// 7-11 morning, 12 noon, 1-6 afternoon. 0 and 13-23 are already 24-hour.
const fn default_hour(hour: u32) -> u32 {
    match hour {
        1..=6 => hour + 12,
        _ => hour,
    }
}

/// Picks `hour` or `hour + 12`, whichever lands closest to a reference start.
///
/// Returns `None` when the hour is not ambiguous or there are no references.
/// Ties go to the default rule.
fn nearest_reference_hour(hour: u32, minute: u32, references: &[TimeSlot]) -> Option<u32> {
    if !(1..=11).contains(&hour) {
        return None;
    }
    let starts: Vec<i64> = references
        .iter()
        .filter_map(|slot| slot.start)
        .map(TimeOfDay::minutes_from_midnight)
        .collect();
    if starts.is_empty() {
        return None;
    }
    let distance = |candidate: u32| {
        let minutes = i64::from(candidate * 60 + minute);
        starts
            .iter()
            .map(|start| (start - minutes).abs())
            .min()
            .unwrap_or(i64::MAX)
    };
    let morning = distance(hour);
    let afternoon = distance(hour + 12);
    Some(match morning.cmp(&afternoon) {
        std::cmp::Ordering::Less => hour,
        std::cmp::Ordering::Greater => hour + 12,
        std::cmp::Ordering::Equal => default_hour(hour),
    })
}

/// Stateless time parser holding its compiled patterns.
///
/// Construct once and reuse; patterns are never recompiled per call.
#[derive(Debug, Clone)]
pub struct TimeParser {
    dotted_meridiem: Regex,
    clock_separator: Regex,
    range: Regex,
    clock: Regex,
    time_only_residue: Regex,
}

impl Default for TimeParser {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeParser {
    /// Compiles the parser's patterns.
    ///
    /// # Panics
    ///
    /// Never in practice: all patterns are fixed literals.
    #[must_use]
    pub fn new() -> Self {
        let compile = |pattern: &str| Regex::new(pattern).expect("time pattern is a valid regex");
        Self {
            dotted_meridiem: compile(r"(?i)\b([ap])\.\s?m\b\.?"),
            clock_separator: compile(r"\b(\d{1,2})[:.]([0-9oO]{2})(\d?)"),
            range: compile(
                r"(?i)\b(\d{1,2})(?::(\d{2}))?\s*(am|pm)?\s*(?:-|\bto\b)\s*(\d{1,2})(?::(\d{2}))?\s*(am|pm)?\b",
            ),
            clock: compile(r"(?i)\b(\d{1,2})(?::(\d{2})(?:\s*(am|pm))?|\s*(am|pm))\b"),
            time_only_residue: compile(r"(?i)(?:[\d:.\-\s]|\bto\b)+(?:am|pm)?"),
        }
    }

    /// Parses text without reference times.
    #[must_use]
    pub fn parse(&self, text: &str) -> Option<TimeSlot> {
        self.parse_with_references(text, &[])
    }

    /// Parses text, using `references` to settle hours written without am/pm.
    #[must_use]
    pub fn parse_with_references(&self, text: &str, references: &[TimeSlot]) -> Option<TimeSlot> {
        let raw = text.trim();
        if raw.is_empty() {
            return None;
        }
        let normalized = self.normalize(raw);

        let mut fallback = None;
        for strategy in Strategy::PRECEDENCE {
            match self.apply(strategy, &normalized, raw, references) {
                Resolution::Resolved(slot) => {
                    tracing::trace!(strategy = strategy.name(), text = raw, %slot, "resolved time");
                    return Some(slot);
                }
                Resolution::NeedsContext(slot) => {
                    fallback.get_or_insert(slot);
                }
                Resolution::Unresolved => {}
            }
        }
        fallback
    }

    /// Runs a single strategy against already normalised text.
    #[must_use]
    pub fn apply(
        &self,
        strategy: Strategy,
        normalized: &str,
        raw: &str,
        references: &[TimeSlot],
    ) -> Resolution {
        let slot = match strategy {
            Strategy::ExplicitRange => self.explicit_range(normalized, raw, references),
            Strategy::BareTokens => self.bare_tokens(normalized, raw, references),
            Strategy::SingleToken => self.single_token(normalized, raw, references),
            Strategy::TimeWords => {
                return if mentions_meridiem(normalized) {
                    Resolution::NeedsContext(TimeSlot::text_only(raw))
                } else {
                    Resolution::Unresolved
                };
            }
        };
        slot.map_or(Resolution::Unresolved, Resolution::Resolved)
    }

    /// Unifies dashes, turns `10.45` into `10:45`, repairs `9:O0`, and
    /// collapses whitespace.
    #[must_use]
    pub fn normalize(&self, text: &str) -> String {
        let dashed = text.replace(
            [
                '\u{2010}', '\u{2011}', '\u{2012}', '\u{2013}', '\u{2014}', '\u{2015}', '\u{2212}',
            ],
            "-",
        );
        let meridiem = self.dotted_meridiem.replace_all(&dashed, "${1}m");
        let clocks = self
            .clock_separator
            .replace_all(&meridiem, |caps: &Captures<'_>| {
                // A third digit means this was not a clock reading ("1.234").
                if caps[3].is_empty() {
                    format!("{}:{}", &caps[1], caps[2].replace(['o', 'O'], "0"))
                } else {
                    caps[0].to_string()
                }
            });
        clocks.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Whether text carries any time signal: a clock reading, a range, or
    /// an am/pm substring.
    #[must_use]
    pub fn looks_time_like(&self, text: &str) -> bool {
        let normalized = self.normalize(text);
        !normalized.is_empty()
            && (self.clock.is_match(&normalized)
                || self.range.is_match(&normalized)
                || mentions_meridiem(&normalized))
    }

    /// Whether text is nothing but digits, separators and am/pm.
    ///
    /// Text shorter than two characters after stripping counts as time-only.
    #[must_use]
    pub fn is_time_only(&self, text: &str) -> bool {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return false;
        }
        let residue = self.time_only_residue.replace_all(trimmed, "");
        residue.trim().chars().count() < 2
    }

    fn explicit_range(&self, text: &str, raw: &str, references: &[TimeSlot]) -> Option<TimeSlot> {
        self.range.captures_iter(text).find_map(|caps| {
            let start = Clock::from_parts(
                &caps[1],
                caps.get(2).map(|m| m.as_str()),
                caps.get(3).map(|m| m.as_str()),
            )?;
            let end = Clock::from_parts(
                &caps[4],
                caps.get(5).map(|m| m.as_str()),
                caps.get(6).map(|m| m.as_str()),
            )?;
            let written_as_time = caps.get(2).is_some()
                || caps.get(5).is_some()
                || start.meridiem.is_some()
                || end.meridiem.is_some();
            // "2-3" alone is a number range, not a time range.
            if !written_as_time {
                return None;
            }
            resolve_pair(start, end, raw, references)
        })
    }

    fn bare_tokens(&self, text: &str, raw: &str, references: &[TimeSlot]) -> Option<TimeSlot> {
        let clocks = self.clocks(text);
        match clocks.as_slice() {
            [start, end, ..] => resolve_pair(*start, *end, raw, references),
            _ => None,
        }
    }

    fn single_token(&self, text: &str, raw: &str, references: &[TimeSlot]) -> Option<TimeSlot> {
        let clocks = self.clocks(text);
        match clocks.as_slice() {
            [only] => only
                .in_context(references)
                .map(|start| TimeSlot::starting_at(start, raw)),
            _ => None,
        }
    }

    fn clocks(&self, text: &str) -> Vec<Clock> {
        self.clock
            .captures_iter(text)
            .filter_map(|caps| {
                let meridiem = caps.get(3).or_else(|| caps.get(4)).map(|m| m.as_str());
                Clock::from_parts(&caps[1], caps.get(2).map(|m| m.as_str()), meridiem)
            })
            .collect()
    }
}

/// Resolves both ends of a range, sharing am/pm between the sides.
///
/// A borrowed meridiem that would put its side out of order is swapped for
/// the opposite one: `"11:30 - 12:15pm"` is 11:30-12:15, not 23:30.
fn resolve_pair(
    start: Clock,
    end: Clock,
    raw: &str,
    references: &[TimeSlot],
) -> Option<TimeSlot> {
    let (start_time, end_time) = match (start.meridiem, end.meridiem) {
        (Some(a), Some(b)) => (start.with_meridiem(a)?, end.with_meridiem(b)?),
        (None, Some(m)) => {
            let end_time = end.with_meridiem(m)?;
            let borrowed = start.with_meridiem(m)?;
            let start_time = if borrowed > end_time {
                start.with_meridiem(m.opposite())?
            } else {
                borrowed
            };
            (start_time, end_time)
        }
        (Some(m), None) => {
            let start_time = start.with_meridiem(m)?;
            let borrowed = end.with_meridiem(m)?;
            let end_time = if borrowed <= start_time {
                end.with_meridiem(m.opposite())?
            } else {
                borrowed
            };
            (start_time, end_time)
        }
        (None, None) => (start.in_context(references)?, end.in_context(references)?),
    };
    Some(TimeSlot::range(start_time, end_time, raw))
}

fn mentions_meridiem(text: &str) -> bool {
    let lower = text.to_ascii_lowercase();
    lower.contains("am") || lower.contains("pm")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(hour: u32, minute: u32) -> TimeOfDay {
        TimeOfDay::new(hour, minute).unwrap()
    }

    fn span(parser: &TimeParser, text: &str) -> (Option<TimeOfDay>, Option<TimeOfDay>) {
        let slot = parser.parse(text).unwrap_or_else(|| panic!("{text} should parse"));
        (slot.start, slot.end)
    }

    #[test]
    fn plain_range() {
        let parser = TimeParser::new();
        assert_eq!(span(&parser, "9:00-9:30"), (Some(t(9, 0)), Some(t(9, 30))));
    }

    #[test]
    fn pm_propagates_backwards() {
        let parser = TimeParser::new();
        assert_eq!(span(&parser, "1 - 2pm"), (Some(t(13, 0)), Some(t(14, 0))));
    }

    #[test]
    fn am_propagates_forwards() {
        let parser = TimeParser::new();
        assert_eq!(span(&parser, "9am - 10"), (Some(t(9, 0)), Some(t(10, 0))));
        assert_eq!(span(&parser, "11am - 1"), (Some(t(11, 0)), Some(t(13, 0))));
    }

    #[test]
    fn borrowed_meridiem_keeps_order() {
        let parser = TimeParser::new();
        assert_eq!(
            span(&parser, "11:30 - 12:15pm"),
            (Some(t(11, 30)), Some(t(12, 15)))
        );
    }

    #[test]
    fn dotted_minutes_and_en_dash() {
        let parser = TimeParser::new();
        assert_eq!(
            span(&parser, "10.45 \u{2013} 11.00"),
            (Some(t(10, 45)), Some(t(11, 0)))
        );
    }

    #[test]
    fn word_to_separates_range() {
        let parser = TimeParser::new();
        assert_eq!(span(&parser, "2:15 to 3:00"), (Some(t(14, 15)), Some(t(15, 0))));
    }

    #[test]
    fn ocr_letter_o_repaired() {
        let parser = TimeParser::new();
        assert_eq!(parser.normalize("9:O0 - 9:3O"), "9:00 - 9:30");
        assert_eq!(span(&parser, "9:O0 - 9:3O"), (Some(t(9, 0)), Some(t(9, 30))));
    }

    #[test]
    fn normalize_leaves_longer_numbers_alone() {
        let parser = TimeParser::new();
        assert_eq!(parser.normalize("Room  1.234"), "Room 1.234");
        assert_eq!(parser.normalize("9.30 a.m."), "9:30 am");
    }

    #[test]
    fn default_hour_rule_without_context() {
        let parser = TimeParser::new();
        assert_eq!(span(&parser, "8:45").0, Some(t(8, 45)));
        assert_eq!(span(&parser, "12:10").0, Some(t(12, 10)));
        assert_eq!(span(&parser, "1:30").0, Some(t(13, 30)));
        assert_eq!(span(&parser, "14:05").0, Some(t(14, 5)));
    }

    #[test]
    fn single_time_has_no_end() {
        let parser = TimeParser::new();
        let slot = parser.parse("Assembly 10:30").unwrap();
        assert_eq!(slot.start, Some(t(10, 30)));
        assert_eq!(slot.end, None);
        assert_eq!(slot.raw_text, "Assembly 10:30");
    }

    #[test]
    fn references_pick_nearest_reading() {
        let parser = TimeParser::new();
        let evening = [TimeSlot::starting_at(t(19, 0), "7pm")];
        assert_eq!(
            parser.parse_with_references("7:45", &evening).unwrap().start,
            Some(t(19, 45))
        );
        let early = [TimeSlot::starting_at(t(2, 30), "2:30am")];
        assert_eq!(
            parser.parse_with_references("2:00", &early).unwrap().start,
            Some(t(2, 0))
        );
    }

    #[test]
    fn references_ignored_when_meridiem_written() {
        let parser = TimeParser::new();
        let evening = [TimeSlot::starting_at(t(19, 0), "7pm")];
        assert_eq!(
            parser.parse_with_references("7:45am", &evening).unwrap().start,
            Some(t(7, 45))
        );
    }

    #[test]
    fn bare_tokens_form_a_range() {
        let parser = TimeParser::new();
        assert_eq!(
            span(&parser, "from 9:00 until 9:40"),
            (Some(t(9, 0)), Some(t(9, 40)))
        );
    }

    #[test]
    fn range_beats_bare_tokens() {
        let parser = TimeParser::new();
        let normalized = parser.normalize("9:00-9:30");
        assert!(matches!(
            parser.apply(Strategy::ExplicitRange, &normalized, "9:00-9:30", &[]),
            Resolution::Resolved(_)
        ));
        assert_eq!(parser.parse("9:00-9:30").unwrap().end, Some(t(9, 30)));
    }

    #[test]
    fn number_range_is_not_a_time() {
        let parser = TimeParser::new();
        assert_eq!(parser.parse("Year 2-3"), None);
    }

    #[test]
    fn meridiem_words_keep_text_only() {
        let parser = TimeParser::new();
        let slot = parser.parse("PM session").unwrap();
        assert!(!slot.is_resolved());
        assert_eq!(slot.raw_text, "PM session");
    }

    #[test]
    fn unparseable_text_is_none() {
        let parser = TimeParser::new();
        assert_eq!(parser.parse(""), None);
        assert_eq!(parser.parse("   "), None);
        assert_eq!(parser.parse("Phonics"), None);
        assert_eq!(parser.parse("25:00"), None);
    }

    #[test]
    fn resolved_ranges_end_after_start() {
        let parser = TimeParser::new();
        for text in [
            "9:00-9:30",
            "10:00-9:00",
            "3:00 - 3:00",
            "12:00-1:00",
            "11.30 - 12.15",
            "1 - 2pm",
            "9am-9am",
            "2:15 to 3:00",
        ] {
            let slot = parser.parse(text).unwrap();
            let (Some(start), Some(end)) = (slot.start, slot.end) else {
                panic!("{text} should resolve both ends");
            };
            assert!(end > start, "{text}: {start} !< {end}");
        }
    }

    #[test]
    fn end_before_start_gets_one_hour() {
        let parser = TimeParser::new();
        assert_eq!(span(&parser, "10:00-9:00"), (Some(t(10, 0)), Some(t(11, 0))));
    }

    #[test]
    fn time_likeness_and_time_only() {
        let parser = TimeParser::new();
        assert!(parser.looks_time_like("9:00"));
        assert!(parser.looks_time_like("1 - 2pm"));
        assert!(parser.looks_time_like("10.45"));
        assert!(!parser.looks_time_like("Maths"));
        assert!(!parser.looks_time_like(""));

        assert!(parser.is_time_only("9:00 - 9:30"));
        assert!(parser.is_time_only("1pm"));
        assert!(!parser.is_time_only("Maths 9:00"));
        assert!(!parser.is_time_only(""));
    }
}
