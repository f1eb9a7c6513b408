//! Per-day clean-up of raw entries.
//!
//! # Algorithm
//!
//! 1. Drop exact duplicates (same day, slot and activity)
//! 2. Group by weekday
//! 3. Within each day:
//!    - re-parse slots that kept only their source text
//!    - sort timed entries and fill missing ends
//!    - merge overlapping intervals
//!    - inject canonical blocks the day lacks, as entries of their own
//!    - append untimed entries
//! 4. Concatenate days Monday to Sunday, then entries without a day
//!
//! The step rebuilds the entry list rather than editing it, and running it
//! on its own output changes nothing.

use std::collections::{BTreeMap, HashSet};

use crate::config::DefaultBlockPolicy;
use crate::document::TimetableEntry;
use crate::normalize::MERGE_SEPARATOR;
use crate::time_parser::TimeParser;
use crate::types::{DEFAULT_SPAN_MINUTES, TimeOfDay, TimeSlot};
use crate::weekday::Weekday;

/// Rebuilds a document's entries into per-day, merged schedules.
#[derive(Debug, Clone, Copy)]
pub struct PostProcessor<'a> {
    times: &'a TimeParser,
    policy: &'a DefaultBlockPolicy,
}

impl<'a> PostProcessor<'a> {
    #[must_use]
    pub const fn new(times: &'a TimeParser, policy: &'a DefaultBlockPolicy) -> Self {
        Self { times, policy }
    }

    /// Returns the processed entries.
    ///
    /// `header_slots` are the time-axis slots collected while building the
    /// entries; they supply ends for entries that start on a header.
    #[must_use]
    pub fn process(
        &self,
        entries: Vec<TimetableEntry>,
        header_slots: &[TimeSlot],
    ) -> Vec<TimetableEntry> {
        let before = entries.len();
        let header_starts = header_starts(header_slots);

        let mut days: BTreeMap<Weekday, Vec<TimetableEntry>> = BTreeMap::new();
        let mut undated = Vec::new();
        for entry in dedup(entries) {
            match entry.weekday {
                Some(day) => days.entry(day).or_default().push(entry),
                None => undated.push(entry),
            }
        }

        let processed: Vec<TimetableEntry> = days
            .into_iter()
            .flat_map(|(day, entries)| self.process_day(day, entries, &header_starts))
            .chain(undated)
            .collect();

        tracing::debug!(
            before,
            after = processed.len(),
            "post-processed entries"
        );
        processed
    }

    fn process_day(
        &self,
        day: Weekday,
        entries: Vec<TimetableEntry>,
        header_starts: &[TimeOfDay],
    ) -> Vec<TimetableEntry> {
        let (timed, untimed): (Vec<_>, Vec<_>) = entries
            .into_iter()
            .map(|entry| self.reparse(entry))
            .partition(|entry| entry.start().is_some());

        // Blocks injected by an earlier pass stay out of the sweep.
        let (placed, mut timed): (Vec<_>, Vec<_>) = timed
            .into_iter()
            .partition(|entry| self.policy.enabled && self.is_placed_block(entry));

        timed.sort_by_key(TimetableEntry::start);
        let mut day_entries = merge_overlapping(fill_ends(timed, header_starts));
        day_entries.extend(placed);

        if self.policy.enabled {
            let missing = self.missing_blocks(day, &day_entries, &untimed);
            day_entries.extend(missing);
        }
        day_entries.sort_by_key(TimetableEntry::start);

        day_entries.extend(untimed);
        day_entries
    }

    /// Whether `entry` is exactly one of the policy's blocks.
    fn is_placed_block(&self, entry: &TimetableEntry) -> bool {
        self.policy.blocks.iter().any(|block| {
            entry.activity == block.activity
                && entry.start() == Some(block.start)
                && entry.end() == Some(block.end)
        })
    }

    /// Re-runs the parser on a slot that has text but no start.
    fn reparse(&self, mut entry: TimetableEntry) -> TimetableEntry {
        let retry = entry
            .timeslot
            .as_ref()
            .filter(|slot| slot.start.is_none() && !slot.raw_text.trim().is_empty())
            .and_then(|slot| self.times.parse(&slot.raw_text));
        if let Some(slot) = retry {
            entry.timeslot = Some(slot);
        }
        entry
    }

    /// Canonical blocks not yet covered by an overlapping entry that names
    /// them.
    fn missing_blocks(
        &self,
        day: Weekday,
        timed: &[TimetableEntry],
        untimed: &[TimetableEntry],
    ) -> Vec<TimetableEntry> {
        if timed.is_empty() && untimed.is_empty() {
            return Vec::new();
        }
        self.policy
            .blocks
            .iter()
            .filter(|block| {
                let window = block.slot();
                !timed.iter().any(|entry| {
                    let named = block.matches(&entry.activity)
                        || entry.notes.as_deref().is_some_and(|n| block.matches(n));
                    named
                        && entry
                            .timeslot
                            .as_ref()
                            .is_some_and(|slot| slot.overlaps(&window))
                })
            })
            .map(|block| {
                TimetableEntry::new(
                    day,
                    Some(block.slot()),
                    block.activity.clone(),
                    self.policy.confidence,
                )
            })
            .collect()
    }
}

/// Distinct header starts in time order.
fn header_starts(header_slots: &[TimeSlot]) -> Vec<TimeOfDay> {
    let mut starts: Vec<TimeOfDay> = header_slots.iter().filter_map(|s| s.start).collect();
    starts.sort_unstable();
    starts.dedup();
    starts
}

/// Keeps the first of entries equal in day, rendered slot and activity.
fn dedup(entries: Vec<TimetableEntry>) -> Vec<TimetableEntry> {
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .filter(|entry| {
            seen.insert((
                entry.weekday,
                entry
                    .timeslot
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_default(),
                entry.activity.to_lowercase(),
            ))
        })
        .collect()
}

/// Fills missing ends on entries sorted by start.
///
/// The end is the next later start, else the start of the header after a
/// header this entry starts on, else one hour on.
fn fill_ends(timed: Vec<TimetableEntry>, header_starts: &[TimeOfDay]) -> Vec<TimetableEntry> {
    let starts: Vec<Option<TimeOfDay>> = timed.iter().map(TimetableEntry::start).collect();
    timed
        .into_iter()
        .enumerate()
        .map(|(index, mut entry)| {
            let Some(slot) = entry.timeslot.take() else {
                return entry;
            };
            let slot = match (slot.start, slot.end) {
                (Some(start), None) => {
                    let end = starts[index + 1..]
                        .iter()
                        .flatten()
                        .find(|&&next| next > start)
                        .copied()
                        .or_else(|| {
                            let at = header_starts.iter().position(|&h| h == start)?;
                            header_starts.get(at + 1).copied()
                        })
                        .unwrap_or_else(|| start.plus_minutes(DEFAULT_SPAN_MINUTES));
                    slot.with_end(end)
                }
                _ => slot,
            };
            entry.timeslot = Some(slot);
            entry
        })
        .collect()
}

/// Sweeps entries sorted by start, joining each into the previous one when
/// it starts before the previous one ends.
fn merge_overlapping(timed: Vec<TimetableEntry>) -> Vec<TimetableEntry> {
    timed
        .into_iter()
        .fold(Vec::new(), |mut merged: Vec<TimetableEntry>, entry| {
            let overlapping = merged.last().is_some_and(|last| {
                matches!(
                    (last.end(), entry.start()),
                    (Some(end), Some(start)) if start < end
                )
            });
            match merged.last_mut() {
                Some(last) if overlapping => absorb(last, entry),
                _ => merged.push(entry),
            }
            merged
        })
}

fn absorb(into: &mut TimetableEntry, other: TimetableEntry) {
    if let (Some(slot), Some(other_end)) = (into.timeslot.as_mut(), other.end()) {
        if slot.end.is_none_or(|end| other_end > end) {
            slot.end = Some(other_end);
        }
    }
    for part in other.activity.split(MERGE_SEPARATOR) {
        let known = into
            .activity
            .split(MERGE_SEPARATOR)
            .any(|existing| existing.to_lowercase() == part.to_lowercase());
        if !known {
            into.activity = format!("{}{MERGE_SEPARATOR}{part}", into.activity);
        }
    }
    into.confidence = into.confidence.max(other.confidence);
}
