//! Entry extraction from detected tables.

use crate::document::TimetableEntry;
use crate::structure::{TableStructure, classify};
use crate::time_parser::TimeParser;
use crate::token::TableMatrix;
use crate::types::{Confidence, DEFAULT_SPAN_MINUTES, TimeSlot};
use crate::weekday::Weekday;

/// Words that mark a cell as an activity even when it is short or odd.
const ACTIVITY_KEYWORDS: &[&str] = &[
    "maths",
    "math",
    "mathematics",
    "english",
    "reading",
    "writing",
    "science",
    "history",
    "geography",
    "art",
    "music",
    "pe",
    "physical education",
    "computing",
    "assembly",
    "break",
    "lunch",
    "recess",
    "phonics",
    "register",
    "handwriting",
    "spelling",
    "topic",
    "lesson",
    "story",
    "comprehension",
    "grammar",
    "vocabulary",
    "outdoor",
    "indoor",
    "swimming",
    "re",
    "religious education",
    "drama",
    "dance",
    "spanish",
    "french",
    "pshe",
];

/// Entries read from one table plus the time slots its axis defined.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableEntries {
    pub structure: Option<TableStructure>,
    pub entries: Vec<TimetableEntry>,
    /// Resolved slots from the time axis, in axis order.
    pub header_slots: Vec<TimeSlot>,
}

/// One position on a table's time axis: a column (days in rows) or a row
/// (days in columns).
#[derive(Debug, Clone)]
struct AxisSlot {
    index: usize,
    slot: Option<TimeSlot>,
}

/// Turns a [`TableMatrix`] into entries according to its orientation.
#[derive(Debug, Clone, Copy)]
pub struct TableEntryBuilder<'a> {
    times: &'a TimeParser,
    table_confidence: Confidence,
    generic_confidence: Confidence,
}

impl<'a> TableEntryBuilder<'a> {
    #[must_use]
    pub const fn new(
        times: &'a TimeParser,
        table_confidence: Confidence,
        generic_confidence: Confidence,
    ) -> Self {
        Self {
            times,
            table_confidence,
            generic_confidence,
        }
    }

    /// Classifies the table and runs the matching strategy.
    ///
    /// Tables with fewer than two rows carry no data and yield nothing.
    #[must_use]
    pub fn build(&self, table: &TableMatrix) -> TableEntries {
        if table.rows().len() < 2 {
            tracing::debug!(rows = table.rows().len(), "skipping table without data rows");
            return TableEntries::default();
        }

        let structure = classify(table, self.times);
        tracing::debug!(%structure, rows = table.rows().len(), "classified table");
        self.build_classified(table, structure)
    }

    /// Runs the strategy for an already known orientation.
    #[must_use]
    pub fn build_classified(&self, table: &TableMatrix, structure: TableStructure) -> TableEntries {
        let mut built = match &structure {
            TableStructure::WeekdayRows {
                day_column,
                time_columns,
            } => self.weekday_rows(table, *day_column, time_columns),
            TableStructure::WeekdayColumns { day_columns } => {
                self.weekday_columns(table, day_columns)
            }
            TableStructure::Unknown => self.generic(table),
        };
        built.structure = Some(structure);
        built
    }

    fn weekday_rows(
        &self,
        table: &TableMatrix,
        day_column: usize,
        time_columns: &[usize],
    ) -> TableEntries {
        let header = table.header();
        let mut references: Vec<TimeSlot> = Vec::new();
        let mut axis = Vec::new();
        for &column in time_columns.iter().filter(|&&c| c != day_column) {
            let Some(cell) = header.get(column) else {
                continue;
            };
            if let Some(slot) = self.times.parse_with_references(cell, &references) {
                if slot.is_resolved() {
                    references.push(slot.clone());
                }
                axis.push(AxisSlot {
                    index: column,
                    slot: Some(slot),
                });
            }
        }

        let entries = (1..table.rows().len())
            .filter_map(|row| {
                let weekday = Weekday::resolve(table.cell(row, day_column))?;
                Some(self.spanned_entries(
                    weekday,
                    &axis,
                    |column| table.cell(row, column),
                    &references,
                ))
            })
            .flatten()
            .collect();

        TableEntries {
            structure: None,
            entries,
            header_slots: references,
        }
    }

    fn weekday_columns(&self, table: &TableMatrix, day_columns: &[usize]) -> TableEntries {
        let has_time_column = !day_columns.contains(&0);
        let mut references: Vec<TimeSlot> = Vec::new();
        let axis: Vec<AxisSlot> = (1..table.rows().len())
            .map(|row| {
                let slot = has_time_column
                    .then(|| self.times.parse_with_references(table.cell(row, 0), &references))
                    .flatten();
                if let Some(resolved) = slot.as_ref().filter(|s| s.is_resolved()) {
                    references.push(resolved.clone());
                }
                AxisSlot { index: row, slot }
            })
            .collect();

        let entries = day_columns
            .iter()
            .filter_map(|&column| {
                let weekday = Weekday::resolve(table.cell(0, column))?;
                Some(self.spanned_entries(
                    weekday,
                    &axis,
                    |row| table.cell(row, column),
                    &references,
                ))
            })
            .flatten()
            .collect();

        TableEntries {
            structure: None,
            entries,
            header_slots: references,
        }
    }

    fn generic(&self, table: &TableMatrix) -> TableEntries {
        let entries = table
            .rows()
            .iter()
            .filter_map(|row| {
                let weekday = row.iter().find_map(|cell| Weekday::resolve(cell))?;
                let activity = row
                    .iter()
                    .map(|cell| cell.trim())
                    .find(|cell| self.is_activity(cell))?;
                let timeslot = row
                    .iter()
                    .find(|cell| self.times.looks_time_like(cell))
                    .and_then(|cell| self.times.parse(cell));
                Some(TimetableEntry::new(
                    weekday,
                    timeslot,
                    activity,
                    self.generic_confidence,
                ))
            })
            .collect();

        TableEntries {
            structure: None,
            entries,
            header_slots: Vec::new(),
        }
    }

    /// Walks the time axis for one day, joining runs of identical cells.
    fn spanned_entries<'t>(
        &self,
        weekday: Weekday,
        axis: &[AxisSlot],
        cell: impl Fn(usize) -> &'t str,
        references: &[TimeSlot],
    ) -> Vec<TimetableEntry> {
        let mut entries = Vec::new();
        let mut position = 0;
        while position < axis.len() {
            let text = cell(axis[position].index).trim();
            if is_blank(text) {
                position += 1;
                continue;
            }

            let key = text.to_lowercase();
            let mut last = position;
            while last + 1 < axis.len() && cell(axis[last + 1].index).trim().to_lowercase() == key
            {
                last += 1;
            }

            let timeslot = self.span_slot(
                text,
                &axis[position..=last],
                axis.get(last + 1),
                references,
            );
            entries.push(TimetableEntry::new(
                weekday,
                timeslot,
                text,
                self.table_confidence,
            ));
            position = last + 1;
        }
        entries
    }

    /// Resolves the slot of a span of axis positions.
    ///
    /// The end comes from, in order: a range written in the cell, the next
    /// position's start, the last spanned position's end, one hour.
    fn span_slot(
        &self,
        text: &str,
        spanned: &[AxisSlot],
        next: Option<&AxisSlot>,
        references: &[TimeSlot],
    ) -> Option<TimeSlot> {
        let in_cell = self.times.parse_with_references(text, references);
        if let Some(slot) = in_cell.as_ref().filter(|s| s.start.is_some() && s.end.is_some()) {
            return Some(slot.clone());
        }

        let first = spanned.first()?.slot.as_ref();
        let Some(start) = first.and_then(|slot| slot.start) else {
            return in_cell.filter(TimeSlot::is_resolved).or_else(|| first.cloned());
        };

        let end = next
            .and_then(|n| n.slot.as_ref()?.start)
            .or_else(|| spanned.last()?.slot.as_ref()?.end)
            .unwrap_or_else(|| start.plus_minutes(DEFAULT_SPAN_MINUTES));

        let raw_text = spanned
            .iter()
            .filter_map(|position| position.slot.as_ref())
            .map(|slot| slot.raw_text.as_str())
            .collect::<Vec<_>>()
            .join(" + ");
        Some(TimeSlot::range(start, end, raw_text))
    }

    fn is_activity(&self, cell: &str) -> bool {
        if is_blank(cell) || cell.chars().count() < 2 {
            return false;
        }
        let lower = cell.to_lowercase();
        let keyword = ACTIVITY_KEYWORDS.iter().any(|keyword| {
            if keyword.contains(' ') {
                lower.contains(keyword)
            } else {
                lower
                    .split(|c: char| !c.is_alphanumeric())
                    .any(|word| word == *keyword)
            }
        });
        keyword || (Weekday::resolve(cell).is_none() && !self.times.is_time_only(cell))
    }
}

/// Empty cells and the placeholders table detectors emit for them.
fn is_blank(cell: &str) -> bool {
    let trimmed = cell.trim();
    trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("nan")
        || trimmed.eq_ignore_ascii_case("none")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TimeOfDay;

    fn t(hour: u32, minute: u32) -> TimeOfDay {
        TimeOfDay::new(hour, minute).unwrap()
    }

    fn build(rows: &[&[&str]]) -> TableEntries {
        let times = TimeParser::new();
        let builder =
            TableEntryBuilder::new(&times, Confidence::clamped(0.85), Confidence::clamped(0.7));
        builder.build(&TableMatrix::from_rows(rows.iter().map(|r| r.to_vec())))
    }

    fn span(entry: &TimetableEntry) -> (Option<TimeOfDay>, Option<TimeOfDay>) {
        (entry.start(), entry.end())
    }

    #[test]
    fn identical_adjacent_cells_become_one_entry() {
        let times = TimeParser::new();
        let builder =
            TableEntryBuilder::new(&times, Confidence::clamped(0.85), Confidence::clamped(0.7));
        let table = TableMatrix::from_rows([
            vec!["Day", "9:00-9:30", "9:30-10:00"],
            vec!["Monday", "Maths", "Maths"],
        ]);
        let built = builder.build_classified(
            &table,
            TableStructure::WeekdayRows {
                day_column: 0,
                time_columns: vec![1, 2],
            },
        );
        assert_eq!(built.entries.len(), 1);
        let entry = &built.entries[0];
        assert_eq!(entry.weekday, Some(Weekday::Monday));
        assert_eq!(entry.activity, "Maths");
        assert_eq!(span(entry), (Some(t(9, 0)), Some(t(10, 0))));
        assert_eq!(entry.confidence, Confidence::clamped(0.85));
    }

    #[test]
    fn weekday_rows_with_three_days() {
        let built = build(&[
            &["", "9:00", "10:00", "11:00"],
            &["Mon", "Maths", "maths", "Art"],
            &["Tue", "PE", "nan", "Music"],
            &["Wed", "", "Science", "Science"],
        ]);
        assert!(matches!(
            built.structure,
            Some(TableStructure::WeekdayRows { .. })
        ));
        let summary: Vec<_> = built
            .entries
            .iter()
            .map(|e| (e.weekday.unwrap(), e.activity.as_str(), span(e)))
            .collect();
        assert_eq!(
            summary,
            vec![
                (Weekday::Monday, "Maths", (Some(t(9, 0)), Some(t(11, 0)))),
                (Weekday::Monday, "Art", (Some(t(11, 0)), Some(t(12, 0)))),
                (Weekday::Tuesday, "PE", (Some(t(9, 0)), Some(t(10, 0)))),
                (Weekday::Tuesday, "Music", (Some(t(11, 0)), Some(t(12, 0)))),
                // No later header and no header end: one hour from the start.
                (Weekday::Wednesday, "Science", (Some(t(10, 0)), Some(t(11, 0)))),
            ]
        );
        assert_eq!(built.header_slots.len(), 3);
    }

    #[test]
    fn range_in_cell_wins_over_header() {
        let built = build(&[
            &["Day", "9:00", "10:00"],
            &["Mon", "Assembly 9:15-9:45", "Reading"],
            &["Tue", "Maths", "Reading"],
            &["Wed", "Maths", "Reading"],
        ]);
        let assembly = &built.entries[0];
        assert_eq!(span(assembly), (Some(t(9, 15)), Some(t(9, 45))));
    }

    #[test]
    fn header_times_use_earlier_headers_as_references() {
        // "1:00" after "12:00" reads as 13:00 either way; "11:00" stays morning.
        let built = build(&[
            &["Day", "11:00", "12:00", "1:00"],
            &["Mon", "Maths", "Lunch", "Art"],
            &["Tue", "Maths", "Lunch", "Art"],
            &["Wed", "Maths", "Lunch", "Art"],
        ]);
        let starts: Vec<_> = built.header_slots.iter().map(|s| s.start).collect();
        assert_eq!(starts, vec![Some(t(11, 0)), Some(t(12, 0)), Some(t(13, 0))]);
    }

    #[test]
    fn weekday_columns_span_down_rows() {
        let built = build(&[
            &["Time", "Monday", "Tuesday", "Wednesday"],
            &["9:00", "Maths", "English", "Science"],
            &["10:00", "Maths", "Art", "Science"],
            &["11:00", "Break", "Break", "Music"],
        ]);
        assert!(matches!(
            built.structure,
            Some(TableStructure::WeekdayColumns { .. })
        ));
        let monday: Vec<_> = built
            .entries
            .iter()
            .filter(|e| e.weekday == Some(Weekday::Monday))
            .map(|e| (e.activity.as_str(), span(e)))
            .collect();
        assert_eq!(
            monday,
            vec![
                ("Maths", (Some(t(9, 0)), Some(t(11, 0)))),
                ("Break", (Some(t(11, 0)), Some(t(12, 0)))),
            ]
        );
        assert_eq!(built.entries.len(), 7);
    }

    #[test]
    fn times_in_cells_follow_the_time_column() {
        let built = build(&[
            &["Time", "Monday", "Tuesday", "Wednesday"],
            &["7:00pm", "Club 7:15-7:45", "Chess", "Choir"],
            &["8:00pm", "Homework", "Homework", "Homework"],
        ]);
        assert_eq!(
            built.header_slots.iter().map(|s| s.start).collect::<Vec<_>>(),
            vec![Some(t(19, 0)), Some(t(20, 0))]
        );
        let club = built
            .entries
            .iter()
            .find(|e| e.activity == "Club 7:15-7:45")
            .unwrap();
        assert_eq!(club.weekday, Some(Weekday::Monday));
        assert_eq!(span(club), (Some(t(19, 15)), Some(t(19, 45))));

        // Without the evening column the same text reads as morning.
        let times = TimeParser::new();
        let alone = times.parse("Club 7:15-7:45").unwrap();
        assert_eq!((alone.start, alone.end), (Some(t(7, 15)), Some(t(7, 45))));
    }

    #[test]
    fn unknown_tables_fall_back_to_row_scanning() {
        let built = build(&[
            &["Notes", "Monday", "9:00", "Assembly"],
            &["Tuesday", "10:30", "Swimming"],
            &["Only text here"],
        ]);
        assert_eq!(built.structure, Some(TableStructure::Unknown));
        assert_eq!(built.entries.len(), 2);
        assert_eq!(built.entries[0].weekday, Some(Weekday::Monday));
        assert_eq!(built.entries[0].activity, "Notes");
        assert_eq!(built.entries[1].activity, "Swimming");
        assert_eq!(built.entries[1].start(), Some(t(10, 30)));
        assert_eq!(built.entries[1].confidence, Confidence::clamped(0.7));
    }

    #[test]
    fn single_row_tables_are_skipped() {
        let built = build(&[&["Monday", "Maths"]]);
        assert!(built.entries.is_empty());
        assert!(built.structure.is_none());
    }

    #[test]
    fn activity_detection() {
        let times = TimeParser::new();
        let builder = TableEntryBuilder::new(&times, Confidence::MAX, Confidence::MAX);
        assert!(builder.is_activity("PE"));
        assert!(builder.is_activity("Guided reading"));
        assert!(!builder.is_activity("Mon"));
        assert!(!builder.is_activity("9:00-9:30"));
        assert!(!builder.is_activity("nan"));
        assert!(!builder.is_activity("x"));
    }
}
