//! Table orientation classification.

use std::fmt;

use serde::Serialize;

use crate::time_parser::TimeParser;
use crate::token::TableMatrix;
use crate::weekday::Weekday;

/// Weekday matches needed before an axis counts as the day axis.
///
/// Fewer than three is treated as a coincidental match.
pub const MIN_WEEKDAY_MATCHES: usize = 3;

/// Orientation of a timetable table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TableStructure {
    /// Days run down a column; times run across the header row.
    WeekdayRows {
        day_column: usize,
        /// Header cells that look time-like.
        time_columns: Vec<usize>,
    },
    /// Days run across the header row; times (if any) run down column 0.
    WeekdayColumns { day_columns: Vec<usize> },
    /// No day axis found.
    Unknown,
}

impl TableStructure {
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::WeekdayRows { .. } => "weekday_rows",
            Self::WeekdayColumns { .. } => "weekday_columns",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for TableStructure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// Classifies a table by where its weekday labels sit.
///
/// Column 0 of the data rows is checked first, then the header row.
#[must_use]
pub fn classify(table: &TableMatrix, times: &TimeParser) -> TableStructure {
    let rows = table.rows();

    if rows.len() > 1 {
        let day_rows = (1..rows.len())
            .filter(|&row| Weekday::resolve(table.cell(row, 0)).is_some())
            .count();
        if day_rows >= MIN_WEEKDAY_MATCHES {
            let time_columns = table
                .header()
                .iter()
                .enumerate()
                .filter(|(_, cell)| times.looks_time_like(cell))
                .map(|(index, _)| index)
                .collect();
            return TableStructure::WeekdayRows {
                day_column: 0,
                time_columns,
            };
        }
    }

    let day_columns: Vec<usize> = table
        .header()
        .iter()
        .enumerate()
        .filter(|(_, cell)| Weekday::resolve(cell).is_some())
        .map(|(index, _)| index)
        .collect();
    if day_columns.len() >= MIN_WEEKDAY_MATCHES {
        return TableStructure::WeekdayColumns { day_columns };
    }

    TableStructure::Unknown
}
