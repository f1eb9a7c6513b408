//! Column inference for pages where no table was detected.
//!
//! Time-like tokens near the top of the page become column headers; every
//! other token is placed under the headers its horizontal extent covers.
//! When fewer than two headers are found, [`HeaderInference::row_walk`]
//! reads one entry per visual row instead.

use std::collections::BTreeSet;

use crate::config::ParserConfig;
use crate::document::TimetableEntry;
use crate::rows::group_rows;
use crate::time_parser::TimeParser;
use crate::token::Token;
use crate::types::{Confidence, DEFAULT_SPAN_MINUTES, TimeSlot};
use crate::weekday::Weekday;

/// A column inferred from a header token, in pixel space.
#[derive(Debug, Clone, PartialEq)]
pub struct InferredColumn {
    pub left: f64,
    pub right: f64,
    pub slot: TimeSlot,
}

impl InferredColumn {
    /// Whether `[x0, x1]` reaches into `[left, right)`, or `[left, right]`
    /// for the rightmost column.
    fn covers(&self, (x0, x1): (f64, f64), rightmost: bool) -> bool {
        self.left <= x1 && (x0 < self.right || (rightmost && x0 <= self.right))
    }
}

/// Entries read through inferred columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeaderEntries {
    pub columns: Vec<InferredColumn>,
    pub entries: Vec<TimetableEntry>,
}

impl HeaderEntries {
    /// The header slots, left to right.
    #[must_use]
    pub fn header_slots(&self) -> Vec<TimeSlot> {
        self.columns.iter().map(|c| c.slot.clone()).collect()
    }
}

/// OCR-only entry builder.
#[derive(Debug, Clone, Copy)]
pub struct HeaderInference<'a> {
    times: &'a TimeParser,
    config: &'a ParserConfig,
}

impl<'a> HeaderInference<'a> {
    #[must_use]
    pub const fn new(times: &'a TimeParser, config: &'a ParserConfig) -> Self {
        Self { times, config }
    }

    /// Infers columns and reads entries through them.
    ///
    /// Tokens whose index is in `excluded` (metadata) are ignored. Returns
    /// `None` when fewer than two header times are found.
    #[must_use]
    pub fn infer(&self, tokens: &[Token], excluded: &BTreeSet<usize>) -> Option<HeaderEntries> {
        let (header_indices, columns) = self.columns(tokens, excluded)?;

        let body = tokens
            .iter()
            .enumerate()
            .filter(|(index, _)| !excluded.contains(index) && !header_indices.contains(index))
            .map(|(_, token)| token);
        let rows = group_rows(body, self.config.row_threshold);

        let (_, entries) = rows.iter().flatten().fold(
            (None, Vec::new()),
            |(day, mut entries): (Option<Weekday>, Vec<TimetableEntry>), token| {
                if let Some(weekday) = Weekday::resolve(token.text()) {
                    return (Some(weekday), entries);
                }
                if self.times.is_time_only(token.text()) {
                    return (day, entries);
                }
                if let Some(weekday) = day {
                    entries.extend(self.entry_for(weekday, token, &columns));
                }
                (day, entries)
            },
        );

        tracing::debug!(
            columns = columns.len(),
            entries = entries.len(),
            "read entries through inferred header columns"
        );
        Some(HeaderEntries { columns, entries })
    }

    /// One entry per visual row: all non-time, non-weekday tokens joined as
    /// the activity, under the most recent weekday.
    #[must_use]
    pub fn row_walk(&self, tokens: &[Token], excluded: &BTreeSet<usize>) -> Vec<TimetableEntry> {
        let body = tokens
            .iter()
            .enumerate()
            .filter(|(index, _)| !excluded.contains(index))
            .map(|(_, token)| token);
        let rows = group_rows(body, self.config.row_threshold);

        let (_, entries) = rows.iter().fold(
            (None, Vec::new()),
            |(day, mut entries): (Option<Weekday>, Vec<TimetableEntry>), row| {
                let day = row
                    .iter()
                    .find_map(|token| Weekday::resolve(token.text()))
                    .or(day);

                let activity_tokens: Vec<&Token> = row
                    .iter()
                    .copied()
                    .filter(|token| {
                        Weekday::resolve(token.text()).is_none()
                            && !self.times.is_time_only(token.text())
                    })
                    .collect();

                if let Some(weekday) = day {
                    if !activity_tokens.is_empty() {
                        let row_text = row.iter().map(|t| t.text()).collect::<Vec<_>>().join(" ");
                        let activity = activity_tokens
                            .iter()
                            .map(|t| t.text())
                            .collect::<Vec<_>>()
                            .join(" ");
                        let confidence =
                            Confidence::mean(activity_tokens.iter().map(|t| t.confidence()))
                                .unwrap_or_default();
                        entries.push(TimetableEntry::new(
                            weekday,
                            self.times.parse(&row_text),
                            activity,
                            confidence,
                        ));
                    }
                }
                (day, entries)
            },
        );

        tracing::debug!(
            rows = rows.len(),
            entries = entries.len(),
            "read entries row by row"
        );
        entries
    }

    /// Finds header tokens and turns them into columns.
    fn columns(
        &self,
        tokens: &[Token],
        excluded: &BTreeSet<usize>,
    ) -> Option<(BTreeSet<usize>, Vec<InferredColumn>)> {
        let within = |band: f64| -> Vec<usize> {
            tokens
                .iter()
                .enumerate()
                .filter(|(index, token)| {
                    !excluded.contains(index)
                        && token.position().y < band
                        && self.times.looks_time_like(token.text())
                })
                .map(|(index, _)| index)
                .collect()
        };
        let mut candidates = within(self.config.header_band);
        if candidates.is_empty() {
            candidates = within(self.config.widened_header_band);
        }
        candidates.sort_by(|&a, &b| tokens[a].center().x.total_cmp(&tokens[b].center().x));

        let mut references: Vec<TimeSlot> = Vec::new();
        let mut headers: Vec<(usize, TimeSlot)> = Vec::new();
        for index in candidates {
            let Some(slot) = self
                .times
                .parse_with_references(tokens[index].text(), &references)
                .filter(TimeSlot::is_resolved)
            else {
                continue;
            };
            references.push(slot.clone());
            headers.push((index, slot));
        }

        if headers.len() < 2 {
            tracing::debug!(
                headers = headers.len(),
                "too few header times to infer columns"
            );
            return None;
        }

        let width = page_width(tokens);
        let centers: Vec<f64> = headers.iter().map(|(i, _)| tokens[*i].center().x).collect();
        let columns = headers
            .iter()
            .enumerate()
            .map(|(position, (_, slot))| InferredColumn {
                left: if position == 0 {
                    0.0
                } else {
                    f64::midpoint(centers[position - 1], centers[position])
                },
                right: centers
                    .get(position + 1)
                    .map_or(width, |next| f64::midpoint(centers[position], *next)),
                slot: slot.clone(),
            })
            .collect();

        Some((headers.into_iter().map(|(index, _)| index).collect(), columns))
    }

    fn entry_for(
        &self,
        weekday: Weekday,
        token: &Token,
        columns: &[InferredColumn],
    ) -> Option<TimetableEntry> {
        let extent = token.x_extent();
        let rightmost = columns.len().checked_sub(1)?;
        let covered = |(index, column): (usize, &InferredColumn)| {
            column.covers(extent, index == rightmost)
        };
        let first = columns.iter().enumerate().position(covered)?;
        let last = columns.iter().enumerate().rposition(covered)?;

        let start = columns[first].slot.start?;
        let end = columns
            .get(last + 1)
            .and_then(|next| next.slot.start)
            .or(columns[last].slot.end)
            .unwrap_or_else(|| start.plus_minutes(DEFAULT_SPAN_MINUTES));

        let raw_text = columns[first..=last]
            .iter()
            .map(|c| c.slot.raw_text.as_str())
            .collect::<Vec<_>>()
            .join(" + ");
        Some(TimetableEntry::new(
            weekday,
            Some(TimeSlot::range(start, end, raw_text)),
            token.text(),
            token.confidence(),
        ))
    }
}

/// Right edge of the page: the widest bounding box, else the furthest centre.
fn page_width(tokens: &[Token]) -> f64 {
    let from_boxes = tokens
        .iter()
        .filter_map(Token::bbox)
        .map(|bbox| bbox.max_x())
        .reduce(f64::max);
    from_boxes.unwrap_or_else(|| {
        tokens
            .iter()
            .map(|t| t.center().x)
            .fold(0.0, f64::max)
    })
}
