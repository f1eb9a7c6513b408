//! Report command and the text renderings shared with `ttx parse`.

use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use ttx_core::{ConfidenceSummary, DocumentSummary, TimetableDocument, validate_document};

/// Longest activity shown in a sample line before it is cut.
const ACTIVITY_WIDTH: usize = 40;

pub fn run<W: Write>(writer: &mut W, path: &Path) -> Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let document: TimetableDocument = serde_json::from_str(&text)
        .with_context(|| format!("invalid document JSON in {}", path.display()))?;

    write!(writer, "{}", format_summary(&document))?;
    writeln!(writer)?;
    write!(writer, "{}", format_issues(&document))?;
    writeln!(writer)?;
    write!(writer, "{}", format_confidence(&document))?;
    Ok(())
}

/// Metadata, per-day counts and the first few entries.
pub fn format_summary(document: &TimetableDocument) -> String {
    let mut output = String::new();
    let summary = DocumentSummary::of(document);

    writeln!(output, "Source: {}", document.source).unwrap();
    let metadata = &document.metadata;
    for (label, value) in [
        ("Class", &metadata.class_name),
        ("Teacher", &metadata.teacher_name),
        ("Term", &metadata.term),
        ("School", &metadata.school_name),
    ] {
        if let Some(value) = value {
            writeln!(output, "  {label}: {value}").unwrap();
        }
    }

    writeln!(output).unwrap();
    writeln!(output, "  Total Entries: {}", summary.total).unwrap();
    for (day, count) in &summary.per_day {
        writeln!(output, "    {day}: {count} entries").unwrap();
    }

    if summary.sample.is_empty() {
        return output;
    }

    writeln!(output).unwrap();
    writeln!(output, "  Sample Entries:").unwrap();
    for (number, entry) in summary.sample.iter().enumerate() {
        let day = entry.weekday.map_or_else(|| "N/A".to_string(), |d| d.to_string());
        let time = entry
            .timeslot
            .as_ref()
            .map_or_else(|| "N/A".to_string(), ToString::to_string);
        writeln!(
            output,
            "    {}. {day} | {time} | {}",
            number + 1,
            truncate(&entry.activity, ACTIVITY_WIDTH)
        )
        .unwrap();
    }
    if summary.remaining() > 0 {
        writeln!(output, "    ... and {} more entries", summary.remaining()).unwrap();
    }
    output
}

/// Validation issues, or a line saying there are none.
pub fn format_issues(document: &TimetableDocument) -> String {
    let issues = validate_document(document);
    if issues.is_empty() {
        return "No issues found.\n".to_string();
    }

    let mut output = String::new();
    writeln!(output, "Warnings:").unwrap();
    for issue in issues {
        writeln!(output, "  - {issue}").unwrap();
    }
    output
}

/// Confidence statistics.
pub fn format_confidence(document: &TimetableDocument) -> String {
    if document.is_empty() {
        return "No entries to analyze\n".to_string();
    }
    let Some(summary) = ConfidenceSummary::from_entries(&document.entries) else {
        return "No confidence scores available\n".to_string();
    };

    let mut output = String::new();
    writeln!(output, "Confidence Report:").unwrap();
    writeln!(output, "  Average: {}", percent(summary.average)).unwrap();
    writeln!(
        output,
        "  Range: {} - {}",
        percent(summary.min),
        percent(summary.max)
    )
    .unwrap();
    writeln!(output).unwrap();
    writeln!(output, "  Distribution:").unwrap();
    writeln!(output, "    High (>=80%): {} entries", summary.high).unwrap();
    writeln!(output, "    Medium (50-80%): {} entries", summary.medium).unwrap();
    writeln!(output, "    Low (<50%): {} entries", summary.low).unwrap();
    output
}

fn percent(score: f32) -> String {
    format!("{:.2}%", score * 100.0)
}

/// Cuts `text` to `width` characters, marking the cut with `...`.
fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let head: String = text.chars().take(width).collect();
        format!("{head}...")
    }
}
