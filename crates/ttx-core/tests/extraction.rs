//! Whole-document extraction through the public API.

use std::fmt::Write as _;

use insta::assert_snapshot;
use ttx_core::{
    DefaultBlockPolicy, ParserConfig, TableMatrix, TimetableDocument, TimetableParser,
};

fn week_table() -> TableMatrix {
    TableMatrix::from_rows([
        vec!["Time", "Monday", "Tuesday", "Wednesday"],
        vec!["9:00-10:00", "Maths", "math", "PE"],
        vec!["10:00-10:30", "Maths", "Phonics", "phys ed"],
        vec!["10:30-11:00", "Assembly", "Phonics", "Break"],
    ])
}

fn render(document: &TimetableDocument) -> String {
    let mut output = String::new();
    for entry in &document.entries {
        let day = entry.weekday.map(|d| d.to_string()).unwrap_or_default();
        let slot = entry
            .timeslot
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default();
        write!(output, "{day} {slot} {}", entry.activity).unwrap();
        if let Some(notes) = &entry.notes {
            write!(output, " ({notes})").unwrap();
        }
        writeln!(output).unwrap();
    }
    output
}

#[test]
fn days_across_the_header() {
    let parser = TimetableParser::new(ParserConfig {
        default_blocks: DefaultBlockPolicy::disabled(),
        ..ParserConfig::default()
    });
    let document = parser.parse_document("week.json", &[], &[week_table()]);

    assert_snapshot!(render(&document), @r"
    Monday 09:00-10:30 Maths
    Monday 10:30-11:00 Assembly
    Tuesday 09:00-10:00 Maths
    Tuesday 10:00-11:00 Phonics
    Wednesday 09:00-10:00 PE
    Wednesday 10:00-10:30 PE
    Wednesday 10:30-11:00 Break
    ");
}

#[test]
fn school_day_blocks_sit_beside_lessons() {
    let parser = TimetableParser::default();
    let document = parser.parse_document("week.json", &[], &[week_table()]);

    assert_snapshot!(render(&document), @r"
    Monday 08:35-08:50 Registration and Early Morning Work
    Monday 09:00-10:30 Maths
    Monday 10:20-10:35 Break
    Monday 10:30-11:00 Assembly
    Monday 12:00-13:00 Lunch
    Monday 15:00-15:15 Storytime
    Tuesday 08:35-08:50 Registration and Early Morning Work
    Tuesday 09:00-10:00 Maths
    Tuesday 10:00-11:00 Phonics
    Tuesday 10:20-10:35 Break
    Tuesday 12:00-13:00 Lunch
    Tuesday 15:00-15:15 Storytime
    Wednesday 08:35-08:50 Registration and Early Morning Work
    Wednesday 09:00-10:00 PE
    Wednesday 10:00-10:30 PE
    Wednesday 10:30-11:00 Break
    Wednesday 12:00-13:00 Lunch
    Wednesday 15:00-15:15 Storytime
    ");
}

#[test]
fn parsing_is_deterministic() {
    let parser = TimetableParser::default();
    let first = parser.parse_document("week.json", &[], &[week_table()]);
    let second = parser.parse_document("week.json", &[], &[week_table()]);
    assert_eq!(first.entries, second.entries);
}
