//! Timetable extraction engine.
//!
//! Turns OCR tokens and detected table matrices into a weekly schedule of
//! (weekday, time range, activity) entries:
//! - Table classification: days down a column or across the header row
//! - Time parsing: ranges, bare times and am/pm inference from neighbours
//! - Column inference: header columns recovered from token positions when no
//!   table was detected
//! - Post-processing: end filling, interval merging and canonical blocks

pub mod config;
pub mod document;
pub mod header;
pub mod metadata;
pub mod normalize;
mod pipeline;
pub mod postprocess;
pub mod report;
pub mod rows;
pub mod structure;
pub mod table;
pub mod time_parser;
pub mod token;
pub mod types;
pub mod weekday;

pub use config::{CanonicalBlock, DefaultBlockPolicy, ParserConfig};
pub use document::{DocumentMetadata, TimetableDocument, TimetableEntry};
pub use pipeline::TimetableParser;
pub use report::{ConfidenceSummary, DocumentSummary, Issue, validate_document};
pub use structure::TableStructure;
pub use time_parser::TimeParser;
pub use token::{BoundingBox, Point, RawToken, TableMatrix, Token, tokens_from_raw};
pub use types::{Confidence, TimeOfDay, TimeSlot, ValidationError};
pub use weekday::{UnknownWeekday, Weekday};
