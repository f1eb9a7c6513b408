//! Parse command: input bundles in, timetable documents out.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use rayon::prelude::*;
use serde::Deserialize;
use ttx_core::{RawToken, TableMatrix, TimetableDocument, TimetableParser, tokens_from_raw};

use crate::Config;
use crate::commands::report::{format_issues, format_summary};

#[derive(Debug, Args)]
pub struct ParseArgs {
    /// Input bundles (JSON with `tokens` and `tables`).
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Output file for a single input, or directory for several.
    ///
    /// Without it a single document is printed to stdout and several are
    /// written next to their inputs.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Do not add the canonical school-day blocks.
    #[arg(long)]
    pub no_default_blocks: bool,
}

/// OCR and table-detection output for one page.
#[derive(Debug, Default, Deserialize)]
pub struct Bundle {
    /// Identifier recorded in the document; defaults to the file name.
    #[serde(default)]
    pub source: Option<String>,

    #[serde(default)]
    pub tokens: Vec<RawToken>,

    #[serde(default)]
    pub tables: Vec<TableMatrix>,
}

impl Bundle {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("invalid bundle JSON in {}", path.display()))
    }
}

/// Where a document goes.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Destination {
    Stdout,
    File(PathBuf),
}

/// Parses every input and writes the documents.
///
/// Inputs are parsed in parallel, one document per thread; output is
/// written in input order. Returns the number of documents written.
pub fn run<W: Write>(writer: &mut W, args: &ParseArgs, config: &Config) -> Result<usize> {
    let mut parser_config = config.parser.clone();
    if args.no_default_blocks {
        parser_config.default_blocks.enabled = false;
    }
    let parser = TimetableParser::new(parser_config);

    let documents: Vec<TimetableDocument> = args
        .inputs
        .par_iter()
        .map(|path| parse_file(&parser, path))
        .collect::<Result<_>>()?;

    for (input, document) in args.inputs.iter().zip(&documents) {
        match destination(input, args.output.as_deref(), args.inputs.len()) {
            Destination::Stdout => {
                serde_json::to_writer_pretty(&mut *writer, document)
                    .context("failed to write document")?;
                writeln!(writer)?;
            }
            Destination::File(path) => {
                let json = serde_json::to_string_pretty(document)
                    .context("failed to serialize document")?;
                std::fs::write(&path, json)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                writeln!(writer, "Wrote {}", path.display())?;
                write!(writer, "{}", format_summary(document))?;
                write!(writer, "{}", format_issues(document))?;
                writeln!(writer)?;
            }
        }
    }

    Ok(documents.len())
}

fn parse_file(parser: &TimetableParser, path: &Path) -> Result<TimetableDocument> {
    let bundle = Bundle::load(path)?;
    let source = bundle.source.unwrap_or_else(|| {
        path.file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
    });
    let tokens = tokens_from_raw(bundle.tokens);
    tracing::debug!(
        %source,
        tokens = tokens.len(),
        tables = bundle.tables.len(),
        "loaded bundle"
    );
    Ok(parser.parse_document(source, &tokens, &bundle.tables))
}

/// Picks the output for one input.
fn destination(input: &Path, output: Option<&Path>, input_count: usize) -> Destination {
    match output {
        Some(path) if input_count == 1 && !path.is_dir() => Destination::File(path.to_path_buf()),
        Some(dir) => Destination::File(dir.join(extracted_name(input))),
        None if input_count == 1 => Destination::Stdout,
        None => Destination::File(input.with_file_name(extracted_name(input))),
    }
}

/// `week1.json` becomes `week1_extracted.json`.
fn extracted_name(input: &Path) -> String {
    let stem = input
        .file_stem()
        .map_or_else(|| "document".into(), |s| s.to_string_lossy());
    format!("{stem}_extracted.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    use ttx_core::Weekday;

    const WEEK: &str = r#"{
        "source": "week1.png",
        "tokens": [
            {"text": "Class: 2EJ", "confidence": 0.95, "position": [0.1, 0.05]}
        ],
        "tables": [
            {"content": [
                ["Day", "9:00-9:30", "9:30-10:00"],
                ["Monday", "Maths", "Maths"],
                ["Tuesday", "Reading", null],
                ["Wednesday", "PE", "Art"]
            ]}
        ]
    }"#;

    fn args(inputs: Vec<PathBuf>, output: Option<PathBuf>) -> ParseArgs {
        ParseArgs {
            inputs,
            output,
            no_default_blocks: true,
        }
    }

    #[test]
    fn single_input_prints_json() {
        let temp = tempfile::tempdir().unwrap();
        let input = temp.path().join("week1.json");
        std::fs::write(&input, WEEK).unwrap();

        let mut output = Vec::new();
        let written = run(&mut output, &args(vec![input], None), &Config::default()).unwrap();
        assert_eq!(written, 1);

        let document: TimetableDocument = serde_json::from_slice(&output).unwrap();
        assert_eq!(document.source, "week1.png");
        assert_eq!(document.metadata.class_name.as_deref(), Some("2EJ"));
        assert_eq!(document.entries_for(Weekday::Monday).count(), 1);
        assert_eq!(document.len(), 4);
    }

    #[test]
    fn several_inputs_go_to_an_output_directory() {
        let temp = tempfile::tempdir().unwrap();
        let out_dir = temp.path().join("out");
        std::fs::create_dir(&out_dir).unwrap();
        let first = temp.path().join("week1.json");
        let second = temp.path().join("week2.json");
        std::fs::write(&first, WEEK).unwrap();
        std::fs::write(&second, r#"{"tokens": [], "tables": []}"#).unwrap();

        let mut output = Vec::new();
        run(
            &mut output,
            &args(vec![first, second], Some(out_dir.clone())),
            &Config::default(),
        )
        .unwrap();

        let empty: TimetableDocument = serde_json::from_str(
            &std::fs::read_to_string(out_dir.join("week2_extracted.json")).unwrap(),
        )
        .unwrap();
        assert!(empty.is_empty());
        assert_eq!(empty.source, "week2.json");
        assert!(out_dir.join("week1_extracted.json").exists());

        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("Total Entries: 4"));
        assert!(output.contains("No timetable entries were extracted"));
    }

    #[test]
    fn default_blocks_are_on_unless_disabled() {
        let temp = tempfile::tempdir().unwrap();
        let input = temp.path().join("week1.json");
        std::fs::write(&input, WEEK).unwrap();

        let mut output = Vec::new();
        let with_blocks = ParseArgs {
            no_default_blocks: false,
            ..args(vec![input], None)
        };
        run(&mut output, &with_blocks, &Config::default()).unwrap();
        let document: TimetableDocument = serde_json::from_slice(&output).unwrap();
        assert_eq!(document.len(), 16);
    }

    #[test]
    fn missing_input_is_an_error() {
        let temp = tempfile::tempdir().unwrap();
        let error = run(
            &mut Vec::new(),
            &args(vec![temp.path().join("absent.json")], None),
            &Config::default(),
        )
        .unwrap_err();
        assert!(error.to_string().contains("failed to read"));
    }

    #[test]
    fn destinations() {
        let input = Path::new("/data/week1.json");
        assert_eq!(destination(input, None, 1), Destination::Stdout);
        assert_eq!(
            destination(input, None, 2),
            Destination::File(PathBuf::from("/data/week1_extracted.json"))
        );
        assert_eq!(
            destination(input, Some(Path::new("/tmp/doc.json")), 1),
            Destination::File(PathBuf::from("/tmp/doc.json"))
        );
    }
}
