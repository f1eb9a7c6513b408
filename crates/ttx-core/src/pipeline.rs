//! The end-to-end parse: tokens and tables in, finished document out.

use crate::config::ParserConfig;
use crate::document::TimetableDocument;
use crate::header::HeaderInference;
use crate::metadata::MetadataExtractor;
use crate::normalize::ActivityNormalizer;
use crate::postprocess::PostProcessor;
use crate::table::TableEntryBuilder;
use crate::time_parser::TimeParser;
use crate::token::{TableMatrix, Token};

/// Reusable timetable parser.
///
/// Holds only compiled patterns and settings; every call to
/// [`parse_document`](Self::parse_document) owns its own working state, so
/// one parser can serve many documents, including from several threads.
#[derive(Debug, Clone, Default)]
pub struct TimetableParser {
    config: ParserConfig,
    times: TimeParser,
    metadata: MetadataExtractor,
    normalizer: ActivityNormalizer,
}

impl TimetableParser {
    #[must_use]
    pub fn new(config: ParserConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn config(&self) -> &ParserConfig {
        &self.config
    }

    #[must_use]
    pub const fn time_parser(&self) -> &TimeParser {
        &self.times
    }

    /// Parses one document.
    ///
    /// Tables, when present, are the only entry source. Without tables the
    /// tokens are read through inferred header columns, or row by row when
    /// no header can be inferred. Never fails; a page with nothing usable
    /// gives a document with no entries.
    #[must_use]
    pub fn parse_document(
        &self,
        source: impl Into<String>,
        tokens: &[Token],
        tables: &[TableMatrix],
    ) -> TimetableDocument {
        let mut document = TimetableDocument::new(source);
        let extracted = self
            .metadata
            .extract(tokens, self.config.metadata_token_limit);
        document.metadata = extracted.metadata;

        let (entries, header_slots) = if tables.is_empty() {
            let inference = HeaderInference::new(&self.times, &self.config);
            match inference.infer(tokens, &extracted.token_indices) {
                Some(inferred) => {
                    tracing::debug!(source = %document.source, "using inferred header columns");
                    let slots = inferred.header_slots();
                    (inferred.entries, slots)
                }
                None => {
                    tracing::debug!(source = %document.source, "falling back to row walk");
                    (
                        inference.row_walk(tokens, &extracted.token_indices),
                        Vec::new(),
                    )
                }
            }
        } else {
            tracing::debug!(
                source = %document.source,
                tables = tables.len(),
                "reading entries from tables"
            );
            let builder = TableEntryBuilder::new(
                &self.times,
                self.config.table_confidence,
                self.config.generic_confidence,
            );
            tables
                .iter()
                .map(|table| builder.build(table))
                .fold((Vec::new(), Vec::new()), |(mut entries, mut slots), built| {
                    entries.extend(built.entries);
                    slots.extend(built.header_slots);
                    (entries, slots)
                })
        };

        let processed = PostProcessor::new(&self.times, &self.config.default_blocks)
            .process(entries, &header_slots);
        document.entries = self.normalizer.apply(processed);

        tracing::debug!(
            source = %document.source,
            entries = document.len(),
            "parsed document"
        );
        document
    }
}
