//! Document metadata read from the first tokens on the page.

use std::collections::BTreeSet;
use std::ops::Range;

use regex::Regex;

use crate::document::DocumentMetadata;
use crate::token::Token;

/// Metadata plus the tokens it was read from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedMetadata {
    pub metadata: DocumentMetadata,
    /// Indices (into the token slice) of tokens that matched a field.
    pub token_indices: BTreeSet<usize>,
}

/// Pattern-based metadata extractor.
///
/// Looks only at the first `limit` tokens in reading order. The first match
/// wins per field; nothing is scored and nothing is required.
#[derive(Debug, Clone)]
pub struct MetadataExtractor {
    class: Regex,
    teacher: Regex,
    term: Regex,
    school: Regex,
}

impl Default for MetadataExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataExtractor {
    /// # Panics
    ///
    /// Never in practice: all patterns are fixed literals.
    #[must_use]
    pub fn new() -> Self {
        let compile =
            |pattern: &str| Regex::new(pattern).expect("metadata pattern is a valid regex");
        Self {
            class: compile(r"(?i)\bclass[:\s]+([a-z0-9]+)|^(\d[a-z]{1,3})\b"),
            teacher: compile(
                r"(?i)(?:\bteacher[:\s]+)?\b((?:miss|mrs|mr|ms|dr)\.?\s+[a-z][a-z'\-]*)",
            ),
            term: compile(r"(?i)\b(?:autumn|spring|summer)\s*\d+\s*(?:week[:\s]+\d+)?\s*\d{4}"),
            school: compile(
                r"(?i)\b([a-z][a-z'&.\-]*(?:\s+[a-z][a-z'&.\-]*)*?\s+(?:primary|secondary|school)\b(?:\s+school\b)?)",
            ),
        }
    }

    /// Reads class, teacher, term and school from the first `limit` tokens.
    #[must_use]
    pub fn extract(&self, tokens: &[Token], limit: usize) -> ExtractedMetadata {
        let head = &tokens[..tokens.len().min(limit)];
        if head.is_empty() {
            return ExtractedMetadata::default();
        }

        // Joined text with the byte range each token occupies.
        let mut joined = String::new();
        let mut spans = Vec::with_capacity(head.len());
        for token in head {
            if !joined.is_empty() {
                joined.push(' ');
            }
            let start = joined.len();
            joined.push_str(token.text());
            spans.push(start..joined.len());
        }

        let mut found = ExtractedMetadata::default();
        let mut mark = |range: Range<usize>| {
            for (index, span) in spans.iter().enumerate() {
                if span.start < range.end && range.start < span.end {
                    found.token_indices.insert(index);
                }
            }
        };

        let class_name = self.class.captures(&joined).and_then(|caps| {
            let group = caps.get(1).or_else(|| caps.get(2))?;
            mark(caps.get(0)?.range());
            Some(group.as_str().to_string())
        });

        let teacher_name = self.teacher.captures(&joined).and_then(|caps| {
            let group = caps.get(1)?;
            mark(caps.get(0)?.range());
            Some(title_case(group.as_str()))
        });

        let term = self.term.find(&joined).map(|m| {
            mark(m.range());
            title_case(m.as_str())
        });

        // Searched token by token so a name never straddles unrelated tokens.
        let school_name = head
            .iter()
            .enumerate()
            .find_map(|(index, token)| {
                let caps = self.school.captures(token.text())?;
                Some((index, title_case(caps.get(1)?.as_str().trim())))
            })
            .map(|(index, name)| {
                mark(spans[index].clone());
                name
            });

        found.metadata = DocumentMetadata {
            class_name,
            teacher_name,
            term,
            school_name,
        };
        tracing::debug!(
            metadata_tokens = found.token_indices.len(),
            class = ?found.metadata.class_name,
            teacher = ?found.metadata.teacher_name,
            "extracted metadata"
        );
        found
    }
}

/// Capitalises the first letter of each alphabetic run, lowercasing the rest.
#[must_use]
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut previous_alpha = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if previous_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            previous_alpha = true;
        } else {
            out.push(c);
            previous_alpha = false;
        }
    }
    out
}
