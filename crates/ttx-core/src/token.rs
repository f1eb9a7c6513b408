//! Producer-side inputs: OCR tokens and detected table matrices.
//!
//! Both arrive as loosely typed JSON from the OCR and table-detection
//! stages. `RawToken` mirrors that shape; `Token` is the validated form the
//! engine works with. Malformed records are dropped here with a warning so
//! that one bad token never aborts a parse.

use serde::{Deserialize, Deserializer, Serialize};

use crate::types::{Confidence, ValidationError};

/// A point in pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<[f64; 2]> for Point {
    fn from([x, y]: [f64; 2]) -> Self {
        Self { x, y }
    }
}

/// A quadrilateral around a token, in pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox([Point; 4]);

impl BoundingBox {
    /// Builds a box from four corners.
    pub fn new(corners: [Point; 4]) -> Result<Self, ValidationError> {
        if corners.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
            return Err(ValidationError::DegenerateBox {
                reason: "non-finite coordinate",
            });
        }
        let bbox = Self(corners);
        if bbox.max_x() - bbox.min_x() <= 0.0 && bbox.max_y() - bbox.min_y() <= 0.0 {
            return Err(ValidationError::DegenerateBox {
                reason: "zero area",
            });
        }
        Ok(bbox)
    }

    /// Axis-aligned box from two corners.
    pub fn from_extents(x0: f64, y0: f64, x1: f64, y1: f64) -> Result<Self, ValidationError> {
        Self::new([
            Point::new(x0, y0),
            Point::new(x1, y0),
            Point::new(x1, y1),
            Point::new(x0, y1),
        ])
    }

    #[must_use]
    pub const fn corners(&self) -> &[Point; 4] {
        &self.0
    }

    #[must_use]
    pub fn min_x(&self) -> f64 {
        self.0.iter().map(|p| p.x).fold(f64::INFINITY, f64::min)
    }

    #[must_use]
    pub fn max_x(&self) -> f64 {
        self.0.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max)
    }

    #[must_use]
    pub fn min_y(&self) -> f64 {
        self.0.iter().map(|p| p.y).fold(f64::INFINITY, f64::min)
    }

    #[must_use]
    pub fn max_y(&self) -> f64 {
        self.0.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max)
    }

    /// Mean of the four corners.
    #[must_use]
    pub fn center(&self) -> Point {
        let (sx, sy) = self
            .0
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        Point::new(sx / 4.0, sy / 4.0)
    }
}

/// One OCR-recognised text fragment. Immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    text: String,
    bbox: Option<BoundingBox>,
    confidence: Confidence,
    position: Point,
    center: Point,
}

impl Token {
    /// Creates a token, rejecting empty text.
    ///
    /// `position` is the normalised (0..1) centre, `center` the pixel centre.
    pub fn new(
        text: impl Into<String>,
        bbox: Option<BoundingBox>,
        confidence: Confidence,
        position: Point,
        center: Point,
    ) -> Result<Self, ValidationError> {
        let text = text.into().trim().to_string();
        if text.is_empty() {
            return Err(ValidationError::Empty {
                field: "token text",
            });
        }
        Ok(Self {
            text,
            bbox,
            confidence,
            position,
            center,
        })
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub const fn bbox(&self) -> Option<&BoundingBox> {
        self.bbox.as_ref()
    }

    #[must_use]
    pub const fn confidence(&self) -> Confidence {
        self.confidence
    }

    /// Normalised centre position, both axes in \[0, 1\].
    #[must_use]
    pub const fn position(&self) -> Point {
        self.position
    }

    /// Centre in pixel space.
    #[must_use]
    pub const fn center(&self) -> Point {
        self.center
    }

    /// Horizontal pixel extent: the box when present, else the centre point.
    #[must_use]
    pub fn x_extent(&self) -> (f64, f64) {
        self.bbox
            .as_ref()
            .map_or((self.center.x, self.center.x), |b| (b.min_x(), b.max_x()))
    }
}

/// A token as emitted by the OCR collaborator, before validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawToken {
    #[serde(default)]
    pub text: Option<String>,

    #[serde(default)]
    pub bbox: Option<Vec<[f64; 2]>>,

    /// Kept untyped so that a non-numeric value skips one token instead of
    /// failing the whole bundle.
    #[serde(default)]
    pub confidence: serde_json::Value,

    #[serde(default)]
    pub position: Option<[f64; 2]>,

    #[serde(default)]
    pub center: Option<[f64; 2]>,
}

impl TryFrom<RawToken> for Token {
    type Error = ValidationError;

    fn try_from(raw: RawToken) -> Result<Self, Self::Error> {
        let text = raw.text.unwrap_or_default();

        let confidence = match raw.confidence.as_f64() {
            Some(value) if value.is_finite() => Confidence::new(ratio_to_f32(value))?,
            _ => {
                return Err(ValidationError::NonNumericConfidence {
                    raw: raw.confidence.to_string(),
                });
            }
        };

        let bbox = match raw.bbox {
            None => None,
            Some(points) => {
                let corners: [[f64; 2]; 4] =
                    points
                        .try_into()
                        .map_err(|_| ValidationError::DegenerateBox {
                            reason: "expected four corners",
                        })?;
                Some(BoundingBox::new(corners.map(Point::from))?)
            }
        };

        let center = raw
            .center
            .map(Point::from)
            .or_else(|| bbox.as_ref().map(BoundingBox::center))
            .unwrap_or(Point::new(0.0, 0.0));
        let position = raw.position.map_or(Point::new(0.0, 0.0), Point::from);

        Self::new(text, bbox, confidence, position, center)
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "confidence is a ratio, f32 precision is plenty"
)]
fn ratio_to_f32(value: f64) -> f32 {
    value as f32
}

/// Validates producer tokens, skipping malformed ones.
pub fn tokens_from_raw<I: IntoIterator<Item = RawToken>>(raw: I) -> Vec<Token> {
    raw.into_iter()
        .enumerate()
        .filter_map(|(index, raw)| match Token::try_from(raw) {
            Ok(token) => Some(token),
            Err(error) => {
                tracing::warn!(index, %error, "skipping malformed token");
                None
            }
        })
        .collect()
}

/// A table produced by the detection stage: rows of cell strings.
///
/// Rows may be ragged. Row 0 is the candidate header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMatrix {
    #[serde(deserialize_with = "deserialize_cells")]
    pub content: Vec<Vec<String>>,
}

impl TableMatrix {
    #[must_use]
    pub const fn new(content: Vec<Vec<String>>) -> Self {
        Self { content }
    }

    /// Builds a matrix from string slices.
    #[must_use]
    pub fn from_rows<R, C>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self {
            content: rows
                .into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
        }
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.content
    }

    /// Cell text, or `""` when the row is too short.
    #[must_use]
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.content
            .get(row)
            .and_then(|r| r.get(column))
            .map_or("", String::as_str)
    }

    #[must_use]
    pub fn header(&self) -> &[String] {
        self.content.first().map_or(&[], Vec::as_slice)
    }
}

/// Accepts strings, numbers, booleans and nulls as cell values.
fn deserialize_cells<'de, D>(deserializer: D) -> Result<Vec<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let rows = Vec::<Vec<serde_json::Value>>::deserialize(deserializer)?;
    Ok(rows
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|cell| match cell {
                    serde_json::Value::Null => String::new(),
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                })
                .collect()
        })
        .collect())
}
