//! Spatial grouping of tokens into visual rows.

use crate::token::Token;

/// Default vertical tolerance, in normalised page height.
pub const DEFAULT_ROW_THRESHOLD: f64 = 0.02;

/// Groups tokens into rows by normalised vertical position.
///
/// # Algorithm
///
/// 1. Sort by `y`, then `x`
/// 2. The first token seeds a row and fixes the row's `y`
/// 3. A token within `threshold` of that `y` joins the row; any other token
///    closes the row and seeds the next one
/// 4. Each closed row is ordered left to right
///
/// The anchor is the row's first token, not a running mean, so a slowly
/// sloping line of text can be split across rows.
pub fn group_rows<'a, I>(tokens: I, threshold: f64) -> Vec<Vec<&'a Token>>
where
    I: IntoIterator<Item = &'a Token>,
{
    let mut sorted: Vec<&Token> = tokens.into_iter().collect();
    sorted.sort_by(|a, b| {
        a.position()
            .y
            .total_cmp(&b.position().y)
            .then(a.position().x.total_cmp(&b.position().x))
    });

    let mut rows: Vec<Vec<&Token>> = Vec::new();
    let mut current: Vec<&Token> = Vec::new();
    let mut anchor_y = 0.0;

    for token in sorted {
        let y = token.position().y;
        if !current.is_empty() && (y - anchor_y).abs() > threshold {
            rows.push(close_row(std::mem::take(&mut current)));
        }
        if current.is_empty() {
            anchor_y = y;
        }
        current.push(token);
    }
    if !current.is_empty() {
        rows.push(close_row(current));
    }
    rows
}

fn close_row(mut row: Vec<&Token>) -> Vec<&Token> {
    row.sort_by(|a, b| a.position().x.total_cmp(&b.position().x));
    row
}
