//! Fixed-width station/elevation encoding used by `#Sta/Elev=` tables.
//!
//! Each pair is two right-justified 8 character fields, station first, with
//! no separator. Pairs are packed five to a line, so a full line is exactly
//! 80 characters and the last line of a table may be shorter.

use crate::error::FormatError;

pub const FIELD_WIDTH: usize = 8;
pub const PAIR_WIDTH: usize = 2 * FIELD_WIDTH;
pub const PAIRS_PER_LINE: usize = 5;
pub const LINE_WIDTH: usize = PAIR_WIDTH * PAIRS_PER_LINE;

const MAX_DECIMALS: usize = 3;

/// Formats one value into an 8 character field.
///
/// Three decimals are written when they fit; larger magnitudes give up
/// decimals one at a time.
pub fn encode_field(value: f64) -> Result<String, FormatError> {
    if value.is_finite() {
        for decimals in (0..=MAX_DECIMALS).rev() {
            let field = format!("{:>width$.prec$}", value, width = FIELD_WIDTH, prec = decimals);
            if field.len() <= FIELD_WIDTH {
                return Ok(field);
            }
        }
    }
    Err(FormatError::FieldOverflow { value })
}

pub fn encode_pair(station: f64, elevation: f64) -> Result<String, FormatError> {
    let mut pair = encode_field(station)?;
    pair.push_str(&encode_field(elevation)?);
    Ok(pair)
}

pub fn decode_field(field: &str) -> Option<f64> {
    field.trim().parse().ok()
}

/// Parses a 16 character pair back into (station, elevation).
pub fn decode_pair(text: &str) -> Result<(f64, f64), FormatError> {
    let invalid = || FormatError::InvalidPair {
        text: text.to_string(),
    };
    if text.len() != PAIR_WIDTH {
        return Err(invalid());
    }
    let station = text.get(..FIELD_WIDTH).and_then(decode_field);
    let elevation = text.get(FIELD_WIDTH..).and_then(decode_field);
    match (station, elevation) {
        (Some(station), Some(elevation)) => Ok((station, elevation)),
        _ => Err(invalid()),
    }
}

/// Splits a table body line into its pairs. A trailing fragment shorter than
/// a pair is ignored.
pub fn split_pairs(line: &str) -> Vec<&str> {
    let mut pairs = Vec::with_capacity(PAIRS_PER_LINE);
    let mut start = 0;
    while let Some(pair) = line.get(start..start + PAIR_WIDTH) {
        pairs.push(pair);
        start += PAIR_WIDTH;
    }
    pairs
}

/// First pair on a table body line, verbatim.
pub fn leading_pair(line: &str) -> Option<&str> {
    line.get(..PAIR_WIDTH)
}

/// Last pair on a table body line, verbatim.
pub fn trailing_pair(line: &str) -> Option<&str> {
    let start = line.len().checked_sub(PAIR_WIDTH)?;
    line.get(start..)
}

/// Packs encoded pairs into table body lines.
pub fn pack_pairs<S: AsRef<str>>(pairs: &[S]) -> Vec<String> {
    pairs
        .chunks(PAIRS_PER_LINE)
        .map(|chunk| chunk.iter().map(AsRef::as_ref).collect::<String>())
        .collect()
}
