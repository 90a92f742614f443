//! Delta-from-low price groups and the volume series.

use super::DecodeError;
use std::str::FromStr;

/// One day's prices in fen (hundredths of a yuan).
///
/// The wire form is `(low, openDelta, highDelta, closeDelta)`; only `low`
/// is absolute. Nothing here enforces `low <= open/high/close`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceGroup {
    pub low: i64,
    pub open: i64,
    pub high: i64,
    pub close: i64,
}

impl PriceGroup {
    pub fn from_deltas(low: i64, open_delta: i64, high_delta: i64, close_delta: i64) -> Option<Self> {
        Some(Self {
            low,
            open: low.checked_add(open_delta)?,
            high: low.checked_add(high_delta)?,
            close: low.checked_add(close_delta)?,
        })
    }
}

/// Convert fen to yuan.
///
/// The input is already an exact number of hundredths, so the result is
/// the nearest `f64` to a 2-decimal value and needs no further rounding.
pub fn fen_to_yuan(fen: i64) -> f64 {
    fen as f64 / 100.0
}

/// Parse a comma-separated integer list. An empty field is an empty list.
pub fn parse_int_list<T: FromStr>(field: &str, raw: &str) -> Result<Vec<T>, DecodeError> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    raw.split(',')
        .enumerate()
        .map(|(i, token)| {
            token.trim().parse::<T>().map_err(|_| {
                DecodeError::Malformed(format!("{field}[{i}] is not an integer: {token:?}"))
            })
        })
        .collect()
}

/// Decode the `price` field into groups of four.
pub fn decode_price_groups(price: &str) -> Result<Vec<PriceGroup>, DecodeError> {
    let values: Vec<i64> = parse_int_list("price", price)?;
    if values.len() % 4 != 0 {
        return Err(DecodeError::Malformed(format!(
            "price has {} values, not a multiple of 4",
            values.len()
        )));
    }

    values
        .chunks_exact(4)
        .enumerate()
        .map(|(i, t)| {
            PriceGroup::from_deltas(t[0], t[1], t[2], t[3])
                .ok_or_else(|| DecodeError::Malformed(format!("price group {i} overflows")))
        })
        .collect()
}
