//! Trading calendar: `dates` tokens grouped by `sortYear`.

use super::DecodeError;

/// Split the `dates` field into `MMDD` tokens.
///
/// The provider sends comma-separated tokens; a field without commas is a
/// flat digit string read in 4-character groups.
pub fn date_tokens(dates: &str) -> Vec<&str> {
    if dates.is_empty() {
        return Vec::new();
    }
    if dates.contains(',') {
        return dates.split(',').collect();
    }

    let mut tokens = Vec::with_capacity(dates.len() / 4 + 1);
    let mut rest = dates;
    while !rest.is_empty() {
        let (head, tail) = rest.split_at(char_offset(rest, 4));
        tokens.push(head);
        rest = tail;
    }
    tokens
}

/// Expand `(year, count)` groups over the date tokens, in order.
///
/// Each date is `{year}-{token[0..2]}-{token[2..]}` built from the literal
/// substrings; the token is not validated or re-padded.
pub fn decode_trading_dates(
    dates: &str,
    year_counts: &[(i64, usize)],
) -> Result<Vec<String>, DecodeError> {
    let tokens = date_tokens(dates);
    let needed = year_counts
        .iter()
        .try_fold(0usize, |acc, &(_, count)| acc.checked_add(count))
        .ok_or_else(|| DecodeError::Malformed("sortYear counts overflow".into()))?;

    if needed > tokens.len() {
        return Err(DecodeError::IndexOutOfRange {
            field: "dates",
            needed,
            available: tokens.len(),
        });
    }

    let mut out = Vec::with_capacity(needed);
    let mut next = tokens.iter();
    for &(year, count) in year_counts {
        for token in next.by_ref().take(count) {
            let (month, day) = token.split_at(char_offset(token, 2));
            out.push(format!("{year}-{month}-{day}"));
        }
    }
    Ok(out)
}

/// Byte offset of the `n`th char, or the string length if shorter.
fn char_offset(s: &str, n: usize) -> usize {
    s.char_indices().nth(n).map_or(s.len(), |(i, _)| i)
}
