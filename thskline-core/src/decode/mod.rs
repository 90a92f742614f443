//! Decoder for the THS `all.js` daily k-line payload.
//!
//! The payload carries four parallel encodings:
//! - `dates` + `sortYear`: the trading calendar, `MMDD` tokens grouped by year
//! - `price`: `(low, openDelta, highDelta, closeDelta)` groups in fen
//! - `volumn`: one volume per day
//! - `total`: how many records to zip out of the three sequences
//!
//! Decoding is a pure function of the body. The calendar and the records are
//! decoded as two independent results so a caller can keep the calendar when
//! the price data is bad.

mod calendar;
mod payload;
mod price;

pub use calendar::{date_tokens, decode_trading_dates};
pub use payload::{extract_object, Payload};
pub use price::{decode_price_groups, fen_to_yuan, parse_int_list, PriceGroup};

use crate::domain::{KDataRecord, Security};
use thiserror::Error;

/// Why a body could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("no payload object found in response body")]
    NoPayloadFound,

    #[error("{field} out of range: need {needed}, have {available}")]
    IndexOutOfRange {
        field: &'static str,
        needed: usize,
        available: usize,
    },

    #[error("malformed payload: {0}")]
    Malformed(String),
}

/// Both decode results for one body.
///
/// `records` is never `Ok` when `trading_dates` is `Err`, since every record
/// takes its timestamp from the calendar.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeOutcome {
    pub trading_dates: Result<Vec<String>, DecodeError>,
    pub records: Result<Vec<KDataRecord>, DecodeError>,
}

impl DecodeOutcome {
    fn failed(err: DecodeError) -> Self {
        Self {
            trading_dates: Err(err.clone()),
            records: Err(err),
        }
    }

    /// Collapse into `(records, trading_dates)`, failing if either part failed.
    pub fn into_result(self) -> Result<(Vec<KDataRecord>, Vec<String>), DecodeError> {
        let trading_dates = self.trading_dates?;
        let records = self.records?;
        Ok((records, trading_dates))
    }
}

/// Decode a body into records and trading dates, all or nothing.
pub fn decode(
    security: &Security,
    body: &str,
) -> Result<(Vec<KDataRecord>, Vec<String>), DecodeError> {
    decode_independent(security, body).into_result()
}

/// Decode a body, keeping the calendar result separate from the records.
pub fn decode_independent(security: &Security, body: &str) -> DecodeOutcome {
    let payload = match Payload::from_body(body) {
        Ok(p) => p,
        Err(e) => return DecodeOutcome::failed(e),
    };

    let trading_dates = payload
        .year_counts()
        .and_then(|groups| decode_trading_dates(payload.str_field("dates")?, &groups));

    let records = match &trading_dates {
        Ok(dates) => decode_records(security, &payload, dates),
        Err(e) => Err(e.clone()),
    };

    DecodeOutcome {
        trading_dates,
        records,
    }
}

fn decode_records(
    security: &Security,
    payload: &Payload,
    trading_dates: &[String],
) -> Result<Vec<KDataRecord>, DecodeError> {
    let prices = decode_price_groups(payload.str_field("price")?)?;
    let volumes: Vec<i64> = parse_int_list("volumn", payload.str_field("volumn")?)?;

    let total = payload.int_field("total")?;
    let total = usize::try_from(total)
        .map_err(|_| DecodeError::Malformed(format!("negative total: {total}")))?;

    for (field, available) in [
        ("price", prices.len()),
        ("volumn", volumes.len()),
        ("dates", trading_dates.len()),
    ] {
        if total > available {
            return Err(DecodeError::IndexOutOfRange {
                field,
                needed: total,
                available,
            });
        }
    }

    let records = prices
        .iter()
        .zip(&volumes)
        .zip(trading_dates)
        .take(total)
        .map(|((p, &volume), date)| {
            KDataRecord::new(
                security,
                fen_to_yuan(p.open),
                fen_to_yuan(p.high),
                fen_to_yuan(p.low),
                fen_to_yuan(p.close),
                volume,
                date.clone(),
            )
        })
        .collect();
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Exchange;

    fn sec() -> Security {
        Security::stock(Exchange::Sh, "600000", "浦发银行")
    }

    fn body(dates: &str, sort_year: &str, price: &str, volumn: &str, total: &str) -> String {
        format!(
            r#"quotebridge_v6_line_hs_600000_00_all({{"total":{total},"start":"20200115","sortYear":{sort_year},"priceFactor":100,"price":"{price}","volumn":"{volumn}","dates":"{dates}"}})"#
        )
    }

    #[test]
    fn decodes_single_day() {
        let b = body("0115", "[[2020,1]]", "100,50,80,30", "12000", r#""1""#);
        let (records, dates) = decode(&sec(), &b).unwrap();
        assert_eq!(dates, vec!["2020-01-15"]);
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!((r.low, r.open, r.high, r.close), (1.0, 1.5, 1.8, 1.3));
        assert_eq!(r.volume, 12000);
        assert_eq!(r.timestamp, "2020-01-15");
        assert_eq!(r.security_id, "stock_sh_600000");
        assert_eq!(r.code, "600000");
    }

    #[test]
    fn total_zero_yields_no_records() {
        let b = body("0115", "[[2020,1]]", "100,50,80,30", "12000", "0");
        let (records, dates) = decode(&sec(), &b).unwrap();
        assert!(records.is_empty());
        assert_eq!(dates.len(), 1);
    }

    #[test]
    fn total_shorter_than_sequences_truncates() {
        let b = body(
            "0115,0116",
            "[[2020,2]]",
            "100,50,80,30,110,0,10,5",
            "1,2",
            "1",
        );
        let (records, _) = decode(&sec(), &b).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn total_beyond_prices_is_out_of_range() {
        let b = body("0115,0116", "[[2020,2]]", "100,50,80,30", "1,2", "2");
        let outcome = decode_independent(&sec(), &b);
        assert_eq!(
            outcome.records,
            Err(DecodeError::IndexOutOfRange {
                field: "price",
                needed: 2,
                available: 1
            })
        );
        assert_eq!(
            outcome.trading_dates,
            Ok(vec!["2020-01-15".to_string(), "2020-01-16".to_string()])
        );
    }

    #[test]
    fn total_beyond_calendar_is_out_of_range() {
        let b = body("0115", "[[2020,1]]", "100,50,80,30,100,1,2,3", "1,2", "2");
        let err = decode(&sec(), &b).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::IndexOutOfRange { field: "dates", .. }
        ));
    }

    #[test]
    fn bad_volume_keeps_calendar() {
        let b = body("0115", "[[2020,1]]", "100,50,80,30", "abc", "1");
        let outcome = decode_independent(&sec(), &b);
        assert!(matches!(outcome.records, Err(DecodeError::Malformed(_))));
        assert_eq!(outcome.trading_dates.unwrap(), vec!["2020-01-15"]);
    }

    #[test]
    fn negative_volume_passes_through() {
        let b = body("0115,0116", "[[2020,2]]", "100,50,80,30,100,0,0,0", "-5,0", "2");
        let (records, _) = decode(&sec(), &b).unwrap();
        assert_eq!(records[0].volume, -5);
        assert_eq!(records[1].volume, 0);
    }

    #[test]
    fn bad_calendar_fails_both() {
        let b = body("0115", "[[2020,2]]", "100,50,80,30", "1", "1");
        let outcome = decode_independent(&sec(), &b);
        assert!(outcome.trading_dates.is_err());
        assert!(outcome.records.is_err());
    }

    #[test]
    fn missing_braces_fail_both() {
        let outcome = decode_independent(&sec(), "<html>403 Forbidden</html>");
        assert_eq!(outcome.trading_dates, Err(DecodeError::NoPayloadFound));
        assert_eq!(outcome.records, Err(DecodeError::NoPayloadFound));
    }

    #[test]
    fn negative_total_is_malformed() {
        let b = body("0115", "[[2020,1]]", "100,50,80,30", "1", "-1");
        assert!(matches!(
            decode(&sec(), &b),
            Err(DecodeError::Malformed(_))
        ));
    }

    #[test]
    fn decode_is_idempotent() {
        let b = body(
            "1231,0102",
            "[[2019,1],[2020,1]]",
            "1000,5,20,10,1010,0,15,3",
            "500,600",
            "2",
        );
        assert_eq!(decode(&sec(), &b), decode(&sec(), &b));
    }
}
