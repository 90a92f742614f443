//! KDataRecord: one decoded daily k-line, plus the adjustment mode it was
//! fetched with.

use super::security::{Security, SecurityType};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Bar interval. The provider endpoint crawled here only serves daily bars.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum KLevel {
    #[default]
    #[serde(rename = "DAY")]
    Day,
}

/// Dividend/split adjustment ("fuquan") of a fetched series.
///
/// The numeric code is the second digit of the `0<flag>` URL segment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustFlag {
    #[default]
    None,
    Forward,
    Backward,
}

impl AdjustFlag {
    pub fn code(&self) -> u8 {
        match self {
            AdjustFlag::None => 0,
            AdjustFlag::Forward => 1,
            AdjustFlag::Backward => 2,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(AdjustFlag::None),
            1 => Some(AdjustFlag::Forward),
            2 => Some(AdjustFlag::Backward),
            _ => None,
        }
    }

    /// URL path segment: `00`, `01` or `02`.
    pub fn url_segment(&self) -> String {
        format!("0{}", self.code())
    }

    /// File name of the k-line output for this adjustment.
    pub fn kdata_file_name(&self) -> &'static str {
        match self {
            AdjustFlag::None => "ths_dayk.json",
            AdjustFlag::Forward | AdjustFlag::Backward => "ths_fuquan_dayk.json",
        }
    }
}

/// Daily OHLCV record for one security on one trading day.
///
/// Prices are yuan with two decimals; `timestamp` is the trading date
/// exactly as reconstructed from the provider's calendar encoding.
/// Field order is the serialized order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KDataRecord {
    #[serde(rename = "securityId")]
    pub security_id: String,
    pub code: String,
    #[serde(rename = "type")]
    pub security_type: SecurityType,
    pub level: KLevel,
    pub high: f64,
    pub low: f64,
    pub open: f64,
    pub close: f64,
    pub volume: i64,
    pub timestamp: String,
}

impl KDataRecord {
    pub fn new(
        security: &Security,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: i64,
        timestamp: String,
    ) -> Self {
        Self {
            security_id: security.id.clone(),
            code: security.code.clone(),
            security_type: security.security_type,
            level: KLevel::Day,
            high,
            low,
            open,
            close,
            volume,
            timestamp,
        }
    }

    /// The trading date, if `timestamp` is a valid calendar date.
    pub fn date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.timestamp, "%Y-%m-%d").ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Exchange;

    fn sample() -> KDataRecord {
        let sec = Security::stock(Exchange::Sh, "600000", "");
        KDataRecord::new(&sec, 1.5, 1.8, 1.0, 1.3, 12_000, "2020-01-15".into())
    }

    #[test]
    fn serializes_in_output_field_order() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert_eq!(
            json,
            r#"{"securityId":"stock_sh_600000","code":"600000","type":"stock","level":"DAY","high":1.8,"low":1.0,"open":1.5,"close":1.3,"volume":12000,"timestamp":"2020-01-15"}"#
        );
    }

    #[test]
    fn date_parses_timestamp() {
        assert_eq!(sample().date(), NaiveDate::from_ymd_opt(2020, 1, 15));
        let mut bad = sample();
        bad.timestamp = "2020-13-01".into();
        assert_eq!(bad.date(), None);
    }

    #[test]
    fn adjust_flag_segments() {
        assert_eq!(AdjustFlag::None.url_segment(), "00");
        assert_eq!(AdjustFlag::Backward.url_segment(), "02");
        assert_eq!(AdjustFlag::from_code(1), Some(AdjustFlag::Forward));
        assert_eq!(AdjustFlag::from_code(3), None);
        assert_eq!(AdjustFlag::Forward.kdata_file_name(), "ths_fuquan_dayk.json");
    }
}
