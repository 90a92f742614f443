//! Serializable crawl configuration.
//!
//! Loaded from TOML; every field has a default, so a file only needs the
//! keys it changes. CLI flags are applied on top by the binary.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use thskline_core::data::{default_headers, DEFAULT_BASE_URL};
use thskline_core::domain::AdjustFlag;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Everything the crawl needs, passed in at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Quote server prefix; `/hs_<code>/0<adjust>/all.js` is appended.
    pub base_url: String,

    /// First code to crawl (inclusive, lexicographic).
    pub start_code: String,

    /// Last code to crawl (inclusive, lexicographic).
    pub end_code: String,

    /// Price adjustment to request.
    pub adjust: AdjustFlag,

    /// Root of the per-security output tree.
    pub store_dir: PathBuf,

    /// Directory holding `sh.csv` and `sz.csv`.
    pub list_dir: PathBuf,

    /// Maximum simultaneous requests to the quote server.
    pub max_in_flight: usize,

    /// Minimum delay between two dispatches, in milliseconds.
    pub download_delay_ms: u64,

    /// Per-request timeout, in seconds.
    pub request_timeout_secs: u64,

    /// Headers sent with every request.
    pub headers: BTreeMap<String, String>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            start_code: "000001".to_string(),
            end_code: "666666".to_string(),
            adjust: AdjustFlag::None,
            store_dir: PathBuf::from("data"),
            list_dir: PathBuf::from("data/meta/stock"),
            max_in_flight: 8,
            download_delay_ms: 2000,
            request_timeout_secs: 30,
            headers: default_headers(),
        }
    }
}

impl CrawlConfig {
    /// Load a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Serialize the config to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject settings the crawler cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.start_code > self.end_code {
            return Err(ConfigError::Invalid(format!(
                "start_code {} is after end_code {}",
                self.start_code, self.end_code
            )));
        }
        if self.max_in_flight == 0 {
            return Err(ConfigError::Invalid("max_in_flight must be at least 1".into()));
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "base_url must be http(s): {}",
                self.base_url
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn download_delay(&self) -> Duration {
        Duration::from_millis(self.download_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = CrawlConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.max_in_flight, 8);
        assert_eq!(cfg.download_delay(), Duration::from_secs(2));
        assert!(cfg.headers.contains_key("Referer"));
        assert!(!cfg.headers.contains_key("Host"));
    }

    #[test]
    fn toml_roundtrip() {
        let cfg = CrawlConfig::default();
        let parsed = CrawlConfig::from_toml(&cfg.to_toml().unwrap()).unwrap();
        assert_eq!(cfg, parsed);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let cfg = CrawlConfig::from_toml(
            r#"
start_code = "600000"
end_code = "600999"
adjust = "forward"
"#,
        )
        .unwrap();
        assert_eq!(cfg.start_code, "600000");
        assert_eq!(cfg.adjust, AdjustFlag::Forward);
        assert_eq!(cfg.max_in_flight, 8);
        assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn inverted_range_is_rejected() {
        let cfg = CrawlConfig {
            start_code: "600000".into(),
            end_code: "000001".into(),
            ..CrawlConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn zero_in_flight_is_rejected() {
        let cfg = CrawlConfig {
            max_in_flight: 0,
            ..CrawlConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn non_http_base_is_rejected() {
        let cfg = CrawlConfig {
            base_url: "ftp://d.10jqka.com.cn".into(),
            ..CrawlConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn unknown_adjust_fails_to_parse() {
        assert!(matches!(
            CrawlConfig::from_toml(r#"adjust = "sideways""#),
            Err(ConfigError::Parse(_))
        ));
    }
}
