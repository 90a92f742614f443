//! Source trait for raw k-line bodies and its error type.
//!
//! The crawl orchestrator only sees `KlineSource`, so the HTTP source can be
//! swapped for a canned one in tests.

use crate::domain::AdjustFlag;
use thiserror::Error;

/// Transport-level failure fetching one body. Never retried.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network unreachable for {url}: {message}")]
    Network { url: String, message: String },

    #[error("HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("failed to read body from {url}: {message}")]
    Body { url: String, message: String },

    #[error("invalid client configuration: {0}")]
    Client(String),
}

/// A successfully retrieved response body and the URL it came from.
#[derive(Debug, Clone)]
pub struct FetchedBody {
    pub url: String,
    pub body: String,
}

/// Something that can fetch the `all.js` body for a security code.
pub trait KlineSource: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// The URL `fetch` would request, for logging.
    fn kline_url(&self, code: &str, adjust: AdjustFlag) -> String;

    /// Fetch the raw body for one security.
    fn fetch(&self, code: &str, adjust: AdjustFlag) -> Result<FetchedBody, FetchError>;
}
