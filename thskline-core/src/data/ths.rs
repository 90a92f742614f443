//! 10jqka (THS) quote server source.
//!
//! Serves the whole daily history of a security from
//! `http://d.10jqka.com.cn/v6/line/hs_<code>/0<adjust>/all.js`. The server
//! checks `Referer`, so it is sent on every request. `Host` is left to the
//! client so it always matches the configured base URL.

use super::provider::{FetchError, FetchedBody, KlineSource};
use crate::domain::AdjustFlag;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "http://d.10jqka.com.cn/v6/line";

/// Headers the quote server expects from its own web pages.
pub fn default_headers() -> BTreeMap<String, String> {
    BTreeMap::from([
        (
            "Referer".to_string(),
            "http://stockpage.10jqka.com.cn/HQ_v4.html".to_string(),
        ),
        (
            "User-Agent".to_string(),
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_12_6) AppleWebKit/537.36 \
             (KHTML, like Gecko) Chrome/60.0.3112.90 Safari/537.36"
                .to_string(),
        ),
    ])
}

/// `<base>/hs_<code>/0<adjust>/all.js`
pub fn kline_url(base_url: &str, code: &str, adjust: AdjustFlag) -> String {
    format!(
        "{}/hs_{code}/{}/all.js",
        base_url.trim_end_matches('/'),
        adjust.url_segment()
    )
}

/// Blocking HTTP source for the THS quote server.
pub struct ThsSource {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl ThsSource {
    pub fn new(
        base_url: impl Into<String>,
        headers: &BTreeMap<String, String>,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let mut header_map = HeaderMap::with_capacity(headers.len());
        for (name, value) in headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| FetchError::Client(format!("header name {name:?}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| FetchError::Client(format!("header value for {name}: {e}")))?;
            header_map.insert(name, value);
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .default_headers(header_map)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

impl KlineSource for ThsSource {
    fn name(&self) -> &str {
        "10jqka"
    }

    fn kline_url(&self, code: &str, adjust: AdjustFlag) -> String {
        kline_url(&self.base_url, code, adjust)
    }

    fn fetch(&self, code: &str, adjust: AdjustFlag) -> Result<FetchedBody, FetchError> {
        let url = self.kline_url(code, adjust);
        debug!(%url, "requesting k-line history");

        let resp = self.client.get(&url).send().map_err(|e| FetchError::Network {
            url: url.clone(),
            message: e.to_string(),
        })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                url,
                status: status.as_u16(),
            });
        }

        let body = resp.text().map_err(|e| FetchError::Body {
            url: url.clone(),
            message: e.to_string(),
        })?;
        Ok(FetchedBody { url, body })
    }
}
