//! Security: an exchange-listed instrument the crawler fetches k-lines for.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Mainland exchange a security is listed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Exchange {
    /// Shanghai Stock Exchange.
    Sh,
    /// Shenzhen Stock Exchange.
    Sz,
}

impl Exchange {
    pub const ALL: [Exchange; 2] = [Exchange::Sh, Exchange::Sz];

    pub fn as_str(&self) -> &'static str {
        match self {
            Exchange::Sh => "sh",
            Exchange::Sz => "sz",
        }
    }

    /// Parse an exchange tag (`sh`/`sz`, case-insensitive).
    pub fn parse(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "sh" => Some(Exchange::Sh),
            "sz" => Some(Exchange::Sz),
            _ => None,
        }
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of instrument. Only stocks are crawled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityType {
    #[default]
    Stock,
}

impl SecurityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SecurityType::Stock => "stock",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "stock" => Some(SecurityType::Stock),
            _ => None,
        }
    }
}

impl fmt::Display for SecurityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A security from the exchange stock lists.
///
/// `code` is the fixed-width six digit exchange code; range filtering
/// compares it lexicographically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Security {
    pub id: String,
    pub code: String,
    pub exchange: Exchange,
    #[serde(rename = "type")]
    pub security_type: SecurityType,
    #[serde(default)]
    pub name: String,
}

impl Security {
    /// A stock with the conventional `stock_{exchange}_{code}` id.
    pub fn stock(exchange: Exchange, code: impl Into<String>, name: impl Into<String>) -> Self {
        let code = code.into();
        Self {
            id: Self::derive_id(SecurityType::Stock, exchange, &code),
            code,
            exchange,
            security_type: SecurityType::Stock,
            name: name.into(),
        }
    }

    pub fn derive_id(security_type: SecurityType, exchange: Exchange, code: &str) -> String {
        format!("{security_type}_{exchange}_{code}")
    }

    /// Inverse of `derive_id`: `"stock_sz_000001"` back to a security.
    pub fn from_id(id: &str) -> Option<Self> {
        let mut parts = id.splitn(3, '_');
        let security_type = SecurityType::parse(parts.next()?)?;
        let exchange = Exchange::parse(parts.next()?)?;
        let code = parts.next().filter(|c| !c.is_empty())?;
        Some(Self {
            id: id.to_string(),
            code: code.to_string(),
            exchange,
            security_type,
            name: String::new(),
        })
    }

    /// True when `start <= code <= end` (inclusive, lexicographic).
    pub fn in_range(&self, start: &str, end: &str) -> bool {
        start <= self.code.as_str() && self.code.as_str() <= end
    }
}
