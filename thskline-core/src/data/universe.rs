//! Security universe: the Shanghai and Shenzhen stock lists.
//!
//! Each exchange list is a CSV file (`sh.csv`, `sz.csv`) with a header row.
//! `code` is required and `name` optional. `id`, `exchange` and `type` are
//! used when present, otherwise derived from the file being read.

use crate::domain::{Exchange, Security, SecurityType};
use serde::Deserialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum UniverseError {
    #[error("read stock list {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("stock list {source_name} line {line}: {message}")]
    InvalidRow {
        source_name: String,
        line: u64,
        message: String,
    },
}

#[derive(Debug, Deserialize)]
struct StockListRow {
    code: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    exchange: Option<String>,
    #[serde(default, rename = "type")]
    security_type: Option<String>,
}

/// All listed securities, Shanghai first, each list in file order.
#[derive(Debug, Clone, Default)]
pub struct Universe {
    securities: Vec<Security>,
}

impl Universe {
    pub fn from_securities(securities: Vec<Security>) -> Self {
        Self { securities }
    }

    /// `{dir}/sh.csv` or `{dir}/sz.csv`.
    pub fn list_path(dir: &Path, exchange: Exchange) -> PathBuf {
        dir.join(format!("{exchange}.csv"))
    }

    /// Load both exchange lists from a directory.
    pub fn from_list_dir(dir: &Path) -> Result<Self, UniverseError> {
        let mut securities = Vec::new();
        for exchange in Exchange::ALL {
            let path = Self::list_path(dir, exchange);
            let file = std::fs::File::open(&path).map_err(|e| UniverseError::Read {
                path: path.clone(),
                source: e.into(),
            })?;
            let source_name = path.display().to_string();
            securities.extend(Self::read_list(file, exchange, &source_name)?);
        }
        debug!(count = securities.len(), dir = %dir.display(), "loaded stock lists");
        Ok(Self { securities })
    }

    /// Read one exchange list. Rows of another type are skipped.
    pub fn read_list<R: Read>(
        reader: R,
        exchange: Exchange,
        source_name: &str,
    ) -> Result<Vec<Security>, UniverseError> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let headers = rdr
            .headers()
            .map_err(|e| invalid_row(source_name, 1, e.to_string()))?
            .clone();
        let mut out = Vec::new();

        for record in rdr.records() {
            let record = record.map_err(|e| {
                invalid_row(source_name, e.position().map_or(0, |p| p.line()), e.to_string())
            })?;
            let line = record.position().map_or(0, |p| p.line());
            let row: StockListRow = record
                .deserialize(Some(&headers))
                .map_err(|e| invalid_row(source_name, line, e.to_string()))?;

            let security_type = match non_empty(row.security_type) {
                None => SecurityType::Stock,
                Some(tag) => match SecurityType::parse(&tag) {
                    Some(t) => t,
                    None => {
                        debug!(code = %row.code, kind = %tag, "skipping non-stock row");
                        continue;
                    }
                },
            };

            let exchange = match non_empty(row.exchange) {
                None => exchange,
                Some(tag) => Exchange::parse(&tag).ok_or_else(|| {
                    invalid_row(source_name, line, format!("unknown exchange {tag:?}"))
                })?,
            };

            let code = normalize_code(&row.code);
            let id = non_empty(row.id)
                .unwrap_or_else(|| Security::derive_id(security_type, exchange, &code));

            out.push(Security {
                id,
                code,
                exchange,
                security_type,
                name: row.name,
            });
        }
        Ok(out)
    }

    pub fn securities(&self) -> &[Security] {
        &self.securities
    }

    /// Securities with `start <= code <= end`, in list order.
    pub fn in_range(&self, start: &str, end: &str) -> Vec<&Security> {
        self.securities
            .iter()
            .filter(|s| s.in_range(start, end))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.securities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.securities.is_empty()
    }
}

fn invalid_row(source_name: &str, line: u64, message: impl Into<String>) -> UniverseError {
    UniverseError::InvalidRow {
        source_name: source_name.to_string(),
        line,
        message: message.into(),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Left-pad purely numeric codes to six digits; lists that went through a
/// spreadsheet lose the leading zeros of Shenzhen codes.
fn normalize_code(code: &str) -> String {
    let code = code.trim();
    if !code.is_empty() && code.len() < 6 && code.bytes().all(|b| b.is_ascii_digit()) {
        format!("{code:0>6}")
    } else {
        code.to_string()
    }
}
