//! On-disk k-line store, one directory per security.
//!
//! Layout: `{root}/{type}/{exchange}/{code}/kdata/`
//! - `ths_dayk.json` (unadjusted) or `ths_fuquan_dayk.json` (adjusted): JSON array of records
//! - `ths_trading_dates.json`: JSON array of date strings
//!
//! Writes replace the whole file. There is no temp-file rename, so a crash
//! mid-write can leave a truncated file behind.

use crate::domain::{AdjustFlag, KDataRecord, Security};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const KDATA_DIR: &str = "kdata";
pub const TRADING_DATES_FILE: &str = "ths_trading_dates.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("create dir {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("serialize {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    /// The file or directory the failed operation touched.
    pub fn path(&self) -> &Path {
        match self {
            StoreError::CreateDir { path, .. }
            | StoreError::Write { path, .. }
            | StoreError::Read { path, .. }
            | StoreError::Serialize { path, .. }
            | StoreError::Parse { path, .. } => path,
        }
    }
}

/// Per-security view of what is on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStatus {
    pub code: String,
    pub has_kdata: bool,
    pub record_count: Option<usize>,
    pub has_trading_dates: bool,
}

/// The k-line store rooted at a data directory.
#[derive(Debug, Clone)]
pub struct KlineStore {
    root: PathBuf,
}

impl KlineStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `{root}/{type}/{exchange}/{code}`
    pub fn security_dir(&self, security: &Security) -> PathBuf {
        self.root
            .join(security.security_type.as_str())
            .join(security.exchange.as_str())
            .join(&security.code)
    }

    fn kdata_dir(&self, security: &Security) -> PathBuf {
        self.security_dir(security).join(KDATA_DIR)
    }

    pub fn kdata_path(&self, security: &Security, adjust: AdjustFlag) -> PathBuf {
        self.kdata_dir(security).join(adjust.kdata_file_name())
    }

    pub fn trading_dates_path(&self, security: &Security) -> PathBuf {
        self.kdata_dir(security).join(TRADING_DATES_FILE)
    }

    /// Create the security's k-line directory if missing.
    pub fn ensure_security_dir(&self, security: &Security) -> Result<PathBuf, StoreError> {
        let dir = self.kdata_dir(security);
        fs::create_dir_all(&dir).map_err(|source| StoreError::CreateDir {
            path: dir.clone(),
            source,
        })?;
        Ok(dir)
    }

    pub fn has_kdata(&self, security: &Security, adjust: AdjustFlag) -> bool {
        self.kdata_path(security, adjust).is_file()
    }

    /// Overwrite the k-line file. Returns the path written.
    pub fn write_kdata(
        &self,
        security: &Security,
        adjust: AdjustFlag,
        records: &[KDataRecord],
    ) -> Result<PathBuf, StoreError> {
        let path = self.kdata_path(security, adjust);
        write_json(&path, records)?;
        Ok(path)
    }

    /// Overwrite the trading dates file. Returns the path written.
    pub fn write_trading_dates(
        &self,
        security: &Security,
        dates: &[String],
    ) -> Result<PathBuf, StoreError> {
        let path = self.trading_dates_path(security);
        write_json(&path, dates)?;
        Ok(path)
    }

    pub fn load_kdata(
        &self,
        security: &Security,
        adjust: AdjustFlag,
    ) -> Result<Vec<KDataRecord>, StoreError> {
        read_json(&self.kdata_path(security, adjust))
    }

    pub fn load_trading_dates(&self, security: &Security) -> Result<Vec<String>, StoreError> {
        read_json(&self.trading_dates_path(security))
    }

    /// What is on disk for each security. An unreadable k-line file counts as
    /// present with an unknown record count.
    pub fn status(&self, securities: &[&Security], adjust: AdjustFlag) -> Vec<StoreStatus> {
        securities
            .iter()
            .map(|sec| {
                let has_kdata = self.has_kdata(sec, adjust);
                let record_count = if has_kdata {
                    self.load_kdata(sec, adjust).ok().map(|r| r.len())
                } else {
                    None
                };
                StoreStatus {
                    code: sec.code.clone(),
                    has_kdata,
                    record_count,
                    has_trading_dates: self.trading_dates_path(sec).is_file(),
                }
            })
            .collect()
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec(value).map_err(|source| StoreError::Serialize {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, bytes).map_err(|source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let bytes = fs::read(path).map_err(|source| StoreError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| StoreError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
