//! Fetch orchestrator: one fetch -> decode -> persist cycle per security.
//!
//! Securities are dispatched in list order by a fixed set of workers on a
//! dedicated rayon pool. Every worker pulls the next index from a shared
//! cursor and waits on the shared `Throttle` before each request, so the
//! pool size caps requests in flight and the throttle spaces dispatches.
//!
//! Per-security failures (fetch, decode, write) are logged and counted in the
//! returned `CrawlSummary`; they never abort the crawl.

use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use std::ops::AddAssign;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;
use thskline_core::data::{
    FetchError, KlineSource, KlineStore, ThsSource, Throttle, Universe, UniverseError,
};
use thskline_core::decode::decode_independent;
use thskline_core::domain::{AdjustFlag, Security};
use tracing::{debug, error, info, warn};

use crate::config::{ConfigError, CrawlConfig};

/// Failures that stop a crawl before any security is processed.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Universe(#[from] UniverseError),

    #[error("failed to build HTTP source: {0}")]
    Source(#[from] FetchError),

    #[error("failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// Outcome of one crawl.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrawlSummary {
    pub started_at: NaiveDateTime,
    pub finished_at: NaiveDateTime,
    /// Securities inside the configured code range.
    pub eligible: usize,
    pub counts: CrawlCounts,
}

impl CrawlSummary {
    fn started(eligible: usize) -> Self {
        let now = Local::now().naive_local();
        Self {
            started_at: now,
            finished_at: now,
            eligible,
            counts: CrawlCounts::default(),
        }
    }
}

/// Per-security counters. Each worker keeps its own and they are summed
/// when the worker exits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrawlCounts {
    /// Securities whose k-line file already existed.
    pub skipped_existing: usize,
    /// Bodies retrieved successfully.
    pub fetched: usize,
    pub fetch_failures: usize,
    pub decode_failures: usize,
    /// Failed writes, including directories that could not be created.
    pub write_failures: usize,
    pub kdata_files_written: usize,
    pub trading_date_files_written: usize,
    pub records_written: usize,
    /// Securities fetched, decoded and persisted with no failure at any step.
    pub succeeded: usize,
}

impl AddAssign<&CrawlCounts> for CrawlCounts {
    fn add_assign(&mut self, other: &CrawlCounts) {
        self.skipped_existing += other.skipped_existing;
        self.fetched += other.fetched;
        self.fetch_failures += other.fetch_failures;
        self.decode_failures += other.decode_failures;
        self.write_failures += other.write_failures;
        self.kdata_files_written += other.kdata_files_written;
        self.trading_date_files_written += other.trading_date_files_written;
        self.records_written += other.records_written;
        self.succeeded += other.succeeded;
    }
}

/// Load the stock lists, build the HTTP source and store, and crawl.
pub fn run_crawl(config: &CrawlConfig) -> Result<CrawlSummary, CrawlError> {
    config.validate()?;

    let universe = Universe::from_list_dir(&config.list_dir)?;
    let source = ThsSource::new(
        config.base_url.clone(),
        &config.headers,
        config.request_timeout(),
    )?;
    let store = KlineStore::new(&config.store_dir);

    crawl(config, &source, &store, &universe)
}

/// Crawl every security of `universe` inside the configured code range.
pub fn crawl(
    config: &CrawlConfig,
    source: &dyn KlineSource,
    store: &KlineStore,
    universe: &Universe,
) -> Result<CrawlSummary, CrawlError> {
    config.validate()?;

    let eligible = universe.in_range(&config.start_code, &config.end_code);
    let mut summary = CrawlSummary::started(eligible.len());

    info!(
        source = source.name(),
        eligible = eligible.len(),
        listed = universe.len(),
        start = %config.start_code,
        end = %config.end_code,
        adjust = config.adjust.code(),
        "crawl started"
    );

    if !eligible.is_empty() {
        let workers = config.max_in_flight.min(eligible.len());
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("thskline-fetch-{i}"))
            .build()?;

        let throttle = Throttle::new(config.download_delay());
        debug!(
            workers,
            min_interval_ms = throttle.min_interval().as_millis() as u64,
            "worker pool ready"
        );
        let cursor = AtomicUsize::new(0);
        let totals = Mutex::new(CrawlCounts::default());

        pool.scope(|s| {
            for _ in 0..workers {
                s.spawn(|_| {
                    let mut counts = CrawlCounts::default();
                    loop {
                        let i = cursor.fetch_add(1, Ordering::Relaxed);
                        let Some(security) = eligible.get(i) else {
                            break;
                        };
                        crawl_one(security, config.adjust, source, store, &throttle, &mut counts);
                    }
                    let mut totals = totals.lock().unwrap_or_else(PoisonError::into_inner);
                    *totals += &counts;
                });
            }
        });

        let totals = totals.into_inner().unwrap_or_else(PoisonError::into_inner);
        summary.counts += &totals;
    }

    summary.finished_at = Local::now().naive_local();
    let elapsed = summary.finished_at - summary.started_at;
    let counts = &summary.counts;
    info!(
        eligible = summary.eligible,
        succeeded = counts.succeeded,
        skipped_existing = counts.skipped_existing,
        fetched = counts.fetched,
        fetch_failures = counts.fetch_failures,
        decode_failures = counts.decode_failures,
        write_failures = counts.write_failures,
        records_written = counts.records_written,
        elapsed_secs = elapsed.num_seconds(),
        "spider closed"
    );

    Ok(summary)
}

fn crawl_one(
    security: &Security,
    adjust: AdjustFlag,
    source: &dyn KlineSource,
    store: &KlineStore,
    throttle: &Throttle,
    counts: &mut CrawlCounts,
) {
    let url = source.kline_url(&security.code, adjust);

    if let Err(e) = store.ensure_security_dir(security) {
        error!(%url, path = %e.path().display(), error = %e, "cannot create security directory");
        counts.write_failures += 1;
        return;
    }

    // Checked before dispatch, so an existing file never costs a request.
    if store.has_kdata(security, adjust) {
        info!("{} kdata existed", security.code);
        counts.skipped_existing += 1;
        return;
    }

    let waited = throttle.acquire();
    debug!(code = %security.code, waited_ms = waited.as_millis() as u64, "dispatch");

    let fetched = match source.fetch(&security.code, adjust) {
        Ok(body) => body,
        Err(e) => {
            warn!(%url, error = %e, "fetch failed");
            counts.fetch_failures += 1;
            return;
        }
    };
    counts.fetched += 1;
    let mut failed = false;

    let outcome = decode_independent(security, &fetched.body);

    match outcome.trading_dates {
        Ok(dates) if !dates.is_empty() => match store.write_trading_dates(security, &dates) {
            Ok(path) => {
                debug!(code = %security.code, path = %path.display(), dates = dates.len(), "trading dates saved");
                counts.trading_date_files_written += 1;
            }
            Err(e) => {
                error!(url = %fetched.url, path = %e.path().display(), error = %e, "failed to save trading dates");
                counts.write_failures += 1;
                failed = true;
            }
        },
        // An empty calendar writes nothing. A calendar error is reported once
        // below, since it is also a records error.
        _ => {}
    }

    match outcome.records {
        Ok(records) if !records.is_empty() => {
            match store.write_kdata(security, adjust, &records) {
                Ok(path) => {
                    info!(code = %security.code, records = records.len(), path = %path.display(), "kdata saved");
                    counts.kdata_files_written += 1;
                    counts.records_written += records.len();
                }
                Err(e) => {
                    error!(url = %fetched.url, path = %e.path().display(), error = %e, "failed to save kdata");
                    counts.write_failures += 1;
                    failed = true;
                }
            }
        }
        Ok(_) => {
            info!(code = %security.code, "no records in payload");
        }
        Err(e) => {
            error!(url = %fetched.url, error = %e, "decode failed");
            counts.decode_failures += 1;
            failed = true;
        }
    }

    if !failed {
        counts.succeeded += 1;
    }
}
