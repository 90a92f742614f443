//! thskline CLI: crawl, offline decode, store status and config commands.
//!
//! Commands:
//! - `crawl`: fetch, decode and persist daily k-lines for a code range
//! - `decode`: decode a saved `all.js` body and print the records as JSON
//! - `status`: report which securities in range have data on disk
//! - `init-config`: emit the default TOML configuration

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use thskline_core::data::{KlineStore, Universe};
use thskline_core::decode::decode_independent;
use thskline_core::domain::{AdjustFlag, Exchange, Security};
use thskline_runner::{run_crawl, CrawlConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "thskline",
    about = "thskline: daily k-line crawler for the 10jqka quote server"
)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, decode and store daily k-lines for every listed stock in range.
    Crawl {
        #[command(flatten)]
        overrides: ConfigOverrides,

        /// Print the crawl summary as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Decode a saved all.js body offline.
    Decode {
        /// Path to the saved response body.
        file: PathBuf,

        /// Security id, e.g. stock_sh_600000. Takes precedence over --code.
        #[arg(long)]
        id: Option<String>,

        /// Six digit code; the exchange is inferred from the leading digit.
        #[arg(long, default_value = "000001")]
        code: String,

        /// Write the records here instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Report which securities in the configured range have data on disk.
    Status {
        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// List every security, not just the totals.
        #[arg(long, default_value_t = false)]
        detail: bool,
    },
    /// Print the default configuration as TOML.
    InitConfig {
        /// Write the config here instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

/// Flags applied on top of the config file.
#[derive(clap::Args)]
struct ConfigOverrides {
    /// Path to a TOML config file. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// First code to crawl (inclusive).
    #[arg(long)]
    start_code: Option<String>,

    /// Last code to crawl (inclusive).
    #[arg(long)]
    end_code: Option<String>,

    /// Root of the output tree.
    #[arg(long)]
    store_dir: Option<PathBuf>,

    /// Directory holding sh.csv and sz.csv.
    #[arg(long)]
    list_dir: Option<PathBuf>,

    /// Price adjustment: 0 none, 1 forward, 2 backward.
    #[arg(long)]
    adjust: Option<u8>,

    /// Maximum simultaneous requests.
    #[arg(long)]
    max_in_flight: Option<usize>,

    /// Minimum delay between dispatches, in milliseconds.
    #[arg(long)]
    delay_ms: Option<u64>,
}

impl ConfigOverrides {
    fn resolve(self) -> Result<CrawlConfig> {
        let mut config = load_config(self.config.as_deref())?;

        if let Some(code) = self.start_code {
            config.start_code = code;
        }
        if let Some(code) = self.end_code {
            config.end_code = code;
        }
        if let Some(dir) = self.store_dir {
            config.store_dir = dir;
        }
        if let Some(dir) = self.list_dir {
            config.list_dir = dir;
        }
        if let Some(code) = self.adjust {
            let Some(adjust) = AdjustFlag::from_code(code) else {
                bail!("unknown adjust flag {code}. Valid: 0, 1, 2");
            };
            config.adjust = adjust;
        }
        if let Some(n) = self.max_in_flight {
            config.max_in_flight = n;
        }
        if let Some(ms) = self.delay_ms {
            config.download_delay_ms = ms;
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Crawl { overrides, json } => run_crawl_cmd(overrides, json),
        Commands::Decode { file, id, code, out } => {
            run_decode(&file, id.as_deref(), &code, out.as_deref())
        }
        Commands::Status { config, detail } => run_status(config.as_deref(), detail),
        Commands::InitConfig { out } => run_init_config(out.as_deref()),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_target(false)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<CrawlConfig> {
    match path {
        Some(path) => CrawlConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(CrawlConfig::default()),
    }
}

fn run_crawl_cmd(overrides: ConfigOverrides, json: bool) -> Result<()> {
    let config = overrides.resolve()?;
    info!(
        store = %config.store_dir.display(),
        lists = %config.list_dir.display(),
        max_in_flight = config.max_in_flight,
        delay_ms = config.download_delay_ms,
        "starting crawl"
    );

    // Per-security failures are in the summary, not the exit code.
    let summary = run_crawl(&config)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    let counts = &summary.counts;
    println!(
        "Crawled {} securities: {} succeeded, {} skipped (existing), {} fetched, {} fetch failures, {} decode failures, {} write failures",
        summary.eligible,
        counts.succeeded,
        counts.skipped_existing,
        counts.fetched,
        counts.fetch_failures,
        counts.decode_failures,
        counts.write_failures,
    );
    println!(
        "Wrote {} k-line files ({} records) and {} trading date files",
        counts.kdata_files_written, counts.records_written, counts.trading_date_files_written,
    );
    Ok(())
}

fn run_decode(file: &Path, id: Option<&str>, code: &str, out: Option<&Path>) -> Result<()> {
    let security = match id {
        Some(id) => match Security::from_id(id) {
            Some(s) => s,
            None => bail!("invalid security id '{id}'. Expected e.g. stock_sh_600000"),
        },
        None => Security::stock(infer_exchange(code), code, ""),
    };

    let body = std::fs::read_to_string(file)
        .with_context(|| format!("reading {}", file.display()))?;
    let outcome = decode_independent(&security, &body);

    match &outcome.trading_dates {
        Ok(dates) => info!(dates = dates.len(), "trading dates decoded"),
        Err(e) => info!(error = %e, "trading dates unavailable"),
    }
    let records = outcome
        .records
        .with_context(|| format!("decoding {}", file.display()))?;

    let json = serde_json::to_string_pretty(&records)?;
    match out {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
            println!("Wrote {} records to {}", records.len(), path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// Shanghai codes start with 6 or 9, Shenzhen with 0, 2 or 3.
fn infer_exchange(code: &str) -> Exchange {
    if code.starts_with('6') || code.starts_with('9') {
        Exchange::Sh
    } else {
        Exchange::Sz
    }
}

fn run_status(config_path: Option<&Path>, detail: bool) -> Result<()> {
    let config = load_config(config_path)?;
    config.validate()?;

    let universe = Universe::from_list_dir(&config.list_dir)
        .with_context(|| format!("loading stock lists from {}", config.list_dir.display()))?;
    let store = KlineStore::new(&config.store_dir);
    let in_range = universe.in_range(&config.start_code, &config.end_code);
    let rows = store.status(&in_range, config.adjust);

    let with_data = rows.iter().filter(|r| r.has_kdata).count();
    let with_dates = rows.iter().filter(|r| r.has_trading_dates).count();
    let records: usize = rows.iter().filter_map(|r| r.record_count).sum();

    println!("Store: {}", store.root().display());
    println!(
        "Range: {}..={} ({} of {} listed)",
        config.start_code,
        config.end_code,
        rows.len(),
        universe.len()
    );
    println!("With k-lines: {with_data}");
    println!("Without k-lines: {}", rows.len() - with_data);
    println!("With trading dates: {with_dates}");
    println!("Records on disk: {records}");

    if detail {
        println!();
        println!("{:<8} {:<7} {:>8} {:>6}", "Code", "K-line", "Records", "Dates");
        println!("{}", "-".repeat(32));
        for row in &rows {
            let count = row
                .record_count
                .map_or_else(|| "-".to_string(), |n| n.to_string());
            println!(
                "{:<8} {:<7} {:>8} {:>6}",
                row.code,
                if row.has_kdata { "yes" } else { "no" },
                count,
                if row.has_trading_dates { "yes" } else { "no" },
            );
        }
    }

    Ok(())
}

fn run_init_config(out: Option<&Path>) -> Result<()> {
    let toml = CrawlConfig::default().to_toml()?;
    match out {
        Some(path) => {
            if path.exists() {
                bail!("{} already exists", path.display());
            }
            std::fs::write(path, toml).with_context(|| format!("writing {}", path.display()))?;
            println!("Wrote default config to {}", path.display());
        }
        None => print!("{toml}"),
    }
    Ok(())
}
