//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::markit::MarkitAdapter;
use crate::adapters::store::StoreAdapter;
use crate::domain::error::TrendyError;
use crate::domain::resolver::{Persistence, TieredResolver};
use crate::domain::settings::{log_ansi, log_level};
use crate::domain::stock::Stock;
use crate::ports::quote_port::QuotePort;
use crate::ports::store_port::StorePort;

#[derive(Parser, Debug)]
#[command(name = "trendy", about = "Daily closing values by symbol and date range")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve a range through memory, the store and the quote provider
    Range {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
    },
    /// Query the quote provider directly, without touching the store
    Fetch {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
    },
    /// Create the measures table
    InitDb {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Delete a symbol's stored measures over an inclusive date range
    Clear {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
    },
    /// Show stored coverage for one symbol or all of them
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Range {
            config,
            symbol,
            start,
            end,
        } => run_range(&config, &symbol, &start, &end),
        Command::Fetch {
            config,
            symbol,
            start,
            end,
        } => run_fetch(&config, &symbol, &start, &end),
        Command::InitDb { config } => run_init_db(&config),
        Command::Clear {
            config,
            symbol,
            start,
            end,
        } => run_clear(&config, &symbol, &start, &end),
        Command::Info { config, symbol } => run_info(&config, symbol.as_deref()),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    let config = FileConfigAdapter::from_file(path).map_err(|err| {
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })?;
    init_logging(&log_level(&config), log_ansi(&config));
    Ok(config)
}

/// Installs the stderr subscriber. `RUST_LOG` overrides the configured level.
pub fn init_logging(level: &str, ansi: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // A subscriber may already be installed (tests, repeated runs).
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(ansi)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Parses a `YYYY-MM-DD` argument named `field`.
pub fn parse_date_arg(value: &str, field: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| format!("Could not parse {field} as time. must be YYYY-MM-DD [{value}]"))
}

fn parse_range(start: &str, end: &str) -> Result<(NaiveDate, NaiveDate), ExitCode> {
    let parsed = parse_date_arg(start, "start").and_then(|s| Ok((s, parse_date_arg(end, "end")?)));
    parsed.map_err(|msg| {
        eprintln!("error: {msg}");
        ExitCode::from(2)
    })
}

fn report(err: TrendyError) -> ExitCode {
    eprintln!("error: {err}");
    (&err).into()
}

/// Opens the configured store and creates the measures table if missing.
fn open_store(config: &FileConfigAdapter) -> Result<StoreAdapter, TrendyError> {
    let store = StoreAdapter::from_config(config)?;
    store.initialize_schema()?;
    Ok(store)
}

/// Resolves `[start, end]` for `symbol` into a stock carrying the result.
pub fn resolve_stock(
    store: &dyn StorePort,
    quotes: &dyn QuotePort,
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Stock, TrendyError> {
    let mut stock = Stock::new(symbol);
    let resolution = TieredResolver::new(store, quotes).resolve(&mut stock, start, end)?;
    if let Persistence::Skipped { reason } = &resolution.persistence {
        eprintln!("warning: {symbol} {start} to {end} was not saved: {reason}");
    }
    stock.span = resolution.span;
    Ok(stock)
}

fn run_range(config_path: &PathBuf, symbol: &str, start: &str, end: &str) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let (start, end) = match parse_range(start, end) {
        Ok(r) => r,
        Err(code) => return code,
    };

    let store = match open_store(&config) {
        Ok(s) => s,
        Err(e) => return report(e),
    };
    let quotes = match MarkitAdapter::from_config(&config) {
        Ok(q) => q,
        Err(e) => return report(e),
    };

    let stock = match resolve_stock(&store, &quotes, symbol, start, end) {
        Ok(s) => s,
        Err(e) => {
            eprintln!(
                "error: could not get range for provided stock over start to end [{symbol}:{start}-{end}]: {e}"
            );
            return (&e).into();
        }
    };

    match serde_json::to_string(&stock) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: could not encode {symbol} as JSON: {e}");
            ExitCode::from(1)
        }
    }
}

fn run_fetch(config_path: &PathBuf, symbol: &str, start: &str, end: &str) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let (start, end) = match parse_range(start, end) {
        Ok(r) => r,
        Err(code) => return code,
    };

    let quotes = match MarkitAdapter::from_config(&config) {
        Ok(q) => q,
        Err(e) => return report(e),
    };
    eprintln!("Fetching {symbol} {start} to {end} from {}", quotes.url());

    let span = match quotes.fetch_span(symbol, start, end) {
        Ok(s) => s,
        Err(e) => return report(e),
    };

    match serde_json::to_string(&span) {
        Ok(json) => {
            println!("{json}");
            eprintln!("{} measures fetched", span.len());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: could not encode span as JSON: {e}");
            ExitCode::from(1)
        }
    }
}

fn run_init_db(config_path: &PathBuf) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let store = match StoreAdapter::from_config(&config) {
        Ok(s) => s,
        Err(e) => return report(e),
    };

    match store.initialize_schema() {
        Ok(()) => {
            eprintln!("Schema ready");
            ExitCode::SUCCESS
        }
        Err(e) => report(e),
    }
}

fn run_clear(config_path: &PathBuf, symbol: &str, start: &str, end: &str) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let (start, end) = match parse_range(start, end) {
        Ok(r) => r,
        Err(code) => return code,
    };

    let store = match open_store(&config) {
        Ok(s) => s,
        Err(e) => return report(e),
    };

    match store.delete_range(symbol, start, end) {
        Ok(removed) => {
            println!("{symbol}: removed {removed} measures");
            ExitCode::SUCCESS
        }
        Err(e) => report(e),
    }
}

fn run_info(config_path: &PathBuf, symbol: Option<&str>) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let store = match open_store(&config) {
        Ok(s) => s,
        Err(e) => return report(e),
    };

    let symbols = match symbol {
        Some(s) => vec![s.to_string()],
        None => match store.symbols() {
            Ok(s) => s,
            Err(e) => return report(e),
        },
    };

    if symbols.is_empty() {
        eprintln!("No measures stored");
        return ExitCode::SUCCESS;
    }

    for sym in &symbols {
        match store.coverage(sym) {
            Ok(Some((first, last, count))) => {
                println!("{sym}: {first} to {last} ({count} measures)");
            }
            Ok(None) => println!("{sym}: no data"),
            Err(e) => return report(e),
        }
    }
    ExitCode::SUCCESS
}
