//! CLI argument definitions for idxcast.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `forecast` | Project a ticker's price over a horizon |
//! | `market` | Snapshot of a ticker over a display range |
//! | `tickers` | List supported IDX tickers |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `json` | Output format (json, table) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--data-dir` | `data` | Directory holding the history cache and metrics file |
//! | `--timeout-ms` | `10000` | Request timeout in ms |
//! | `--offline` | `false` | Never touch the network |
//!
//! # Examples
//!
//! ```bash
//! idxcast forecast BBRI.JK --horizon 14 --pretty
//! idxcast forecast --horizon 7 --csv forecast.csv
//! idxcast market TLKM.JK --range 1w --format table
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Short-horizon price projections for IDX equities.
#[derive(Debug, Parser)]
#[command(
    name = "idxcast",
    author,
    version,
    about = "Short-horizon price projections for IDX equities",
    long_about = "idxcast projects a drift/volatility price path with a confidence band \
for Indonesian equities, using a local CSV history cache with a Yahoo Finance fallback.\n\
\n\
Use 'idxcast <command> --help' for command-specific help."
)]
pub struct Cli {
    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Directory holding `data_saham_*` history files and
    /// `model_evaluation_result.csv`. Defaults to $IDXCAST_DATA_DIR or `data`.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Request timeout in milliseconds.
    #[arg(long, global = true, default_value_t = 10_000)]
    pub timeout_ms: u64,

    /// Refuse all network requests; only local files are used.
    #[arg(long, global = true, default_value_t = false)]
    pub offline: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Plain text for terminal display.
    Table,
    /// Single JSON object output.
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Project a price path with a confidence band.
    Forecast(ForecastArgs),

    /// Current price, range and volume over a display range.
    Market(MarketArgs),

    /// List the supported IDX tickers.
    Tickers,
}

#[derive(Debug, Args)]
pub struct ForecastArgs {
    /// Exchange-qualified ticker.
    #[arg(default_value = "BBRI.JK")]
    pub symbol: String,

    /// Days to project. 7, 14 and 30 are the usual choices.
    #[arg(long, default_value_t = 7)]
    pub horizon: u32,

    /// Also write the projected path as CSV to this file.
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// Also write the chart as a Plotly figure JSON to this file.
    #[arg(long)]
    pub chart: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct MarketArgs {
    /// Exchange-qualified ticker.
    #[arg(default_value = "BBRI.JK")]
    pub symbol: String,

    /// Display range: 1d, 1w, 1m or 1y.
    #[arg(long, default_value = "1d")]
    pub range: String,
}
