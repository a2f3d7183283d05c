//! CLI argument definitions for stockwatch.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `statistic` | Store and inspect daily market-breadth statistics |
//! | `alert` | Manage price alerts and check them against quotes |
//! | `line` | Manage horizontal chart lines |
//! | `quote` | Normalize provider quotes |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `json` | Output format (json, table) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--locale` | `en` | Language of validation messages |
//! | `--log-level` | `warn` | Tracing filter directive |
//! | `--log-format` | `plain` | Log format on stderr (plain, json) |
//! | `--db` | `$STOCKWATCH_HOME/data/stockwatch.duckdb` | Warehouse file |
//!
//! # Examples
//!
//! ```bash
//! stockwatch statistic insert --input statistic.json
//! stockwatch statistic breadth --date 2024-01-15 --instrument-type STOCK --sector 3
//! stockwatch alert insert --symbol RY --exchange TSX --alert-type GREATER_OR_EQUAL --price 120.50
//! stockwatch quote normalize --exchange VAN --ticker ABC.V --price 12.345 --currency CAD
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use stockwatch_core::{AlertType, InstrumentType, StockExchange};
use time::macros::format_description;
use time::Date;

use crate::logging::LogFormat;

/// Market-breadth statistics, price alerts and chart lines.
#[derive(Debug, Parser)]
#[command(name = "stockwatch", author, version, about = "Financial market monitoring CLI")]
pub struct Cli {
    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Language of validation messages (en, de). Overrides STOCKWATCH_LOCALE.
    #[arg(long, global = true)]
    pub locale: Option<String>,

    /// Tracing filter, e.g. `debug` or `stockwatch_warehouse=trace`. Overrides STOCKWATCH_LOG.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format written to stderr.
    #[arg(long, global = true, value_enum)]
    pub log_format: Option<LogFormat>,

    /// DuckDB file holding persisted entities.
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Messages and data laid out for a terminal.
    Table,
    /// Single JSON object output.
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store and inspect daily market-breadth statistics.
    #[command(subcommand)]
    Statistic(StatisticCommand),

    /// Manage price alerts.
    #[command(subcommand)]
    Alert(AlertCommand),

    /// Manage horizontal chart lines.
    #[command(subcommand)]
    Line(LineCommand),

    /// Normalize provider quotes.
    #[command(subcommand)]
    Quote(QuoteCommand),
}

#[derive(Debug, Subcommand)]
pub enum StatisticCommand {
    /// Insert a statistic read from JSON.
    Insert(InputArgs),
    /// Replace the counts of a stored statistic. Unchanged statistics are not written.
    Update(InputArgs),
    Delete(StatisticKeyArgs),
    Get(StatisticKeyArgs),
    /// Advance/decline number and moving-average percentages of one statistic.
    Breadth(StatisticKeyArgs),
    List(StatisticListArgs),
}

/// JSON document with camelCase fields, `-` for stdin.
#[derive(Debug, Args)]
pub struct InputArgs {
    #[arg(long)]
    pub input: PathBuf,
}

#[derive(Debug, Args)]
pub struct StatisticKeyArgs {
    /// Trading day, YYYY-MM-DD.
    #[arg(long, value_parser = parse_date)]
    pub date: Date,

    #[arg(long)]
    pub instrument_type: InstrumentType,

    #[arg(long)]
    pub sector: Option<i64>,

    #[arg(long)]
    pub industry_group: Option<i64>,
}

#[derive(Debug, Args)]
pub struct StatisticListArgs {
    #[arg(long)]
    pub instrument_type: Option<InstrumentType>,

    #[arg(long)]
    pub sector: Option<i64>,

    #[arg(long)]
    pub industry_group: Option<i64>,

    /// Only statistics without sector or industry group.
    #[arg(long, conflicts_with_all = ["sector", "industry_group"])]
    pub unscoped: bool,

    /// First trading day, inclusive.
    #[arg(long, value_parser = parse_date)]
    pub from: Option<Date>,

    /// Last trading day, inclusive.
    #[arg(long, value_parser = parse_date)]
    pub to: Option<Date>,
}

#[derive(Debug, Subcommand)]
pub enum AlertCommand {
    /// Store a new alert. Its id is handed out by the warehouse.
    Insert(AlertArgs),
    /// Rewrite a stored alert. Unchanged alerts are not written.
    Update(AlertUpdateArgs),
    Delete(IdArgs),
    Get(IdArgs),
    List(ListingArgs),
    /// Evaluate every stored alert against a quote feed.
    Check(FeedArgs),
}

#[derive(Debug, Args)]
pub struct AlertArgs {
    #[arg(long, default_value = "")]
    pub symbol: String,

    #[arg(long)]
    pub exchange: Option<StockExchange>,

    #[arg(long)]
    pub alert_type: Option<AlertType>,

    #[arg(long)]
    pub price: Decimal,
}

#[derive(Debug, Subcommand)]
pub enum LineCommand {
    /// Store a new line. Its id is handed out by the warehouse.
    Insert(LineArgs),
    /// Move a stored line. Unchanged lines are not written.
    Update(LineUpdateArgs),
    Delete(IdArgs),
    Get(IdArgs),
    List(ListingArgs),
}

#[derive(Debug, Args)]
pub struct LineArgs {
    #[arg(long, default_value = "")]
    pub symbol: String,

    #[arg(long)]
    pub exchange: Option<StockExchange>,

    #[arg(long)]
    pub price: Decimal,
}

#[derive(Debug, Args)]
pub struct IdArgs {
    #[arg(long)]
    pub id: i64,
}

#[derive(Debug, Args)]
pub struct AlertUpdateArgs {
    /// Identity of the stored alert.
    #[arg(long)]
    pub id: i64,

    #[command(flatten)]
    pub alert: AlertArgs,
}

#[derive(Debug, Args)]
pub struct LineUpdateArgs {
    /// Identity of the stored line.
    #[arg(long)]
    pub id: i64,

    #[command(flatten)]
    pub line: LineArgs,
}

#[derive(Debug, Args)]
pub struct ListingArgs {
    #[arg(long)]
    pub symbol: Option<String>,

    #[arg(long)]
    pub exchange: Option<StockExchange>,
}

#[derive(Debug, Subcommand)]
pub enum QuoteCommand {
    /// Map raw provider fields onto the canonical quote.
    Normalize(NormalizeArgs),
    /// Look up one listing in a quote feed.
    Fetch(FetchArgs),
}

#[derive(Debug, Args)]
pub struct NormalizeArgs {
    /// Provider exchange code, e.g. VAN, TOR, NYQ.
    #[arg(long)]
    pub exchange: String,

    /// Provider ticker, e.g. ABC.V.
    #[arg(long)]
    pub ticker: String,

    #[arg(long, allow_negative_numbers = true)]
    pub price: f64,

    #[arg(long)]
    pub currency: String,
}

/// JSON array of raw Yahoo quote payloads, `-` for stdin.
#[derive(Debug, Args)]
pub struct FeedArgs {
    #[arg(long)]
    pub feed: PathBuf,
}

#[derive(Debug, Args)]
pub struct FetchArgs {
    #[command(flatten)]
    pub feed: FeedArgs,

    #[arg(long)]
    pub symbol: String,

    #[arg(long)]
    pub exchange: StockExchange,
}

fn parse_date(value: &str) -> Result<Date, String> {
    Date::parse(value.trim(), format_description!("[year]-[month]-[day]"))
        .map_err(|err| format!("expected YYYY-MM-DD: {err}"))
}
