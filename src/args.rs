//! These structs provide the CLI interface for the expenses CLI.

use crate::commands::ChartKind;
use crate::config::DEFAULT_SHEET_NAME;
use crate::model::{parse_month, Amount};
use chrono::Month;
use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// expenses: Log personal expenses to a Google sheet and chart them.
///
/// Each expense is a row in a Google sheet with the columns Insert_date, Category, Value and
/// Comments. This program appends rows to that sheet and renders the rows as chart options that
/// an ECharts-compatible dashboard can display.
///
/// Access to the sheet uses a Google service account. Share the sheet with the service account's
/// email address and pass its JSON key to `expenses init`.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the home directory and initialize the configuration file.
    ///
    /// This is the first command you should run. You need:
    ///
    /// - The URL of your Google sheet, passed as --sheet-url.
    ///
    /// - The JSON key of a Google service account that the sheet is shared with, passed as
    ///   --service-account. The file is moved into the home directory.
    Init(InitArgs),
    /// Append an expense to the sheet.
    Add(AddArgs),
    /// List the existing categories.
    Categories,
    /// Show the most recent expenses.
    Recent(RecentArgs),
    /// Render the dashboard charts as JSON.
    Report(ReportArgs),
    /// Re-render the dashboard charts into a file on an interval.
    Watch(WatchArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where the configuration and backups are held. Defaults to ~/expenses
    #[arg(long, env = "EXPENSES_HOME", default_value_t = default_expenses_home())]
    expenses_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, expenses_home: PathBuf) -> Self {
        Self {
            log_level,
            expenses_home: expenses_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn expenses_home(&self) -> &DisplayPath {
        &self.expenses_home
    }
}

/// (Not shown): Args for the `expenses init` command.
#[derive(Debug, Parser, Clone)]
pub struct InitArgs {
    /// The URL to your Google sheet. It looks like this:
    /// https://docs.google.com/spreadsheets/d/1a7Km9FxQwRbPt82JvN4LzYpH5OcGnWsT6iDuE3VhMjX
    #[arg(long)]
    sheet_url: String,

    /// The path to the service account JSON key. This file will be moved to the default secrets
    /// location in the home directory.
    #[arg(long)]
    service_account: PathBuf,

    /// The tab that holds the expenses.
    #[arg(long, default_value = DEFAULT_SHEET_NAME)]
    sheet_name: String,
}

impl InitArgs {
    pub fn new(
        sheet_url: impl Into<String>,
        service_account: impl Into<PathBuf>,
        sheet_name: impl Into<String>,
    ) -> Self {
        Self {
            sheet_url: sheet_url.into(),
            service_account: service_account.into(),
            sheet_name: sheet_name.into(),
        }
    }

    pub fn sheet_url(&self) -> &str {
        &self.sheet_url
    }

    pub fn service_account(&self) -> &Path {
        &self.service_account
    }

    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }
}

/// (Not shown): Args for the `expenses add` command.
#[derive(Debug, Parser, Clone)]
pub struct AddArgs {
    /// An existing category, see `expenses categories`.
    #[arg(long)]
    category: Option<String>,

    /// A new category. When given, it replaces --category.
    #[arg(long)]
    new_category: Option<String>,

    /// The amount, e.g. 12.50, 12,50 or €12.50.
    #[arg(long, allow_hyphen_values = true)]
    value: Option<Amount>,

    /// Free text.
    #[arg(long, default_value = "")]
    comments: String,
}

impl AddArgs {
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn new_category(&self) -> Option<&str> {
        self.new_category.as_deref()
    }

    pub fn value(&self) -> Option<Amount> {
        self.value
    }

    pub fn comments(&self) -> &str {
        &self.comments
    }
}

/// (Not shown): Args for the `expenses recent` command.
#[derive(Debug, Parser, Clone)]
pub struct RecentArgs {
    /// How many records to show.
    #[arg(long, default_value_t = 5)]
    count: usize,
}

impl RecentArgs {
    pub fn count(&self) -> usize {
        self.count
    }
}

/// Selects what `report` and `watch` render.
#[derive(Debug, Parser, Clone)]
pub struct ChartArgs {
    /// Which chart to render.
    #[arg(long, value_enum, default_value_t = ChartKind::All)]
    chart: ChartKind,

    /// The month of the category chart, 1-12 or a name like "march". Defaults to the current
    /// month.
    #[arg(long, value_parser = parse_month)]
    month: Option<Month>,

    /// Only count the month in this year. By default the month is matched in every year.
    #[arg(long)]
    year: Option<i32>,
}

impl ChartArgs {
    pub fn chart(&self) -> ChartKind {
        self.chart
    }

    pub fn month(&self) -> Option<Month> {
        self.month
    }

    pub fn year(&self) -> Option<i32> {
        self.year
    }
}

/// (Not shown): Args for the `expenses report` command.
#[derive(Debug, Parser, Clone)]
pub struct ReportArgs {
    #[clap(flatten)]
    chart: ChartArgs,

    /// Write the JSON to this file instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,
}

impl ReportArgs {
    pub fn chart(&self) -> &ChartArgs {
        &self.chart
    }

    pub fn output(&self) -> Option<&Path> {
        self.output.as_deref()
    }
}

/// (Not shown): Args for the `expenses watch` command.
#[derive(Debug, Parser, Clone)]
pub struct WatchArgs {
    #[clap(flatten)]
    chart: ChartArgs,

    /// The file to keep up to date.
    #[arg(long)]
    output: PathBuf,

    /// Seconds between refreshes.
    #[arg(long, default_value_t = 3000)]
    interval_secs: u64,
}

impl WatchArgs {
    pub fn chart(&self) -> &ChartArgs {
        &self.chart
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn interval_secs(&self) -> u64 {
        self.interval_secs
    }
}

fn default_expenses_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("expenses"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --expenses-home or EXPENSES_HOME instead of relying on the \
                default home directory. If you continue using the program right now, you may \
                have problems!",
            );
            PathBuf::from("expenses")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}
