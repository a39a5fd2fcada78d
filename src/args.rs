//! These structs provide the CLI interface for the ledgerbook CLI.

use crate::model::{Amount, Category, MonthKey};
use clap::{Parser, Subcommand};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// ledgerbook: a household budget ledger kept in an Excel workbook.
///
/// Data is organized by calendar month; each month is one tab of the
/// workbook. Entries are cached locally on every change, and when a workbook
/// is attached (with `create` or `open`) it is kept up to date
/// automatically.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
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

    /// The directory where ledgerbook data and configuration is held.
    /// Defaults to ~/ledgerbook
    #[arg(long, env = "LEDGERBOOK_HOME", default_value_t = default_home())]
    home: DisplayPath,

    /// The month to operate on, e.g. "Mar 2025". Defaults to the current
    /// month.
    #[arg(long, global = true, value_parser = parse_month)]
    month: Option<MonthKey>,
}

impl Common {
    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn month(&self) -> Option<MonthKey> {
        self.month
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Add, update, delete or list expenses for a month.
    Expense {
        #[command(subcommand)]
        action: ExpenseAction,
    },

    /// Add, delete or list income entries for a month.
    Income {
        #[command(subcommand)]
        action: IncomeAction,
    },

    /// Enter or show the month's utility bills.
    Utilities {
        #[command(subcommand)]
        action: UtilitiesAction,
    },

    /// Show the tenant/landlord utility split for a month.
    Split,

    /// Show the month's totals: income, expenses, overage, net savings.
    Summary,

    /// Create a workbook at the given path and keep it up to date. The
    /// current ledger is written to it immediately.
    Create(DocumentArgs),

    /// Open an existing workbook, replacing the ledger with its contents,
    /// and keep it up to date from now on.
    Open(DocumentArgs),

    /// Stop mirroring to the attached workbook. Local data is kept.
    Detach,

    /// Write the ledger to a workbook file without attaching it.
    Export(DocumentArgs),

    /// Show the attached workbook and the save status.
    Status,

    /// Delete all ledger data.
    Clear(ClearArgs),

    /// Write the ledger to a JSON backup file.
    Backup(DocumentArgs),

    /// Replace the ledger with the contents of a JSON backup file.
    Restore(DocumentArgs),
}

#[derive(Subcommand, Debug, Clone)]
pub enum ExpenseAction {
    /// Add an expense to the month.
    Add(AddExpenseArgs),
    /// Delete the expense with the given id.
    Delete(IdArgs),
    /// Change fields of the expense with the given id.
    Update(UpdateExpenseArgs),
    /// List the month's expenses.
    List,
}

#[derive(Subcommand, Debug, Clone)]
pub enum IncomeAction {
    /// Add an income entry to the month.
    Add(AddIncomeArgs),
    /// Delete the income entry with the given id.
    Delete(IdArgs),
    /// List the month's income entries.
    List,
}

#[derive(Subcommand, Debug, Clone)]
pub enum UtilitiesAction {
    /// Replace the month's utility readings. Omitted bills are cleared.
    Set(SetUtilitiesArgs),
    /// Show the month's utility readings.
    Show,
}

#[derive(Debug, Parser, Clone)]
pub struct AddExpenseArgs {
    /// The expense date (ISO, e.g. 2025-03-05). Defaults to the first of
    /// the month.
    #[arg(long)]
    date: Option<String>,

    /// What the money was spent on.
    #[arg(long)]
    description: String,

    /// The amount spent, e.g. 52.75
    #[arg(long)]
    cost: Amount,

    /// The spending category, e.g. "Grocery" or "Eat Outside".
    #[arg(long, default_value_t = Category::Miscellaneous)]
    category: Category,
}

impl AddExpenseArgs {
    pub fn date(&self) -> Option<&str> {
        self.date.as_deref()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn cost(&self) -> Amount {
        self.cost
    }

    pub fn category(&self) -> Category {
        self.category
    }
}

#[derive(Debug, Parser, Clone)]
pub struct UpdateExpenseArgs {
    /// The id of the expense to change, as printed by `expense list`.
    id: String,

    /// A new date.
    #[arg(long)]
    date: Option<String>,

    /// A new description.
    #[arg(long)]
    description: Option<String>,

    /// A new amount.
    #[arg(long)]
    cost: Option<Amount>,

    /// A new category.
    #[arg(long)]
    category: Option<Category>,
}

impl UpdateExpenseArgs {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn date(&self) -> Option<&str> {
        self.date.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn cost(&self) -> Option<Amount> {
        self.cost
    }

    pub fn category(&self) -> Option<Category> {
        self.category
    }
}

#[derive(Debug, Parser, Clone)]
pub struct AddIncomeArgs {
    /// The income date (ISO, e.g. 2025-03-01). Defaults to the first of the
    /// month.
    #[arg(long)]
    date: Option<String>,

    /// Where the money came from, e.g. "Salary".
    #[arg(long)]
    description: String,

    /// The amount received.
    #[arg(long)]
    amount: Amount,
}

impl AddIncomeArgs {
    pub fn date(&self) -> Option<&str> {
        self.date.as_deref()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }
}

#[derive(Debug, Parser, Clone)]
pub struct IdArgs {
    /// The entry id, as printed by the list subcommand.
    id: String,
}

impl IdArgs {
    pub fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Parser, Clone)]
pub struct SetUtilitiesArgs {
    /// The water bill for the whole house.
    #[arg(long)]
    water: Option<Amount>,

    /// The basement electricity bill.
    #[arg(long)]
    elec_base: Option<Amount>,

    /// The main-unit electricity bill.
    #[arg(long)]
    elec_main: Option<Amount>,

    /// The gas bill for the whole house.
    #[arg(long)]
    gas: Option<Amount>,

    /// The internet bill.
    #[arg(long)]
    internet: Option<Amount>,
}

impl SetUtilitiesArgs {
    pub fn water(&self) -> Option<Amount> {
        self.water
    }

    pub fn elec_base(&self) -> Option<Amount> {
        self.elec_base
    }

    pub fn elec_main(&self) -> Option<Amount> {
        self.elec_main
    }

    pub fn gas(&self) -> Option<Amount> {
        self.gas
    }

    pub fn internet(&self) -> Option<Amount> {
        self.internet
    }
}

#[derive(Debug, Parser, Clone)]
pub struct DocumentArgs {
    /// The file path.
    path: PathBuf,
}

impl DocumentArgs {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[derive(Debug, Parser, Clone)]
pub struct ClearArgs {
    /// Confirm that you really want to delete all data.
    #[arg(long)]
    yes: bool,
}

impl ClearArgs {
    pub fn yes(&self) -> bool {
        self.yes
    }
}

fn parse_month(s: &str) -> Result<MonthKey, String> {
    MonthKey::from_str(s).map_err(|e| e.to_string())
}

fn default_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("ledgerbook"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --home or LEDGERBOOK_HOME instead of relying on the default \
                ledgerbook home directory. If you continue using the program right now, you may \
                have problems!",
            );
            PathBuf::from("ledgerbook")
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
