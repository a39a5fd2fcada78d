//! Bidirectional conversion between the [`Ledger`] and a multi-sheet grid
//! document.
//!
//! One sheet per month, named by the canonical month key. Each sheet holds
//! five sections delimited by literal marker rows: EXPENSES, INCOME,
//! UTILITIES, SPLIT SUMMARY (only when there is a utility bill) and
//! MONTH SUMMARY. The two summary sections are derived data; the decoder
//! ignores them and recomputes, so a hand-edited workbook round-trips
//! without the summaries leaking into the model.
//!
//! The decoder is a line-oriented state machine that tolerates missing
//! sections, unknown sheet names and malformed rows by skipping them.

pub mod xlsx;

use crate::model::{
    month_summary, Amount, Category, Expense, Income, Ledger, MonthKey, MonthRecord, NewExpense,
    NewIncome,
};
use crate::split::{compute_split, TENANT_CAP};
use std::str::FromStr;
use tracing::{debug, trace};

const EXPENSES_MARKER: &str = "=== EXPENSES ===";
const INCOME_MARKER: &str = "=== INCOME ===";
const UTILITIES_MARKER: &str = "=== UTILITIES ===";
const SPLIT_MARKER: &str = "=== SPLIT SUMMARY ===";
const MONTH_MARKER: &str = "=== MONTH SUMMARY ===";

/// Placeholder rows ("No expenses this month") start with this and carry no
/// data.
const PLACEHOLDER_PREFIX: &str = "No ";
const NO_EXPENSES: &str = "No expenses this month";
const NO_INCOME: &str = "No income this month";

const WATER_LABEL: &str = "Water (Full House)";
const ELEC_BASE_LABEL: &str = "Electricity (Basement)";
const ELEC_MAIN_LABEL: &str = "Electricity (Main)";
const GAS_LABEL: &str = "Gas (Full House)";
const INTERNET_LABEL: &str = "Internet";

/// Sheet emitted instead of zero sheets when the ledger is empty; many
/// spreadsheet tools reject a workbook with no sheets at all.
const INFO_SHEET_NAME: &str = "Info";

/// Excel serial day 0 is 1899-12-30; this serial is the Unix epoch.
const EXCEL_UNIX_EPOCH: f64 = 25569.0;

const SECONDS_PER_DAY: f64 = 86400.0;

/// One cell of the grid document.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Cell {
        Cell::Text(value.into())
    }

    pub fn number(value: f64) -> Cell {
        Cell::Number(value)
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(_) => false,
        }
    }

    /// The cell content as a string, the way a spreadsheet displays it.
    pub fn display(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => n.to_string(),
        }
    }
}

/// One sheet of the grid document: a name and its rows.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetData {
    pub name: String,
    pub rows: Vec<Vec<Cell>>,
}

/// Encodes the full ledger into sheets, months ascending. An empty ledger
/// produces a single informational sheet.
pub fn encode(ledger: &Ledger) -> Vec<SheetData> {
    if ledger.is_empty() {
        return vec![SheetData {
            name: INFO_SHEET_NAME.to_string(),
            rows: vec![vec![
                Cell::text("Ledgerbook"),
                Cell::text("No data yet. Add expenses to create month sheets."),
            ]],
        }];
    }

    ledger
        .months()
        .map(|(key, record)| encode_month(*key, record))
        .collect()
}

fn encode_month(key: MonthKey, record: &MonthRecord) -> SheetData {
    let mut rows: Vec<Vec<Cell>> = Vec::new();

    rows.push(vec![Cell::text(EXPENSES_MARKER)]);
    rows.push(header(&["Date", "Description", "Category", "Amount"]));
    for expense in &record.expenses {
        rows.push(vec![
            Cell::text(&expense.date),
            Cell::text(&expense.description),
            Cell::text(expense.category.to_string()),
            Cell::number(expense.cost.to_cell()),
        ]);
    }
    if record.expenses.is_empty() {
        rows.push(vec![Cell::Empty, Cell::text(NO_EXPENSES)]);
    }
    rows.push(Vec::new());

    rows.push(vec![Cell::text(INCOME_MARKER)]);
    rows.push(header(&["Date", "Description", "Amount"]));
    for income in &record.incomes {
        rows.push(vec![
            Cell::text(&income.date),
            Cell::text(&income.description),
            Cell::number(income.amount.to_cell()),
        ]);
    }
    if record.incomes.is_empty() {
        rows.push(vec![Cell::Empty, Cell::text(NO_INCOME)]);
    }
    rows.push(Vec::new());

    rows.push(vec![Cell::text(UTILITIES_MARKER)]);
    rows.push(header(&["Item", "Amount"]));
    let utilities = &record.utilities;
    for (label, amount) in [
        (WATER_LABEL, utilities.water),
        (ELEC_BASE_LABEL, utilities.elec_base),
        (ELEC_MAIN_LABEL, utilities.elec_main),
        (GAS_LABEL, utilities.gas),
        (INTERNET_LABEL, utilities.internet),
    ] {
        rows.push(vec![
            Cell::text(label),
            Cell::number(amount.unwrap_or(Amount::ZERO).to_cell()),
        ]);
    }
    rows.push(Vec::new());

    if let Some(split) = compute_split(Some(utilities)) {
        if split.total.is_positive() {
            rows.push(vec![Cell::text(SPLIT_MARKER)]);
            rows.push(header(&["Metric", "Amount"]));
            rows.push(metric("Total Utility Bill", split.total));
            rows.push(metric("Tenant Calculated Share", split.tenant.calc));
            rows.push(vec![
                Cell::text(format!("Cap (${TENANT_CAP})")),
                Cell::number(Amount::new(TENANT_CAP).to_cell()),
            ]);
            rows.push(metric("Tenant Pays (Overage)", split.tenant.overage));
            rows.push(metric("Landlord Pays (Full Bill)", split.landlord.total_bill));
            rows.push(metric("Landlord Net Cost", split.landlord.net_cost));
            rows.push(Vec::new());
        }
    }

    let summary = month_summary(record);
    rows.push(vec![Cell::text(MONTH_MARKER)]);
    rows.push(header(&["Metric", "Amount"]));
    rows.push(metric("Total Income", summary.total_income));
    rows.push(metric("Total Expenses", summary.total_expenses));
    rows.push(metric("Tenant Utility Overage", summary.tenant_overage));
    rows.push(metric("Total Outflow", summary.total_outflow));
    rows.push(metric("Net Savings", summary.net_savings));

    SheetData {
        name: key.to_string(),
        rows,
    }
}

fn header(labels: &[&str]) -> Vec<Cell> {
    labels.iter().map(|label| Cell::text(*label)).collect()
}

fn metric(label: &str, amount: Amount) -> Vec<Cell> {
    vec![Cell::text(label), Cell::number(amount.to_cell())]
}

/// The decoder's current section while walking a sheet's rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Expenses,
    Incomes,
    Utilities,
}

/// Decodes sheets into a ledger. Sheets whose names do not parse as a month
/// key are skipped; missing sections and malformed rows default to empty.
pub fn decode(sheets: &[SheetData]) -> Ledger {
    let mut ledger = Ledger::new();
    for sheet in sheets {
        let key = match MonthKey::from_str(sheet.name.trim()) {
            Ok(key) => key,
            Err(_) => {
                debug!("Skipping sheet '{}': not a month name", sheet.name);
                continue;
            }
        };
        trace!("Decoding sheet '{key}'");
        ledger.insert(key, decode_sheet(&sheet.rows));
    }
    ledger
}

fn decode_sheet(rows: &[Vec<Cell>]) -> MonthRecord {
    let mut record = MonthRecord::default();
    let mut section = Section::None;
    let mut skipped_header = false;

    for row in rows {
        let first = row.first().map(Cell::display).unwrap_or_default();
        let first = first.trim();

        match first {
            EXPENSES_MARKER => {
                section = Section::Expenses;
                skipped_header = false;
                continue;
            }
            INCOME_MARKER => {
                section = Section::Incomes;
                skipped_header = false;
                continue;
            }
            UTILITIES_MARKER => {
                section = Section::Utilities;
                skipped_header = false;
                continue;
            }
            // Derived sections are recomputed on load, never read back.
            SPLIT_MARKER | MONTH_MARKER => {
                section = Section::None;
                continue;
            }
            _ => {}
        }

        // The row immediately after a marker is always the header row.
        if section != Section::None && !skipped_header {
            skipped_header = true;
            continue;
        }

        // A fully blank row ends the current section.
        if row.iter().all(Cell::is_empty) {
            section = Section::None;
            continue;
        }

        match section {
            Section::Expenses => {
                if first.is_empty() || first.starts_with(PLACEHOLDER_PREFIX) {
                    continue;
                }
                record.expenses.push(Expense::create(NewExpense {
                    date: date_cell(row.first()),
                    description: text_cell(row.get(1)),
                    category: Category::from_cell(&text_cell(row.get(2))),
                    cost: amount_cell(row.get(3)).unwrap_or(Amount::ZERO),
                }));
            }
            Section::Incomes => {
                if first.is_empty() || first.starts_with(PLACEHOLDER_PREFIX) {
                    continue;
                }
                record.incomes.push(Income::create(NewIncome {
                    date: date_cell(row.first()),
                    description: text_cell(row.get(1)),
                    amount: amount_cell(row.get(2)).unwrap_or(Amount::ZERO),
                }));
            }
            Section::Utilities => {
                let item = first.to_lowercase();
                let value = reading_cell(row.get(1));
                if item.contains("water") {
                    record.utilities.water = value;
                } else if item.contains("basement") {
                    record.utilities.elec_base = value;
                } else if item.contains("main") {
                    record.utilities.elec_main = value;
                } else if item.contains("gas") {
                    record.utilities.gas = value;
                } else if item.contains("internet") {
                    record.utilities.internet = value;
                }
                // Unrecognized labels are ignored.
            }
            Section::None => {}
        }
    }

    record
}

fn text_cell(cell: Option<&Cell>) -> String {
    cell.map(Cell::display).unwrap_or_default().trim().to_string()
}

/// A date cell may be text or an Excel serial day number; serials are
/// converted to an ISO calendar date.
fn date_cell(cell: Option<&Cell>) -> String {
    match cell {
        Some(Cell::Number(serial)) if *serial != 0.0 => {
            excel_serial_to_iso(*serial).unwrap_or_else(|| serial.to_string())
        }
        Some(Cell::Text(s)) => s.trim().to_string(),
        _ => String::new(),
    }
}

fn amount_cell(cell: Option<&Cell>) -> Option<Amount> {
    match cell {
        Some(Cell::Number(n)) => Some(Amount::from_cell(*n)),
        Some(Cell::Text(s)) => Amount::from_str(s).ok(),
        _ => None,
    }
}

/// A utility reading cell; zero and unparseable values decode to "not
/// entered", which is what they encode from.
fn reading_cell(cell: Option<&Cell>) -> Option<Amount> {
    amount_cell(cell).filter(|amount| !amount.is_zero())
}

fn excel_serial_to_iso(serial: f64) -> Option<String> {
    let seconds = ((serial - EXCEL_UNIX_EPOCH) * SECONDS_PER_DAY).floor() as i64;
    let datetime = chrono::DateTime::from_timestamp(seconds, 0)?;
    Some(datetime.date_naive().to_string())
}
