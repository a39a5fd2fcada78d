//! Command handlers for the ledgerbook CLI.
//!
//! Handlers only drive the library surface (the sync engine's CRUD calls
//! and document operations) and report what happened. Nothing in here
//! touches the cache or the workbook directly.

mod document;
mod entry;

pub use document::{backup, clear, create, detach, export, open, restore, status};
pub use entry::{
    add_expense, add_income, delete_expense, delete_income, list_expenses, list_incomes,
    set_utilities, show_split, show_summary, show_utilities, update_expense,
};

use serde_json::Value;
use tracing::{debug, info};

/// The output of a command: a message for the user and, optionally,
/// structured data for anyone running with debug logging.
#[derive(Debug, Clone)]
pub struct Out {
    message: String,
    details: Option<Value>,
}

impl Out {
    /// A command outcome with structured details.
    pub fn new(message: impl Into<String>, details: Value) -> Self {
        Self {
            message: message.into(),
            details: Some(details),
        }
    }

    /// A command outcome that is just a message.
    pub fn new_message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            details: None,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Print the message to `info!` and the details (if any) as JSON to
    /// `debug!`.
    pub fn print(&self) {
        info!("{}", self.message);
        if let Some(details) = &self.details {
            if let Ok(json) = serde_json::to_string_pretty(details) {
                debug!("Command output:\n\n{json}\n\n");
            }
        }
    }
}
