//! A household budget ledger keyed by calendar month, mirrored to an Excel
//! workbook.
//!
//! The pieces, leaves first:
//!
//! - [`split`]: the tenant/landlord utility cost split, a pure calculation.
//! - [`model`]: the ledger and its CRUD mutations.
//! - [`codec`]: encodes the ledger to a multi-sheet grid document (and the
//!   `.xlsx` bytes for it) and decodes such a document back, tolerantly.
//! - [`sync`]: owns the ledger; mirrors every change to the local cache
//!   synchronously and to the attached workbook asynchronously behind a
//!   debounce window, with a visible save-status state machine.
//! - [`store`] and [`doc`]: the narrow contracts for the cache and the
//!   external document, each with a real and an in-memory implementation.

pub mod args;
pub mod codec;
pub mod commands;
mod config;
mod doc;
mod error;
mod model;
mod split;
mod store;
mod sync;
mod utils;

pub use codec::{decode, encode, Cell, SheetData};
pub use config::Config;
pub use doc::{DocumentHandle, FileDocument, Permission, TestDocument};
pub use error::{Error, Result};
pub use model::{
    month_summary, Amount, Category, Expense, ExpensePatch, Income, Ledger, MonthKey, MonthRecord,
    MonthSummary, NewExpense, NewIncome, UtilityReadings,
};
pub use split::{compute_split, LandlordShare, TenantShare, UtilitySplit, TENANT_CAP};
pub use store::{CacheStore, FileStore, MemoryStore, LEDGER_KEY};
pub use sync::{SaveStatus, SyncEngine, DEBOUNCE};
