//! The sync engine: owns the authoritative in-memory ledger and keeps the
//! durable local cache and the optionally attached workbook consistent with
//! it.
//!
//! Every mutation persists the full ledger to the cache synchronously before
//! it returns; the attached workbook is a best-effort mirror written
//! asynchronously behind a debounce window. Only the most recent pending
//! write in a burst of edits is ever issued. External failures (permission
//! denial, I/O) surface through [`SaveStatus::Error`] and never roll back
//! the ledger or the cache; the next mutation is a fresh attempt.
//!
//! When a document is attached, mutations must run inside a tokio runtime,
//! which owns the debounce timer task.

use crate::codec::{self, xlsx};
use crate::doc::{DocumentHandle, Permission};
use crate::model::{
    Expense, ExpensePatch, Income, Ledger, MonthKey, NewExpense, NewIncome, UtilityReadings,
};
use crate::store::{CacheStore, LEDGER_KEY};
use crate::Result;
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

/// How long a burst of edits must go quiet before the workbook is written.
pub const DEBOUNCE: Duration = Duration::from_millis(800);

/// The save-status of the attached workbook, observable by the UI layer.
///
/// `Idle` means no document is attached or nothing has changed since attach;
/// a mutation moves the status to `Pending` until the debounce window
/// expires, then `Saving` while the write is in flight, and finally `Saved`
/// or `Error`.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveStatus {
    #[default]
    Idle,
    Pending,
    Saving,
    Saved,
    Error,
}

serde_plain::derive_display_from_serialize!(SaveStatus);
serde_plain::derive_fromstr_from_deserialize!(SaveStatus);

/// State shared with the debounce timer task.
#[derive(Debug)]
struct Shared {
    ledger: Ledger,
    status: SaveStatus,
    /// Bumped whenever a newer write supersedes the pending one; a timer
    /// task that wakes up to a different epoch than it was armed with must
    /// not write.
    epoch: u64,
}

/// Owns the ledger and the synchronization discipline around it. See the
/// module docs.
pub struct SyncEngine {
    shared: Arc<Mutex<Shared>>,
    cache: Arc<dyn CacheStore>,
    document: Option<Arc<dyn DocumentHandle>>,
    debounce: Duration,
    timer: Option<JoinHandle<()>>,
}

impl SyncEngine {
    /// Creates the engine, loading the ledger from the cache. A missing or
    /// corrupt cache entry is a cold start with an empty ledger, never an
    /// error.
    pub fn new(cache: Arc<dyn CacheStore>) -> Self {
        let ledger = match cache.get(LEDGER_KEY) {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(ledger) => ledger,
                Err(e) => {
                    warn!("Ignoring corrupt ledger cache: {e}");
                    Ledger::new()
                }
            },
            Ok(None) => Ledger::new(),
            Err(e) => {
                warn!("Unable to read the ledger cache: {e:#}");
                Ledger::new()
            }
        };

        Self {
            shared: Arc::new(Mutex::new(Shared {
                ledger,
                status: SaveStatus::Idle,
                epoch: 0,
            })),
            cache,
            document: None,
            debounce: DEBOUNCE,
            timer: None,
        }
    }

    /// Overrides the debounce window, e.g. for tests.
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().expect("sync engine state poisoned")
    }

    /// A snapshot of the current ledger.
    pub fn ledger(&self) -> Ledger {
        self.lock().ledger.clone()
    }

    pub fn save_status(&self) -> SaveStatus {
        self.lock().status
    }

    pub fn is_attached(&self) -> bool {
        self.document.is_some()
    }

    pub fn document_name(&self) -> Option<String> {
        self.document.as_ref().map(|d| d.name().to_string())
    }

    // ---- CRUD ----------------------------------------------------------

    /// Appends an expense with a fresh id, creating the month if needed.
    pub fn add_expense(&mut self, key: MonthKey, new: NewExpense) -> Result<Expense> {
        self.mutate(|ledger| ledger.add_expense(key, new).clone())
    }

    /// Removes the expense with the given id; a no-op returning false when
    /// no such expense exists.
    pub fn delete_expense(&mut self, key: MonthKey, id: &str) -> Result<bool> {
        self.mutate(|ledger| ledger.delete_expense(key, id))
    }

    /// Merges the patch into the expense with the given id; a no-op
    /// returning false when no such expense exists.
    pub fn update_expense(&mut self, key: MonthKey, id: &str, patch: ExpensePatch) -> Result<bool> {
        self.mutate(|ledger| ledger.update_expense(key, id, patch))
    }

    /// Appends an income entry with a fresh id, creating the month if needed.
    pub fn add_income(&mut self, key: MonthKey, new: NewIncome) -> Result<Income> {
        self.mutate(|ledger| ledger.add_income(key, new).clone())
    }

    /// Removes the income entry with the given id; a no-op returning false
    /// when no such entry exists.
    pub fn delete_income(&mut self, key: MonthKey, id: &str) -> Result<bool> {
        self.mutate(|ledger| ledger.delete_income(key, id))
    }

    /// Replaces the month's utility readings wholesale.
    pub fn set_utilities(&mut self, key: MonthKey, readings: UtilityReadings) -> Result<()> {
        self.mutate(|ledger| ledger.set_utilities(key, readings))
    }

    /// Removes every record from the ledger.
    pub fn clear(&mut self) -> Result<()> {
        self.mutate(Ledger::clear)
    }

    /// Applies a mutation, persists the ledger to the cache before
    /// returning, and arms the debounced mirror write.
    fn mutate<R>(&mut self, f: impl FnOnce(&mut Ledger) -> R) -> Result<R> {
        let (result, json) = {
            let mut shared = self.lock();
            let result = f(&mut shared.ledger);
            let json = serde_json::to_string(&shared.ledger)
                .context("Unable to serialize the ledger")?;
            (result, json)
        };
        self.cache
            .set(LEDGER_KEY, &json)
            .context("Unable to persist the ledger to the local cache")?;
        self.schedule_save();
        Ok(result)
    }

    // ---- external document --------------------------------------------

    /// Attaches a document and immediately writes the current ledger to it
    /// as a baseline. Supersedes any pending write to a previous document.
    pub async fn attach(&mut self, document: Arc<dyn DocumentHandle>) -> Result<()> {
        self.cancel_pending();
        debug!("Attaching document '{}'", document.name());
        self.document = Some(document);
        self.save_now().await
    }

    /// Re-attaches a previously attached document without the baseline
    /// write, e.g. when the process restarts.
    pub fn resume(&mut self, document: Arc<dyn DocumentHandle>) {
        self.cancel_pending();
        trace!("Resuming document '{}'", document.name());
        self.document = Some(document);
    }

    /// Opens a document: reads and decodes it, replaces the entire ledger
    /// (not a merge) and re-baselines the cache. An unreadable document
    /// leaves the existing ledger untouched.
    pub async fn open(&mut self, document: Arc<dyn DocumentHandle>) -> Result<()> {
        self.cancel_pending();
        debug!("Opening document '{}'", document.name());

        let bytes = document.read().await?;
        let sheets = xlsx::read_workbook_bytes(&bytes)
            .with_context(|| format!("Could not read '{}' as a workbook", document.name()))?;
        let ledger = codec::decode(&sheets);
        let json =
            serde_json::to_string(&ledger).context("Unable to serialize the ledger")?;

        {
            let mut shared = self.lock();
            shared.ledger = ledger;
            shared.status = SaveStatus::Saved;
        }
        self.cache
            .set(LEDGER_KEY, &json)
            .context("Unable to persist the opened ledger to the local cache")?;
        self.document = Some(document);
        Ok(())
    }

    /// Detaches the document. Any pending write to it is dropped.
    pub fn detach(&mut self) {
        self.cancel_pending();
        if let Some(document) = self.document.take() {
            debug!("Detaching document '{}'", document.name());
        }
        self.lock().status = SaveStatus::Idle;
    }

    /// Writes a pending snapshot now instead of waiting out the debounce
    /// window. Call before the process exits so the tail of an edit burst is
    /// not lost.
    pub async fn flush(&mut self) -> Result<()> {
        if self.document.is_none() || self.save_status() != SaveStatus::Pending {
            return Ok(());
        }
        self.cancel_pending();
        self.save_now().await
    }

    /// Encodes the ledger to a standalone workbook file, independent of the
    /// attached document.
    pub fn export(&self, path: impl AsRef<Path>) -> Result<()> {
        let sheets = {
            let shared = self.lock();
            codec::encode(&shared.ledger)
        };
        xlsx::write_workbook_file(path, &sheets)
    }

    /// Writes the ledger as pretty-printed JSON, a plain-text backup format.
    pub fn backup_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = {
            let shared = self.lock();
            serde_json::to_string_pretty(&shared.ledger)
                .context("Unable to serialize the ledger")?
        };
        std::fs::write(path, json)
            .with_context(|| format!("Unable to write backup to {}", path.display()))
    }

    /// Restores a JSON backup, replacing the entire ledger and re-baselining
    /// the cache. A file that does not parse leaves the ledger untouched.
    pub fn restore_json(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Unable to read backup at {}", path.display()))?;
        let ledger: Ledger = serde_json::from_str(&content)
            .with_context(|| format!("{} is not a ledger backup", path.display()))?;
        let json =
            serde_json::to_string(&ledger).context("Unable to serialize the ledger")?;

        self.lock().ledger = ledger;
        self.cache
            .set(LEDGER_KEY, &json)
            .context("Unable to persist the restored ledger to the local cache")?;
        self.schedule_save();
        Ok(())
    }

    // ---- debounced mirror ---------------------------------------------

    /// Arms (or re-arms) the debounce timer. Earlier pending writes are
    /// superseded and never issued.
    fn schedule_save(&mut self) {
        let Some(document) = self.document.clone() else {
            return;
        };

        let epoch = {
            let mut shared = self.lock();
            shared.epoch += 1;
            shared.status = SaveStatus::Pending;
            shared.epoch
        };

        if let Some(timer) = self.timer.take() {
            timer.abort();
        }

        trace!("Arming debounce timer for '{}'", document.name());
        let shared = Arc::clone(&self.shared);
        let delay = self.debounce;
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            save_snapshot(shared, document, epoch).await;
        }));
    }

    /// Supersedes any armed timer without writing.
    fn cancel_pending(&mut self) {
        self.lock().epoch += 1;
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }

    /// Immediate (non-debounced) write of the current ledger.
    async fn save_now(&mut self) -> Result<()> {
        let Some(document) = self.document.clone() else {
            return Ok(());
        };

        let (ledger, epoch) = {
            let mut shared = self.lock();
            shared.epoch += 1;
            shared.status = SaveStatus::Saving;
            (shared.ledger.clone(), shared.epoch)
        };

        let result = write_document(&ledger, document.as_ref()).await;

        let mut shared = self.lock();
        if shared.epoch == epoch {
            shared.status = match &result {
                Ok(()) => SaveStatus::Saved,
                Err(_) => SaveStatus::Error,
            };
        }
        result
    }
}

impl Drop for SyncEngine {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

/// The debounce timer body: give up if superseded, otherwise encode and
/// write, recording the outcome in the save status.
async fn save_snapshot(shared: Arc<Mutex<Shared>>, document: Arc<dyn DocumentHandle>, epoch: u64) {
    let ledger = {
        let mut guard = shared.lock().expect("sync engine state poisoned");
        if guard.epoch != epoch {
            return;
        }
        guard.status = SaveStatus::Saving;
        guard.ledger.clone()
    };

    let result = write_document(&ledger, document.as_ref()).await;

    let mut guard = shared.lock().expect("sync engine state poisoned");
    if guard.epoch != epoch {
        // A newer write owns the status now.
        return;
    }
    match result {
        Ok(()) => {
            debug!("Saved ledger to '{}'", document.name());
            guard.status = SaveStatus::Saved;
        }
        Err(e) => {
            warn!("Failed to save ledger to '{}': {e:#}", document.name());
            guard.status = SaveStatus::Error;
        }
    }
}

/// Encodes the ledger and writes it to the document, negotiating read-write
/// permission first.
async fn write_document(ledger: &Ledger, document: &dyn DocumentHandle) -> Result<()> {
    let sheets = codec::encode(ledger);
    let bytes = xlsx::write_workbook(&sheets)?;

    if document.query_permission().await? != Permission::Granted
        && document.request_permission().await? != Permission::Granted
    {
        bail!("Read-write permission denied for '{}'", document.name());
    }

    document.write(&bytes).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Amount, Category};
    use crate::store::MemoryStore;

    fn key() -> MonthKey {
        MonthKey::new(2025, 2).unwrap()
    }

    fn expense() -> NewExpense {
        NewExpense {
            date: "2025-03-05".to_string(),
            description: "Groceries".to_string(),
            category: Category::Grocery,
            cost: Amount::from(50),
        }
    }

    #[test]
    fn test_cold_start_with_empty_cache() {
        let engine = SyncEngine::new(Arc::new(MemoryStore::new()));
        assert!(engine.ledger().is_empty());
        assert_eq!(engine.save_status(), SaveStatus::Idle);
    }

    #[test]
    fn test_cold_start_with_corrupt_cache() {
        let cache = Arc::new(MemoryStore::new());
        cache.seed(LEDGER_KEY, "{not json");
        let engine = SyncEngine::new(Arc::clone(&cache) as Arc<dyn CacheStore>);
        assert!(engine.ledger().is_empty());
    }

    #[test]
    fn test_mutation_persists_to_cache_synchronously() {
        let cache = Arc::new(MemoryStore::new());
        let mut engine = SyncEngine::new(Arc::clone(&cache) as Arc<dyn CacheStore>);

        engine.add_expense(key(), expense()).unwrap();

        let json = cache.get(LEDGER_KEY).unwrap().unwrap();
        let cached: Ledger = serde_json::from_str(&json).unwrap();
        assert_eq!(cached, engine.ledger());
    }

    #[test]
    fn test_engine_restarts_from_cache() {
        let cache = Arc::new(MemoryStore::new());
        {
            let mut engine = SyncEngine::new(Arc::clone(&cache) as Arc<dyn CacheStore>);
            engine.add_expense(key(), expense()).unwrap();
        }
        let engine = SyncEngine::new(cache as Arc<dyn CacheStore>);
        assert_eq!(engine.ledger().len(), 1);
    }

    #[test]
    fn test_status_stays_idle_without_document() {
        let mut engine = SyncEngine::new(Arc::new(MemoryStore::new()));
        engine.add_expense(key(), expense()).unwrap();
        assert_eq!(engine.save_status(), SaveStatus::Idle);
    }

    #[test]
    fn test_save_status_display() {
        assert_eq!(SaveStatus::Pending.to_string(), "pending");
        assert_eq!("error".parse::<SaveStatus>().unwrap(), SaveStatus::Error);
    }
}
