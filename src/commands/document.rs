//! Handlers for the workbook and data-management commands.

use crate::commands::Out;
use crate::config::Config;
use crate::doc::FileDocument;
use crate::sync::SyncEngine;
use crate::Result;
use anyhow::bail;
use std::path::Path;
use std::sync::Arc;

/// Creates (or overwrites) a workbook at `path`, writes the current ledger
/// to it as a baseline, and keeps mirroring to it from now on.
pub async fn create(config: &mut Config, engine: &mut SyncEngine, path: &Path) -> Result<Out> {
    let document = Arc::new(FileDocument::new(path));
    engine.attach(document).await?;
    config.set_document(Some(path.to_path_buf()))?;
    Ok(Out::new_message(format!(
        "Created '{}'; every change is now mirrored there",
        path.display()
    )))
}

/// Opens an existing workbook, replacing the ledger with its contents, and
/// keeps mirroring to it from now on.
pub async fn open(config: &mut Config, engine: &mut SyncEngine, path: &Path) -> Result<Out> {
    let document = Arc::new(FileDocument::new(path));
    engine.open(document).await?;
    config.set_document(Some(path.to_path_buf()))?;

    let ledger = engine.ledger();
    let message = match ledger.latest_month() {
        Some(latest) => format!(
            "Loaded {} month(s) from '{}', most recent {latest}; every change is now mirrored there",
            ledger.len(),
            path.display()
        ),
        None => format!(
            "'{}' holds no month sheets yet; every change is now mirrored there",
            path.display()
        ),
    };
    Ok(Out::new_message(message))
}

/// Stops mirroring to the attached workbook.
pub fn detach(config: &mut Config, engine: &mut SyncEngine) -> Result<Out> {
    if !engine.is_attached() {
        return Ok(Out::new_message("No workbook is attached"));
    }
    let name = engine.document_name().unwrap_or_default();
    engine.detach();
    config.set_document(None)?;
    Ok(Out::new_message(format!(
        "Detached '{name}'; data stays in the local cache"
    )))
}

/// Writes the ledger to a standalone workbook file.
pub fn export(engine: &SyncEngine, path: &Path) -> Result<Out> {
    engine.export(path)?;
    Ok(Out::new_message(format!(
        "Exported the ledger to '{}'",
        path.display()
    )))
}

/// Shows the attached workbook and the save status.
pub fn status(config: &Config, engine: &SyncEngine) -> Result<Out> {
    let message = match (engine.document_name(), config.document()) {
        (Some(name), _) => format!(
            "Attached to '{name}', save status: {}",
            engine.save_status()
        ),
        (None, Some(path)) => format!("Configured workbook: '{}' (not loaded)", path.display()),
        (None, None) => "No workbook attached; data is saved in the local cache only".to_string(),
    };
    Ok(Out::new_message(message))
}

/// Deletes all ledger data, everywhere the engine writes.
pub fn clear(engine: &mut SyncEngine, yes: bool) -> Result<Out> {
    if !yes {
        bail!("This deletes ALL ledger data and cannot be undone; pass --yes to confirm");
    }
    engine.clear()?;
    Ok(Out::new_message("Deleted all ledger data"))
}

/// Writes the ledger to a JSON backup file.
pub fn backup(engine: &SyncEngine, path: &Path) -> Result<Out> {
    engine.backup_json(path)?;
    Ok(Out::new_message(format!(
        "Backed up the ledger to '{}'",
        path.display()
    )))
}

/// Replaces the ledger with the contents of a JSON backup file.
pub fn restore(engine: &mut SyncEngine, path: &Path) -> Result<Out> {
    engine.restore_json(path)?;
    let ledger = engine.ledger();
    Ok(Out::new_message(format!(
        "Restored {} month(s) from '{}'",
        ledger.len(),
        path.display()
    )))
}
