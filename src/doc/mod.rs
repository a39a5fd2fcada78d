//! The external document adapter: the narrow contract through which the sync
//! engine talks to the mirrored workbook.
//!
//! The engine never assumes a write will succeed: it negotiates read-write
//! permission first and treats denial or I/O failure as a non-fatal error
//! surfaced through the save status.

use crate::Result;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// The outcome of a permission query or request.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Granted,
    Denied,
}

serde_plain::derive_display_from_serialize!(Permission);
serde_plain::derive_fromstr_from_deserialize!(Permission);

/// A handle to the external document. Implementations must not panic on
/// failure; every method reports errors for the engine to absorb.
#[async_trait::async_trait]
pub trait DocumentHandle: Send + Sync {
    /// A human-readable name for the document, e.g. its file name.
    fn name(&self) -> &str;

    /// Whether read-write access is currently granted, without prompting.
    async fn query_permission(&self) -> Result<Permission>;

    /// Asks for read-write access. May still come back denied.
    async fn request_permission(&self) -> Result<Permission>;

    /// Reads the whole document.
    async fn read(&self) -> Result<Vec<u8>>;

    /// Replaces the whole document.
    async fn write(&self, bytes: &[u8]) -> Result<()>;
}

/// A [`DocumentHandle`] backed by a file on disk.
///
/// There is no interactive permission prompt for plain files; read-write
/// permission means the file (or, for a file not yet created, its parent
/// directory) is writable, and a request simply re-checks.
#[derive(Debug, Clone)]
pub struct FileDocument {
    path: PathBuf,
    name: String,
}

impl FileDocument {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());
        Self { path, name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn check_writable(&self) -> Result<Permission> {
        match std::fs::metadata(&self.path) {
            Ok(metadata) => {
                if metadata.permissions().readonly() {
                    Ok(Permission::Denied)
                } else {
                    Ok(Permission::Granted)
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // The file will be created on write; the parent directory
                // decides whether that can work.
                let parent = self.path.parent().unwrap_or_else(|| Path::new("."));
                if parent.as_os_str().is_empty() || parent.is_dir() {
                    Ok(Permission::Granted)
                } else {
                    Ok(Permission::Denied)
                }
            }
            Err(e) => Err(e).with_context(|| {
                format!("Unable to inspect document at {}", self.path.display())
            }),
        }
    }
}

#[async_trait::async_trait]
impl DocumentHandle for FileDocument {
    fn name(&self) -> &str {
        &self.name
    }

    async fn query_permission(&self) -> Result<Permission> {
        self.check_writable()
    }

    async fn request_permission(&self) -> Result<Permission> {
        self.check_writable()
    }

    async fn read(&self) -> Result<Vec<u8>> {
        tokio::fs::read(&self.path)
            .await
            .with_context(|| format!("Unable to read document at {}", self.path.display()))
    }

    async fn write(&self, bytes: &[u8]) -> Result<()> {
        tokio::fs::write(&self.path, bytes)
            .await
            .with_context(|| format!("Unable to write document at {}", self.path.display()))
    }
}

/// An in-memory [`DocumentHandle`] with scriptable permission and failure
/// behavior.
///
/// Note: this is compiled even in the "production" version of this crate so
/// that the whole engine can run, top-to-bottom, without a real file.
#[derive(Debug, Default)]
pub struct TestDocument {
    state: Mutex<TestDocumentState>,
}

#[derive(Debug)]
struct TestDocumentState {
    contents: Vec<u8>,
    permission: Permission,
    grant_on_request: bool,
    fail_writes: bool,
    writes: u32,
    permission_requests: u32,
}

impl Default for TestDocumentState {
    fn default() -> Self {
        Self {
            contents: Vec::new(),
            permission: Permission::Granted,
            grant_on_request: true,
            fail_writes: false,
            writes: 0,
            permission_requests: 0,
        }
    }
}

impl TestDocument {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TestDocumentState> {
        self.state.lock().expect("test document mutex poisoned")
    }

    /// Starts denied; a permission request will be granted.
    pub fn deny_until_requested(&self) {
        let mut state = self.lock();
        state.permission = Permission::Denied;
        state.grant_on_request = true;
    }

    /// Starts denied and stays denied, even after a request.
    pub fn deny(&self) {
        let mut state = self.lock();
        state.permission = Permission::Denied;
        state.grant_on_request = false;
    }

    /// Grants permission, e.g. after a user changed their mind.
    pub fn grant(&self) {
        self.lock().permission = Permission::Granted;
    }

    /// Makes every write fail with an I/O-style error.
    pub fn fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    /// Seeds the document contents, as if another program wrote it.
    pub fn set_contents(&self, bytes: Vec<u8>) {
        self.lock().contents = bytes;
    }

    pub fn contents(&self) -> Vec<u8> {
        self.lock().contents.clone()
    }

    /// How many writes have completed successfully.
    pub fn write_count(&self) -> u32 {
        self.lock().writes
    }

    /// How many times permission was requested (not just queried).
    pub fn permission_request_count(&self) -> u32 {
        self.lock().permission_requests
    }
}

#[async_trait::async_trait]
impl DocumentHandle for TestDocument {
    fn name(&self) -> &str {
        "test-document.xlsx"
    }

    async fn query_permission(&self) -> Result<Permission> {
        Ok(self.lock().permission)
    }

    async fn request_permission(&self) -> Result<Permission> {
        let mut state = self.lock();
        state.permission_requests += 1;
        if state.grant_on_request {
            state.permission = Permission::Granted;
        }
        Ok(state.permission)
    }

    async fn read(&self) -> Result<Vec<u8>> {
        Ok(self.lock().contents.clone())
    }

    async fn write(&self, bytes: &[u8]) -> Result<()> {
        let mut state = self.lock();
        if state.fail_writes {
            anyhow::bail!("Simulated write failure");
        }
        state.contents = bytes.to_vec();
        state.writes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_file_document_round_trip() {
        let dir = TempDir::new().unwrap();
        let doc = FileDocument::new(dir.path().join("budget.xlsx"));

        assert_eq!(doc.name(), "budget.xlsx");
        assert_eq!(doc.query_permission().await.unwrap(), Permission::Granted);

        doc.write(b"abc").await.unwrap();
        assert_eq!(doc.read().await.unwrap(), b"abc");
    }

    #[tokio::test]
    async fn test_file_document_missing_parent_is_denied() {
        let dir = TempDir::new().unwrap();
        let doc = FileDocument::new(dir.path().join("missing").join("budget.xlsx"));
        assert_eq!(doc.query_permission().await.unwrap(), Permission::Denied);
    }

    #[tokio::test]
    async fn test_test_document_permission_script() {
        let doc = TestDocument::new();
        doc.deny_until_requested();
        assert_eq!(doc.query_permission().await.unwrap(), Permission::Denied);
        assert_eq!(doc.request_permission().await.unwrap(), Permission::Granted);
        assert_eq!(doc.query_permission().await.unwrap(), Permission::Granted);
        assert_eq!(doc.permission_request_count(), 1);
    }

    #[tokio::test]
    async fn test_test_document_write_failure() {
        let doc = TestDocument::new();
        doc.fail_writes(true);
        assert!(doc.write(b"x").await.is_err());
        assert_eq!(doc.write_count(), 0);

        doc.fail_writes(false);
        doc.write(b"x").await.unwrap();
        assert_eq!(doc.write_count(), 1);
    }
}
