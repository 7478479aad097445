//! JSON file relationship store.
//!
//! The whole store is one document (`relationships.json` under the data
//! directory). Every call holds an advisory lock on the sibling
//! `relationships.lock` file, shared for reads and exclusive for
//! read-modify-write, so separate processes and separate handles see each
//! other's compare-and-swap. Writes land via a uniquely named temp file
//! renamed over the document, so readers never see a torn file.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use fd_lock::RwLock as FileLock;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::relationship::record::{AuditEvent, RelationshipRecord};

use super::RelationshipStore;

/// On-disk document.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDocument {
    #[serde(default)]
    records: Vec<RelationshipRecord>,
    #[serde(default)]
    audit: Vec<AuditEvent>,
}

/// Lock mode for one store call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Shared,
    Exclusive,
}

/// Relationship store persisted as a single JSON document.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    /// Serializes calls made through this handle before the file lock is taken.
    local: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            local: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling lock file guarding the document.
    pub fn lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }

    fn parent_dir(&self) -> Option<&Path> {
        self.path.parent().filter(|p| !p.as_os_str().is_empty())
    }

    /// Run `f` while holding the file lock in the given mode.
    fn locked<T>(&self, access: Access, f: impl FnOnce(&Self) -> Result<T>) -> Result<T> {
        let _local = self.local.lock();

        match (access, self.parent_dir()) {
            // Nothing has been written yet; there is nothing to lock against
            (Access::Shared, Some(parent)) if !parent.exists() => return f(self),
            (Access::Exclusive, Some(parent)) => {
                fs::create_dir_all(parent).map_err(|e| {
                    Error::storage_write(format!("create {}: {}", parent.display(), e))
                })?;
            }
            _ => {}
        }

        let lock_path = self.lock_path();
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&lock_path)
            .map_err(|e| lock_error(access, &lock_path, e))?;
        let mut lock = FileLock::new(file);

        match access {
            Access::Shared => {
                let _guard = lock.read().map_err(|e| lock_error(access, &lock_path, e))?;
                f(self)
            }
            Access::Exclusive => {
                let _guard = lock.write().map_err(|e| lock_error(access, &lock_path, e))?;
                trace!(path = %lock_path.display(), "Store lock acquired");
                f(self)
            }
        }
    }

    fn load(&self) -> Result<StoreDocument> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                trace!(path = %self.path.display(), "Store file absent, starting empty");
                return Ok(StoreDocument::default());
            }
            Err(e) => {
                return Err(Error::storage_read(format!("{}: {}", self.path.display(), e)));
            }
        };

        if content.trim().is_empty() {
            return Ok(StoreDocument::default());
        }

        serde_json::from_str(&content).map_err(|e| Error::StorageCorrupted {
            message: format!("{}: {}", self.path.display(), e),
        })
    }

    /// Replace the document. Caller must hold the exclusive lock.
    fn save(&self, document: &StoreDocument) -> Result<()> {
        let dir = self.parent_dir().unwrap_or_else(|| Path::new("."));
        let content = serde_json::to_vec_pretty(document)?;

        let mut tmp = NamedTempFile::new_in(dir)
            .map_err(|e| Error::storage_write(format!("temp file in {}: {}", dir.display(), e)))?;
        tmp.write_all(&content)
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| Error::storage_write(format!("{}: {}", tmp.path().display(), e)))?;
        tmp.persist(&self.path)
            .map_err(|e| Error::storage_write(format!("{}: {}", self.path.display(), e.error)))?;

        debug!(
            path = %self.path.display(),
            records = document.records.len(),
            events = document.audit.len(),
            "Relationship store saved"
        );
        Ok(())
    }
}

fn lock_error(access: Access, path: &Path, e: std::io::Error) -> Error {
    let message = format!("lock {}: {}", path.display(), e);
    match access {
        Access::Shared => Error::storage_read(message),
        Access::Exclusive => Error::storage_write(message),
    }
}

#[async_trait]
impl RelationshipStore for JsonFileStore {
    fn name(&self) -> &'static str {
        "json"
    }

    async fn get(&self, user_id: &str, persona_id: &str) -> Result<Option<RelationshipRecord>> {
        self.locked(Access::Shared, |store| {
            Ok(store
                .load()?
                .records
                .into_iter()
                .find(|r| r.user_id() == user_id && r.persona_id() == persona_id))
        })
    }

    async fn upsert(&self, record: &RelationshipRecord, expected_version: Option<u64>) -> Result<()> {
        self.locked(Access::Exclusive, |store| {
            let mut document = store.load()?;

            let position = document
                .records
                .iter()
                .position(|r| r.user_id() == record.user_id() && r.persona_id() == record.persona_id());
            let current = position.map(|i| document.records[i].version());

            if current != expected_version {
                return Err(Error::StorageConflict {
                    user_id: record.user_id().to_string(),
                    persona_id: record.persona_id().to_string(),
                });
            }

            match position {
                Some(i) => document.records[i] = record.clone(),
                None => document.records.push(record.clone()),
            }
            store.save(&document)
        })
    }

    async fn append(&self, event: &AuditEvent) -> Result<()> {
        self.locked(Access::Exclusive, |store| {
            let mut document = store.load()?;
            document.audit.push(event.clone());
            store.save(&document)
        })
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<RelationshipRecord>> {
        self.locked(Access::Shared, |store| {
            Ok(store
                .load()?
                .records
                .into_iter()
                .filter(|r| r.user_id() == user_id)
                .collect())
        })
    }

    async fn audit_events(&self, user_id: &str) -> Result<Vec<AuditEvent>> {
        self.locked(Access::Shared, |store| {
            Ok(store
                .load()?
                .audit
                .into_iter()
                .filter(|e| e.user_id == user_id)
                .collect())
        })
    }
}
