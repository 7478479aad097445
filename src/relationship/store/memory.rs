//! In-process relationship store.
//!
//! Also used in tests: [`MemoryFaults`] makes reads, writes or the
//! compare-and-swap fail on demand.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::relationship::record::{AuditEvent, RelationshipRecord};

use super::RelationshipStore;

/// Injected failures.
#[derive(Debug, Clone, Default)]
pub struct MemoryFaults {
    /// `get` and `list_for_user` fail.
    pub fail_reads: bool,

    /// `upsert` fails with a write error.
    pub fail_writes: bool,

    /// `append` fails.
    pub fail_appends: bool,

    /// Number of upcoming `upsert` calls that report a version conflict.
    pub conflicts: u32,
}

/// Track method call counts for verification
#[derive(Debug, Default, Clone, Copy)]
pub struct CallCounts {
    pub get: u32,
    pub upsert: u32,
    pub append: u32,
}

type Key = (String, String);

/// Relationship store backed by process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<Key, RelationshipRecord>>,
    events: RwLock<Vec<AuditEvent>>,
    faults: RwLock<MemoryFaults>,
    calls: RwLock<CallCounts>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_faults(faults: MemoryFaults) -> Self {
        Self {
            faults: RwLock::new(faults),
            ..Self::default()
        }
    }

    /// Seed a record directly, bypassing the version check.
    pub fn insert(&self, record: RelationshipRecord) {
        let key = (record.user_id().to_string(), record.persona_id().to_string());
        self.records.write().insert(key, record);
    }

    pub fn call_counts(&self) -> CallCounts {
        *self.calls.read()
    }

    /// Number of stored audit events across all users.
    pub fn event_count(&self) -> usize {
        self.events.read().len()
    }
}

#[async_trait]
impl RelationshipStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, user_id: &str, persona_id: &str) -> Result<Option<RelationshipRecord>> {
        self.calls.write().get += 1;
        if self.faults.read().fail_reads {
            return Err(Error::storage_read("injected read failure"));
        }

        let key = (user_id.to_string(), persona_id.to_string());
        Ok(self.records.read().get(&key).cloned())
    }

    async fn upsert(&self, record: &RelationshipRecord, expected_version: Option<u64>) -> Result<()> {
        self.calls.write().upsert += 1;
        {
            let mut faults = self.faults.write();
            if faults.fail_writes {
                return Err(Error::storage_write("injected write failure"));
            }
            if faults.conflicts > 0 {
                faults.conflicts -= 1;
                return Err(Error::StorageConflict {
                    user_id: record.user_id().to_string(),
                    persona_id: record.persona_id().to_string(),
                });
            }
        }

        let key = (record.user_id().to_string(), record.persona_id().to_string());
        let mut records = self.records.write();
        let current = records.get(&key).map(RelationshipRecord::version);
        if current != expected_version {
            return Err(Error::StorageConflict {
                user_id: key.0,
                persona_id: key.1,
            });
        }
        records.insert(key, record.clone());
        Ok(())
    }

    async fn append(&self, event: &AuditEvent) -> Result<()> {
        self.calls.write().append += 1;
        if self.faults.read().fail_appends {
            return Err(Error::storage_write("injected audit failure"));
        }
        self.events.write().push(event.clone());
        Ok(())
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<RelationshipRecord>> {
        if self.faults.read().fail_reads {
            return Err(Error::storage_read("injected read failure"));
        }
        Ok(self
            .records
            .read()
            .values()
            .filter(|r| r.user_id() == user_id)
            .cloned()
            .collect())
    }

    async fn audit_events(&self, user_id: &str) -> Result<Vec<AuditEvent>> {
        Ok(self
            .events
            .read()
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect())
    }
}
