//! Persistence contract for relationship records and audit events.
//!
//! Implementations must make `upsert` a compare-and-swap on the record
//! version so that decay and sentiment land in one atomic write.

use async_trait::async_trait;

use crate::error::Result;

use super::record::{AuditEvent, RelationshipRecord};

pub mod json;
pub mod memory;

pub use json::JsonFileStore;
pub use memory::{MemoryFaults, MemoryStore};

/// Storage for relationship records keyed by (user_id, persona_id).
#[async_trait]
pub trait RelationshipStore: Send + Sync {
    /// Name of the implementation, for logs.
    fn name(&self) -> &'static str;

    /// Current record for the pair, if one was ever written.
    async fn get(&self, user_id: &str, persona_id: &str) -> Result<Option<RelationshipRecord>>;

    /// Write `record` only if the stored version still equals `expected_version`
    /// (`None` means the pair must not exist yet).
    ///
    /// Returns `Error::StorageConflict` when the check fails.
    async fn upsert(&self, record: &RelationshipRecord, expected_version: Option<u64>) -> Result<()>;

    /// Append an audit event.
    async fn append(&self, event: &AuditEvent) -> Result<()>;

    /// All records for a user, in no particular order.
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<RelationshipRecord>>;

    /// Audit events for a user, oldest first.
    async fn audit_events(&self, user_id: &str) -> Result<Vec<AuditEvent>>;
}
