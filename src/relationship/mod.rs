//! Relationship state machine: per user, per persona scores that move with
//! every message.
//!
//! - `sentiment`: message → (delta, reason)
//! - `stage`: score → stage label
//! - `record`: the stored state and its audit events
//! - `store`: persistence contract plus memory and JSON file stores
//! - `engine`: decay + delta + compare-and-swap write

pub mod engine;
pub mod record;
pub mod sentiment;
pub mod stage;
pub mod store;

pub use engine::{RelationshipEngine, RelationshipStatus, RelationshipUpdate};
pub use record::{AuditEvent, RelationshipRecord};
pub use sentiment::{Sentiment, SentimentLexicon, SentimentReason};
pub use stage::{Stage, MAX_SCORE};
pub use store::{JsonFileStore, MemoryFaults, MemoryStore, RelationshipStore};
