//! Relationship records and audit events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::sentiment::Sentiment;
use super::stage::{Stage, MAX_SCORE};

// ─────────────────────────────────────────────────────────────────
// Relationship Record
// ─────────────────────────────────────────────────────────────────

/// Relationship state for one (user, persona) pair.
///
/// Fields are private so the stage can only ever be `Stage::for_score(score)`.
/// Deserialization goes through [`StoredRecord`] and re-derives the stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredRecord")]
pub struct RelationshipRecord {
    user_id: String,
    persona_id: String,
    score: u8,
    stage: Stage,
    interaction_count: u64,
    last_interaction: Option<DateTime<Utc>>,
    /// Bumped on every write; the compare-and-swap token.
    version: u64,
}

/// Wire shape of a record. Any persisted stage is ignored.
#[derive(Debug, Deserialize)]
struct StoredRecord {
    user_id: String,
    persona_id: String,
    score: u8,
    #[serde(default)]
    interaction_count: u64,
    #[serde(default)]
    last_interaction: Option<DateTime<Utc>>,
    #[serde(default)]
    version: u64,
}

impl From<StoredRecord> for RelationshipRecord {
    fn from(raw: StoredRecord) -> Self {
        let score = raw.score.min(MAX_SCORE);
        Self {
            user_id: raw.user_id,
            persona_id: raw.persona_id,
            score,
            stage: Stage::for_score(score),
            interaction_count: raw.interaction_count,
            last_interaction: raw.last_interaction,
            version: raw.version,
        }
    }
}

impl RelationshipRecord {
    /// A fresh record: score 0, never interacted, not yet stored.
    pub fn new(user_id: impl Into<String>, persona_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            persona_id: persona_id.into(),
            score: 0,
            stage: Stage::Stranger,
            interaction_count: 0,
            last_interaction: None,
            version: 0,
        }
    }

    /// Rebuild a record from externally held values (imports, fixtures).
    pub fn restore(
        user_id: impl Into<String>,
        persona_id: impl Into<String>,
        score: u8,
        interaction_count: u64,
        last_interaction: Option<DateTime<Utc>>,
    ) -> Self {
        StoredRecord {
            user_id: user_id.into(),
            persona_id: persona_id.into(),
            score,
            interaction_count,
            last_interaction,
            version: 0,
        }
        .into()
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn persona_id(&self) -> &str {
        &self.persona_id
    }

    pub fn score(&self) -> u8 {
        self.score
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn interaction_count(&self) -> u64 {
        self.interaction_count
    }

    pub fn last_interaction(&self) -> Option<DateTime<Utc>> {
        self.last_interaction
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Whole days between the last interaction and `now`. Zero if never
    /// interacted or if the clock moved backwards.
    pub fn days_inactive(&self, now: DateTime<Utc>) -> u32 {
        self.last_interaction
            .map(|last| (now - last).num_days().max(0))
            .map(|days| u32::try_from(days).unwrap_or(u32::MAX))
            .unwrap_or(0)
    }

    /// The record after one message: decay then delta, clamped to `0..=100`,
    /// stage recomputed, count bumped, timestamp and version advanced.
    pub fn advance(&self, decay: u32, delta: i32, now: DateTime<Utc>) -> Self {
        let raw = i64::from(self.score) - i64::from(decay) + i64::from(delta);
        let score = raw.clamp(0, i64::from(MAX_SCORE)) as u8;
        Self {
            user_id: self.user_id.clone(),
            persona_id: self.persona_id.clone(),
            score,
            stage: Stage::for_score(score),
            interaction_count: self.interaction_count.saturating_add(1),
            last_interaction: Some(now),
            version: self.version.wrapping_add(1),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Audit Event
// ─────────────────────────────────────────────────────────────────

/// Append-only record of a significant score change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: Uuid,
    pub user_id: String,
    pub persona_id: String,
    pub delta: i32,
    pub decay_applied: u32,
    pub score: u8,
    pub stage: Stage,
    /// Sentiment reason label (e.g. "insulting language").
    pub reason: String,
    pub description: String,
    pub recorded_at: DateTime<Utc>,
}

impl AuditEvent {
    /// Event describing how `record` was reached from a sentiment and decay.
    pub fn describe(record: &RelationshipRecord, sentiment: &Sentiment, decay: u32, now: DateTime<Utc>) -> Self {
        let mut description = format!(
            "Relationship changed by {} due to {}",
            sentiment.delta,
            sentiment.reason.label()
        );
        if decay > 0 {
            description.push_str(&format!(" (Inactivity decay: -{})", decay));
        }

        Self {
            id: Uuid::new_v4(),
            user_id: record.user_id().to_string(),
            persona_id: record.persona_id().to_string(),
            delta: sentiment.delta,
            decay_applied: decay,
            score: record.score(),
            stage: record.stage(),
            reason: sentiment.reason.label().to_string(),
            description,
            recorded_at: now,
        }
    }
}
