//! Relationship state machine.
//!
//! One message for a (user, persona) pair becomes one sentiment delta, one
//! lazily computed inactivity decay, and a single compare-and-swap write.
//! Storage trouble is logged and never fails the message.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::RelationshipSettings;
use crate::error::Result;

use super::record::{AuditEvent, RelationshipRecord};
use super::sentiment::{Sentiment, SentimentLexicon};
use super::stage::Stage;
use super::store::RelationshipStore;

/// Result of processing one message.
#[derive(Debug, Clone, Serialize)]
pub struct RelationshipUpdate {
    /// The record after this message (stored or not, see `persisted`).
    pub record: RelationshipRecord,

    pub sentiment: Sentiment,

    /// Inactivity decay applied before the sentiment delta.
    pub decay: u32,

    /// Audit event due for this change, if any. Only appended to the store
    /// when `persisted` is true.
    pub audit: Option<AuditEvent>,

    /// Whether the record was written.
    pub persisted: bool,
}

/// One line of a user's relationship overview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationshipStatus {
    pub persona_id: String,
    pub score: u8,
    pub stage: Stage,
    pub interaction_count: u64,
    pub last_interaction: Option<DateTime<Utc>>,
    pub days_inactive: u32,
}

/// Applies messages to relationship records.
pub struct RelationshipEngine {
    store: Arc<dyn RelationshipStore>,
    lexicon: SentimentLexicon,
    settings: RelationshipSettings,
}

impl RelationshipEngine {
    pub fn new(store: Arc<dyn RelationshipStore>, settings: RelationshipSettings) -> Self {
        Self {
            store,
            lexicon: SentimentLexicon::default(),
            settings,
        }
    }

    /// Decay owed after `days` whole days of silence.
    pub fn decay_for(&self, days: u32) -> u32 {
        if days == 0 {
            return 0;
        }
        days.saturating_mul(self.settings.decay_per_day)
            .min(self.settings.max_decay)
    }

    /// Whether a change is significant enough to audit.
    pub fn should_audit(&self, delta: i32, decay: u32) -> bool {
        delta.unsigned_abs() > self.settings.audit_threshold || decay > 0
    }

    /// Apply one message from `user_id` to `persona_id` at time `now`.
    pub async fn process(
        &self,
        user_id: &str,
        persona_id: &str,
        message: &str,
        now: DateTime<Utc>,
    ) -> RelationshipUpdate {
        let sentiment = self.lexicon.classify(message);
        let attempts = self.settings.max_update_attempts.max(1);
        let mut last_computed = None;

        for attempt in 1..=attempts {
            let (current, expected_version) = match self.store.get(user_id, persona_id).await {
                Ok(Some(record)) => {
                    let version = record.version();
                    (record, Some(version))
                }
                Ok(None) => (RelationshipRecord::new(user_id, persona_id), None),
                Err(e) => {
                    // Never overwrite a row we could not read
                    warn!(
                        user = %user_id,
                        persona = %persona_id,
                        store = self.store.name(),
                        error = %e.format_for_log(),
                        "Relationship read failed, continuing from a fresh record"
                    );
                    let fresh = RelationshipRecord::new(user_id, persona_id);
                    return self.unpersisted(&fresh, sentiment, now);
                }
            };

            let decay = self.decay_for(current.days_inactive(now));
            let next = current.advance(decay, sentiment.delta, now);

            match self.store.upsert(&next, expected_version).await {
                Ok(()) => {
                    let audit = self.audit_for(&next, &sentiment, decay, now);
                    if let Some(ref event) = audit {
                        if let Err(e) = self.store.append(event).await {
                            warn!(
                                user = %user_id,
                                persona = %persona_id,
                                error = %e.format_for_log(),
                                "Audit append failed"
                            );
                        }
                    }

                    info!(
                        user = %user_id,
                        persona = %persona_id,
                        delta = sentiment.delta,
                        reason = %sentiment.reason,
                        decay,
                        score = next.score(),
                        stage = %next.stage(),
                        "Relationship updated"
                    );

                    return RelationshipUpdate {
                        record: next,
                        sentiment,
                        decay,
                        audit,
                        persisted: true,
                    };
                }
                Err(e) if e.is_retryable() => {
                    debug!(
                        user = %user_id,
                        persona = %persona_id,
                        attempt,
                        "Relationship changed concurrently, retrying"
                    );
                    last_computed = Some((next, decay));
                }
                Err(e) => {
                    warn!(
                        user = %user_id,
                        persona = %persona_id,
                        store = self.store.name(),
                        error = %e.format_for_log(),
                        "Relationship write failed, using unsaved record"
                    );
                    return self.local_update(next, sentiment, decay, now);
                }
            }
        }

        warn!(
            user = %user_id,
            persona = %persona_id,
            attempts,
            "Relationship update gave up after repeated conflicts"
        );
        match last_computed {
            Some((record, decay)) => self.local_update(record, sentiment, decay, now),
            None => self.unpersisted(&RelationshipRecord::new(user_id, persona_id), sentiment, now),
        }
    }

    /// Every stored relationship of a user, highest score first.
    pub async fn status(&self, user_id: &str, now: DateTime<Utc>) -> Result<Vec<RelationshipStatus>> {
        let mut records = self.store.list_for_user(user_id).await?;
        records.sort_by(|a, b| {
            b.score()
                .cmp(&a.score())
                .then_with(|| a.persona_id().cmp(b.persona_id()))
        });

        Ok(records
            .iter()
            .map(|r| RelationshipStatus {
                persona_id: r.persona_id().to_string(),
                score: r.score(),
                stage: r.stage(),
                interaction_count: r.interaction_count(),
                last_interaction: r.last_interaction(),
                days_inactive: r.days_inactive(now),
            })
            .collect())
    }

    /// Audit trail for a user, oldest first.
    pub async fn history(&self, user_id: &str) -> Result<Vec<AuditEvent>> {
        self.store.audit_events(user_id).await
    }

    fn audit_for(
        &self,
        record: &RelationshipRecord,
        sentiment: &Sentiment,
        decay: u32,
        now: DateTime<Utc>,
    ) -> Option<AuditEvent> {
        self.should_audit(sentiment.delta, decay)
            .then(|| AuditEvent::describe(record, sentiment, decay, now))
    }

    fn unpersisted(
        &self,
        base: &RelationshipRecord,
        sentiment: Sentiment,
        now: DateTime<Utc>,
    ) -> RelationshipUpdate {
        let decay = self.decay_for(base.days_inactive(now));
        let record = base.advance(decay, sentiment.delta, now);
        self.local_update(record, sentiment, decay, now)
    }

    fn local_update(
        &self,
        record: RelationshipRecord,
        sentiment: Sentiment,
        decay: u32,
        now: DateTime<Utc>,
    ) -> RelationshipUpdate {
        let audit = self.audit_for(&record, &sentiment, decay, now);
        RelationshipUpdate {
            record,
            sentiment,
            decay,
            audit,
            persisted: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relationship::sentiment::SentimentReason;
    use crate::relationship::store::{MemoryFaults, MemoryStore};
    use chrono::Duration;

    fn engine_with(store: Arc<MemoryStore>) -> RelationshipEngine {
        RelationshipEngine::new(store, RelationshipSettings::default())
    }

    #[test]
    fn test_decay_for() {
        let engine = engine_with(Arc::new(MemoryStore::new()));
        assert_eq!(engine.decay_for(0), 0);
        assert_eq!(engine.decay_for(1), 2);
        assert_eq!(engine.decay_for(4), 8);
        assert_eq!(engine.decay_for(10), 10);
        assert_eq!(engine.decay_for(u32::MAX), 10);
    }

    #[test]
    fn test_should_audit() {
        let engine = engine_with(Arc::new(MemoryStore::new()));
        assert!(!engine.should_audit(2, 0));
        assert!(engine.should_audit(3, 0));
        assert!(engine.should_audit(-4, 0));
        assert!(engine.should_audit(2, 1));
    }

    #[tokio::test]
    async fn test_first_message_creates_record() {
        let store = Arc::new(MemoryStore::new());
        let engine = engine_with(store.clone());

        let update = engine.process("u1", "ceo", "hello", Utc::now()).await;
        assert!(update.persisted);
        assert_eq!(update.record.score(), 2);
        assert_eq!(update.record.interaction_count(), 1);
        assert_eq!(update.decay, 0);
        assert!(update.audit.is_none());
        assert_eq!(store.event_count(), 0);
    }

    #[tokio::test]
    async fn test_first_message_negative_is_clamped() {
        let store = Arc::new(MemoryStore::new());
        let engine = engine_with(store.clone());

        let update = engine.process("u1", "ceo", "you are stupid", Utc::now()).await;
        assert_eq!(update.record.score(), 0);
        assert_eq!(update.sentiment.delta, -8);
        assert!(update.audit.is_some());
        assert_eq!(store.event_count(), 1);
    }

    #[tokio::test]
    async fn test_decay_then_neutral_regresses_stage() {
        let store = Arc::new(MemoryStore::new());
        let now = Utc::now();
        store.insert(RelationshipRecord::restore(
            "u1",
            "cfo",
            15,
            6,
            Some(now - Duration::days(10)),
        ));
        let engine = engine_with(store.clone());

        let update = engine.process("u1", "cfo", "ok, noted", now).await;
        assert_eq!(update.decay, 10);
        assert_eq!(update.sentiment.reason, SentimentReason::NormalInteraction);
        assert_eq!(update.record.score(), 7);
        assert_eq!(update.record.stage(), Stage::Stranger);
        assert_eq!(update.record.interaction_count(), 7);

        let event = update.audit.unwrap();
        assert_eq!(
            event.description,
            "Relationship changed by 2 due to normal interaction (Inactivity decay: -10)"
        );
    }

    #[tokio::test]
    async fn test_score_stays_in_bounds() {
        let store = Arc::new(MemoryStore::new());
        let engine = engine_with(store.clone());
        let now = Utc::now();

        for _ in 0..40 {
            let update = engine.process("u1", "cmo", "I need you", now).await;
            assert!(update.record.score() <= 100);
        }
        assert_eq!(store.get("u1", "cmo").await.unwrap().unwrap().score(), 100);

        for _ in 0..20 {
            let update = engine.process("u1", "cmo", "I will kill you", now).await;
            assert_eq!(update.record.stage(), Stage::for_score(update.record.score()));
        }
        assert_eq!(store.get("u1", "cmo").await.unwrap().unwrap().score(), 0);
    }

    #[tokio::test]
    async fn test_conflict_is_retried() {
        let store = Arc::new(MemoryStore::with_faults(MemoryFaults {
            conflicts: 2,
            ..Default::default()
        }));
        let engine = engine_with(store.clone());

        let update = engine.process("u1", "cto", "the api is down", Utc::now()).await;
        assert!(update.persisted);
        assert_eq!(store.call_counts().upsert, 3);
    }

    #[tokio::test]
    async fn test_conflicts_exhaust_attempts() {
        let store = Arc::new(MemoryStore::with_faults(MemoryFaults {
            conflicts: 10,
            ..Default::default()
        }));
        let engine = engine_with(store.clone());

        let update = engine.process("u1", "cto", "thanks", Utc::now()).await;
        assert!(!update.persisted);
        assert_eq!(update.record.score(), 2);
        assert_eq!(store.call_counts().upsert, 3);
    }

    #[tokio::test]
    async fn test_write_failure_returns_local_record() {
        let store = Arc::new(MemoryStore::with_faults(MemoryFaults {
            fail_writes: true,
            ..Default::default()
        }));
        let engine = engine_with(store.clone());

        let update = engine.process("u1", "coo", "you are amazing", Utc::now()).await;
        assert!(!update.persisted);
        assert_eq!(update.record.score(), 3);
        assert!(update.audit.is_some());
        assert_eq!(store.event_count(), 0);
        // Write failures are not retried
        assert_eq!(store.call_counts().upsert, 1);
    }

    #[tokio::test]
    async fn test_read_failure_does_not_write() {
        let store = Arc::new(MemoryStore::with_faults(MemoryFaults {
            fail_reads: true,
            ..Default::default()
        }));
        let engine = engine_with(store.clone());

        let update = engine.process("u1", "coo", "hello", Utc::now()).await;
        assert!(!update.persisted);
        assert_eq!(update.record.score(), 2);
        assert_eq!(store.call_counts().upsert, 0);
    }

    #[tokio::test]
    async fn test_audit_failure_still_persists_record() {
        let store = Arc::new(MemoryStore::with_faults(MemoryFaults {
            fail_appends: true,
            ..Default::default()
        }));
        let engine = engine_with(store.clone());

        let update = engine.process("u1", "ceo", "whatever", Utc::now()).await;
        assert!(update.persisted);
        assert_eq!(store.get("u1", "ceo").await.unwrap().unwrap().score(), 0);
    }

    #[tokio::test]
    async fn test_status_sorted_by_score() {
        let store = Arc::new(MemoryStore::new());
        let now = Utc::now();
        store.insert(RelationshipRecord::restore("u1", "ceo", 12, 3, Some(now - Duration::days(2))));
        store.insert(RelationshipRecord::restore("u1", "cto", 48, 9, Some(now)));
        store.insert(RelationshipRecord::restore("u2", "cfo", 90, 40, Some(now)));
        let engine = engine_with(store);

        let status = engine.status("u1", now).await.unwrap();
        assert_eq!(status.len(), 2);
        assert_eq!(status[0].persona_id, "cto");
        assert_eq!(status[0].stage, Stage::CloseFriend);
        assert_eq!(status[1].days_inactive, 2);
    }

    #[tokio::test]
    async fn test_custom_decay_settings() {
        let store = Arc::new(MemoryStore::new());
        let now = Utc::now();
        store.insert(RelationshipRecord::restore("u1", "ceo", 50, 3, Some(now - Duration::days(3))));
        let settings = RelationshipSettings {
            decay_per_day: 5,
            max_decay: 12,
            ..Default::default()
        };
        let engine = RelationshipEngine::new(store, settings);

        let update = engine.process("u1", "ceo", "hi", now).await;
        assert_eq!(update.decay, 12);
        assert_eq!(update.record.score(), 40);
    }
}
