//! Control plane. Handles one inbound message end to end.
//!
//! route persona → detect commands → update relationship → `Turn`
//!
//! Everything except the relationship store is immutable after startup.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::command::{Command, RuleTable, TextCommandMatcher};
use crate::config::{StorageBackend, SwitchboardConfig};
use crate::error::Result;
use crate::persona::{DomainRouter, PersonaCatalog, RouteDecision};
use crate::relationship::{
    JsonFileStore, MemoryStore, RelationshipEngine, RelationshipStore, RelationshipUpdate, Stage,
};

/// A message as received from the transport layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub user_id: String,
    pub text: String,
    /// Explicitly requested persona id, if any.
    #[serde(default)]
    pub persona: Option<String>,
}

/// Relationship state handed to prompt composition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationshipSnapshot {
    pub score: u8,
    pub stage: Stage,
    pub interaction_count: u64,
    pub delta: i32,
    pub reason: String,
    pub decay: u32,
    pub persisted: bool,
}

impl From<&RelationshipUpdate> for RelationshipSnapshot {
    fn from(update: &RelationshipUpdate) -> Self {
        Self {
            score: update.record.score(),
            stage: update.record.stage(),
            interaction_count: update.record.interaction_count(),
            delta: update.sentiment.delta,
            reason: update.sentiment.reason.label().to_string(),
            decay: update.decay,
            persisted: update.persisted,
        }
    }
}

/// Everything downstream needs to answer one message.
#[derive(Debug, Clone, Serialize)]
pub struct Turn {
    pub persona_id: String,
    pub persona_name: String,
    pub route: RouteDecision,
    pub relationship: RelationshipSnapshot,
    /// Persona hint from the intent table. Advisory; routing is not changed.
    pub intent: Option<Command>,
    /// Theme/mode command.
    pub command: Option<Command>,
}

/// Wires catalog, router, matchers and relationship engine together.
pub struct ControlPlane {
    catalog: Arc<PersonaCatalog>,
    router: DomainRouter,
    intents: TextCommandMatcher,
    themes: TextCommandMatcher,
    relationships: RelationshipEngine,
}

impl ControlPlane {
    pub fn new(catalog: Arc<PersonaCatalog>, themes: RuleTable, relationships: RelationshipEngine) -> Self {
        let intents = TextCommandMatcher::new(RuleTable::intents(&catalog));
        Self {
            router: DomainRouter::new(catalog.clone()),
            catalog,
            intents,
            themes: TextCommandMatcher::new(themes),
            relationships,
        }
    }

    /// Build from configuration: catalog, bundled theme table and the configured store.
    pub fn from_config(config: &SwitchboardConfig) -> Result<Self> {
        let catalog = Arc::new(PersonaCatalog::load(&config.catalog)?);
        let store = open_store(config);
        let engine = RelationshipEngine::new(store, config.relationship.clone());
        Ok(Self::new(catalog, RuleTable::themes()?, engine))
    }

    pub fn catalog(&self) -> &PersonaCatalog {
        &self.catalog
    }

    pub fn router(&self) -> &DomainRouter {
        &self.router
    }

    pub fn intents(&self) -> &TextCommandMatcher {
        &self.intents
    }

    pub fn themes(&self) -> &TextCommandMatcher {
        &self.themes
    }

    pub fn relationships(&self) -> &RelationshipEngine {
        &self.relationships
    }

    /// Process one message at time `now`.
    pub async fn handle(&self, message: &InboundMessage, now: DateTime<Utc>) -> Turn {
        let route = self.router.route(&message.text, message.persona.as_deref());
        let persona_name = self
            .catalog
            .get(&route.persona_id)
            .map(|p| p.name.clone())
            .unwrap_or_default();

        let intent = self.intents.detect(&message.text);
        let command = self.themes.detect(&message.text);
        if intent.is_some() || command.is_some() {
            debug!(intent = ?intent, command = ?command, "Commands detected");
        }

        let update = self
            .relationships
            .process(&message.user_id, &route.persona_id, &message.text, now)
            .await;

        info!(
            user = %message.user_id,
            persona = %route.persona_id,
            reason = %route.reason,
            score = update.record.score(),
            "Turn handled"
        );

        Turn {
            persona_id: route.persona_id.clone(),
            persona_name,
            relationship: RelationshipSnapshot::from(&update),
            route,
            intent,
            command,
        }
    }
}

/// Open the store selected by `[storage]`.
pub fn open_store(config: &SwitchboardConfig) -> Arc<dyn RelationshipStore> {
    match config.storage.backend {
        StorageBackend::Memory => Arc::new(MemoryStore::new()),
        StorageBackend::Json => Arc::new(JsonFileStore::new(config.relationship_file())),
    }
}
