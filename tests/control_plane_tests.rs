//! End-to-end tests of the control plane over the public API

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use tempfile::TempDir;

use switchboard::command::{CommandKind, RuleTable};
use switchboard::config::{RelationshipSettings, StorageBackend};
use switchboard::persona::{PersonaCatalog, RouteReason};
use switchboard::relationship::{
    JsonFileStore, MemoryFaults, MemoryStore, RelationshipEngine, RelationshipStore, Stage,
};
use switchboard::{ControlPlane, InboundMessage, SwitchboardConfig};

fn message(user: &str, text: &str, persona: Option<&str>) -> InboundMessage {
    InboundMessage {
        user_id: user.to_string(),
        text: text.to_string(),
        persona: persona.map(str::to_string),
    }
}

fn plane_with(store: Arc<dyn RelationshipStore>, settings: RelationshipSettings) -> ControlPlane {
    let catalog = Arc::new(PersonaCatalog::bundled().unwrap());
    ControlPlane::new(
        catalog,
        RuleTable::themes().unwrap(),
        RelationshipEngine::new(store, settings),
    )
}

fn json_config(dir: &TempDir) -> SwitchboardConfig {
    let mut config = SwitchboardConfig::default();
    config.storage.backend = StorageBackend::Json;
    config.storage.data_dir = dir.path().to_string_lossy().into_owned();
    config
}

#[tokio::test]
async fn test_scores_survive_restart_and_decay() {
    let dir = TempDir::new().unwrap();
    let config = json_config(&dir);
    let monday = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();

    {
        let plane = ControlPlane::from_config(&config).unwrap();
        for _ in 0..5 {
            let turn = plane
                .handle(&message("dana", "our brand is amazing", Some("cmo")), monday)
                .await;
            assert!(turn.relationship.persisted);
        }
    }

    // Same data directory, new process
    let plane = ControlPlane::from_config(&config).unwrap();
    let turn = plane
        .handle(&message("dana", "brand check-in", Some("cmo")), monday + Duration::days(3))
        .await;

    // 5 x +3, then 3 days of decay (-6) and a neutral +2
    assert_eq!(turn.relationship.decay, 6);
    assert_eq!(turn.relationship.score, 11);
    assert_eq!(turn.relationship.stage, Stage::Acquaintance);
    assert_eq!(turn.relationship.interaction_count, 6);

    let history = plane.relationships().history("dana").await.unwrap();
    // Compliments (+3) exceed the threshold, and so does the decayed turn
    assert_eq!(history.len(), 6);
    assert_eq!(history.last().unwrap().decay_applied, 6);
}

#[tokio::test]
async fn test_users_and_personas_are_independent() {
    let plane = plane_with(Arc::new(MemoryStore::new()), RelationshipSettings::default());
    let now = Utc::now();

    plane.handle(&message("u1", "our brand reach", None), now).await;
    plane.handle(&message("u1", "ebitda margin", None), now).await;
    plane.handle(&message("u2", "ebitda margin", None), now).await;

    let u1 = plane.relationships().status("u1", now).await.unwrap();
    let ids: Vec<&str> = u1.iter().map(|s| s.persona_id.as_str()).collect();
    assert_eq!(ids, vec!["cfo", "cmo"]);

    let u2 = plane.relationships().status("u2", now).await.unwrap();
    assert_eq!(u2.len(), 1);
    assert_eq!(u2[0].interaction_count, 1);
}

#[tokio::test]
async fn test_rejected_persona_is_not_scored() {
    let store = Arc::new(MemoryStore::new());
    let plane = plane_with(store.clone(), RelationshipSettings::default());
    let now = Utc::now();

    let turn = plane
        .handle(&message("u1", "plan the merger with the board", Some("cfo")), now)
        .await;

    assert_eq!(turn.persona_id, "ceo");
    assert_eq!(turn.route.reason, RouteReason::Redirected { from: "cfo".into() });
    assert!(store.get("u1", "cfo").await.unwrap().is_none());
    assert!(store.get("u1", "ceo").await.unwrap().is_some());
}

#[tokio::test]
async fn test_store_outage_does_not_fail_turn() {
    let store = Arc::new(MemoryStore::with_faults(MemoryFaults {
        fail_reads: true,
        fail_writes: true,
        ..Default::default()
    }));
    let plane = plane_with(store.clone(), RelationshipSettings::default());

    let turn = plane
        .handle(&message("u1", "switch to dark mode", None), Utc::now())
        .await;

    assert!(!turn.relationship.persisted);
    assert_eq!(turn.relationship.score, 2);
    assert_eq!(turn.command.unwrap().kind, CommandKind::SwitchCategory);
    assert_eq!(store.event_count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_messages_are_all_counted() {
    let dir = TempDir::new().unwrap();
    let store: Arc<dyn RelationshipStore> =
        Arc::new(JsonFileStore::new(dir.path().join("relationships.json")));
    let settings = RelationshipSettings {
        max_update_attempts: 100,
        ..Default::default()
    };
    let plane = Arc::new(plane_with(store.clone(), settings));
    let now = Utc::now();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let plane = plane.clone();
        handles.push(tokio::spawn(async move {
            plane.handle(&message("u1", "hello", Some("ceo")), now).await
        }));
    }
    for handle in handles {
        assert!(handle.await.unwrap().relationship.persisted);
    }

    let record = store.get("u1", "ceo").await.unwrap().unwrap();
    assert_eq!(record.interaction_count(), 8);
    assert_eq!(record.score(), 16);
}

#[tokio::test]
async fn test_intent_is_advisory() {
    let plane = plane_with(Arc::new(MemoryStore::new()), RelationshipSettings::default());

    let turn = plane
        .handle(&message("u1", "can I talk to finance about the mission", None), Utc::now())
        .await;

    // "mission" routes to the CEO even though the intent names the CFO
    assert_eq!(turn.persona_id, "ceo");
    let intent = turn.intent.unwrap();
    assert_eq!(intent.kind, CommandKind::SwitchCategory);
    assert_eq!(intent.target.as_deref(), Some("cfo"));
}
