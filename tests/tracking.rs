// Integration tests for the encounter store, preference store and the
// two-step selection flow.

use std::sync::Arc;
use std::time::Duration;

use huntlog_backend::catalog::{CatalogClient, MonsterRecord};
use huntlog_backend::db::{Database, SizeTier};
use huntlog_backend::flow::{BeginOutcome, CommitOutcome, FlowError, SelectionFlow};
use huntlog_backend::language::Language;
use huntlog_backend::render;
use huntlog_backend::session::SessionStore;

async fn test_db() -> Arc<Database> {
    Arc::new(Database::new("sqlite::memory:").await.unwrap())
}

/// Catalog client pointing at a port nothing listens on, for tests that
/// must not depend on the network. Fetches fail fast with a transport
/// error.
fn unreachable_catalog() -> CatalogClient {
    CatalogClient::new(
        "http://127.0.0.1:9/monsters".to_string(),
        "http://127.0.0.1:9".to_string(),
    )
}

fn test_flow(db: Arc<Database>, sessions: SessionStore) -> SelectionFlow {
    SelectionFlow::new(db, unreachable_catalog(), sessions, 25)
}

/// Serve a fixed catalog body from an ephemeral local port and return the
/// endpoint URL, so `begin` can be exercised end to end.
async fn serve_catalog(body: &str) -> String {
    let body = body.to_string();
    let app = axum::Router::new().route(
        "/monsters",
        axum::routing::get(move || {
            let body = body.clone();
            async move { body }
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/monsters")
}

fn stub_catalog_client(url: &str) -> CatalogClient {
    CatalogClient::new(url.to_string(), "http://127.0.0.1:9".to_string())
}

// ── Encounter store ──────────────────────────────────────────────────

#[tokio::test]
async fn test_record_encounter_is_idempotent() {
    let db = test_db().await;

    assert!(db
        .record_encounter("u1", "zinogre", SizeTier::Largest)
        .await
        .unwrap());
    // Second write is a no-op
    assert!(!db
        .record_encounter("u1", "zinogre", SizeTier::Largest)
        .await
        .unwrap());

    let encounters = db.list_encounters("u1").await.unwrap();
    assert_eq!(encounters.len(), 1);
}

#[tokio::test]
async fn test_record_encounter_is_case_insensitive() {
    let db = test_db().await;

    assert!(db
        .record_encounter("u1", "Rathalos", SizeTier::Largest)
        .await
        .unwrap());
    assert!(!db
        .record_encounter("u1", "rathalos", SizeTier::Largest)
        .await
        .unwrap());

    let encounters = db.list_encounters("u1").await.unwrap();
    assert_eq!(encounters.len(), 1);
    assert_eq!(encounters[0].monster_name, "rathalos");
}

#[tokio::test]
async fn test_same_monster_at_both_sizes_is_two_rows() {
    let db = test_db().await;

    assert!(db
        .record_encounter("u1", "rathalos", SizeTier::Smallest)
        .await
        .unwrap());
    assert!(db
        .record_encounter("u1", "rathalos", SizeTier::Largest)
        .await
        .unwrap());

    assert_eq!(db.list_encounters("u1").await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_encounters_are_scoped_per_user() {
    let db = test_db().await;

    db.record_encounter("u1", "zinogre", SizeTier::Largest)
        .await
        .unwrap();

    assert!(db.list_encounters("u2").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_tracked_names_filter_by_size() {
    let db = test_db().await;

    db.record_encounter("u1", "Zinogre", SizeTier::Largest)
        .await
        .unwrap();
    db.record_encounter("u1", "Rathalos", SizeTier::Smallest)
        .await
        .unwrap();

    let largest = db
        .tracked_names_for_size("u1", SizeTier::Largest)
        .await
        .unwrap();
    assert_eq!(largest, vec!["zinogre"]);

    let smallest = db
        .tracked_names_for_size("u1", SizeTier::Smallest)
        .await
        .unwrap();
    assert_eq!(smallest, vec!["rathalos"]);
}

// ── Preference store ─────────────────────────────────────────────────

#[tokio::test]
async fn test_language_defaults_to_english() {
    let db = test_db().await;
    assert_eq!(db.get_language("new-user").await.unwrap(), Language::En);
}

#[tokio::test]
async fn test_set_language_upserts() {
    let db = test_db().await;

    db.set_language("u1", Language::ZhHant).await.unwrap();
    assert_eq!(db.get_language("u1").await.unwrap(), Language::ZhHant);

    // Overwrite back, idempotently
    db.set_language("u1", Language::En).await.unwrap();
    db.set_language("u1", Language::En).await.unwrap();
    assert_eq!(db.get_language("u1").await.unwrap(), Language::En);
}

// ── Selection flow ───────────────────────────────────────────────────

#[tokio::test]
async fn test_commit_without_size_selection_is_rejected() {
    let db = test_db().await;
    let flow = test_flow(db.clone(), SessionStore::new(Duration::from_secs(60)));

    let result = flow.commit("u1", "Zinogre").await;
    assert!(matches!(result, Err(FlowError::NoSizeSelected)));

    // No encounter may be written on a rejected commit
    assert!(db.list_encounters("u1").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_commit_records_and_clears_pending_state() {
    let db = test_db().await;
    let sessions = SessionStore::new(Duration::from_secs(60));
    let flow = test_flow(db.clone(), sessions.clone());

    sessions.put_size("u1", SizeTier::Largest);
    let outcome = flow.commit("u1", "Zinogre").await.unwrap();
    assert_eq!(
        outcome,
        CommitOutcome::Recorded {
            monster: "zinogre".to_string(),
            size: SizeTier::Largest,
        }
    );

    // Pending entry is consumed; a second commit needs a fresh size step
    assert!(matches!(
        flow.commit("u1", "Rathalos").await,
        Err(FlowError::NoSizeSelected)
    ));

    let encounters = db.list_encounters("u1").await.unwrap();
    assert_eq!(encounters.len(), 1);
    assert_eq!(encounters[0].monster_name, "zinogre");
    assert_eq!(encounters[0].size, "largest");
}

#[tokio::test]
async fn test_commit_reports_duplicates() {
    let db = test_db().await;
    let sessions = SessionStore::new(Duration::from_secs(60));
    let flow = test_flow(db.clone(), sessions.clone());

    sessions.put_size("u1", SizeTier::Largest);
    flow.commit("u1", "zinogre").await.unwrap();

    sessions.put_size("u1", SizeTier::Largest);
    let outcome = flow.commit("u1", "Zinogre").await.unwrap();
    assert_eq!(
        outcome,
        CommitOutcome::AlreadyTracked {
            monster: "zinogre".to_string(),
            size: SizeTier::Largest,
        }
    );

    assert_eq!(db.list_encounters("u1").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_storage_error_keeps_pending_selection() {
    let db = test_db().await;
    let sessions = SessionStore::new(Duration::from_secs(60));
    let flow = test_flow(db.clone(), sessions.clone());

    sessions.put_size("u1", SizeTier::Largest);
    db.close().await;

    let result = flow.commit("u1", "Zinogre").await;
    assert!(matches!(result, Err(FlowError::Storage(_))));

    // The size choice survives the fault, so the user's retry does not
    // get bounced back to the start of the flow
    assert_eq!(sessions.peek_size("u1"), Some(SizeTier::Largest));
}

#[tokio::test]
async fn test_begin_offers_untracked_monsters() {
    let db = test_db().await;
    let sessions = SessionStore::new(Duration::from_secs(60));
    let url = serve_catalog(
        r#"[{"name": "Rathalos"}, {"name": "Zinogre"}, {"name": "Nergigante"}]"#,
    )
    .await;
    let flow = SelectionFlow::new(db.clone(), stub_catalog_client(&url), sessions.clone(), 25);

    db.record_encounter("u1", "Zinogre", SizeTier::Largest)
        .await
        .unwrap();

    let outcome = flow.begin("u1", SizeTier::Largest).await.unwrap();
    assert_eq!(
        outcome,
        BeginOutcome::Menu {
            options: vec!["Rathalos".to_string(), "Nergigante".to_string()],
            truncated: false,
        }
    );
    assert_eq!(sessions.peek_size("u1"), Some(SizeTier::Largest));
}

#[tokio::test]
async fn test_begin_reports_all_tracked() {
    let db = test_db().await;
    let sessions = SessionStore::new(Duration::from_secs(60));
    let url = serve_catalog(r#"[{"name": "Rathalos"}]"#).await;
    let flow = SelectionFlow::new(db.clone(), stub_catalog_client(&url), sessions, 25);

    db.record_encounter("u1", "rathalos", SizeTier::Largest)
        .await
        .unwrap();

    let outcome = flow.begin("u1", SizeTier::Largest).await.unwrap();
    assert_eq!(outcome, BeginOutcome::AllTracked);
}

#[tokio::test]
async fn test_begin_truncates_at_menu_cap() {
    let db = test_db().await;
    let sessions = SessionStore::new(Duration::from_secs(60));
    let url = serve_catalog(
        r#"[{"name": "A"}, {"name": "B"}, {"name": "C"}, {"name": "D"}, {"name": "E"}]"#,
    )
    .await;
    let flow = SelectionFlow::new(db.clone(), stub_catalog_client(&url), sessions, 3);

    let outcome = flow.begin("u1", SizeTier::Smallest).await.unwrap();
    match outcome {
        BeginOutcome::Menu { options, truncated } => {
            assert!(truncated);
            assert_eq!(options, vec!["A", "B", "C"]);
        }
        other => panic!("expected a truncated menu, got {other:?}"),
    }
}

#[tokio::test]
async fn test_full_flow_from_size_to_progress() {
    let db = test_db().await;
    let sessions = SessionStore::new(Duration::from_secs(60));
    let url = serve_catalog(r#"[{"name": "Zinogre"}, {"name": "Rathalos"}]"#).await;
    let flow = SelectionFlow::new(db.clone(), stub_catalog_client(&url), sessions.clone(), 25);

    let outcome = flow.begin("u1", SizeTier::Largest).await.unwrap();
    assert!(matches!(outcome, BeginOutcome::Menu { .. }));

    let outcome = flow.commit("u1", "Zinogre").await.unwrap();
    assert_eq!(
        outcome,
        CommitOutcome::Recorded {
            monster: "zinogre".to_string(),
            size: SizeTier::Largest,
        }
    );
    assert_eq!(sessions.peek_size("u1"), None);

    let encounters = db.list_encounters("u1").await.unwrap();
    assert_eq!(encounters.len(), 1);
    assert_eq!(encounters[0].monster_name, "zinogre");
    assert_eq!(encounters[0].size, "largest");

    // The next size step no longer offers the tracked monster
    let outcome = flow.begin("u1", SizeTier::Largest).await.unwrap();
    assert_eq!(
        outcome,
        BeginOutcome::Menu {
            options: vec!["Rathalos".to_string()],
            truncated: false,
        }
    );
}

#[tokio::test]
async fn test_begin_surfaces_catalog_failure() {
    let db = test_db().await;
    let sessions = SessionStore::new(Duration::from_secs(60));
    let flow = test_flow(db.clone(), sessions.clone());

    let result = flow.begin("u1", SizeTier::Largest).await;
    assert!(matches!(result, Err(FlowError::Catalog(_))));

    // A failed size step leaves no pending selection behind
    assert!(matches!(
        flow.commit("u1", "Zinogre").await,
        Err(FlowError::NoSizeSelected)
    ));
}

// ── Missing-set arithmetic against stored encounters ─────────────────

#[tokio::test]
async fn test_missing_report_from_stored_encounters() {
    let db = test_db().await;
    db.record_encounter("u1", "A", SizeTier::Smallest)
        .await
        .unwrap();

    let catalog: Vec<MonsterRecord> = ["A", "B", "C"]
        .iter()
        .map(|n| MonsterRecord {
            name: (*n).to_string(),
        })
        .collect();

    let encounters = db.list_encounters("u1").await.unwrap();
    let reports = render::missing_by_size(&catalog, &encounters);

    assert_eq!(reports[0].size, SizeTier::Smallest);
    assert_eq!(reports[0].missing, vec!["B", "C"]);
    assert_eq!(reports[0].percent_complete, 33);

    assert_eq!(reports[1].size, SizeTier::Largest);
    assert_eq!(reports[1].missing.len(), 3);
    assert_eq!(reports[1].percent_complete, 0);
}
