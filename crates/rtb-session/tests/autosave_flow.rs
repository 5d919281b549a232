//! Debounce, coalescing and failure behaviour of autosave through a session

use pretty_assertions::assert_eq;
use rtb_session::prelude::*;
use rtb_session::PersistenceError;
use rtb_test_utils::{sales_template, Harness};
use std::time::Duration;

fn rename(session: &EditorSession, name: impl Into<String>) {
    session.update_metadata(MetadataPatch::new().with_name(name));
}

#[tokio::test(start_paused = true)]
async fn burst_of_edits_produces_one_save() {
    let harness = Harness::new();
    let (session, id) = harness
        .edit_session(sales_template(), SessionConfig::default())
        .await;

    for i in 0..5 {
        rename(&session, format!("edit {i}"));
        if i < 4 {
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
    }
    assert_eq!(session.save_status(), SaveStatus::Scheduled);

    // last edit at t=800ms; nothing before t=2800ms
    tokio::time::sleep(Duration::from_millis(1999)).await;
    assert_eq!(harness.repository.save_count(), 0);

    tokio::time::sleep(Duration::from_millis(2)).await;
    session.settled().await;
    assert_eq!(harness.repository.save_count(), 1);
    assert_eq!(harness.repository.stored(&id).unwrap().name, "edit 4");
    assert_eq!(session.save_status(), SaveStatus::Idle);
}

#[tokio::test(start_paused = true)]
async fn edits_during_a_save_coalesce_into_one_follow_up() {
    let harness = Harness::new().with_save_latency(Duration::from_millis(1000));
    let config = SessionConfig::default().with_debounce_ms(100);
    let (session, id) = harness.edit_session(sales_template(), config).await;

    rename(&session, "edit 1");
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(session.save_status(), SaveStatus::Saving);

    rename(&session, "edit 2");
    tokio::time::sleep(Duration::from_millis(150)).await;
    rename(&session, "edit 3");
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(session.save_status(), SaveStatus::Saving);
    assert_eq!(harness.repository.save_count(), 1);

    session.settled().await;
    assert_eq!(harness.repository.save_count(), 2);
    assert_eq!(harness.repository.max_in_flight(), 1);
    assert!(session.last_save_error().is_none());

    let names: Vec<_> = harness
        .repository
        .history()
        .into_iter()
        .map(|t| t.name)
        .collect();
    assert_eq!(names, vec!["edit 1", "edit 3"]);
    assert_eq!(harness.repository.stored(&id).unwrap().name, "edit 3");
}

#[tokio::test(start_paused = true)]
async fn manual_save_queues_behind_running_save() {
    let harness = Harness::new().with_save_latency(Duration::from_millis(500));
    let config = SessionConfig::default().with_debounce_ms(100);
    let (session, id) = harness.edit_session(sales_template(), config).await;

    rename(&session, "autosaved");
    tokio::time::sleep(Duration::from_millis(120)).await;
    assert_eq!(session.save_status(), SaveStatus::Saving);

    rename(&session, "manual");
    let receipt = session.save_now().await.unwrap();

    assert_eq!(harness.repository.save_count(), 2);
    assert_eq!(harness.repository.max_in_flight(), 1);
    let stored = harness.repository.stored(&id).unwrap();
    assert_eq!(stored.name, "manual");
    assert_eq!(stored.updated_at, Some(receipt.updated_at));
    assert_eq!(session.snapshot().updated_at, Some(receipt.updated_at));
}

#[tokio::test(start_paused = true)]
async fn edit_during_first_save_of_new_template_is_autosaved() {
    let harness = Harness::new().with_save_latency(Duration::from_millis(500));
    let session = harness.create_session(SessionConfig::default()).await;
    session
        .load_template(sales_template())
        .expect("valid template");
    rename(&session, "v1");

    let edit = async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        rename(&session, "v2 typed during save");
    };
    let (receipt, ()) = futures::join!(session.save_now(), edit);
    let receipt = receipt.unwrap();

    assert_eq!(harness.repository.stored(&receipt.id).unwrap().name, "v1");
    assert_eq!(session.save_status(), SaveStatus::Scheduled);

    session.settled().await;
    assert_eq!(session.save_status(), SaveStatus::Idle);
    assert_eq!(harness.repository.save_count(), 2);
    assert_eq!(harness.repository.len(), 1);
    assert_eq!(
        harness.repository.stored(&receipt.id).unwrap().name,
        "v2 typed during save"
    );
}

#[tokio::test(start_paused = true)]
async fn concurrent_manual_saves_never_overlap() {
    let harness = Harness::new().with_save_latency(Duration::from_millis(300));
    let session = harness.create_session(SessionConfig::default()).await;
    session
        .load_template(sales_template())
        .expect("valid template");

    let (first, second) = futures::join!(session.save_now(), session.save_now());
    let (first, second) = (first.unwrap(), second.unwrap());

    // the queued save picked up the id assigned by the first one
    assert_eq!(first.id, second.id);
    assert!(second.updated_at > first.updated_at);
    assert_eq!(harness.repository.len(), 1);
    assert_eq!(harness.repository.max_in_flight(), 1);
}

#[tokio::test(start_paused = true)]
async fn failure_keeps_edits_and_waits_for_next_trigger() {
    let harness = Harness::new();
    let config = SessionConfig::default().with_debounce_ms(100);
    let (session, id) = harness.edit_session(sales_template(), config).await;
    harness
        .repository
        .fail_next(PersistenceError::Unavailable("timeout".into()));

    rename(&session, "offline edit");
    tokio::time::sleep(Duration::from_millis(150)).await;
    session.settled().await;

    assert_eq!(session.save_status(), SaveStatus::Error);
    assert_eq!(session.snapshot().name, "offline edit");
    assert_eq!(harness.repository.stored(&id).unwrap().name, "Sales");

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(harness.repository.save_count(), 1);

    let receipt = session.save_now().await.unwrap();
    assert_eq!(receipt.id, id);
    assert_eq!(session.save_status(), SaveStatus::Idle);
    assert_eq!(harness.repository.stored(&id).unwrap().name, "offline edit");
}

#[tokio::test(start_paused = true)]
async fn concurrent_edit_surfaces_version_conflict() {
    let harness = Harness::new();
    let (session, id) = harness
        .edit_session(sales_template(), SessionConfig::default())
        .await;
    assert!(harness.repository.touch(&id));

    rename(&session, "mine");
    tokio::time::sleep(Duration::from_millis(2100)).await;
    session.settled().await;

    let error = session.last_save_error().unwrap();
    assert_eq!(error.code(), "VERSION_CONFLICT");
    assert!(!error.is_retryable());
    assert_eq!(session.save_status(), SaveStatus::Error);
    assert_eq!(session.snapshot().name, "mine");
}

#[tokio::test(start_paused = true)]
async fn loading_another_template_supersedes_queued_save() {
    let harness = Harness::new().with_save_latency(Duration::from_millis(500));
    let config = SessionConfig::default().with_debounce_ms(100);
    let (session, _) = harness.edit_session(sales_template(), config).await;

    rename(&session, "before switch");
    tokio::time::sleep(Duration::from_millis(120)).await;
    assert_eq!(session.save_status(), SaveStatus::Saving);

    let (queued, ()) = futures::join!(session.save_now(), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        session.load_prebuilt("task-status").unwrap();
    });
    assert!(matches!(
        queued,
        Err(SessionError::Persistence(PersistenceError::Superseded))
    ));

    session.settled().await;
    // the running save finished but its receipt belongs to the old template
    assert!(!session.is_persisted());
    assert_eq!(harness.repository.save_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn status_walks_through_scheduled_and_saving() {
    let harness = Harness::new().with_save_latency(Duration::from_millis(50));
    let config = SessionConfig::default().with_debounce_ms(100);
    let (session, _) = harness.edit_session(sales_template(), config).await;
    let mut status = session.subscribe_save_status();

    rename(&session, "watched");
    let mut seen = vec![*status.borrow_and_update()];
    while seen.last() != Some(&SaveStatus::Idle) {
        status.changed().await.unwrap();
        seen.push(*status.borrow_and_update());
    }
    assert_eq!(
        seen,
        vec![SaveStatus::Scheduled, SaveStatus::Saving, SaveStatus::Idle]
    );
}

#[tokio::test(start_paused = true)]
async fn disabled_autosave_only_saves_on_demand() {
    let harness = Harness::new();
    let config = SessionConfig::default().with_autosave(false);
    let (session, _) = harness.edit_session(sales_template(), config).await;

    rename(&session, "quiet");
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(harness.repository.save_count(), 0);
    assert_eq!(session.save_status(), SaveStatus::Idle);

    session.save_now().await.unwrap();
    assert_eq!(harness.repository.save_count(), 1);
}
