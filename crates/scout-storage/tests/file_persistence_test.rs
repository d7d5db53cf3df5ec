//! File-backed persistence: restart survival, WAL mode, migration idempotence,
//! read pool visibility.

use chrono::Utc;
use scout_core::models::*;
use scout_core::traits::IResearchStorage;
use scout_storage::migrations::{self, LATEST_VERSION};
use scout_storage::pool::pragmas::verify_wal_mode;
use scout_storage::StorageEngine;

#[test]
fn schema_is_at_latest_version_and_wal_is_on() {
    let dir = tempfile::tempdir().unwrap();
    let store = StorageEngine::open(&dir.path().join("scout.db")).unwrap();
    assert_eq!(store.schema_version().unwrap(), LATEST_VERSION);
    let wal = store.pool().writer.with_conn(verify_wal_mode).unwrap();
    assert!(wal);
}

#[test]
fn migrations_are_idempotent_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scout.db");
    drop(StorageEngine::open(&path).unwrap());
    let store = StorageEngine::open(&path).unwrap();
    let applied = store
        .pool()
        .writer
        .with_conn(migrations::run_migrations)
        .unwrap();
    assert_eq!(applied, 0);
    assert_eq!(store.schema_version().unwrap(), LATEST_VERSION);
}

#[test]
fn task_survives_restart_and_orphan_is_recovered() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scout.db");

    let id = {
        let store = StorageEngine::open(&path).unwrap();
        let mut task = ResearchTask::from_request(&ResearchRequest::new(
            "why does serde skip this field",
            ResearchDepth::Medium,
            TriggerSource::Oracle,
        ));
        task.status = TaskStatus::Running;
        task.started_at = Some(Utc::now());
        store.insert_task(&task).unwrap();
        task.id
    };

    let store = StorageEngine::open(&path).unwrap();
    assert_eq!(
        store.get_task(&id).unwrap().unwrap().status,
        TaskStatus::Running
    );
    assert_eq!(store.recover_running_tasks("restarted").unwrap(), 1);
    let task = store.get_task(&id).unwrap().unwrap();
    assert_eq!(task.status, TaskStatus::Failed);
    assert!(task.completed_at.is_some());
}

#[test]
fn read_pool_sees_committed_writes() {
    let dir = tempfile::tempdir().unwrap();
    let store = StorageEngine::open(&dir.path().join("scout.db")).unwrap();
    for i in 0..8 {
        store
            .record_citation(&format!("site{i}.dev"), "rust", 1.0)
            .unwrap();
    }
    // Round-robin over every reader.
    for _ in 0..8 {
        assert_eq!(store.top_sources("rust", 20).unwrap().len(), 8);
    }
}
