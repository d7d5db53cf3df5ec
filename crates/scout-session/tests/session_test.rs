use std::sync::Arc;

use chrono::{Duration, Utc};
use proptest::prelude::*;

use scout_core::config::SessionConfig;
use scout_core::models::PendingInjection;
use scout_core::traits::IResearchStorage;
use scout_session::focus::FocusTracker;
use scout_session::{sweep_inactive, ErrorKind, SessionManager, ToolUseEvent};
use scout_storage::StorageEngine;

fn edit(session: &str, path: &str) -> ToolUseEvent {
    ToolUseEvent {
        session_id: session.to_string(),
        tool_name: "Edit".to_string(),
        input: serde_json::json!({ "file_path": path }),
        output: "ok".to_string(),
        is_error: false,
        project_path: Some("/work/app".to_string()),
    }
}

fn bash(session: &str, command: &str, output: &str, is_error: bool) -> ToolUseEvent {
    ToolUseEvent {
        session_id: session.to_string(),
        tool_name: "Bash".to_string(),
        input: serde_json::json!({ "command": command }),
        output: output.to_string(),
        is_error,
        project_path: None,
    }
}

fn pending(query: &str, priority: u8, offset_ms: i64) -> PendingInjection {
    PendingInjection {
        query: query.to_string(),
        summary: format!("summary of {query}"),
        relevance: 0.8,
        priority,
        queued_at: Utc::now() + Duration::milliseconds(offset_ms),
        pivot: None,
        finding_id: None,
        task_id: None,
        sources: vec![],
    }
}

// ── Focus & stuck ──

#[test]
fn eight_edits_to_one_file_is_stuck() {
    let manager = SessionManager::default();
    for _ in 0..7 {
        manager.add_tool_use(&edit("s1", "src/auth/auth.ts"));
    }
    assert!(!manager.is_stuck("s1"));

    manager.add_tool_use(&edit("s1", "src/auth/auth.ts"));
    let indicator = manager.stuck_indicator("s1").unwrap();
    assert!(indicator.is_stuck);
    assert_eq!(indicator.focus_area.as_deref(), Some("auth.ts"));
    assert_eq!(indicator.turns, 8);

    manager.add_tool_use(&edit("s1", "src/db/pool.ts"));
    assert!(!manager.is_stuck("s1"));
    let ctx = manager.snapshot("s1").unwrap();
    assert_eq!(ctx.focus.history().len(), 1);
    assert_eq!(ctx.focus.history()[0].turns, 8);
}

#[test]
fn unknown_session_is_not_stuck() {
    let manager = SessionManager::default();
    assert!(!manager.is_stuck("nope"));
    assert!(manager.stuck_indicator("nope").is_none());
}

// ── Window & extraction ──

#[test]
fn window_keeps_last_hundred_entries() {
    let manager = SessionManager::default();
    for i in 0..130 {
        manager.add_user_prompt("s1", &format!("prompt {i}"), None);
    }
    let ctx = manager.snapshot("s1").unwrap();
    assert_eq!(ctx.window.len(), 100);
    assert_eq!(ctx.window.front().unwrap().content, "prompt 30");
}

#[test]
fn tool_use_populates_context() {
    let manager = SessionManager::default();
    manager.add_user_prompt("s1", "Implement JWT login for the express api", Some("/work"));
    manager.add_tool_use(&bash(
        "s1",
        "npm test --prefix server",
        "TypeError: Cannot read properties of undefined (reading 'token')",
        true,
    ));

    let ctx = manager.snapshot("s1").unwrap();
    assert_eq!(ctx.project_path.as_deref(), Some("/work"));
    assert_eq!(
        ctx.current_task.as_deref(),
        Some("Implement JWT login for the express api")
    );
    assert!(ctx.topics.contains("authentication"));
    assert!(ctx.tech_stack.contains("express"));
    assert_eq!(ctx.recent_errors.len(), 1);
    assert_eq!(ctx.recent_errors[0].kind, ErrorKind::TypeError);
    assert_eq!(ctx.tool_uses_since_strategic, 1);
}

#[test]
fn long_output_is_truncated() {
    let manager = SessionManager::default();
    manager.add_tool_use(&bash("s1", "cat big.log", &"x".repeat(5_000), false));
    let ctx = manager.snapshot("s1").unwrap();
    let entry = ctx.latest_entry().unwrap();
    assert!(entry.truncated);
    assert_eq!(entry.content.len(), 2_000);
}

#[test]
fn new_task_pushes_previous_into_history() {
    let manager = SessionManager::default();
    manager.add_user_prompt("s1", "fix the login redirect", None);
    manager.add_user_prompt("s1", "add rate limiting to the api", None);
    let ctx = manager.snapshot("s1").unwrap();
    assert_eq!(ctx.current_task.as_deref(), Some("add rate limiting to the api"));
    assert_eq!(ctx.task_history.back().map(String::as_str), Some("fix the login redirect"));
}

#[test]
fn tool_use_description_sets_current_task() {
    let manager = SessionManager::default();
    manager.add_user_prompt("s1", "fix the login redirect", None);
    manager.add_tool_use(&ToolUseEvent {
        session_id: "s1".to_string(),
        tool_name: "Task".to_string(),
        input: serde_json::json!({ "description": "Add retry logic to the payment client" }),
        output: "started".to_string(),
        is_error: false,
        project_path: None,
    });
    let ctx = manager.snapshot("s1").unwrap();
    assert_eq!(ctx.current_task.as_deref(), Some("Add retry logic to the payment client"));
    assert_eq!(ctx.task_history.back().map(String::as_str), Some("fix the login redirect"));

    // Shell commands are not task descriptions.
    manager.add_tool_use(&bash("s1", "update-alternatives --set java", "ok", false));
    let ctx = manager.snapshot("s1").unwrap();
    assert_eq!(ctx.current_task.as_deref(), Some("Add retry logic to the payment client"));
}

#[test]
fn repeated_error_counts_retries_and_clean_run_resets() {
    let manager = SessionManager::default();
    let failing = bash("s1", "cargo build", "error[E0502]: cannot borrow `v` as mutable", true);
    manager.add_tool_use(&failing);
    assert_eq!(manager.snapshot("s1").unwrap().retries, 0);
    manager.add_tool_use(&failing);
    manager.add_tool_use(&failing);
    let ctx = manager.snapshot("s1").unwrap();
    assert_eq!(ctx.retries, 2);
    assert!(ctx.same_error_repeated());

    manager.add_tool_use(&bash("s1", "cargo build", "Finished dev profile", false));
    assert_eq!(manager.snapshot("s1").unwrap().retries, 0);
}

// ── Strategic ──

#[test]
fn strategic_analysis_after_fifteen_tool_uses() {
    let manager = SessionManager::default();
    for i in 0..14 {
        manager.add_tool_use(&edit("s1", &format!("src/f{i}.rs")));
    }
    assert!(!manager.should_trigger_strategic_analysis("s1"));
    manager.add_tool_use(&edit("s1", "src/f14.rs"));
    assert!(manager.should_trigger_strategic_analysis("s1"));

    manager.mark_strategic_analysis_performed("s1");
    assert!(!manager.should_trigger_strategic_analysis("s1"));
    assert_eq!(manager.snapshot("s1").unwrap().tool_uses_since_strategic, 0);
}

// ── Pending injections ──

#[test]
fn pop_returns_highest_priority_then_oldest() {
    let manager = SessionManager::default();
    manager.add_user_prompt("s1", "hello", None);
    assert!(manager.queue_injection("s1", pending("low", 3, 0)));
    assert!(manager.queue_injection("s1", pending("high-old", 8, 0)));
    assert!(manager.queue_injection("s1", pending("high-new", 8, 50)));
    assert_eq!(manager.pending_count("s1"), 3);

    assert_eq!(manager.pop_injection("s1").unwrap().query, "high-old");
    assert_eq!(manager.pop_injection("s1").unwrap().query, "high-new");
    assert_eq!(manager.pop_injection("s1").unwrap().query, "low");
    assert!(manager.pop_injection("s1").is_none());
}

#[test]
fn queue_to_unknown_session_is_refused() {
    let manager = SessionManager::default();
    assert!(!manager.queue_injection("ghost", pending("q", 5, 0)));
}

#[test]
fn research_history_marks_injected() {
    let manager = SessionManager::default();
    manager.add_user_prompt("s1", "hello", None);
    manager.record_research("s1", "react hooks rules", Some("t1"), 0.7);
    assert!(manager.mark_research_injected("s1", "t1"));
    assert!(!manager.mark_research_injected("s1", "t2"));
    let ctx = manager.snapshot("s1").unwrap();
    assert!(ctx.research_history[0].injected);
    assert_eq!(ctx.analytics.research_triggered, 1);
}

// ── Lifecycle ──

#[test]
fn ended_session_is_never_resurrected() {
    let store: Arc<dyn IResearchStorage> = Arc::new(StorageEngine::open_in_memory().unwrap());
    let manager = SessionManager::with_storage(SessionConfig::default(), store.clone());

    manager.add_user_prompt("s1", "fix the auth flow", None);
    manager.add_tool_use(&edit("s1", "src/auth.ts"));
    manager.persist("s1").unwrap();

    let ended = manager.end_session("s1").unwrap();
    assert!(ended.persisted.is_ok());
    assert_eq!(ended.context.window.len(), 2);
    assert!(!store.get_session("s1").unwrap().unwrap().active);

    manager.add_user_prompt("s1", "hello again", None);
    let fresh = manager.snapshot("s1").unwrap();
    assert_eq!(fresh.window.len(), 1);
    assert!(fresh.current_task.is_none());
    assert!(fresh.focus.current().is_none());
}

#[test]
fn sweep_ends_only_idle_sessions() {
    let manager = SessionManager::default();
    manager.add_user_prompt("old", "hello", None);
    manager.add_user_prompt("fresh", "hello", None);

    let swept = sweep_inactive(&manager, Utc::now() + Duration::minutes(30));
    assert!(swept.is_empty());

    let swept = sweep_inactive(&manager, Utc::now() + Duration::hours(2));
    assert_eq!(swept.len(), 2);
    assert_eq!(manager.session_count(), 0);
}

#[test]
fn idle_removal_rechecks_the_session() {
    let manager = SessionManager::default();
    manager.add_user_prompt("s1", "hello", None);
    let later = Utc::now() + Duration::hours(2);
    assert_eq!(manager.idle_sessions(later), vec!["s1".to_string()]);

    // Between the scan and the removal the session saw another event.
    manager.add_user_prompt("s1", "still here", None);
    assert!(manager.end_session_if_idle("s1", Utc::now()).is_none());
    assert_eq!(manager.session_count(), 1);
    assert_eq!(manager.snapshot("s1").unwrap().window.len(), 2);

    let ended = manager.end_session_if_idle("s1", later).unwrap();
    assert!(!ended.context.active);
    assert_eq!(manager.session_count(), 0);
}

// ── Properties ──

proptest! {
    #[test]
    fn focus_counter_is_monotonic_until_change(areas in prop::collection::vec(0u8..4, 1..60)) {
        let now = Utc::now();
        let mut tracker = FocusTracker::new();
        let mut previous: Option<u8> = None;
        let mut last_turns = 0u32;
        let mut changes = 0usize;

        for area in areas {
            let turns = tracker.observe(&format!("f{area}.rs"), 1_000, now);
            if previous == Some(area) {
                prop_assert_eq!(turns, last_turns + 1);
            } else {
                prop_assert_eq!(turns, 1);
                if previous.is_some() {
                    changes += 1;
                }
            }
            prop_assert_eq!(tracker.history().len(), changes);
            previous = Some(area);
            last_turns = turns;
        }
    }

    #[test]
    fn window_never_exceeds_configured_size(n in 0usize..250, size in 1usize..50) {
        let manager = SessionManager::new(SessionConfig {
            window_size: size,
            ..SessionConfig::default()
        });
        for i in 0..n {
            manager.add_user_prompt("s", &format!("p{i}"), None);
        }
        let len = manager.snapshot("s").map(|c| c.window.len()).unwrap_or(0);
        prop_assert_eq!(len, n.min(size));
    }
}
