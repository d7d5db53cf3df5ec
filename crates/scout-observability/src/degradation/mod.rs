//! Degradation tracking.

pub mod tracker;

use std::sync::{Arc, Mutex, PoisonError};

pub use tracker::{DegradationEvent, DegradationTracker, RecoveryStatus, TrackedDegradation};

/// One tracker shared by every component of a runtime.
pub type SharedDegradations = Arc<Mutex<DegradationTracker>>;

pub fn shared() -> SharedDegradations {
    Arc::new(Mutex::new(DegradationTracker::new()))
}

/// Record into a shared tracker, or only emit the event when there is none.
pub fn report(
    tracker: Option<&SharedDegradations>,
    component: &str,
    failure: &str,
    fallback: &str,
) {
    match tracker {
        Some(t) => t
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .record(DegradationEvent::new(component, failure, fallback)),
        None => crate::tracing_setup::events::degradation_triggered(component, failure, fallback),
    }
}

pub fn recovered(tracker: Option<&SharedDegradations>, component: &str) {
    if let Some(t) = tracker {
        t.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .mark_recovered(component);
    }
}
