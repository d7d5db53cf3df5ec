//! # scout-observability
//!
//! Structured tracing setup with span and event helpers, plus degradation
//! event tracking for components that fall back to a cheaper path.

pub mod degradation;
pub mod tracing_setup;

pub use degradation::{
    DegradationEvent, DegradationTracker, RecoveryStatus, SharedDegradations, TrackedDegradation,
};
pub use tracing_setup::{events, init_tracing, init_tracing_with_filter};
