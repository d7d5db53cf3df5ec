//! Startup recovery.

pub mod orphans;

pub use orphans::fail_running_tasks;
