use scout_core::config::ObservabilityConfig;
use scout_observability::{events, init_tracing, init_tracing_with_filter};

#[test]
fn second_init_is_refused_not_panicking() {
    let first = init_tracing_with_filter("debug");
    let second = init_tracing(&ObservabilityConfig::default());
    assert!(first);
    assert!(!second);

    events::research_triggered("s1", "tool_error", "TypeError in render", 0.6);
    events::session_ended("s1", 12, 2);
}
