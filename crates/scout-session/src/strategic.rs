//! Strategic timing and complementary research suggestions.

use chrono::{DateTime, Utc};

use scout_core::config::SessionConfig;

use crate::context::SessionContext;
use crate::extraction::tech_stack::{BACKEND_FRAMEWORKS, DATABASES, FRONTEND_FRAMEWORKS};

const MAX_SUGGESTIONS: usize = 3;

/// Enough tool uses since the last strategic analysis, and enough time.
pub fn should_trigger(ctx: &SessionContext, config: &SessionConfig, now: DateTime<Utc>) -> bool {
    if ctx.tool_uses_since_strategic < config.strategic_tool_use_threshold {
        return false;
    }
    match ctx.last_strategic {
        None => true,
        Some(last) => {
            (now - last).num_seconds() >= config.strategic_min_interval_secs as i64
        }
    }
}

pub fn mark_performed(ctx: &mut SessionContext, now: DateTime<Utc>) {
    ctx.last_strategic = Some(now);
    ctx.tool_uses_since_strategic = 0;
}

struct Suggestion {
    applies: fn(&SessionContext) -> bool,
    render: fn(&SessionContext) -> String,
}

/// Ordered suggestion table.
fn all_suggestions() -> Vec<Suggestion> {
    vec![
        Suggestion {
            applies: |c| {
                first_of(c, BACKEND_FRAMEWORKS).is_some()
                    && first_of(c, FRONTEND_FRAMEWORKS).is_none()
                    && !touched_dir_like(c, &["frontend", "client", "web", "ui", "components"])
            },
            render: |c| {
                format!(
                    "frontend integration patterns for a {} backend",
                    first_of(c, BACKEND_FRAMEWORKS).unwrap_or("web")
                )
            },
        },
        Suggestion {
            applies: |c| {
                first_of(c, FRONTEND_FRAMEWORKS).is_some() && !c.topics.contains("testing")
            },
            render: |c| {
                format!(
                    "component testing strategies for {}",
                    first_of(c, FRONTEND_FRAMEWORKS).unwrap_or("frontend")
                )
            },
        },
        Suggestion {
            applies: |c| {
                first_of(c, DATABASES).is_some()
                    && !touched_dir_like(c, &["migrations", "migration", "prisma"])
                    && !c.topics.contains("migration")
            },
            render: |c| {
                format!(
                    "schema migration workflow for {}",
                    first_of(c, DATABASES).unwrap_or("the database")
                )
            },
        },
        Suggestion {
            applies: |c| {
                first_of(c, BACKEND_FRAMEWORKS).is_some()
                    && c.topics.contains("api")
                    && !c.topics.contains("authentication")
            },
            render: |c| {
                format!(
                    "API authentication best practices for {}",
                    first_of(c, BACKEND_FRAMEWORKS).unwrap_or("the backend")
                )
            },
        },
        Suggestion {
            applies: |c| {
                c.tech_stack.contains("docker")
                    && !c.tech_stack.contains("kubernetes")
                    && !c.topics.contains("deployment")
            },
            render: |_| "container deployment and CI pipeline setup".to_string(),
        },
    ]
}

/// Up to three research suggestions that complement the detected stack.
pub fn complementary_suggestions(ctx: &SessionContext) -> Vec<String> {
    all_suggestions()
        .iter()
        .filter(|s| (s.applies)(ctx))
        .map(|s| (s.render)(ctx))
        .take(MAX_SUGGESTIONS)
        .collect()
}

fn first_of<'a>(ctx: &SessionContext, names: &[&'a str]) -> Option<&'a str> {
    names.iter().copied().find(|n| ctx.tech_stack.contains(*n))
}

fn touched_dir_like(ctx: &SessionContext, names: &[&str]) -> bool {
    ctx.touched_dirs.iter().any(|dir| {
        dir.split('/')
            .any(|component| names.iter().any(|n| component.eq_ignore_ascii_case(n)))
    })
}
