//! Declarative, ordered rule tables. Each pattern is compiled once on first use;
//! a pattern that fails to compile is skipped.

pub mod error_signatures;
pub mod file_refs;
pub mod task_detection;
pub mod tech_stack;
pub mod topics;

use regex::Regex;
use std::sync::LazyLock;

pub use error_signatures::{classify_errors, ErrorKind, ErrorSignature};
pub use file_refs::{extract_file_refs, FileRefs};
pub use task_detection::{detect_task, detect_task_in_input};
pub use tech_stack::detect_tech;
pub use topics::extract_topics;

/// Knowledge domain of a piece of text: its first tech match, else its first
/// topic. Findings are filed and depth history is kept under this name.
pub fn primary_domain(text: &str) -> Option<&'static str> {
    detect_tech(text)
        .into_iter()
        .next()
        .or_else(|| extract_topics(text).into_iter().next())
}

/// A named pattern in a rule table.
pub struct Rule {
    pub name: &'static str,
    pub regex: &'static LazyLock<Option<Regex>>,
}

macro_rules! rule_pattern {
    ($name:ident, $regex_str:expr) => {
        pub static $name: std::sync::LazyLock<Option<regex::Regex>> =
            std::sync::LazyLock::new(|| regex::Regex::new($regex_str).ok());
    };
}
pub(crate) use rule_pattern;

/// Names of every rule matching `text`, in table order, without repeats.
pub(crate) fn matching_names(rules: &[Rule], text: &str) -> Vec<&'static str> {
    rules
        .iter()
        .filter(|r| r.regex.as_ref().is_some_and(|re| re.is_match(text)))
        .map(|r| r.name)
        .fold(Vec::new(), |mut acc, name| {
            if !acc.contains(&name) {
                acc.push(name);
            }
            acc
        })
}
