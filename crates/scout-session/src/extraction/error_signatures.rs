use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::rule_pattern;

/// Fixed error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    TypeError,
    ReferenceError,
    SyntaxError,
    ModuleNotFound,
    CompileError,
    BorrowCheck,
    TestFailure,
    Panic,
    PermissionDenied,
    Network,
    Timeout,
    OutOfMemory,
    Generic,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TypeError => "type_error",
            Self::ReferenceError => "reference_error",
            Self::SyntaxError => "syntax_error",
            Self::ModuleNotFound => "module_not_found",
            Self::CompileError => "compile_error",
            Self::BorrowCheck => "borrow_check",
            Self::TestFailure => "test_failure",
            Self::Panic => "panic",
            Self::PermissionDenied => "permission_denied",
            Self::Network => "network",
            Self::Timeout => "timeout",
            Self::OutOfMemory => "out_of_memory",
            Self::Generic => "generic",
        }
    }
}

/// A classified error line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorSignature {
    pub kind: ErrorKind,
    /// Normalized message: digits collapsed, trimmed, at most 160 chars.
    pub message: String,
    pub seen_at: DateTime<Utc>,
}

impl ErrorSignature {
    /// Same kind and normalized message.
    pub fn same_as(&self, other: &ErrorSignature) -> bool {
        self.kind == other.kind && self.message == other.message
    }
}

rule_pattern!(RE_TYPE_ERROR, r"(?m)^.*\bTypeError\b.*$");
rule_pattern!(RE_REFERENCE_ERROR, r"(?m)^.*\bReferenceError\b.*$");
rule_pattern!(RE_SYNTAX_ERROR, r"(?m)^.*\b(?:SyntaxError|ParseError|unexpected token)\b.*$");
rule_pattern!(
    RE_MODULE_NOT_FOUND,
    r"(?m)^.*(?:ModuleNotFoundError|Cannot find module|No module named|unresolved import|could not find `).*$"
);
rule_pattern!(RE_BORROW, r"(?m)^.*\berror\[E0(?:499|502|505|506|382|597|716)\].*$");
rule_pattern!(RE_COMPILE, r"(?m)^.*\berror(?:\[E\d{4}\])?:.*$|^.*\berror TS\d+:.*$");
rule_pattern!(
    RE_TEST_FAILURE,
    r"(?m)^.*(?:test result: FAILED|\bFAILED\b.*::|\d+ failed|AssertionError|assertion failed).*$"
);
rule_pattern!(RE_PANIC, r"(?m)^.*(?:panicked at|thread '.*' panicked|Segmentation fault).*$");
rule_pattern!(RE_PERMISSION, r"(?m)^.*(?:EACCES|Permission denied|permission denied|EPERM).*$");
rule_pattern!(
    RE_NETWORK,
    r"(?m)^.*(?:ECONNREFUSED|ECONNRESET|ENOTFOUND|Connection refused|getaddrinfo|network error).*$"
);
rule_pattern!(RE_TIMEOUT, r"(?m)^.*(?:ETIMEDOUT|timed out|Timeout exceeded|deadline exceeded).*$");
rule_pattern!(
    RE_OOM,
    r"(?m)^.*(?:out of memory|heap out of memory|OOMKilled|memory allocation of).*$"
);
rule_pattern!(RE_GENERIC, r"(?m)^.*\b(?:Error|Exception|FATAL|fatal):.*$");

type KindRule = (ErrorKind, &'static std::sync::LazyLock<Option<regex::Regex>>);

/// Classification order. Specific kinds before the catch-all.
fn all_rules() -> Vec<KindRule> {
    vec![
        (ErrorKind::TypeError, &RE_TYPE_ERROR),
        (ErrorKind::ReferenceError, &RE_REFERENCE_ERROR),
        (ErrorKind::SyntaxError, &RE_SYNTAX_ERROR),
        (ErrorKind::ModuleNotFound, &RE_MODULE_NOT_FOUND),
        (ErrorKind::BorrowCheck, &RE_BORROW),
        (ErrorKind::CompileError, &RE_COMPILE),
        (ErrorKind::TestFailure, &RE_TEST_FAILURE),
        (ErrorKind::Panic, &RE_PANIC),
        (ErrorKind::PermissionDenied, &RE_PERMISSION),
        (ErrorKind::Network, &RE_NETWORK),
        (ErrorKind::Timeout, &RE_TIMEOUT),
        (ErrorKind::OutOfMemory, &RE_OOM),
        (ErrorKind::Generic, &RE_GENERIC),
    ]
}

/// Classify `text` into at most one signature per kind, in rule order.
pub fn classify_errors(text: &str, now: DateTime<Utc>) -> Vec<ErrorSignature> {
    let mut found: Vec<ErrorSignature> = Vec::new();
    for (kind, regex) in all_rules() {
        let Some(re) = regex.as_ref() else { continue };
        let Some(m) = re.find(text) else { continue };
        // The catch-all only fires when nothing specific did.
        if kind == ErrorKind::Generic && !found.is_empty() {
            continue;
        }
        found.push(ErrorSignature {
            kind,
            message: normalize_message(m.as_str()),
            seen_at: now,
        });
    }
    found
}

fn normalize_message(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut last_digit = false;
    for c in line.trim().chars() {
        if c.is_ascii_digit() {
            if !last_digit {
                out.push('N');
            }
            last_digit = true;
        } else {
            out.push(c);
            last_digit = false;
        }
    }
    out.chars().take(160).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_type_error_and_normalizes_digits() {
        let out = "at line 42\nTypeError: Cannot read properties of undefined (reading 'id') at 17:9";
        let sigs = classify_errors(out, Utc::now());
        assert_eq!(sigs.len(), 1);
        assert_eq!(sigs[0].kind, ErrorKind::TypeError);
        assert!(sigs[0].message.contains("at N:N"));
    }

    #[test]
    fn borrow_check_precedes_generic_compile_error() {
        let out = "error[E0502]: cannot borrow `v` as mutable because it is also borrowed as immutable";
        let sigs = classify_errors(out, Utc::now());
        assert_eq!(sigs[0].kind, ErrorKind::BorrowCheck);
    }

    #[test]
    fn generic_only_when_nothing_specific() {
        let sigs = classify_errors("Error: something odd happened", Utc::now());
        assert_eq!(sigs.len(), 1);
        assert_eq!(sigs[0].kind, ErrorKind::Generic);
        assert!(classify_errors("all good", Utc::now()).is_empty());
    }
}
