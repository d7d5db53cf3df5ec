//! Ordered error-signature table for the zero-latency path. First match wins.

use std::sync::LazyLock;

use regex::Regex;

use scout_core::models::{ResearchType, TriggerSource};

macro_rules! rule_pattern {
    ($name:ident, $regex_str:expr) => {
        static $name: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new($regex_str).ok());
    };
}

rule_pattern!(
    RE_UNDEFINED_PROPERTY,
    r"TypeError: Cannot read propert(?:y|ies) of (?:undefined|null)[^\n]*"
);
rule_pattern!(RE_NOT_A_FUNCTION, r"TypeError: [\w.$\[\]]+ is not a function[^\n]*");
rule_pattern!(RE_NOT_DEFINED, r"ReferenceError: [\w$]+ is not defined[^\n]*");
rule_pattern!(
    RE_MODULE_NOT_FOUND,
    r"(?:Cannot find module|Module not found: Error: Can't resolve|ModuleNotFoundError: No module named)[^\n]*"
);
rule_pattern!(RE_UNEXPECTED_TOKEN, r"SyntaxError: Unexpected token[^\n]*");
rule_pattern!(RE_CORS, r"(?:blocked by CORS policy|No 'Access-Control-Allow-Origin')[^\n]*");
rule_pattern!(RE_CONN_REFUSED, r"(?:ECONNREFUSED|Connection refused)[^\n]*");
rule_pattern!(
    RE_HYDRATION,
    r"(?:Hydration failed|Text content does not match server-rendered HTML)[^\n]*"
);
rule_pattern!(RE_BORROW, r"error\[E0(?:499|502|505|506|382|597|716)\]:[^\n]*");
rule_pattern!(RE_TRAIT_BOUND, r"error\[E0277\]:[^\n]*");
rule_pattern!(RE_TS_TYPE, r"error TS2\d{3}:[^\n]*");
rule_pattern!(RE_PY_ATTRIBUTE, r"AttributeError: [^\n]*has no attribute[^\n]*");
rule_pattern!(RE_NPM_RESOLVE, r"npm ERR! (?:code )?ERESOLVE[^\n]*");
rule_pattern!(
    RE_DEPRECATION,
    r"(?i)(?:DeprecationWarning|\[DEP\d+\]|warning: use of deprecated|is deprecated|has been deprecated)[^\n]*"
);

/// One quick-path pattern and the decision it yields.
pub struct QuickRule {
    pub name: &'static str,
    pub regex: &'static LazyLock<Option<Regex>>,
    pub research_type: ResearchType,
    pub confidence: f64,
    pub priority: u8,
    pub source: TriggerSource,
}

const fn error_rule(name: &'static str, regex: &'static LazyLock<Option<Regex>>) -> QuickRule {
    QuickRule {
        name,
        regex,
        research_type: ResearchType::Direct,
        confidence: 0.6,
        priority: 7,
        source: TriggerSource::ToolError,
    }
}

/// Error signatures first, deprecations last.
pub fn all_rules() -> Vec<QuickRule> {
    vec![
        error_rule("undefined_property", &RE_UNDEFINED_PROPERTY),
        error_rule("not_a_function", &RE_NOT_A_FUNCTION),
        error_rule("not_defined", &RE_NOT_DEFINED),
        error_rule("module_not_found", &RE_MODULE_NOT_FOUND),
        error_rule("unexpected_token", &RE_UNEXPECTED_TOKEN),
        error_rule("cors", &RE_CORS),
        error_rule("connection_refused", &RE_CONN_REFUSED),
        error_rule("hydration", &RE_HYDRATION),
        error_rule("borrow_check", &RE_BORROW),
        error_rule("trait_bound", &RE_TRAIT_BOUND),
        error_rule("ts_type", &RE_TS_TYPE),
        error_rule("py_attribute", &RE_PY_ATTRIBUTE),
        error_rule("npm_resolve", &RE_NPM_RESOLVE),
        QuickRule {
            name: "deprecation",
            regex: &RE_DEPRECATION,
            research_type: ResearchType::Validation,
            confidence: 0.5,
            priority: 5,
            source: TriggerSource::Deprecation,
        },
    ]
}
