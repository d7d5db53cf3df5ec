use super::{matching_names, rule_pattern, Rule};

rule_pattern!(
    RE_AUTH,
    r"(?i)\b(?:auth(?:entication|orization)?|login|oauth2?|jwt|session token|sso)\b"
);
rule_pattern!(RE_DATABASE, r"(?i)\b(?:database|sql|query|schema|orm|index(?:es)?|transaction)\b");
rule_pattern!(
    RE_TESTING,
    r"(?i)\b(?:tests?|testing|spec|assert(?:ion)?|mock(?:ing)?|fixture|coverage)\b"
);
rule_pattern!(
    RE_DEPLOYMENT,
    r"(?i)\b(?:deploy(?:ment)?|release|ci/cd|pipeline|production|staging)\b"
);
rule_pattern!(
    RE_PERFORMANCE,
    r"(?i)\b(?:performance|latency|slow|optimi[sz]e|profil(?:e|ing)|benchmark|throughput)\b"
);
rule_pattern!(RE_CACHING, r"(?i)\b(?:cach(?:e|ing)|memoi[sz]e|ttl|invalidat(?:e|ion))\b");
rule_pattern!(RE_API, r"(?i)\b(?:api|endpoint|rest|graphql|grpc|webhook|http (?:client|server))\b");
rule_pattern!(RE_ROUTING, r"(?i)\b(?:rout(?:e|er|ing)|middleware|handler)\b");
rule_pattern!(
    RE_STATE,
    r"(?i)\b(?:state management|redux|zustand|store|context provider|signals?)\b"
);
rule_pattern!(
    RE_CONCURRENCY,
    r"(?i)\b(?:async|await|concurren(?:t|cy)|thread|mutex|deadlock|race condition|tokio)\b"
);
rule_pattern!(
    RE_SECURITY,
    r"(?i)\b(?:security|xss|csrf|injection|sanitiz(?:e|ation)|encrypt(?:ion)?|secret)\b"
);
rule_pattern!(RE_LOGGING, r"(?i)\b(?:log(?:ging|ger)?|tracing|telemetry|metrics|observability)\b");
rule_pattern!(RE_MIGRATION, r"(?i)\b(?:migrat(?:e|ion)|upgrade|deprecat(?:ed|ion))\b");
rule_pattern!(RE_STYLING, r"(?i)\b(?:css|styles?|styling|tailwind|layout|responsive)\b");
rule_pattern!(RE_BUILD, r"(?i)\b(?:build|compile|bundl(?:e|er)|webpack|vite|cargo build|linker)\b");

/// Fixed topic vocabulary, most specific first.
pub fn all_rules() -> Vec<Rule> {
    vec![
        Rule {
            name: "authentication",
            regex: &RE_AUTH,
        },
        Rule {
            name: "security",
            regex: &RE_SECURITY,
        },
        Rule {
            name: "database",
            regex: &RE_DATABASE,
        },
        Rule {
            name: "caching",
            regex: &RE_CACHING,
        },
        Rule {
            name: "testing",
            regex: &RE_TESTING,
        },
        Rule {
            name: "deployment",
            regex: &RE_DEPLOYMENT,
        },
        Rule {
            name: "performance",
            regex: &RE_PERFORMANCE,
        },
        Rule {
            name: "api",
            regex: &RE_API,
        },
        Rule {
            name: "routing",
            regex: &RE_ROUTING,
        },
        Rule {
            name: "state management",
            regex: &RE_STATE,
        },
        Rule {
            name: "concurrency",
            regex: &RE_CONCURRENCY,
        },
        Rule {
            name: "logging",
            regex: &RE_LOGGING,
        },
        Rule {
            name: "migration",
            regex: &RE_MIGRATION,
        },
        Rule {
            name: "styling",
            regex: &RE_STYLING,
        },
        Rule {
            name: "build",
            regex: &RE_BUILD,
        },
    ]
}

pub fn extract_topics(text: &str) -> Vec<&'static str> {
    matching_names(&all_rules(), text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_known_topics_only() {
        let topics = extract_topics("Fix the JWT login flow and add a test for the cache TTL");
        assert!(topics.contains(&"authentication"));
        assert!(topics.contains(&"testing"));
        assert!(topics.contains(&"caching"));
        assert!(!topics.contains(&"styling"));
    }

    #[test]
    fn empty_text_has_no_topics() {
        assert!(extract_topics("").is_empty());
    }
}
