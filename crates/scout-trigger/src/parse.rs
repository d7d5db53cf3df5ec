//! Oracle reply parsing: first JSON object, clamping, per-type floors, and a
//! keyword fallback for replies that are not JSON at all.

use serde_json::Value;

use scout_core::config::TriggerConfig;
use scout_core::constants::{MAX_PRIORITY, MIN_PRIORITY};
use scout_core::models::{ResearchDepth, ResearchType, TriggerDecision, TriggerSource};
use scout_session::SessionContext;

/// Confidence assigned to a keyword-inferred decision.
const HEURISTIC_CONFIDENCE: f64 = 0.45;
const HEURISTIC_PRIORITY: u8 = 4;
const DEFAULT_PRIORITY: u8 = 5;

const NEGATIVE_MARKERS: &[&str] = &[
    "no research",
    "not needed",
    "no need",
    "not necessary",
    "\"should_research\": false",
    "\"should_research\":false",
];
const POSITIVE_MARKERS: &[&str] = &[
    "should research",
    "research would help",
    "recommend research",
    "worth researching",
    "\"should_research\": true",
    "\"should_research\":true",
];

/// Minimum confidence per research type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Floors {
    pub direct: f64,
    pub alternative: f64,
    pub validation: f64,
}

impl Floors {
    pub fn from_config(config: &TriggerConfig) -> Self {
        Self {
            direct: config.direct_confidence_floor,
            alternative: config.alternative_confidence_floor,
            validation: config.validation_confidence_floor,
        }
    }

    pub fn for_type(&self, research_type: ResearchType) -> f64 {
        match research_type {
            ResearchType::Direct => self.direct,
            ResearchType::Alternative => self.alternative,
            ResearchType::Validation => self.validation,
        }
    }
}

/// The first balanced `{...}` in `text` that parses as a JSON object.
pub fn extract_json_object(text: &str) -> Option<Value> {
    let bytes = text.as_bytes();
    let mut start = 0;
    while let Some(offset) = text[start..].find('{') {
        let open = start + offset;
        if let Some(close) = matching_brace(bytes, open) {
            let candidate = &text[open..=close];
            if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(candidate) {
                return Some(value);
            }
        }
        start = open + 1;
    }
    None
}

fn matching_brace(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, &b) in bytes.iter().enumerate().skip(open) {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Decision from a well-formed reply, floors applied. `None` when the reply
/// holds no object with a `should_research` flag.
pub fn parse_decision(reply: &str, floors: &Floors) -> Option<TriggerDecision> {
    let value = extract_json_object(reply)?;
    let obj = value.as_object()?;
    let should_research = match obj.get("should_research")? {
        Value::Bool(b) => *b,
        Value::String(s) => s.eq_ignore_ascii_case("true"),
        _ => return None,
    };

    let research_type = obj
        .get("research_type")
        .and_then(Value::as_str)
        .and_then(ResearchType::parse)
        .unwrap_or(ResearchType::Direct);
    let confidence = obj
        .get("confidence")
        .and_then(Value::as_f64)
        .unwrap_or(0.0)
        .clamp(0.0, 1.0);
    let priority = obj
        .get("priority")
        .and_then(Value::as_f64)
        .map(|p| p.round().clamp(MIN_PRIORITY as f64, MAX_PRIORITY as f64) as u8)
        .unwrap_or(DEFAULT_PRIORITY);
    let query = obj
        .get("query")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_string);
    let depth = obj
        .get("depth")
        .and_then(Value::as_str)
        .and_then(ResearchDepth::parse);
    let reasoning = obj
        .get("reasoning")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    Some(apply_floor(
        TriggerDecision {
            should_research,
            research_type,
            query,
            confidence,
            priority,
            reasoning,
            depth,
            source: TriggerSource::Oracle,
        },
        floors,
    ))
}

/// Force `should_research` off when confidence is below the type's floor.
pub fn apply_floor(mut decision: TriggerDecision, floors: &Floors) -> TriggerDecision {
    if decision.should_research && decision.confidence < floors.for_type(decision.research_type) {
        decision.should_research = false;
        decision.reasoning = format!(
            "confidence {:.2} below {} floor: {}",
            decision.confidence,
            decision.research_type.as_str(),
            decision.reasoning
        );
    }
    decision
}

/// Crude reading of a reply that was not usable JSON.
pub fn keyword_heuristic(reply: &str, ctx: &SessionContext, floors: &Floors) -> TriggerDecision {
    let lower = reply.to_lowercase();
    let negative = NEGATIVE_MARKERS.iter().any(|m| lower.contains(m));
    let positive = POSITIVE_MARKERS.iter().any(|m| lower.contains(m));
    if negative || !positive {
        return TriggerDecision::no_research("oracle reply unparseable; no research signal");
    }
    let Some(query) = fallback_query(ctx) else {
        return TriggerDecision::no_research("oracle reply unparseable; nothing to research");
    };
    apply_floor(
        TriggerDecision {
            should_research: true,
            research_type: ResearchType::Direct,
            query: Some(query),
            confidence: HEURISTIC_CONFIDENCE,
            priority: HEURISTIC_PRIORITY,
            reasoning: "oracle reply unparseable; keyword heuristic".to_string(),
            depth: None,
            source: TriggerSource::Oracle,
        },
        floors,
    )
}

/// Latest error message, else the current task, qualified by the main tech.
pub fn fallback_query(ctx: &SessionContext) -> Option<String> {
    let base = ctx
        .recent_errors
        .back()
        .map(|e| e.message.clone())
        .or_else(|| ctx.current_task.clone())?;
    Some(match ctx.tech_stack.iter().next() {
        Some(tech) if !base.to_lowercase().contains(tech.as_str()) => format!("{base} {tech}"),
        _ => base,
    })
}
