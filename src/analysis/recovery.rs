//! Recovering a JSON verdict from noisy model output.
//!
//! Models wrap their JSON in prose or code fences often enough that strict
//! parsing is useless. Each strategy looks for an object its own way; the
//! first one that yields a parseable object wins.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::verdict::{AnalysisVerdict, Verdict};

/// A pure attempt at pulling a JSON object out of raw text.
pub type RecoveryStrategy = fn(&str) -> Option<Value>;

/// Strategies in the order they are tried.
pub const RECOVERY_STRATEGIES: &[(&str, RecoveryStrategy)] = &[
    ("fenced-block", from_fenced_block),
    ("brace-span", from_brace_span),
];

/// A ```json fence around a single object.
static FENCED_JSON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```json\s*(\{.*?\})\s*```").unwrap());

/// Interior of the first fenced JSON block.
pub fn from_fenced_block(raw: &str) -> Option<Value> {
    let caps = FENCED_JSON.captures(raw)?;
    parse_object(caps.get(1)?.as_str())
}

/// Everything from the first `{` to the last `}` inclusive.
pub fn from_brace_span(raw: &str) -> Option<Value> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    parse_object(&raw[start..=end])
}

fn parse_object(candidate: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(candidate) {
        Ok(value @ Value::Object(_)) => Some(value),
        Ok(_) => None,
        Err(e) => {
            debug!(error = %e, "Candidate JSON did not parse");
            None
        }
    }
}

/// Turn raw model output into a verdict, degrading if nothing parses.
pub fn recover_verdict(raw: &str) -> Verdict {
    for (name, strategy) in RECOVERY_STRATEGIES {
        if let Some(value) = strategy(raw) {
            info!(strategy = name, "Recovered JSON verdict from model output");
            return Verdict::Model(value);
        }
        debug!(strategy = name, "No JSON object recovered");
    }

    warn!(
        chars = raw.chars().count(),
        "Model output could not be recovered as JSON"
    );
    Verdict::Fallback(AnalysisVerdict::degraded(raw))
}
