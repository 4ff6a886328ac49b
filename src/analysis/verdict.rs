//! Verdict shapes returned from an analysis.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::AnalysisError;

/// Characters of raw model output kept in a degraded verdict.
pub const RAW_OUTPUT_PREVIEW_CHARS: usize = 500;

/// Severity the model assigns to a flagged clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    #[serde(alias = "high", alias = "HIGH")]
    High,
    #[serde(alias = "medium", alias = "MEDIUM")]
    Medium,
    #[serde(alias = "low", alias = "LOW")]
    Low,
    /// Only used for synthetic clauses built when output is unusable.
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlaggedClause {
    pub clause_text: String,
    pub risk_level: RiskLevel,
    pub explanation: String,
    pub recommendation: String,
}

/// Structured analysis of one document.
///
/// The error form carries `error` and an empty clause list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisVerdict {
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_match_warning: Option<String>,
    #[serde(default)]
    pub flagged_clauses: Vec<FlaggedClause>,
    #[serde(default)]
    pub overall_recommendation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnalysisVerdict {
    /// Verdict for model output that could not be recovered as JSON.
    pub fn degraded(raw_output: &str) -> Self {
        let preview: String = raw_output.chars().take(RAW_OUTPUT_PREVIEW_CHARS).collect();
        Self {
            summary: "Analysis completed but response format was invalid".to_string(),
            context_match_warning: None,
            flagged_clauses: vec![FlaggedClause {
                clause_text: "Unable to parse structured response".to_string(),
                risk_level: RiskLevel::Unknown,
                explanation: "The LLM provided analysis but in an unexpected format.".to_string(),
                recommendation: "Please try again or review the document manually.".to_string(),
            }],
            overall_recommendation: format!("Raw LLM response: {}...", preview),
            error: None,
        }
    }

    /// Error verdict for a failed analysis.
    pub fn from_error(err: &AnalysisError) -> Self {
        match err {
            AnalysisError::Transport(e) => Self::failure(
                format!("Failed to connect to LLM API: {}", e),
                "Analysis failed due to API connection error",
                "Please check your LLM API configuration and try again",
            ),
            other => Self::failure(
                format!("Unexpected error during LLM analysis: {}", other),
                "Analysis failed due to unexpected error",
                "Please try again or contact support",
            ),
        }
    }

    fn failure(error: String, summary: &str, recommendation: &str) -> Self {
        Self {
            summary: summary.to_string(),
            context_match_warning: None,
            flagged_clauses: Vec::new(),
            overall_recommendation: recommendation.to_string(),
            error: Some(error),
        }
    }
}

/// Outcome of one analysis. Always serializes to a JSON object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Verdict {
    /// JSON object recovered from model output, passed through as-is.
    Model(Value),
    /// Built locally because the model's output was unusable or never arrived.
    Fallback(AnalysisVerdict),
}

impl Verdict {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Verdict::Fallback(_))
    }

    /// Pipeline error message, if the analysis failed.
    pub fn error(&self) -> Option<&str> {
        match self {
            Verdict::Model(value) => value.get("error").and_then(Value::as_str),
            Verdict::Fallback(verdict) => verdict.error.as_deref(),
        }
    }

    /// Typed view, when the model's object matches the verdict schema.
    pub fn typed(&self) -> Option<AnalysisVerdict> {
        match self {
            Verdict::Model(value) => serde_json::from_value(value.clone()).ok(),
            Verdict::Fallback(verdict) => Some(verdict.clone()),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Verdict::Model(value) => value.clone(),
            Verdict::Fallback(verdict) => {
                serde_json::to_value(verdict).unwrap_or_else(|_| Value::Object(Default::default()))
            }
        }
    }
}
