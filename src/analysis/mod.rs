//! Risk analysis of legal documents.
//!
//! The [`Analyzer`] sends the document to the model, resolves at most one
//! tool call, and recovers a verdict from whatever text comes back.

mod orchestrator;
pub mod prompts;
pub mod recovery;
pub mod tools;
mod verdict;

pub use orchestrator::{AnalysisError, AnalysisRequest, Analyzer, UNKNOWN_TOOL_OUTPUT};
pub use recovery::recover_verdict;
pub use tools::{
    DefinitionLookup, LegalDefinitionTool, LegalGlossary, Tool, ToolError, ToolRegistry,
    SEARCH_LEGAL_DEFINITION,
};
pub use verdict::{AnalysisVerdict, FlaggedClause, RiskLevel, Verdict};

#[cfg(test)]
pub(crate) use orchestrator::tests::{content as scripted_content, ScriptedTransport};
