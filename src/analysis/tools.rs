//! Tools the model may call during an analysis.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::info;

use crate::llm::{ToolCall, ToolSpec};

/// Name of the legal definition lookup tool.
pub const SEARCH_LEGAL_DEFINITION: &str = "search_legal_definition";

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    Unknown(String),

    #[error("Invalid arguments for {tool}: {message}")]
    InvalidArguments { tool: String, message: String },
}

/// Maps a legal term to a plain-language definition.
pub trait DefinitionLookup: Send + Sync {
    /// Definition of `term`, or a not-found message. Never fails.
    fn define(&self, term: &str) -> String;
}

/// Built-in table of common contract terms.
#[derive(Debug, Clone)]
pub struct LegalGlossary {
    entries: HashMap<&'static str, &'static str>,
}

const GLOSSARY: &[(&str, &str)] = &[
    (
        "indemnification",
        "A contractual obligation of one party (the indemnitor) to compensate the loss incurred by another party (the indemnitee) due to the acts of the indemnitor or any other party. Essentially, it's a promise to cover someone else's potential legal costs.",
    ),
    (
        "liability",
        "Legal responsibility for one's acts or omissions. Failure of a person or entity to meet that responsibility leaves them open to a lawsuit for any resulting damages or a court order to perform.",
    ),
    (
        "non-compete",
        "A clause under which one party (usually an employee) agrees not to enter into or start a similar profession or trade in competition against another party (usually the employer).",
    ),
    (
        "termination for cause",
        "The termination of an employment contract by an employer due to the employee's misconduct or failure to perform their duties. This is distinct from termination without cause, which does not require a specific reason.",
    ),
    (
        "arbitration",
        "A method of resolving disputes outside the courts, where the parties present their case to a neutral third party (the arbitrator) whose decision is usually binding.",
    ),
    (
        "force majeure",
        "A clause freeing both parties from obligation if an extraordinary event or circumstance beyond their control prevents one or both from fulfilling their obligations.",
    ),
    (
        "warranty",
        "A promise or guarantee provided by one party to another regarding the condition, quality, or performance of a product or service.",
    ),
    (
        "confidentiality",
        "An obligation to keep certain information secret and not disclose it to unauthorized parties.",
    ),
    (
        "assignment",
        "The transfer of rights or obligations from one party to another under a contract.",
    ),
    (
        "hold harmless",
        "A clause where one party agrees not to hold the other responsible for any loss, damage, or legal liability.",
    ),
];

impl Default for LegalGlossary {
    fn default() -> Self {
        Self {
            entries: GLOSSARY.iter().copied().collect(),
        }
    }
}

impl LegalGlossary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl DefinitionLookup for LegalGlossary {
    fn define(&self, term: &str) -> String {
        match self.entries.get(term.to_lowercase().as_str()) {
            Some(definition) => definition.to_string(),
            None => format!("No definition found for: {}", term),
        }
    }
}

/// A function the model can ask us to run.
pub trait Tool: Send + Sync {
    /// Description offered to the model.
    fn spec(&self) -> ToolSpec;

    /// Run the tool on a JSON-encoded argument object.
    fn invoke(&self, arguments: &str) -> Result<String, ToolError>;
}

#[derive(Debug, Deserialize)]
struct DefinitionArgs {
    term: String,
}

/// `search_legal_definition(term)` backed by a [`DefinitionLookup`].
pub struct LegalDefinitionTool {
    lookup: Arc<dyn DefinitionLookup>,
}

impl LegalDefinitionTool {
    pub fn new(lookup: Arc<dyn DefinitionLookup>) -> Self {
        Self { lookup }
    }
}

impl Default for LegalDefinitionTool {
    fn default() -> Self {
        Self::new(Arc::new(LegalGlossary::default()))
    }
}

impl Tool for LegalDefinitionTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::function(
            SEARCH_LEGAL_DEFINITION,
            "Gets the definition of a legal term.",
            json!({
                "type": "object",
                "properties": {
                    "term": {
                        "type": "string",
                        "description": "The legal term to be defined, e.g., 'indemnification'"
                    }
                },
                "required": ["term"]
            }),
        )
    }

    fn invoke(&self, arguments: &str) -> Result<String, ToolError> {
        let args: DefinitionArgs = parse_arguments(SEARCH_LEGAL_DEFINITION, arguments)?;
        info!(term = %args.term, "Looking up legal definition");
        Ok(self.lookup.define(&args.term))
    }
}

/// Decode a tool's JSON argument payload.
pub fn parse_arguments<T: for<'de> Deserialize<'de>>(
    tool: &str,
    arguments: &str,
) -> Result<T, ToolError> {
    serde_json::from_str(arguments).map_err(|e| ToolError::InvalidArguments {
        tool: tool.to_string(),
        message: e.to_string(),
    })
}

/// Tools available to an analysis, keyed by name.
#[derive(Clone)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::empty().with_tool(Arc::new(LegalDefinitionTool::default()))
    }
}

impl ToolRegistry {
    pub fn empty() -> Self {
        Self { tools: Vec::new() }
    }

    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools.iter().map(|t| t.spec()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.spec().name() == name)
    }

    /// Run the tool a model asked for.
    pub fn dispatch(&self, call: &ToolCall) -> Result<String, ToolError> {
        let tool = self
            .get(&call.function.name)
            .ok_or_else(|| ToolError::Unknown(call.function.name.clone()))?;
        tool.invoke(&call.function.arguments)
    }
}
