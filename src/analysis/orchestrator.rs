//! Drives one document analysis through the LLM transport.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::prompts::{system_prompt, user_prompt};
use super::recovery::recover_verdict;
use super::tools::{ToolError, ToolRegistry};
use super::verdict::{AnalysisVerdict, Verdict};
use crate::llm::{ChatMessage, LlmError, LlmTransport, ModelReply, ModelRequest};

/// Raw output used when the model asks for a tool we don't have.
pub const UNKNOWN_TOOL_OUTPUT: &str =
    r#"{"summary": "Error: LLM requested an unknown tool.", "flagged_clauses": []}"#;

/// Errors that abort an analysis before any model output is available.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("{0}")]
    Transport(LlmError),

    #[error("Malformed tool call: {0}")]
    MalformedToolCall(#[from] ToolError),

    #[error("Unexpected LLM response: {0}")]
    UnexpectedResponse(String),
}

impl From<LlmError> for AnalysisError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Shape(message) => AnalysisError::UnexpectedResponse(message),
            other => AnalysisError::Transport(other),
        }
    }
}

/// Input to one analysis.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    /// The user's description of the document.
    pub context: String,
    /// Extracted document text.
    pub document_text: String,
}

impl AnalysisRequest {
    pub fn new(context: impl Into<String>, document_text: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            document_text: document_text.into(),
        }
    }
}

/// Runs analyses against a transport, offering the registered tools.
pub struct Analyzer {
    transport: Arc<dyn LlmTransport>,
    tools: ToolRegistry,
}

impl Analyzer {
    /// Create an analyzer with the default tool set.
    pub fn new(transport: Arc<dyn LlmTransport>) -> Self {
        Self {
            transport,
            tools: ToolRegistry::default(),
        }
    }

    pub fn with_tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    pub fn transport(&self) -> &Arc<dyn LlmTransport> {
        &self.transport
    }

    /// Analyze a document. Always returns a verdict; failures become error
    /// verdicts.
    pub async fn analyze(&self, request: &AnalysisRequest) -> Verdict {
        let span = info_span!(
            "analysis",
            id = %Uuid::new_v4(),
            dialect = %self.transport.dialect(),
            chars = request.document_text.chars().count(),
        );

        async {
            match self.raw_output(request).await {
                Ok(raw) => recover_verdict(&raw),
                Err(e) => {
                    warn!(error = %e, "Analysis failed");
                    Verdict::Fallback(AnalysisVerdict::from_error(&e))
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Candidate raw model output, after at most one tool round trip.
    pub async fn raw_output(&self, request: &AnalysisRequest) -> Result<String, AnalysisError> {
        let mut messages = vec![
            ChatMessage::system(system_prompt()),
            ChatMessage::user(user_prompt(&request.context, &request.document_text)),
        ];

        let dialect = self.transport.dialect();
        if !dialect.supports_tools() || self.tools.is_empty() {
            let reply = self.transport.send(&ModelRequest::new(messages)).await?;
            return reply_content(reply);
        }

        let first = ModelRequest::new(messages.clone()).with_tools(self.tools.specs());
        let reply = self.transport.send(&first).await?;

        let Some(call) = reply.tool_calls().first().cloned() else {
            debug!("Model answered without calling a tool");
            return reply_content(reply);
        };

        if reply.tool_calls().len() > 1 {
            debug!(
                requested = reply.tool_calls().len(),
                "Model requested several tools, handling only the first"
            );
        }

        if self.tools.get(&call.function.name).is_none() {
            warn!(tool = %call.function.name, "Model requested an unknown tool");
            return Ok(UNKNOWN_TOOL_OUTPUT.to_string());
        }

        let result = self.tools.dispatch(&call)?;
        info!(tool = %call.function.name, "Tool call resolved, sending follow-up request");

        messages.push(reply.message);
        messages.push(ChatMessage::tool_result(&call, result));

        // Follow-up goes out without tools so the model can't chain calls
        let second = self.transport.send(&ModelRequest::new(messages)).await?;
        reply_content(second)
    }
}

fn reply_content(reply: ModelReply) -> Result<String, AnalysisError> {
    match reply.message.content {
        Some(content) => Ok(content),
        None if !reply.message.tool_calls.is_empty() => Err(AnalysisError::UnexpectedResponse(
            "model requested another tool call after the tool result".to_string(),
        )),
        None => Err(AnalysisError::UnexpectedResponse(
            "reply carried neither content nor tool calls".to_string(),
        )),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::analysis::tools::{DefinitionLookup, LegalGlossary, SEARCH_LEGAL_DEFINITION};
    use crate::llm::{Dialect, ProbeStatus, Role, ToolCall};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Transport that replays canned replies and records every request.
    pub(crate) struct ScriptedTransport {
        dialect: Dialect,
        replies: Mutex<VecDeque<Result<ModelReply, LlmError>>>,
        pub(crate) requests: Mutex<Vec<ModelRequest>>,
    }

    impl ScriptedTransport {
        pub(crate) fn new(
            dialect: Dialect,
            replies: Vec<Result<ModelReply, LlmError>>,
        ) -> Arc<Self> {
            Arc::new(Self {
                dialect,
                replies: Mutex::new(replies.into()),
                requests: Mutex::new(Vec::new()),
            })
        }

        pub(crate) fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl LlmTransport for ScriptedTransport {
        fn dialect(&self) -> Dialect {
            self.dialect
        }

        async fn send(&self, request: &ModelRequest) -> Result<ModelReply, LlmError> {
            self.requests.lock().unwrap().push(request.clone());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(LlmError::Connection("script exhausted".into())))
        }

        async fn probe(&self) -> ProbeStatus {
            ProbeStatus::Connected
        }
    }

    pub(crate) fn content(text: &str) -> Result<ModelReply, LlmError> {
        Ok(ModelReply {
            message: ChatMessage::assistant(text),
        })
    }

    fn tool_request(name: &str, arguments: &str) -> Result<ModelReply, LlmError> {
        let mut message = ChatMessage::assistant("");
        message.content = None;
        message.tool_calls = vec![ToolCall::new("call_abc", name, arguments)];
        Ok(ModelReply { message })
    }

    fn request() -> AnalysisRequest {
        AnalysisRequest::new(
            "Employment contract",
            "The Employee shall indemnify the Employer against all claims.",
        )
    }

    const VERDICT: &str = r#"{"summary":"One high risk clause","flagged_clauses":[{"clause_text":"The Employee shall indemnify the Employer against all claims.","risk_level":"High","explanation":"Unlimited indemnity","recommendation":"Negotiate a cap"}],"overall_recommendation":"Review before signing"}"#;

    #[tokio::test]
    async fn test_direct_answer_makes_one_call() {
        let transport = ScriptedTransport::new(Dialect::ChatTools, vec![content(VERDICT)]);
        let analyzer = Analyzer::new(transport.clone());

        let verdict = analyzer.analyze(&request()).await;
        assert_eq!(transport.calls(), 1);
        assert_eq!(verdict.to_value()["summary"], "One high risk clause");

        let requests = transport.requests.lock().unwrap();
        assert_eq!(requests[0].tools.len(), 1);
        assert_eq!(requests[0].messages.len(), 2);
        assert_eq!(requests[0].messages[0].role, Role::System);
        assert!(requests[0].messages[1]
            .content
            .as_deref()
            .unwrap()
            .starts_with("CONTEXT PROVIDED BY USER:\nEmployment contract"));
    }

    #[tokio::test]
    async fn test_known_tool_triggers_single_follow_up() {
        let transport = ScriptedTransport::new(
            Dialect::ChatTools,
            vec![
                tool_request(SEARCH_LEGAL_DEFINITION, r#"{"term":"indemnification"}"#),
                content(&format!("Here is my analysis:\n```json\n{}\n```", VERDICT)),
            ],
        );
        let analyzer = Analyzer::new(transport.clone());

        let verdict = analyzer.analyze(&request()).await;
        assert!(!verdict.is_fallback());
        assert_eq!(transport.calls(), 2);

        let requests = transport.requests.lock().unwrap();
        let second = &requests[1];
        assert!(second.tools.is_empty());
        assert_eq!(second.messages.len(), 4);

        let assistant = &second.messages[2];
        assert_eq!(assistant.role, Role::Assistant);
        assert_eq!(assistant.tool_calls[0].id, "call_abc");

        let tool_msg = &second.messages[3];
        assert_eq!(tool_msg.role, Role::Tool);
        assert_eq!(tool_msg.tool_call_id.as_deref(), Some("call_abc"));
        assert_eq!(tool_msg.name.as_deref(), Some(SEARCH_LEGAL_DEFINITION));
        assert_eq!(
            tool_msg.content.as_deref(),
            Some(LegalGlossary::new().define("indemnification").as_str())
        );
    }

    #[tokio::test]
    async fn test_unknown_tool_skips_second_call() {
        let transport = ScriptedTransport::new(
            Dialect::ChatTools,
            vec![tool_request("send_email", r#"{"to":"x"}"#), content(VERDICT)],
        );
        let analyzer = Analyzer::new(transport.clone());

        let raw = analyzer.raw_output(&request()).await.unwrap();
        assert_eq!(raw, UNKNOWN_TOOL_OUTPUT);
        assert_eq!(transport.calls(), 1);

        let transport = ScriptedTransport::new(
            Dialect::ChatTools,
            vec![tool_request("send_email", "{}")],
        );
        let verdict = Analyzer::new(transport).analyze(&request()).await;
        assert_eq!(
            verdict.to_value(),
            json!({"summary": "Error: LLM requested an unknown tool.", "flagged_clauses": []})
        );
    }

    #[tokio::test]
    async fn test_transport_error_becomes_error_verdict() {
        let transport = ScriptedTransport::new(
            Dialect::ChatTools,
            vec![Err(LlmError::Connection("connection refused".into()))],
        );
        let verdict = Analyzer::new(transport).analyze(&request()).await;

        assert!(verdict.is_fallback());
        let value = verdict.to_value();
        assert_eq!(value["flagged_clauses"], json!([]));
        assert!(value["error"]
            .as_str()
            .unwrap()
            .starts_with("Failed to connect to LLM API:"));
    }

    #[tokio::test]
    async fn test_misshapen_reply_is_unexpected_not_transport() {
        let transport = ScriptedTransport::new(
            Dialect::ChatTools,
            vec![Err(LlmError::Shape("Response contained no choices".into()))],
        );
        let analyzer = Analyzer::new(transport);
        assert!(matches!(
            analyzer.raw_output(&request()).await,
            Err(AnalysisError::UnexpectedResponse(_))
        ));

        let verdict = analyzer.analyze(&request()).await;
        let typed = verdict.typed().unwrap();
        assert_eq!(typed.summary, "Analysis failed due to unexpected error");
        assert!(typed
            .error
            .unwrap()
            .starts_with("Unexpected error during LLM analysis:"));
    }

    #[tokio::test]
    async fn test_second_call_failure_becomes_error_verdict() {
        let transport = ScriptedTransport::new(
            Dialect::ChatTools,
            vec![
                tool_request(SEARCH_LEGAL_DEFINITION, r#"{"term":"warranty"}"#),
                Err(LlmError::Api {
                    status: 500,
                    body: "internal".into(),
                }),
            ],
        );
        let verdict = Analyzer::new(transport.clone()).analyze(&request()).await;
        assert_eq!(transport.calls(), 2);
        assert!(verdict.error().unwrap().contains("HTTP 500"));
    }

    #[tokio::test]
    async fn test_malformed_tool_arguments() {
        let transport = ScriptedTransport::new(
            Dialect::ChatTools,
            vec![tool_request(SEARCH_LEGAL_DEFINITION, "{term: liability")],
        );
        let analyzer = Analyzer::new(transport.clone());

        assert!(matches!(
            analyzer.raw_output(&request()).await,
            Err(AnalysisError::MalformedToolCall(_))
        ));
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_malformed_tool_arguments_verdict() {
        let transport = ScriptedTransport::new(
            Dialect::ChatTools,
            vec![tool_request(SEARCH_LEGAL_DEFINITION, "{}")],
        );
        let verdict = Analyzer::new(transport).analyze(&request()).await;
        assert!(verdict
            .error()
            .unwrap()
            .starts_with("Unexpected error during LLM analysis:"));
    }

    #[tokio::test]
    async fn test_completion_dialect_makes_single_call_without_tools() {
        let transport = ScriptedTransport::new(Dialect::Completion, vec![content(VERDICT)]);
        let verdict = Analyzer::new(transport.clone()).analyze(&request()).await;

        assert_eq!(transport.calls(), 1);
        assert!(transport.requests.lock().unwrap()[0].tools.is_empty());
        let typed = verdict.typed().unwrap();
        assert_eq!(typed.flagged_clauses.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_reply_is_unexpected() {
        let mut message = ChatMessage::assistant("");
        message.content = None;
        let transport =
            ScriptedTransport::new(Dialect::ChatTools, vec![Ok(ModelReply { message })]);
        let analyzer = Analyzer::new(transport);

        assert!(matches!(
            analyzer.raw_output(&request()).await,
            Err(AnalysisError::UnexpectedResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_prose_reply_degrades() {
        let transport = ScriptedTransport::new(
            Dialect::Completion,
            vec![content("This contract looks mostly fine to me.")],
        );
        let verdict = Analyzer::new(transport).analyze(&request()).await;
        let typed = verdict.typed().unwrap();
        assert_eq!(typed.flagged_clauses.len(), 1);
        assert!(typed.error.is_none());
    }

    #[tokio::test]
    async fn test_empty_registry_offers_no_tools() {
        let transport = ScriptedTransport::new(Dialect::ChatTools, vec![content(VERDICT)]);
        let analyzer = Analyzer::new(transport.clone()).with_tools(ToolRegistry::empty());
        analyzer.analyze(&request()).await;
        assert!(transport.requests.lock().unwrap()[0].tools.is_empty());
    }
}
