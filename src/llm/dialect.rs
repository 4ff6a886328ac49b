//! Wire dialects spoken to the LLM endpoint.
//!
//! - Completion: Ollama-style `/api/generate`, one flattened prompt, no tools.
//! - ChatTools: OpenAI-compatible `/v1/chat/completions`, role-tagged messages
//!   and function calling.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;
use url::Url;

use super::config::LlmConfig;
use super::error::LlmError;
use super::message::{ChatMessage, ModelReply, ModelRequest, Role, ToolSpec};

/// Path marker that selects the chat dialect.
const VERSIONED_API_MARKER: &str = "/v1/";

/// Nucleus sampling sent with completion requests.
const COMPLETION_TOP_P: f32 = 0.9;

/// Token cap for the chat-dialect liveness probe.
const PROBE_MAX_TOKENS: u32 = 10;

const PROBE_PROMPT: &str = "Hello";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Single prompt in, single `response` string out.
    Completion,
    /// Message list in, assistant message (content or tool calls) out.
    ChatTools,
}

/// Ollama generate request.
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    format: &'static str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    top_p: f32,
    num_predict: u32,
}

/// Ollama generate response.
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// OpenAI-compatible chat completion request.
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [ToolSpec]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

impl Dialect {
    /// Pick the dialect from the endpoint URL path.
    ///
    /// Unparseable URLs are matched on the raw string.
    pub fn from_endpoint(endpoint: &str) -> Self {
        let is_versioned = match Url::parse(endpoint) {
            Ok(url) => url.path().contains(VERSIONED_API_MARKER),
            Err(_) => endpoint.contains(VERSIONED_API_MARKER),
        };
        if is_versioned {
            Dialect::ChatTools
        } else {
            Dialect::Completion
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::Completion => "completion",
            Dialect::ChatTools => "chat-tools",
        }
    }

    /// Whether tool specs sent in this dialect can actually be called.
    pub fn supports_tools(&self) -> bool {
        matches!(self, Dialect::ChatTools)
    }

    /// Serialize a request body for this dialect.
    pub fn encode(&self, request: &ModelRequest, config: &LlmConfig) -> Result<Value, LlmError> {
        let body = match self {
            Dialect::Completion => {
                if !request.tools.is_empty() {
                    debug!(
                        tools = request.tools.len(),
                        "Completion dialect cannot call tools, dropping specs"
                    );
                }
                serde_json::to_value(GenerateRequest {
                    model: &config.model,
                    prompt: flatten_prompt(&request.messages),
                    format: "json",
                    stream: false,
                    options: GenerateOptions {
                        temperature: config.temperature,
                        top_p: COMPLETION_TOP_P,
                        num_predict: config.max_tokens,
                    },
                })
            }
            Dialect::ChatTools => {
                let has_tools = !request.tools.is_empty();
                serde_json::to_value(ChatCompletionRequest {
                    model: &config.model,
                    messages: &request.messages,
                    tools: has_tools.then_some(request.tools.as_slice()),
                    tool_choice: has_tools.then_some("auto"),
                    temperature: config.temperature,
                    max_tokens: config.max_tokens,
                    stream: false,
                })
            }
        };
        body.map_err(|e| LlmError::Parse(format!("Failed to encode request: {}", e)))
    }

    /// Deserialize a successful response body into the assistant's reply.
    pub fn decode(&self, body: &str) -> Result<ModelReply, LlmError> {
        match self {
            Dialect::Completion => {
                let resp: GenerateResponse =
                    serde_json::from_str(body).map_err(LlmError::from_serde)?;
                Ok(ModelReply {
                    message: ChatMessage::assistant(resp.response),
                })
            }
            Dialect::ChatTools => {
                let resp: ChatCompletionResponse =
                    serde_json::from_str(body).map_err(LlmError::from_serde)?;
                let choice = resp
                    .choices
                    .into_iter()
                    .next()
                    .ok_or_else(|| LlmError::Shape("Response contained no choices".to_string()))?;
                Ok(ModelReply {
                    message: choice.message,
                })
            }
        }
    }

    /// Minimal request used to check the endpoint is reachable.
    pub fn probe_body(&self, model: &str) -> Value {
        match self {
            Dialect::Completion => json!({
                "model": model,
                "prompt": PROBE_PROMPT,
                "stream": false,
            }),
            Dialect::ChatTools => json!({
                "model": model,
                "messages": [{"role": "user", "content": PROBE_PROMPT}],
                "max_tokens": PROBE_MAX_TOKENS,
            }),
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Join system and user text into one prompt, separated by a blank line.
fn flatten_prompt(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .filter(|m| matches!(m.role, Role::System | Role::User))
        .filter_map(|m| m.content.as_deref())
        .collect::<Vec<_>>()
        .join("\n\n")
}
