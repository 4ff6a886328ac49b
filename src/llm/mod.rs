//! LLM transport for document analysis.
//!
//! Speaks either the Ollama completion API or an OpenAI-compatible chat API
//! with function calling. The dialect follows from the endpoint URL.

mod client;
mod config;
mod dialect;
mod error;
mod message;

pub use client::{backoff_delay, LlmClient, LlmTransport, ProbeStatus};
pub use config::LlmConfig;
pub use dialect::Dialect;
pub use error::LlmError;
pub use message::{
    ChatMessage, FunctionCall, FunctionSpec, ModelReply, ModelRequest, Role, ToolCall, ToolSpec,
};
