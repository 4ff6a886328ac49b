//! ClauseGuard - flags risky clauses in legal documents.
//!
//! Extracts the text of an uploaded PDF, asks an LLM to review it against the
//! user's description, and returns a structured verdict. Works with Ollama's
//! completion API or any OpenAI-compatible chat endpoint that supports
//! function calling.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod extract;
pub mod llm;
pub mod server;
