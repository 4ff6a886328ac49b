//! LLM connectivity check.

use console::style;

use crate::config::Settings;
use crate::llm::{LlmClient, LlmTransport, ProbeStatus};

/// Probe the configured endpoint and report its status.
pub async fn cmd_health(settings: Settings) -> anyhow::Result<()> {
    let client = LlmClient::new(settings.llm)?;
    let status = client.probe().await;

    let marker = match status {
        ProbeStatus::Connected => style("✓").green(),
        ProbeStatus::Error(_) => style("!").yellow(),
        ProbeStatus::Disconnected => style("✗").red(),
    };
    println!("{} LLM API {}", marker, status);
    println!("  URL:     {}", client.config().endpoint);
    println!("  Model:   {}", client.config().model);
    println!("  Dialect: {}", client.dialect());

    if status != ProbeStatus::Connected {
        anyhow::bail!("LLM endpoint is not reachable");
    }
    Ok(())
}
