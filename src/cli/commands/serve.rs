//! Web server command.

use console::style;

use crate::config::{parse_bind_address, Settings};

/// Start the web server.
pub async fn cmd_serve(mut settings: Settings, bind: Option<&str>) -> anyhow::Result<()> {
    if let Some(bind) = bind {
        settings.server.bind_addr = parse_bind_address(bind).map_err(anyhow::Error::msg)?;
    }

    println!(
        "{} Starting analyzer at http://{}",
        style("→").cyan(),
        settings.server.bind_addr
    );
    println!(
        "  LLM: {} ({}, {})",
        style(&settings.llm.endpoint).dim(),
        settings.llm.model,
        settings.llm.dialect()
    );
    println!("  Press Ctrl+C to stop");

    crate::server::serve(settings).await
}
