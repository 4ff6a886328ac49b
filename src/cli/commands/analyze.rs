//! One-off document analysis from the command line.

use std::path::Path;
use std::sync::Arc;

use console::style;

use crate::analysis::{AnalysisRequest, Analyzer};
use crate::config::Settings;
use crate::extract::TextExtractor;
use crate::llm::LlmClient;

/// Extract and analyze a PDF, printing the verdict JSON to stdout.
pub async fn cmd_analyze(settings: Settings, file: &Path, context: &str) -> anyhow::Result<()> {
    let bytes = tokio::fs::read(file).await?;
    let min_chars = settings.server.min_text_chars;

    let extracted = tokio::task::spawn_blocking(move || {
        TextExtractor::new()
            .extract(&bytes)
            .and_then(|r| r.require_min_length(min_chars))
    })
    .await??;

    eprintln!(
        "{} Extracted {} characters via {}",
        style("→").cyan(),
        extracted.length,
        extracted.method
    );

    let client = LlmClient::new(settings.llm.clone())?;
    eprintln!(
        "{} Analyzing with {} ({})",
        style("→").cyan(),
        settings.llm.model,
        settings.llm.dialect()
    );

    let analyzer = Analyzer::new(Arc::new(client));
    let verdict = analyzer
        .analyze(&AnalysisRequest::new(context, extracted.text))
        .await;

    if let Some(error) = verdict.error() {
        eprintln!("{} {}", style("✗").red(), error);
    } else if verdict.is_fallback() {
        eprintln!(
            "{} Model output was not valid JSON",
            style("!").yellow()
        );
    }

    println!("{}", serde_json::to_string_pretty(&verdict)?);
    Ok(())
}
