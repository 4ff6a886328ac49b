//! Text extraction command.

use std::path::Path;

use console::style;

use crate::config::Settings;
use crate::extract::TextExtractor;

/// Print a PDF's extracted text and the strategy that produced it.
pub async fn cmd_extract(settings: &Settings, file: &Path) -> anyhow::Result<()> {
    let bytes = tokio::fs::read(file).await?;

    let extracted =
        tokio::task::spawn_blocking(move || TextExtractor::new().extract(&bytes)).await??;

    eprintln!(
        "{} {} pages, {} characters via {}",
        style("✓").green(),
        extracted.page_count,
        extracted.length,
        style(extracted.method).cyan()
    );
    if extracted.length < settings.server.min_text_chars {
        eprintln!(
            "  {} below the {} character minimum; the server would reject this document",
            style("!").yellow(),
            settings.server.min_text_chars
        );
    }

    println!("{}", extracted.text);
    Ok(())
}
