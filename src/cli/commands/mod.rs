//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod analyze;
mod extract;
mod health;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Settings;

#[derive(Parser)]
#[command(name = "clauseguard")]
#[command(about = "Flag risky clauses in legal documents using an LLM")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// LLM endpoint (overrides LLM_API_URL)
    #[arg(long, global = true, env = "LLM_API_URL", hide_env_values = true)]
    llm_url: Option<String>,

    /// Model name (overrides LLM_MODEL)
    #[arg(long, global = true, env = "LLM_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Address to bind (PORT, HOST, or HOST:PORT; defaults to BIND_ADDR)
        bind: Option<String>,
    },

    /// Analyze a PDF and print the verdict as JSON
    Analyze {
        /// PDF file to analyze
        file: PathBuf,
        /// What the document is supposed to be
        #[arg(short, long, default_value = "")]
        context: String,
    },

    /// Print the text extracted from a PDF
    Extract {
        /// PDF file to read
        file: PathBuf,
    },

    /// Check connectivity to the configured LLM endpoint
    Health,
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::from_env();
    if let Some(url) = cli.llm_url {
        settings.llm.endpoint = url;
    }
    if let Some(model) = cli.model {
        settings.llm.model = model;
    }

    match cli.command {
        Commands::Serve { bind } => serve::cmd_serve(settings, bind.as_deref()).await,
        Commands::Analyze { file, context } => {
            analyze::cmd_analyze(settings, &file, &context).await
        }
        Commands::Extract { file } => extract::cmd_extract(&settings, &file).await,
        Commands::Health => health::cmd_health(settings).await,
    }
}
