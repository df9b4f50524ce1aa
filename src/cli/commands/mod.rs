//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific
//! modules.

mod batch;
mod ocr;
mod serve;
mod status;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::load_settings;

#[derive(Parser)]
#[command(name = "ocrelay")]
#[command(about = "Relay and upload console for a remote OCR engine")]
#[command(version)]
pub struct Cli {
    /// Config file path (defaults to ocrelay.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// OCR engine base address (overrides config file)
    #[arg(long, global = true, env = "OCRELAY_ENGINE_URL")]
    engine_url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web upload console
    Serve {
        /// Bind address: port, host, or host:port
        #[arg(short, long, default_value = "3030")]
        bind: String,
    },

    /// Extract text from one image file or URL
    Ocr {
        /// Image path or http(s) URL
        input: String,
        /// Comma-separated language codes
        #[arg(short, long)]
        langs: Option<String>,
        /// Print per-line bounding boxes as well
        #[arg(long)]
        details: bool,
    },

    /// Process every image in a directory, one at a time
    Batch {
        /// Directory containing images
        dir: PathBuf,
        /// Comma-separated language codes
        #[arg(short, long)]
        langs: Option<String>,
        /// Directory for extracted text files (defaults to the input dir)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show engine address and device report
    Status,
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = load_settings(cli.config.as_deref())?;
    if let Some(url) = cli.engine_url {
        settings.engine_url = url;
    }

    match cli.command {
        Commands::Serve { bind } => serve::cmd_serve(&settings, &bind).await,
        Commands::Ocr {
            input,
            langs,
            details,
        } => ocr::cmd_ocr(&settings, &input, langs.as_deref(), details).await,
        Commands::Batch { dir, langs, output } => {
            batch::cmd_batch(&settings, &dir, langs.as_deref(), output.as_deref()).await
        }
        Commands::Status => status::cmd_status(&settings).await,
    }
}
