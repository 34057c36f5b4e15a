// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// invoicescan: receipt photo normalization over HTTP or from the command line.
//
//   invoicescan serve --port 8000
//   invoicescan process --input receipt.jpg --output clean.png [--skip-crop] [--params tuned.json]

mod cli;
mod form;
mod response;
mod server;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use invoicescan_core::ServiceConfig;
use tracing::info;

#[derive(Parser)]
#[command(name = "invoicescan")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Crop, clean, and binarize photos of paper receipts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1", env = "INVOICESCAN_HOST")]
        host: String,

        /// Port to listen on
        #[arg(long, short, default_value = "8000", env = "INVOICESCAN_PORT")]
        port: u16,

        /// Largest accepted request body in bytes
        #[arg(long, default_value_t = ServiceConfig::default().max_upload_bytes)]
        max_upload_bytes: usize,

        /// Run the boundary detectors one after another
        #[arg(long)]
        sequential: bool,
    },
    /// Normalize a single photo and write the PNG
    Process {
        /// Photo to read
        #[arg(long, short)]
        input: PathBuf,

        /// Where to write the PNG
        #[arg(long, short)]
        output: PathBuf,

        /// Process the full frame without boundary detection
        #[arg(long)]
        skip_crop: bool,

        /// JSON file of enhancement parameters (selects the custom path)
        #[arg(long)]
        params: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            host,
            port,
            max_upload_bytes,
            sequential,
        } => {
            let config = ServiceConfig {
                host,
                port,
                max_upload_bytes,
                parallel_detection: !sequential,
            };
            info!("Starting server on {}:{}", config.host, config.port);
            server::run_server(config).await?;
        }
        Commands::Process {
            input,
            output,
            skip_crop,
            params,
        } => {
            let request = cli::request_from(params.as_deref(), skip_crop)?;
            let config = ServiceConfig::default();
            tokio::task::spawn_blocking(move || cli::process_file(&input, &output, request, &config))
                .await??;
        }
    }

    Ok(())
}
