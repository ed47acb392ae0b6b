//! sitemap-validator CLI entry point

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use sitemap_validator::{
    commands::{cmd_check, cmd_config, print_check_report, print_config, CheckOptions},
    config::Config,
    error::Result,
    progress::LogWriterFactory,
};
use std::path::{Path, PathBuf};
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "sitemap-validator")]
#[command(version, about = "Validate and score XML sitemaps", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a sitemap and print its score, issues and recommendations
    Check {
        /// Sitemap URL (http or https)
        url: String,

        /// Number of sitemap URLs to probe
        #[arg(short, long)]
        samples: Option<usize>,

        /// Per-request timeout in seconds
        #[arg(short, long)]
        timeout: Option<u64>,

        /// Do not verify TLS certificates
        #[arg(long)]
        insecure: bool,
    },

    /// Show the effective configuration
    Config {
        /// Write the effective configuration to the config path
        #[arg(long)]
        save: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(LogWriterFactory::default()))
        .with(filter)
        .init();

    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "sitemap-validator", &mut std::io::stdout());
        return Ok(());
    }

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Check {
            url,
            samples,
            timeout,
            insecure,
        } => {
            let options = CheckOptions {
                samples,
                timeout,
                insecure,
                show_progress: !cli.json,
            };

            let report = cmd_check(&config, &url, options).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_check_report(&report);
            }
        }

        Commands::Config { save } => {
            let rendered = cmd_config(&config, save)?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                print_config(&config, &rendered, save);
            }
        }

        Commands::Completions { .. } => unreachable!(),
    }

    Ok(())
}

/// An explicit path must exist; the default location falls back to defaults
fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path),
        None => Config::load_from(None),
    }
}
