//! # vaultpress CLI
//!
//! Command-line interface for the vaultpress content pipeline.

mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "vaultpress")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "vaultpress.yml", env = "VAULTPRESS_CONFIG")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render every document and write JSON artifacts to the output directory
    Build,

    /// Print the redirect table written by `build` (aliases, manifest and frontmatter redirects)
    Redirects {
        /// Print orphaned redirects instead of servable ones
        #[arg(long)]
        orphaned: bool,

        #[arg(long, value_enum, default_value_t = RedirectFormat::Json)]
        format: RedirectFormat,
    },

    /// Check aliases, redirects and documents, and report diagnostics
    Audit {
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Print the route table (`route -> content path`)
    Paths {
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Render a single document to JSON on stdout
    Render {
        /// Source file, relative to the content directory
        path: String,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum RedirectFormat {
    Json,
    Nginx,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(if cli.verbose {
                tracing::Level::DEBUG.into()
            } else {
                tracing::Level::INFO.into()
            }),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Build => commands::build_site(&cli.config),
        Commands::Redirects { orphaned, format } => {
            commands::print_redirects(&cli.config, orphaned, format)
        }
        Commands::Audit { json } => commands::audit_site(&cli.config, json),
        Commands::Paths { json } => commands::print_paths(&cli.config, json),
        Commands::Render { path } => commands::render_document(&cli.config, &path),
    }
}
