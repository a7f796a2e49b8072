//! Relic CLI - inspect, verify and extract versioned game asset files
//!
//! # Commands
//!
//! - `relic inspect <file>` - Decode an asset and print a summary (or JSON)
//! - `relic roundtrip <file>` - Decode, re-encode and compare with the original bytes
//! - `relic list [sah]` - List every file in an archive index
//! - `relic extract` - Extract files from a SAH/SAF archive pair
//! - `relic scan <dir>` - Decode every recognized asset under a directory
//!
//! # Configuration (relic.toml)
//!
//! ```toml
//! [defaults]
//! episode = "ep5"
//! kind = "ani"
//!
//! [archive]
//! sah = "data.sah"
//! saf = "data.saf"
//! output = "extracted"
//! skip_invalid_names = true
//! ```
//!
//! Command-line flags override the file.

mod config;
mod extract;
mod inspect;
mod list;
mod roundtrip;
mod scan;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use config::RelicConfig;

/// Relic - versioned game asset toolkit
#[derive(Parser)]
#[command(name = "relic")]
#[command(about = "Inspect, verify and extract versioned game asset files")]
#[command(version)]
struct Cli {
    /// Path to relic.toml (missing file means defaults)
    #[arg(long, global = true, default_value = "relic.toml")]
    config: PathBuf,

    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode an asset and print a summary
    Inspect(inspect::InspectArgs),

    /// Decode, re-encode and compare with the original bytes
    Roundtrip(roundtrip::RoundtripArgs),

    /// List every file in an archive index
    List(list::ListArgs),

    /// Extract files from a SAH/SAF archive pair
    Extract(extract::ExtractArgs),

    /// Decode every recognized asset under a directory
    Scan(scan::ScanArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    // Logs go to stderr so command output stays machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();

    let config = RelicConfig::load(&cli.config)?;

    match cli.command {
        Commands::Inspect(args) => inspect::execute(args, &config),
        Commands::Roundtrip(args) => roundtrip::execute(args, &config),
        Commands::List(args) => list::execute(args, &config),
        Commands::Extract(args) => extract::execute(args, &config),
        Commands::Scan(args) => scan::execute(args, &config),
    }
}
