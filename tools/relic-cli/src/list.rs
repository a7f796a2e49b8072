//! List command - print the contents of a SAH archive index

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use relic_codec::Version;
use relic_formats::{Asset, Sah};

use crate::config::RelicConfig;

/// Arguments for the list command
#[derive(Args)]
pub struct ListArgs {
    /// Archive index (defaults to archive.sah from relic.toml, then data.sah)
    pub sah: Option<PathBuf>,

    /// Only list paths containing this text (case-insensitive)
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Print entries as JSON
    #[arg(long)]
    pub json: bool,
}

/// Execute the list command
pub fn execute(args: ListArgs, config: &RelicConfig) -> Result<()> {
    let sah_path = config.sah_path(args.sah);
    let sah = Sah::read_file(&sah_path, Version::Unknown)
        .with_context(|| format!("Failed to read archive index {}", sah_path.display()))?;

    let filter = args.filter.map(|f| f.to_ascii_lowercase());
    let entries: Vec<_> = sah
        .entries()
        .into_iter()
        .filter(|e| {
            filter
                .as_ref()
                .is_none_or(|f| e.path.to_ascii_lowercase().contains(f.as_str()))
        })
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    for entry in &entries {
        println!("{:>12} {:>10}  {}", entry.offset, entry.length, entry.path);
    }
    let total: u64 = entries.iter().map(|e| u64::from(e.length)).sum();
    println!("{} files, {} bytes", entries.len(), total);
    Ok(())
}
