//! Scan command - try to decode every recognized asset under a directory

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use relic_formats::{AnyAsset, AssetKind, Episode};
use walkdir::WalkDir;

use crate::config::RelicConfig;

/// Arguments for the scan command
#[derive(Args)]
pub struct ScanArgs {
    /// Directory to walk
    pub dir: PathBuf,

    /// Client episode whose layout to use (ep4..ep8)
    #[arg(short, long)]
    pub episode: Option<Episode>,

    /// Only scan this format
    #[arg(long)]
    pub kind: Option<AssetKind>,
}

/// Execute the scan command
pub fn execute(args: ScanArgs, config: &RelicConfig) -> Result<()> {
    let version = config.version(args.episode);
    let mut decoded = 0usize;
    let mut failures = Vec::new();

    for entry in WalkDir::new(&args.dir).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(kind) = AssetKind::from_path(entry.path()) else {
            continue;
        };
        if args.kind.is_some_and(|k| k != kind) {
            continue;
        }

        match AnyAsset::read_file(entry.path(), kind, version) {
            Ok(asset) => {
                tracing::debug!("{}: {}", entry.path().display(), asset.summary());
                decoded += 1;
            }
            Err(e) => {
                println!("FAIL {}: {}", entry.path().display(), e);
                failures.push(entry.path().to_path_buf());
            }
        }
    }

    println!("{} decoded, {} failed", decoded, failures.len());
    if !failures.is_empty() {
        anyhow::bail!(
            "{} of {} assets failed to decode",
            failures.len(),
            decoded + failures.len()
        );
    }
    Ok(())
}
