//! Inspect command - decode one asset and describe it

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use relic_formats::{AnyAsset, AssetKind, Episode};

use crate::config::RelicConfig;

/// Arguments for the inspect command
#[derive(Args)]
pub struct InspectArgs {
    /// Asset file (.ani, .seff, .wld, .sah)
    pub file: PathBuf,

    /// Format, when the extension does not say
    #[arg(long)]
    pub kind: Option<AssetKind>,

    /// Client episode whose layout to use (ep4..ep8)
    #[arg(short, long)]
    pub episode: Option<Episode>,

    /// Print the decoded asset as JSON
    #[arg(long)]
    pub json: bool,
}

/// Execute the inspect command
pub fn execute(args: InspectArgs, config: &RelicConfig) -> Result<()> {
    let kind = config.kind_for(&args.file, args.kind)?;
    let version = config.version(args.episode);

    let bytes = std::fs::read(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let asset = AnyAsset::decode(kind, &bytes, version)
        .with_context(|| format!("Failed to decode {} as {}", args.file.display(), kind))?;

    if args.json {
        println!("{}", asset.to_json()?);
        return Ok(());
    }

    println!("=== {} ===", args.file.display());
    println!("  Kind:    {}", kind);
    println!("  Version: {}", version);
    println!("  Size:    {} bytes", bytes.len());
    println!("  {}", asset.summary());
    Ok(())
}
