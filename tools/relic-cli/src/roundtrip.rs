//! Roundtrip command - verify that decode followed by encode is lossless

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use relic_formats::{AnyAsset, AssetKind, Episode};

use crate::config::RelicConfig;

/// Arguments for the roundtrip command
#[derive(Args)]
pub struct RoundtripArgs {
    /// Asset file to verify
    pub file: PathBuf,

    /// Format, when the extension does not say
    #[arg(long)]
    pub kind: Option<AssetKind>,

    /// Client episode whose layout to use (ep4..ep8)
    #[arg(short, long)]
    pub episode: Option<Episode>,

    /// Write the re-encoded bytes here
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Execute the roundtrip command
pub fn execute(args: RoundtripArgs, config: &RelicConfig) -> Result<()> {
    let kind = config.kind_for(&args.file, args.kind)?;
    let version = config.version(args.episode);

    let original = std::fs::read(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let asset = AnyAsset::decode(kind, &original, version)
        .with_context(|| format!("Failed to decode {}", args.file.display()))?;
    let encoded = asset
        .encode(version)
        .with_context(|| format!("Failed to re-encode {}", args.file.display()))?;

    if let Some(output) = &args.output {
        std::fs::write(output, &encoded)
            .with_context(|| format!("Failed to write {}", output.display()))?;
        tracing::info!("Wrote {} bytes to {}", encoded.len(), output.display());
    }

    if let Some(offset) = first_difference(&original, &encoded) {
        anyhow::bail!(
            "{}: re-encoded bytes differ at offset {} (original {} bytes, re-encoded {} bytes)",
            args.file.display(),
            offset,
            original.len(),
            encoded.len()
        );
    }

    println!("OK {} ({} bytes)", args.file.display(), original.len());
    Ok(())
}

/// Offset of the first mismatching byte, or the shorter length if one is a prefix of the other
fn first_difference(a: &[u8], b: &[u8]) -> Option<usize> {
    a.iter()
        .zip(b)
        .position(|(x, y)| x != y)
        .or_else(|| (a.len() != b.len()).then(|| a.len().min(b.len())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_difference() {
        assert_eq!(first_difference(b"abc", b"abc"), None);
        assert_eq!(first_difference(b"abc", b"abd"), Some(2));
        assert_eq!(first_difference(b"abc", b"abcd"), Some(3));
        assert_eq!(first_difference(b"", b"x"), Some(0));
    }
}
