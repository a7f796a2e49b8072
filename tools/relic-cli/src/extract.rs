//! Extract command - copy files out of a SAH/SAF archive pair

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use relic_codec::Version;
use relic_formats::{Asset, ExtractOptions, SafReader, Sah};

use crate::config::RelicConfig;

/// Arguments for the extract command
#[derive(Args)]
pub struct ExtractArgs {
    /// Archive index (defaults to archive.sah from relic.toml, then data.sah)
    #[arg(long)]
    pub sah: Option<PathBuf>,

    /// Data file (defaults to archive.saf, then the index path with .saf)
    #[arg(long)]
    pub saf: Option<PathBuf>,

    /// Output directory (defaults to archive.output, then ./extracted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Extract only this archive path
    #[arg(short, long)]
    pub file: Option<String>,

    /// Fail on entries with invalid names instead of skipping them
    #[arg(long)]
    pub strict: bool,
}

/// Execute the extract command
pub fn execute(args: ExtractArgs, config: &RelicConfig) -> Result<()> {
    let sah_path = config.sah_path(args.sah);
    let saf_path = config.saf_path(args.saf, &sah_path);
    let output = config.output_dir(args.output);

    let sah = Sah::read_file(&sah_path, Version::Unknown)
        .with_context(|| format!("Failed to read archive index {}", sah_path.display()))?;
    let mut reader = SafReader::open(&saf_path)
        .with_context(|| format!("Failed to open data file {}", saf_path.display()))?;

    if let Some(path) = &args.file {
        let entry = sah
            .find(path)
            .with_context(|| format!("{} is not in {}", path, sah_path.display()))?;
        let dir = match Path::new(&entry.path).parent() {
            Some(parent) => output.join(parent),
            None => output.clone(),
        };
        let written = reader.extract_file(entry, &dir)?;
        println!("Extracted {}", written.display());
        return Ok(());
    }

    let options = ExtractOptions {
        skip_invalid_names: config.archive.skip_invalid_names && !args.strict,
    };
    tracing::info!("Extracting {} -> {}", saf_path.display(), output.display());
    let report = reader
        .extract_all(&sah, &output, options)
        .with_context(|| format!("Failed to extract {}", saf_path.display()))?;

    for skipped in &report.skipped {
        println!("Skipped {}", skipped);
    }
    println!(
        "Extracted {} files in {} folders ({} bytes, {} skipped)",
        report.files,
        report.folders,
        report.bytes,
        report.skipped.len()
    );
    Ok(())
}
