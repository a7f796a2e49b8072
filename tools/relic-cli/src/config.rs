//! relic.toml parsing
//!
//! Every setting is optional; a missing file is the same as an empty one.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use relic_codec::Version;
use relic_formats::{AssetKind, Episode};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct RelicConfig {
    #[serde(default)]
    pub defaults: DefaultsSection,
    #[serde(default)]
    pub archive: ArchiveSection,
}

/// Fallbacks for `inspect`, `roundtrip` and `scan`
#[derive(Debug, Default, Deserialize)]
pub struct DefaultsSection {
    /// Client episode used to pick record layouts
    pub episode: Option<Episode>,
    /// Format assumed for files without a recognized extension
    pub kind: Option<AssetKind>,
}

/// Archive locations for `list` and `extract`
#[derive(Debug, Deserialize)]
pub struct ArchiveSection {
    pub sah: Option<PathBuf>,
    pub saf: Option<PathBuf>,
    pub output: Option<PathBuf>,
    #[serde(default = "default_skip_invalid_names")]
    pub skip_invalid_names: bool,
}

impl Default for ArchiveSection {
    fn default() -> Self {
        Self {
            sah: None,
            saf: None,
            output: None,
            skip_invalid_names: default_skip_invalid_names(),
        }
    }
}

fn default_skip_invalid_names() -> bool {
    true
}

impl RelicConfig {
    /// Load from `path`, or defaults when the file does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid config: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse relic.toml")
    }

    /// Layout version for a command; `Unknown` (every field) when no episode is set
    pub fn version(&self, episode: Option<Episode>) -> Version {
        episode
            .or(self.defaults.episode)
            .map(Version::from)
            .unwrap_or_default()
    }

    /// Asset kind from the flag, the file extension, then the configured default
    pub fn kind_for(&self, path: &Path, kind: Option<AssetKind>) -> Result<AssetKind> {
        kind.or_else(|| AssetKind::from_path(path))
            .or(self.defaults.kind)
            .with_context(|| {
                format!(
                    "Cannot tell the format of {} (use --kind or set defaults.kind)",
                    path.display()
                )
            })
    }

    pub fn sah_path(&self, flag: Option<PathBuf>) -> PathBuf {
        flag.or_else(|| self.archive.sah.clone())
            .unwrap_or_else(|| PathBuf::from("data.sah"))
    }

    /// SAF path: flag, config, then the SAH path with a `.saf` extension
    pub fn saf_path(&self, flag: Option<PathBuf>, sah: &Path) -> PathBuf {
        flag.or_else(|| self.archive.saf.clone())
            .unwrap_or_else(|| sah.with_extension("saf"))
    }

    pub fn output_dir(&self, flag: Option<PathBuf>) -> PathBuf {
        flag.or_else(|| self.archive.output.clone())
            .unwrap_or_else(|| PathBuf::from("extracted"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = RelicConfig::parse(
            r#"
[defaults]
episode = "ep6"
kind = "wld"

[archive]
sah = "client/data.sah"
output = "out"
skip_invalid_names = false
"#,
        )
        .unwrap();

        assert_eq!(config.defaults.episode, Some(Episode::Ep6));
        assert_eq!(config.defaults.kind, Some(AssetKind::Wld));
        assert!(!config.archive.skip_invalid_names);
        assert_eq!(config.sah_path(None), PathBuf::from("client/data.sah"));
        assert_eq!(
            config.saf_path(None, &config.sah_path(None)),
            PathBuf::from("client/data.saf")
        );
        assert_eq!(config.output_dir(Some("cli".into())), PathBuf::from("cli"));
    }

    #[test]
    fn test_empty_config_defaults() {
        let config = RelicConfig::parse("").unwrap();
        assert!(config.archive.skip_invalid_names);
        assert_eq!(config.version(None), Version::Unknown);
        assert_eq!(config.version(Some(Episode::Ep4)), Version::new(4));
        assert_eq!(config.sah_path(None), PathBuf::from("data.sah"));
    }

    #[test]
    fn test_flags_override_config() {
        let config = RelicConfig::parse("[defaults]\nepisode = \"ep5\"\nkind = \"ani\"\n").unwrap();
        assert_eq!(config.version(Some(Episode::Ep8)), Version::new(8));
        assert_eq!(config.version(None), Version::new(5));

        let kind = config
            .kind_for(Path::new("fx.seff"), None)
            .unwrap();
        assert_eq!(kind, AssetKind::Seff);
        let kind = config.kind_for(Path::new("blob.bin"), None).unwrap();
        assert_eq!(kind, AssetKind::Ani);
        let kind = config
            .kind_for(Path::new("fx.seff"), Some(AssetKind::Wld))
            .unwrap();
        assert_eq!(kind, AssetKind::Wld);
    }

    #[test]
    fn test_unknown_kind_without_default() {
        let config = RelicConfig::default();
        assert!(config.kind_for(Path::new("blob.bin"), None).is_err());
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = RelicConfig::load(&dir.path().join("relic.toml")).unwrap();
        assert!(config.defaults.episode.is_none());
    }

    #[test]
    fn test_bad_episode_rejected() {
        assert!(RelicConfig::parse("[defaults]\nepisode = \"ep12\"\n").is_err());
    }
}
