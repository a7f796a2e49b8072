//! The [`Asset`] trait and kind-erased dispatch over all supported formats

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use relic_codec::Version;
use serde::Serialize;

use crate::ani::Ani;
use crate::error::{FormatError, Result};
use crate::sah::Sah;
use crate::seff::Seff;
use crate::wld::Wld;

/// A file format that can be read from and written to bytes
pub trait Asset: Sized + Serialize {
    /// File extension, lowercase, without the dot
    const EXTENSION: &'static str;

    fn from_bytes(bytes: &[u8], version: Version) -> Result<Self>;

    fn to_bytes(&self, version: Version) -> Result<Vec<u8>>;

    fn read_file(path: impl AsRef<Path>, version: Version) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        tracing::debug!(path = %path.as_ref().display(), bytes = bytes.len(), "read asset");
        Self::from_bytes(&bytes, version)
    }

    fn write_file(&self, path: impl AsRef<Path>, version: Version) -> Result<()> {
        let bytes = self.to_bytes(version)?;
        std::fs::write(path.as_ref(), &bytes)?;
        tracing::debug!(path = %path.as_ref().display(), bytes = bytes.len(), "wrote asset");
        Ok(())
    }

    fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Supported formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Ani,
    Seff,
    Wld,
    Sah,
}

impl AssetKind {
    pub const ALL: [AssetKind; 4] = [AssetKind::Ani, AssetKind::Seff, AssetKind::Wld, AssetKind::Sah];

    pub fn extension(self) -> &'static str {
        match self {
            AssetKind::Ani => Ani::EXTENSION,
            AssetKind::Seff => Seff::EXTENSION,
            AssetKind::Wld => Wld::EXTENSION,
            AssetKind::Sah => Sah::EXTENSION,
        }
    }

    /// Detect the kind from a file extension (case-insensitive)
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?;
        Self::ALL
            .into_iter()
            .find(|kind| kind.extension().eq_ignore_ascii_case(ext))
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for AssetKind {
    type Err = FormatError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim().trim_start_matches('.');
        Self::ALL
            .into_iter()
            .find(|kind| kind.extension().eq_ignore_ascii_case(s))
            .ok_or_else(|| FormatError::UnknownKind(s.to_string()))
    }
}

/// A decoded asset of any supported kind
#[derive(Debug, Serialize)]
#[serde(tag = "kind", content = "asset", rename_all = "lowercase")]
pub enum AnyAsset {
    Ani(Ani),
    Seff(Seff),
    Wld(Wld),
    Sah(Sah),
}

impl AnyAsset {
    pub fn decode(kind: AssetKind, bytes: &[u8], version: Version) -> Result<Self> {
        Ok(match kind {
            AssetKind::Ani => AnyAsset::Ani(Ani::from_bytes(bytes, version)?),
            AssetKind::Seff => AnyAsset::Seff(Seff::from_bytes(bytes, version)?),
            AssetKind::Wld => AnyAsset::Wld(Wld::from_bytes(bytes, version)?),
            AssetKind::Sah => AnyAsset::Sah(Sah::from_bytes(bytes, version)?),
        })
    }

    pub fn read_file(path: impl AsRef<Path>, kind: AssetKind, version: Version) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::decode(kind, &bytes, version)
    }

    pub fn encode(&self, version: Version) -> Result<Vec<u8>> {
        match self {
            AnyAsset::Ani(a) => a.to_bytes(version),
            AnyAsset::Seff(s) => s.to_bytes(version),
            AnyAsset::Wld(w) => w.to_bytes(version),
            AnyAsset::Sah(s) => s.to_bytes(version),
        }
    }

    pub fn kind(&self) -> AssetKind {
        match self {
            AnyAsset::Ani(_) => AssetKind::Ani,
            AnyAsset::Seff(_) => AssetKind::Seff,
            AnyAsset::Wld(_) => AssetKind::Wld,
            AnyAsset::Sah(_) => AssetKind::Sah,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// One-line description for listings
    pub fn summary(&self) -> String {
        match self {
            AnyAsset::Ani(a) => format!(
                "{} bones, keyframes {}..={}",
                a.bones.len(),
                a.start_keyframe,
                a.end_keyframe
            ),
            AnyAsset::Seff(s) => format!(
                "format {}, {} records, {} effects",
                s.format,
                s.records.len(),
                s.effect_count()
            ),
            AnyAsset::Wld(w) => format!(
                "{} world, size {}, {} regions, {} models",
                w.kind,
                w.map_size,
                w.regions.len(),
                w.models.len()
            ),
            AnyAsset::Sah(s) => format!("{} files in {} folders", s.file_count(), s.folder_count()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_path() {
        assert_eq!(AssetKind::from_path("data/Char.ANI"), Some(AssetKind::Ani));
        assert_eq!(AssetKind::from_path("fx/hit.seff"), Some(AssetKind::Seff));
        assert_eq!(AssetKind::from_path("world/2.wld"), Some(AssetKind::Wld));
        assert_eq!(AssetKind::from_path("data.sah"), Some(AssetKind::Sah));
        assert_eq!(AssetKind::from_path("readme.txt"), None);
        assert_eq!(AssetKind::from_path("noext"), None);
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!(".seff".parse::<AssetKind>().unwrap(), AssetKind::Seff);
        assert_eq!("WLD".parse::<AssetKind>().unwrap(), AssetKind::Wld);
        assert!(matches!(
            "3do".parse::<AssetKind>(),
            Err(FormatError::UnknownKind(_))
        ));
    }

    #[test]
    fn test_any_asset_round_trip() {
        let seff = crate::seff::tests::sample_seff(2);
        let bytes = seff.to_bytes(Version::Unknown).unwrap();

        let any = AnyAsset::decode(AssetKind::Seff, &bytes, Version::Unknown).unwrap();
        assert_eq!(any.kind(), AssetKind::Seff);
        assert_eq!(any.encode(Version::Unknown).unwrap(), bytes);
        assert!(any.summary().starts_with("format 2"));

        let json = any.to_json().unwrap();
        assert!(json.contains("\"kind\": \"seff\""));
    }
}
