//! Relic formats: versioned client asset files described with `relic-codec`
//!
//! | Format | Type | Version source |
//! |--------|------|----------------|
//! | `.ani` animation clips | [`Ani`] | client [`Episode`] |
//! | `.seff` effect files | [`Seff`] | leading format number |
//! | `.wld` world regions | [`Wld`] | client [`Episode`] |
//! | `.sah` archive index | [`Sah`] | none |
//!
//! `.saf` data files are read through [`SafReader`] using a parsed [`Sah`].

pub mod ani;
pub mod asset;
pub mod common;
pub mod episode;
pub mod error;
pub mod saf;
pub mod sah;
pub mod seff;
pub mod wld;

pub use ani::{Ani, AniBone, RotationFrame, TranslationFrame};
pub use asset::{AnyAsset, Asset, AssetKind};
pub use common::{Bounds, RawBytes};
pub use episode::Episode;
pub use error::{FormatError, Result};
pub use saf::{ExtractOptions, ExtractReport, SafReader, is_valid_name};
pub use sah::{Sah, SahEntry, SahFile, SahFolder, SahHeader};
pub use seff::{Seff, SeffEffect, SeffRecord, SeffTimestamp};
pub use wld::{Wld, WldModel, WldRegion};
