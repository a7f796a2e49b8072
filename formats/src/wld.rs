//! WLD world region files (.wld)
//!
//! # Layout
//! ```text
//! kind          char[4]   "FLD" or "DUN", NUL padded
//! map_size      i32
//! region_count  i32
//! regions[]:
//!   name        char[32]  NUL-terminated
//!   bounds      vec3 min, vec3 max, f32 radius
//!   music       i32-prefixed ASCII, NUL-terminated   (ep5+)
//!   indoor      bool                                 (ep6+)
//! model_count   i32
//! models[]:
//!   name        u16-prefixed ASCII, stored with ".3do"
//!   position    vec3
//!   rotation    quat                                 (ep5+)
//!   scale       vec3                                 (ep8 only)
//! ```

use glam::{Quat, Vec3};
use relic_codec::{FieldSchema, PrimitiveType, Record, RecordSchema, SchemaCell, TextFormat, Version};
use serde::{Deserialize, Serialize};

use crate::asset::Asset;
use crate::common::Bounds;
use crate::episode::Episode;
use crate::error::Result;

/// Width of a region name, terminator included
pub const REGION_NAME_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Wld {
    /// `FLD` for open fields, `DUN` for dungeons
    pub kind: String,
    pub map_size: i32,
    pub regions: Vec<WldRegion>,
    pub models: Vec<WldModel>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WldRegion {
    pub name: String,
    pub bounds: Bounds,
    pub music: String,
    pub indoor: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WldModel {
    /// Model name without its `.3do` extension
    pub name: String,
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Wld {
    pub fn is_dungeon(&self) -> bool {
        self.kind == "DUN"
    }

    /// First region whose bounds contain `point`
    pub fn region_at(&self, point: Vec3) -> Option<&WldRegion> {
        self.regions.iter().find(|r| r.bounds.contains(point))
    }
}

impl Record for Wld {
    fn schema() -> relic_codec::Result<&'static RecordSchema<Self>> {
        static SCHEMA: SchemaCell<Wld> = SchemaCell::new();
        SCHEMA.get_or_define(|| {
            RecordSchema::define([
                FieldSchema::fixed_string(
                    "kind",
                    4,
                    TextFormat::ascii(),
                    |w: &Wld| &w.kind,
                    |w| &mut w.kind,
                ),
                FieldSchema::scalar("map_size", |w: &Wld| &w.map_size, |w| &mut w.map_size),
                FieldSchema::prefixed_list(
                    "regions",
                    PrimitiveType::I32,
                    |w: &Wld| &w.regions,
                    |w| &mut w.regions,
                ),
                FieldSchema::prefixed_list(
                    "models",
                    PrimitiveType::I32,
                    |w: &Wld| &w.models,
                    |w| &mut w.models,
                ),
            ])
        })
    }
}

impl Record for WldRegion {
    fn schema() -> relic_codec::Result<&'static RecordSchema<Self>> {
        static SCHEMA: SchemaCell<WldRegion> = SchemaCell::new();
        SCHEMA.get_or_define(|| {
            RecordSchema::define([
                FieldSchema::fixed_string(
                    "name",
                    REGION_NAME_LEN,
                    TextFormat::c_string(),
                    |r: &WldRegion| &r.name,
                    |r| &mut r.name,
                ),
                FieldSchema::composite("bounds", |r: &WldRegion| &r.bounds, |r| &mut r.bounds),
                FieldSchema::prefixed_string(
                    "music",
                    PrimitiveType::I32,
                    TextFormat::c_string(),
                    |r: &WldRegion| &r.music,
                    |r| &mut r.music,
                )
                .range(Episode::Ep5, Episode::Ep8),
                FieldSchema::scalar("indoor", |r: &WldRegion| &r.indoor, |r| &mut r.indoor)
                    .range(Episode::Ep6, Episode::Ep8),
            ])
        })
    }
}

impl Record for WldModel {
    fn schema() -> relic_codec::Result<&'static RecordSchema<Self>> {
        static SCHEMA: SchemaCell<WldModel> = SchemaCell::new();
        SCHEMA.get_or_define(|| {
            RecordSchema::define([
                FieldSchema::prefixed_string(
                    "name",
                    PrimitiveType::U16,
                    TextFormat::ascii(),
                    |m: &WldModel| &m.name,
                    |m| &mut m.name,
                )
                .with_suffix(".3do"),
                FieldSchema::composite("position", |m: &WldModel| &m.position, |m| {
                    &mut m.position
                }),
                FieldSchema::composite("rotation", |m: &WldModel| &m.rotation, |m| {
                    &mut m.rotation
                })
                .range(Episode::Ep5, Episode::Ep8),
                FieldSchema::composite("scale", |m: &WldModel| &m.scale, |m| &mut m.scale)
                    .exact(Episode::Ep8),
            ])
        })
    }
}

impl Asset for Wld {
    const EXTENSION: &'static str = "wld";

    fn from_bytes(bytes: &[u8], version: Version) -> Result<Self> {
        Ok(relic_codec::from_bytes(bytes, version)?)
    }

    fn to_bytes(&self, version: Version) -> Result<Vec<u8>> {
        Ok(relic_codec::encode(self, version)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_wld() -> Wld {
        Wld {
            kind: "FLD".to_string(),
            map_size: 2048,
            regions: vec![
                WldRegion {
                    name: "Keuraijen".to_string(),
                    bounds: Bounds::new(Vec3::ZERO, Vec3::new(512.0, 100.0, 512.0), 360.0),
                    music: "bgm_field01".to_string(),
                    indoor: false,
                },
                WldRegion {
                    name: "Crypt".to_string(),
                    bounds: Bounds::new(
                        Vec3::new(600.0, -50.0, 600.0),
                        Vec3::new(700.0, 0.0, 700.0),
                        70.0,
                    ),
                    music: "bgm_dungeon".to_string(),
                    indoor: true,
                },
            ],
            models: vec![WldModel {
                name: "tree_04".to_string(),
                position: Vec3::new(10.0, 0.0, 12.5),
                rotation: Quat::from_xyzw(0.0, 0.38268343, 0.0, 0.9238795),
                scale: Vec3::splat(1.5),
            }],
        }
    }

    #[test]
    fn test_wld_round_trip_ep8() {
        let wld = sample_wld();
        let bytes = wld.to_bytes(Episode::Ep8.into()).unwrap();
        assert_eq!(Wld::from_bytes(&bytes, Episode::Ep8.into()).unwrap(), wld);
    }

    #[test]
    fn test_wld_ep4_layout() {
        let wld = sample_wld();
        let bytes = wld.to_bytes(Episode::Ep4.into()).unwrap();

        // header + 2 regions of name and bounds + 1 model of name and position
        let model = 2 + "tree_04.3do".len() + 12;
        let expected = 4 + 4 + 4 + 2 * (REGION_NAME_LEN + Bounds::SIZE) + 4 + model;
        assert_eq!(bytes.len(), expected);
        assert_eq!(&bytes[0..4], b"FLD\0");

        let decoded = Wld::from_bytes(&bytes, Episode::Ep4.into()).unwrap();
        assert_eq!(decoded.regions[1].name, "Crypt");
        assert!(decoded.regions[1].music.is_empty());
        assert!(!decoded.regions[1].indoor);
        assert_eq!(decoded.models[0].rotation, Quat::IDENTITY);
        assert_eq!(decoded.models[0].scale, Vec3::ZERO);
    }

    #[test]
    fn test_wld_scale_only_in_ep8() {
        let wld = sample_wld();
        let ep7 = wld.to_bytes(Episode::Ep7.into()).unwrap();
        let ep8 = wld.to_bytes(Episode::Ep8.into()).unwrap();
        assert_eq!(ep8.len() - ep7.len(), 12);
    }

    #[test]
    fn test_wld_region_name_too_long() {
        let mut wld = sample_wld();
        wld.regions[0].name = "x".repeat(REGION_NAME_LEN);
        let err = wld.to_bytes(Episode::Ep5.into()).unwrap_err();
        assert!(err.to_string().starts_with("field `regions.0.name`"));
    }

    #[test]
    fn test_region_lookup() {
        let wld = sample_wld();
        assert_eq!(
            wld.region_at(Vec3::new(650.0, -10.0, 650.0)).map(|r| r.name.as_str()),
            Some("Crypt")
        );
        assert!(wld.region_at(Vec3::splat(-1.0)).is_none());
        assert!(!wld.is_dungeon());
    }
}
