//! SEFF effect files (.seff)
//!
//! The file starts with its own format number, which decides the layout of
//! everything after it independently of the client episode.
//!
//! # Layout
//! ```text
//! format        i32
//! timestamp     u16 x 6 (year month day hour minute second)
//! record_count  i32
//! records[]:
//!   id            i32
//!   name          i32-prefixed ASCII, NUL-terminated
//!   effect_count  i32
//!   effects[]:
//!     kind        i32
//!     texture     i32-prefixed ASCII, stored with ".dds"
//!     start, end  f32
//!     position    vec3
//!     rotation    quat            (format 2+)
//!     scale       vec3
//!     color       u32 ARGB        (format 3+)
//!     looping     bool            (format 3+)
//! ```

use std::fmt;

use glam::{Quat, Vec3};
use relic_codec::{
    CompositeValue, Cursor, FieldSchema, Primitive, PrimitiveType, Record, RecordSchema, SchemaCell,
    TextFormat, Version,
};
use serde::{Deserialize, Serialize};

use crate::asset::Asset;
use crate::error::Result;

/// First format with per-effect rotation
pub const ROTATION_FORMAT: u16 = 2;
/// First format with color and looping flags
pub const COLOR_FORMAT: u16 = 3;

const LATEST_FORMAT: u16 = u16::MAX;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Seff {
    pub format: i32,
    pub timestamp: SeffTimestamp,
    pub records: Vec<SeffRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SeffTimestamp {
    pub year: u16,
    pub month: u16,
    pub day: u16,
    pub hour: u16,
    pub minute: u16,
    pub second: u16,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SeffRecord {
    pub id: i32,
    pub name: String,
    pub effects: Vec<SeffEffect>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SeffEffect {
    pub kind: i32,
    /// Texture name without its `.dds` extension
    pub texture: String,
    pub start: f32,
    pub end: f32,
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    pub color: u32,
    pub looping: bool,
}

impl Seff {
    /// Layout version carried by the file itself
    pub fn format_version(&self) -> Version {
        u16::try_from(self.format)
            .map(Version::new)
            .unwrap_or_default()
    }

    pub fn effect_count(&self) -> usize {
        self.records.iter().map(|r| r.effects.len()).sum()
    }

    pub fn record(&self, id: i32) -> Option<&SeffRecord> {
        self.records.iter().find(|r| r.id == id)
    }
}

impl fmt::Display for SeffTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

impl Record for Seff {
    fn schema() -> relic_codec::Result<&'static RecordSchema<Self>> {
        static SCHEMA: SchemaCell<Seff> = SchemaCell::new();
        SCHEMA.get_or_define(|| {
            RecordSchema::define([
                FieldSchema::scalar("format", |s: &Seff| &s.format, |s| &mut s.format)
                    .selects_version(Seff::format_version),
                FieldSchema::composite("timestamp", |s: &Seff| &s.timestamp, |s| {
                    &mut s.timestamp
                }),
                FieldSchema::prefixed_list(
                    "records",
                    PrimitiveType::I32,
                    |s: &Seff| &s.records,
                    |s| &mut s.records,
                ),
            ])
        })
    }
}

impl CompositeValue for SeffTimestamp {
    fn decode_self(cursor: &mut Cursor<'_>) -> relic_codec::Result<Self> {
        Ok(Self {
            year: u16::decode(cursor)?,
            month: u16::decode(cursor)?,
            day: u16::decode(cursor)?,
            hour: u16::decode(cursor)?,
            minute: u16::decode(cursor)?,
            second: u16::decode(cursor)?,
        })
    }

    fn encode_self(&self, out: &mut Vec<u8>) -> relic_codec::Result<()> {
        for part in [self.year, self.month, self.day, self.hour, self.minute, self.second] {
            part.encode(out);
        }
        Ok(())
    }
}

impl Record for SeffRecord {
    fn schema() -> relic_codec::Result<&'static RecordSchema<Self>> {
        static SCHEMA: SchemaCell<SeffRecord> = SchemaCell::new();
        SCHEMA.get_or_define(|| {
            RecordSchema::define([
                FieldSchema::scalar("id", |r: &SeffRecord| &r.id, |r| &mut r.id),
                FieldSchema::prefixed_string(
                    "name",
                    PrimitiveType::I32,
                    TextFormat::c_string(),
                    |r: &SeffRecord| &r.name,
                    |r| &mut r.name,
                ),
                FieldSchema::prefixed_list(
                    "effects",
                    PrimitiveType::I32,
                    |r: &SeffRecord| &r.effects,
                    |r| &mut r.effects,
                ),
            ])
        })
    }
}

impl Record for SeffEffect {
    fn schema() -> relic_codec::Result<&'static RecordSchema<Self>> {
        static SCHEMA: SchemaCell<SeffEffect> = SchemaCell::new();
        SCHEMA.get_or_define(|| {
            RecordSchema::define([
                FieldSchema::scalar("kind", |e: &SeffEffect| &e.kind, |e| &mut e.kind),
                FieldSchema::prefixed_string(
                    "texture",
                    PrimitiveType::I32,
                    TextFormat::ascii(),
                    |e: &SeffEffect| &e.texture,
                    |e| &mut e.texture,
                )
                .with_suffix(".dds"),
                FieldSchema::scalar("start", |e: &SeffEffect| &e.start, |e| &mut e.start),
                FieldSchema::scalar("end", |e: &SeffEffect| &e.end, |e| &mut e.end),
                FieldSchema::composite("position", |e: &SeffEffect| &e.position, |e| {
                    &mut e.position
                }),
                FieldSchema::composite("rotation", |e: &SeffEffect| &e.rotation, |e| {
                    &mut e.rotation
                })
                .range(ROTATION_FORMAT, LATEST_FORMAT),
                FieldSchema::composite("scale", |e: &SeffEffect| &e.scale, |e| &mut e.scale),
                FieldSchema::scalar("color", |e: &SeffEffect| &e.color, |e| &mut e.color)
                    .range(COLOR_FORMAT, LATEST_FORMAT),
                FieldSchema::scalar("looping", |e: &SeffEffect| &e.looping, |e| {
                    &mut e.looping
                })
                .range(COLOR_FORMAT, LATEST_FORMAT),
            ])
        })
    }
}

impl Asset for Seff {
    const EXTENSION: &'static str = "seff";

    /// `version` only matters when the stored format number is unusable
    fn from_bytes(bytes: &[u8], version: Version) -> Result<Self> {
        Ok(relic_codec::from_bytes(bytes, version)?)
    }

    fn to_bytes(&self, version: Version) -> Result<Vec<u8>> {
        Ok(relic_codec::encode(self, version)?)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_seff(format: i32) -> Seff {
        Seff {
            format,
            timestamp: SeffTimestamp {
                year: 2011,
                month: 3,
                day: 14,
                hour: 9,
                minute: 30,
                second: 0,
            },
            records: vec![SeffRecord {
                id: 101,
                name: "HitSpark".to_string(),
                effects: vec![
                    SeffEffect {
                        kind: 1,
                        texture: "spark_01".to_string(),
                        start: 0.0,
                        end: 0.5,
                        position: Vec3::new(0.0, 1.0, 0.0),
                        scale: Vec3::ONE,
                        ..Default::default()
                    },
                    SeffEffect {
                        kind: 2,
                        texture: "ring".to_string(),
                        start: 0.25,
                        end: 1.0,
                        position: Vec3::ZERO,
                        scale: Vec3::splat(2.0),
                        ..Default::default()
                    },
                ],
            }],
        }
    }

    /// Sets the fields that later formats add
    fn upgrade(seff: &mut Seff) {
        for effect in seff.records.iter_mut().flat_map(|r| r.effects.iter_mut()) {
            effect.rotation = Quat::from_xyzw(0.0, 0.0, 0.6, 0.8);
            effect.color = 0xFF80_40C0;
            effect.looping = true;
        }
    }

    #[test]
    fn test_seff_format_selects_layout() {
        let mut seff = sample_seff(1);
        upgrade(&mut seff);

        let v1 = seff.to_bytes(Version::Unknown).unwrap();
        seff.format = 2;
        let v2 = seff.to_bytes(Version::Unknown).unwrap();
        seff.format = 3;
        let v3 = seff.to_bytes(Version::Unknown).unwrap();

        // Two effects: +16 bytes of rotation each, then +5 bytes of color/looping each
        assert_eq!(v2.len() - v1.len(), 2 * 16);
        assert_eq!(v3.len() - v2.len(), 2 * 5);
    }

    #[test]
    fn test_seff_older_format_drops_newer_fields() {
        let mut seff = sample_seff(2);
        upgrade(&mut seff);
        let bytes = seff.to_bytes(Version::Unknown).unwrap();

        let decoded = Seff::from_bytes(&bytes, Version::Unknown).unwrap();
        let effect = &decoded.records[0].effects[0];
        assert_eq!(effect.rotation, Quat::from_xyzw(0.0, 0.0, 0.6, 0.8));
        assert_eq!(effect.color, 0);
        assert!(!effect.looping);
    }

    #[test]
    fn test_seff_round_trip_latest() {
        let mut seff = sample_seff(3);
        upgrade(&mut seff);
        let bytes = seff.to_bytes(Version::Unknown).unwrap();
        assert_eq!(Seff::from_bytes(&bytes, Version::Unknown).unwrap(), seff);
        assert_eq!(seff.effect_count(), 2);
        assert_eq!(seff.record(101).map(|r| r.name.as_str()), Some("HitSpark"));
    }

    #[test]
    fn test_seff_header_bytes() {
        let bytes = sample_seff(1).to_bytes(Version::Unknown).unwrap();
        assert_eq!(&bytes[0..4], &[1, 0, 0, 0]);
        // 2011 = 0x07DB
        assert_eq!(&bytes[4..6], &[0xDB, 0x07]);
        // One record
        assert_eq!(&bytes[16..20], &[1, 0, 0, 0]);
        assert_eq!(sample_seff(1).timestamp.to_string(), "2011-03-14 09:30:00");
    }

    #[test]
    fn test_seff_texture_stored_with_extension() {
        let bytes = sample_seff(1).to_bytes(Version::Unknown).unwrap();
        let needle = b"\x0C\x00\x00\x00spark_01.dds";
        assert!(bytes.windows(needle.len()).any(|w| w == needle));

        let decoded = Seff::from_bytes(&bytes, Version::Unknown).unwrap();
        assert_eq!(decoded.records[0].effects[0].texture, "spark_01");
    }

    #[test]
    fn test_seff_negative_format_falls_back_to_requested_version() {
        let mut seff = sample_seff(-1);
        upgrade(&mut seff);
        // Only rotation is present at format 2
        let bytes = seff.to_bytes(Version::new(ROTATION_FORMAT)).unwrap();
        let decoded = Seff::from_bytes(&bytes, Version::new(ROTATION_FORMAT)).unwrap();
        assert_eq!(decoded.records[0].effects[0].rotation, seff.records[0].effects[0].rotation);
        assert_eq!(decoded.records[0].effects[0].color, 0);
    }
}
