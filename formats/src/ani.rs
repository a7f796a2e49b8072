//! ANI skeletal animation clips (.ani)
//!
//! # Layout
//! ```text
//! start_keyframe  i32
//! end_keyframe    i32
//! bone_count      i32
//! bones[bone_count]:
//!   parent            i32      (-1 for the root)
//!   name              i32-prefixed ASCII, NUL-terminated    (ep6+)
//!   rotation_count    i32
//!   rotations[]       keyframe i32, quat xyzw f32 x 4
//!   translation_count i32
//!   translations[]    keyframe i32, vec3 f32 x 3
//! ```

use glam::{Quat, Vec3};
use relic_codec::{FieldSchema, PrimitiveType, Record, RecordSchema, SchemaCell, TextFormat, Version};
use serde::{Deserialize, Serialize};

use crate::asset::Asset;
use crate::episode::Episode;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Ani {
    pub start_keyframe: i32,
    pub end_keyframe: i32,
    pub bones: Vec<AniBone>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AniBone {
    pub parent: i32,
    pub name: String,
    pub rotations: Vec<RotationFrame>,
    pub translations: Vec<TranslationFrame>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RotationFrame {
    pub keyframe: i32,
    pub rotation: Quat,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TranslationFrame {
    pub keyframe: i32,
    pub vector: Vec3,
}

impl Ani {
    /// Number of keyframes spanned by the clip (inclusive)
    pub fn keyframe_span(&self) -> u64 {
        u64::from(self.end_keyframe.abs_diff(self.start_keyframe)) + 1
    }

    pub fn root_bones(&self) -> impl Iterator<Item = &AniBone> {
        self.bones.iter().filter(|b| b.parent < 0)
    }
}

impl AniBone {
    /// Last translation at or before `keyframe`
    pub fn translation_at(&self, keyframe: i32) -> Option<Vec3> {
        self.translations
            .iter()
            .take_while(|t| t.keyframe <= keyframe)
            .last()
            .map(|t| t.vector)
    }
}

impl Record for Ani {
    fn schema() -> relic_codec::Result<&'static RecordSchema<Self>> {
        static SCHEMA: SchemaCell<Ani> = SchemaCell::new();
        SCHEMA.get_or_define(|| {
            RecordSchema::define([
                FieldSchema::scalar("start_keyframe", |a: &Ani| &a.start_keyframe, |a| {
                    &mut a.start_keyframe
                }),
                FieldSchema::scalar("end_keyframe", |a: &Ani| &a.end_keyframe, |a| {
                    &mut a.end_keyframe
                }),
                FieldSchema::prefixed_list(
                    "bones",
                    PrimitiveType::I32,
                    |a: &Ani| &a.bones,
                    |a| &mut a.bones,
                ),
            ])
        })
    }
}

impl Record for AniBone {
    fn schema() -> relic_codec::Result<&'static RecordSchema<Self>> {
        static SCHEMA: SchemaCell<AniBone> = SchemaCell::new();
        SCHEMA.get_or_define(|| {
            RecordSchema::define([
                FieldSchema::scalar("parent", |b: &AniBone| &b.parent, |b| &mut b.parent),
                FieldSchema::prefixed_string(
                    "name",
                    PrimitiveType::I32,
                    TextFormat::c_string(),
                    |b: &AniBone| &b.name,
                    |b| &mut b.name,
                )
                .range(Episode::Ep6, Episode::Ep8),
                FieldSchema::prefixed_list(
                    "rotations",
                    PrimitiveType::I32,
                    |b: &AniBone| &b.rotations,
                    |b| &mut b.rotations,
                ),
                FieldSchema::prefixed_list(
                    "translations",
                    PrimitiveType::I32,
                    |b: &AniBone| &b.translations,
                    |b| &mut b.translations,
                ),
            ])
        })
    }
}

impl Record for RotationFrame {
    fn schema() -> relic_codec::Result<&'static RecordSchema<Self>> {
        static SCHEMA: SchemaCell<RotationFrame> = SchemaCell::new();
        SCHEMA.get_or_define(|| {
            RecordSchema::define([
                FieldSchema::scalar("keyframe", |f: &RotationFrame| &f.keyframe, |f| {
                    &mut f.keyframe
                }),
                FieldSchema::composite("rotation", |f: &RotationFrame| &f.rotation, |f| {
                    &mut f.rotation
                }),
            ])
        })
    }
}

impl Record for TranslationFrame {
    fn schema() -> relic_codec::Result<&'static RecordSchema<Self>> {
        static SCHEMA: SchemaCell<TranslationFrame> = SchemaCell::new();
        SCHEMA.get_or_define(|| {
            RecordSchema::define([
                FieldSchema::scalar("keyframe", |f: &TranslationFrame| &f.keyframe, |f| {
                    &mut f.keyframe
                }),
                FieldSchema::composite("vector", |f: &TranslationFrame| &f.vector, |f| {
                    &mut f.vector
                }),
            ])
        })
    }
}

impl Asset for Ani {
    const EXTENSION: &'static str = "ani";

    fn from_bytes(bytes: &[u8], version: Version) -> Result<Self> {
        Ok(relic_codec::from_bytes(bytes, version)?)
    }

    fn to_bytes(&self, version: Version) -> Result<Vec<u8>> {
        Ok(relic_codec::encode(self, version)?)
    }
}
