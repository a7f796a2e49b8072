//! Relic codec: schema-driven binary records for versioned game asset formats
//!
//! Game asset files (archives, animation clips, effect records, world data)
//! are packed little-endian structures whose layout shifted between client
//! releases. This crate describes each layout once, as a [`RecordSchema`], and
//! reads or writes it for any requested [`Version`].
//!
//! # Modules
//!
//! - [`primitive`] - Fixed-width little-endian integers, floats and bools
//! - [`text`] - Fixed-length and length-prefixed strings
//! - [`version`] - Versions and field presence conditions
//! - [`schema`] - Field descriptors, record schemas and the [`Record`] trait
//! - [`composite`] - Self-encoding values (`glam` vectors and quaternions)
//! - [`record`] - The decode/encode engine
//!
//! # Example
//!
//! ```
//! use glam::Vec3;
//! use relic_codec::{FieldSchema, PrimitiveType, Record, RecordSchema, SchemaCell, Version};
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Point {
//!     position: Vec3,
//! }
//!
//! impl Record for Point {
//!     fn schema() -> relic_codec::Result<&'static RecordSchema<Self>> {
//!         static SCHEMA: SchemaCell<Point> = SchemaCell::new();
//!         SCHEMA.get_or_define(|| {
//!             RecordSchema::define([FieldSchema::composite(
//!                 "position",
//!                 |p: &Point| &p.position,
//!                 |p| &mut p.position,
//!             )])
//!         })
//!     }
//! }
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Path {
//!     format: i32,
//!     points: Vec<Point>,
//! }
//!
//! impl Record for Path {
//!     fn schema() -> relic_codec::Result<&'static RecordSchema<Self>> {
//!         static SCHEMA: SchemaCell<Path> = SchemaCell::new();
//!         SCHEMA.get_or_define(|| {
//!             RecordSchema::define([
//!                 FieldSchema::scalar("format", |p: &Path| &p.format, |p| &mut p.format),
//!                 FieldSchema::prefixed_list(
//!                     "points",
//!                     PrimitiveType::U16,
//!                     |p: &Path| &p.points,
//!                     |p| &mut p.points,
//!                 ),
//!             ])
//!         })
//!     }
//! }
//!
//! let path = Path {
//!     format: 1,
//!     points: vec![Point { position: Vec3::ONE }],
//! };
//! let bytes = relic_codec::encode(&path, Version::Unknown).unwrap();
//! assert_eq!(bytes.len(), 4 + 2 + 12);
//! assert_eq!(relic_codec::from_bytes::<Path>(&bytes, Version::Unknown).unwrap(), path);
//! ```

pub mod composite;
pub mod cursor;
pub mod error;
pub mod primitive;
pub mod record;
pub mod schema;
pub mod text;
pub mod version;

pub use composite::CompositeValue;
pub use cursor::Cursor;
pub use error::{CodecError, Result};
pub use primitive::{LengthWidth, Primitive, PrimitiveType};
pub use record::{
    Context, MAX_DEPTH, decode, decode_into, decode_with, encode, encode_into, encode_with,
    from_bytes,
};
pub use schema::{FieldSchema, Lens, Record, RecordSchema, SchemaCell, Shape, StringLayout};
pub use text::{Terminator, TextEncoding, TextFormat};
pub use version::{Condition, Version};
