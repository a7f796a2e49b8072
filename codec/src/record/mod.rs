//! The record codec: walks a schema against a cursor or output buffer
//!
//! Decode and encode are mirror images. For each field, in declared order:
//!
//! 1. The field's [`Condition`](crate::Condition) is checked against the
//!    current version. Absent fields keep their `Default` value on decode and
//!    emit nothing on encode.
//! 2. The [`Shape`] decides what happens: primitives and composites are
//!    handled directly, lists recurse into the item schema with the same
//!    version context, strings go through the text codec.
//! 3. If the field selects a version, the selected version applies to the
//!    rest of the record.


use tracing::{debug, trace, warn};

use crate::cursor::Cursor;
use crate::error::{CodecError, Result};
use crate::schema::{FieldSchema, Record, RecordSchema, ScalarSlot, Shape};
use crate::text;
use crate::version::Version;

/// Maximum nesting of list fields
pub const MAX_DEPTH: usize = 32;

/// Per-call state threaded through nested decode/encode calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Context {
    version: Version,
    depth: usize,
}

impl Context {
    pub fn new(version: Version) -> Self {
        Self { version, depth: 0 }
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    fn nested(self, field: &str) -> Result<Self> {
        if self.depth >= MAX_DEPTH {
            return Err(CodecError::UnsupportedShape {
                field: field.to_string(),
                reason: format!("nesting deeper than {} levels (cyclic schema?)", MAX_DEPTH),
            });
        }
        Ok(Self {
            version: self.version,
            depth: self.depth + 1,
        })
    }

    fn select<R>(&mut self, field: &FieldSchema<R>, record: &R) {
        let Some(select) = field.version_selector() else {
            return;
        };
        let selected = select(record);
        if selected.is_known() && selected != self.version {
            debug!(
                field = field.name(),
                from = %self.version,
                to = %selected,
                "version selected by field"
            );
            self.version = selected;
        }
    }
}

// ============================================================================
// Decode
// ============================================================================

/// Decode a [`Record`] from the cursor
pub fn decode<R: Record>(cursor: &mut Cursor<'_>, version: Version) -> Result<R> {
    decode_with(R::schema()?, cursor, version)
}

/// Decode a record described by `schema`
pub fn decode_with<R: Default>(
    schema: &RecordSchema<R>,
    cursor: &mut Cursor<'_>,
    version: Version,
) -> Result<R> {
    let mut record = R::default();
    decode_into(schema, &mut record, cursor, version)?;
    Ok(record)
}

/// Decode into an existing record.
///
/// Fields absent for the version are left untouched. Returns the version in
/// effect after the last field, which differs from `version` when a field
/// selected a new one.
///
/// On error the contents of `record` are unspecified; use [`decode_with`]
/// to get either a whole record or nothing.
pub fn decode_into<R>(
    schema: &RecordSchema<R>,
    record: &mut R,
    cursor: &mut Cursor<'_>,
    version: Version,
) -> Result<Version> {
    let start = cursor.position();
    let ctx = decode_fields(schema, record, cursor, Context::new(version))?;
    debug!(
        record = schema.type_name(),
        version = %ctx.version,
        bytes = cursor.position() - start,
        "decoded record"
    );
    Ok(ctx.version)
}

/// Decode a whole buffer as one record; trailing bytes are logged, not rejected
pub fn from_bytes<R: Record>(bytes: &[u8], version: Version) -> Result<R> {
    let mut cursor = Cursor::new(bytes);
    let record = decode(&mut cursor, version)?;
    if !cursor.is_empty() {
        warn!(
            record = std::any::type_name::<R>(),
            trailing = cursor.remaining(),
            "trailing bytes after record"
        );
    }
    Ok(record)
}

pub(crate) fn decode_nested<R: Default>(
    schema: &RecordSchema<R>,
    cursor: &mut Cursor<'_>,
    ctx: Context,
) -> Result<R> {
    let mut record = R::default();
    decode_fields(schema, &mut record, cursor, ctx)?;
    Ok(record)
}

fn decode_fields<R>(
    schema: &RecordSchema<R>,
    record: &mut R,
    cursor: &mut Cursor<'_>,
    mut ctx: Context,
) -> Result<Context> {
    for field in schema.fields() {
        if !field.condition().includes(ctx.version) {
            trace!(field = field.name(), version = %ctx.version, "field absent");
            continue;
        }
        trace!(field = field.name(), offset = cursor.position(), "decode field");
        decode_field(field, record, cursor, ctx).map_err(|e| e.in_field(field.name()))?;
        ctx.select(field, record);
    }
    Ok(ctx)
}

fn decode_field<R>(
    field: &FieldSchema<R>,
    record: &mut R,
    cursor: &mut Cursor<'_>,
    ctx: Context,
) -> Result<()> {
    match field.shape() {
        Shape::Scalar(ScalarSlot::Primitive(slot)) => slot.decode(record, cursor),
        Shape::Scalar(ScalarSlot::Composite(slot)) => slot.decode(record, cursor),
        Shape::FixedList { items, count } => {
            items.decode_items(record, *count, cursor, ctx.nested(field.name())?)
        }
        Shape::PrefixedList { items, width } => {
            let count = width.read(cursor)?;
            items.decode_items(record, count, cursor, ctx.nested(field.name())?)
        }
        Shape::FixedString {
            text,
            length,
            format,
        } => {
            *text.get_mut(record) = text::decode_fixed(cursor, *length, *format)?;
            Ok(())
        }
        Shape::PrefixedString {
            text,
            width,
            format,
        } => {
            *text.get_mut(record) = text::decode_prefixed(cursor, *width, *format)?;
            Ok(())
        }
        Shape::SuffixedString {
            text,
            suffix,
            layout,
            format,
        } => {
            let stored = layout.decode(cursor, *format)?;
            let value = stored
                .strip_suffix(suffix)
                .ok_or_else(|| CodecError::MissingSuffix {
                    suffix: suffix.to_string(),
                })?;
            *text.get_mut(record) = value.to_string();
            Ok(())
        }
    }
}

// ============================================================================
// Encode
// ============================================================================

/// Encode a [`Record`]
pub fn encode<R: Record>(record: &R, version: Version) -> Result<Vec<u8>> {
    encode_with(R::schema()?, record, version)
}

/// Encode a record described by `schema`
pub fn encode_with<R>(schema: &RecordSchema<R>, record: &R, version: Version) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    encode_into(schema, record, &mut out, version)?;
    Ok(out)
}

/// Append the encoded record to `out`.
///
/// Returns the version in effect after the last field. On error `out` is
/// restored to its previous length.
pub fn encode_into<R>(
    schema: &RecordSchema<R>,
    record: &R,
    out: &mut Vec<u8>,
    version: Version,
) -> Result<Version> {
    let start = out.len();
    let ctx = match encode_fields(schema, record, out, Context::new(version)) {
        Ok(ctx) => ctx,
        Err(e) => {
            out.truncate(start);
            return Err(e);
        }
    };
    debug!(
        record = schema.type_name(),
        version = %ctx.version,
        bytes = out.len() - start,
        "encoded record"
    );
    Ok(ctx.version)
}

pub(crate) fn encode_nested<R>(
    schema: &RecordSchema<R>,
    record: &R,
    out: &mut Vec<u8>,
    ctx: Context,
) -> Result<()> {
    encode_fields(schema, record, out, ctx).map(|_| ())
}

fn encode_fields<R>(
    schema: &RecordSchema<R>,
    record: &R,
    out: &mut Vec<u8>,
    mut ctx: Context,
) -> Result<Context> {
    for field in schema.fields() {
        if !field.condition().includes(ctx.version) {
            trace!(field = field.name(), version = %ctx.version, "field omitted");
            continue;
        }
        trace!(field = field.name(), offset = out.len(), "encode field");
        encode_field(field, record, out, ctx).map_err(|e| e.in_field(field.name()))?;
        ctx.select(field, record);
    }
    Ok(ctx)
}

fn encode_field<R>(
    field: &FieldSchema<R>,
    record: &R,
    out: &mut Vec<u8>,
    ctx: Context,
) -> Result<()> {
    match field.shape() {
        Shape::Scalar(ScalarSlot::Primitive(slot)) => slot.encode(record, out),
        Shape::Scalar(ScalarSlot::Composite(slot)) => slot.encode(record, out),
        Shape::FixedList { items, count } => {
            let actual = items.len(record);
            if actual != *count {
                return Err(CodecError::CountMismatch {
                    expected: *count,
                    actual,
                });
            }
            items.encode_items(record, out, ctx.nested(field.name())?)
        }
        Shape::PrefixedList { items, width } => {
            width.write(items.len(record), out)?;
            items.encode_items(record, out, ctx.nested(field.name())?)
        }
        Shape::FixedString {
            text,
            length,
            format,
        } => text::encode_fixed(text.get(record), *length, *format, out),
        Shape::PrefixedString {
            text,
            width,
            format,
        } => text::encode_prefixed(text.get(record), *width, *format, out),
        Shape::SuffixedString {
            text,
            suffix,
            layout,
            format,
        } => {
            let stored = format!("{}{}", text.get(record), suffix);
            layout.encode(&stored, *format, out)
        }
    }
}
