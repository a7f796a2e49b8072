//! Record schemas: the static, field-by-field description of a binary layout
//!
//! A [`RecordSchema`] is an ordered list of [`FieldSchema`] descriptors. Each
//! descriptor names a field, says when it is present ([`Condition`]), how it
//! is laid out ([`Shape`]), and binds it to the Rust struct field that holds
//! its value through a pair of accessor functions ([`Lens`]).
//!
//! Schemas are built once per record type and then shared by every call:
//!
//! ```
//! use relic_codec::{FieldSchema, PrimitiveType, Record, RecordSchema, SchemaCell, TextFormat};
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Entry {
//!     id: u32,
//!     name: String,
//! }
//!
//! impl Record for Entry {
//!     fn schema() -> relic_codec::Result<&'static RecordSchema<Self>> {
//!         static SCHEMA: SchemaCell<Entry> = SchemaCell::new();
//!         SCHEMA.get_or_define(|| {
//!             RecordSchema::define([
//!                 FieldSchema::scalar("id", |e: &Entry| &e.id, |e| &mut e.id),
//!                 FieldSchema::prefixed_string(
//!                     "name",
//!                     PrimitiveType::U8,
//!                     TextFormat::ascii(),
//!                     |e: &Entry| &e.name,
//!                     |e| &mut e.name,
//!                 ),
//!             ])
//!         })
//!     }
//! }
//!
//! let bytes = relic_codec::encode(&Entry { id: 7, name: "ok".into() }, Default::default()).unwrap();
//! assert_eq!(bytes, [7, 0, 0, 0, 2, b'o', b'k']);
//! ```

use std::any::TypeId;
use std::collections::HashSet;
use std::fmt;
use std::sync::OnceLock;

use crate::composite::CompositeValue;
use crate::cursor::Cursor;
use crate::error::{CodecError, Result};
use crate::primitive::{LengthWidth, Primitive, PrimitiveType};
use crate::record::{self, Context};
use crate::text::{self, TextFormat};
use crate::version::{Condition, Version};

/// A record type with a static schema
pub trait Record: Default + Send + Sync + 'static {
    /// The schema, built on first use and cached for the life of the program
    fn schema() -> Result<&'static RecordSchema<Self>>;
}

/// Accessor pair binding a field descriptor to a struct field
pub struct Lens<R, T> {
    get: fn(&R) -> &T,
    get_mut: fn(&mut R) -> &mut T,
}

impl<R, T> Lens<R, T> {
    pub fn new(get: fn(&R) -> &T, get_mut: fn(&mut R) -> &mut T) -> Self {
        Self { get, get_mut }
    }

    pub fn get<'r>(&self, record: &'r R) -> &'r T {
        (self.get)(record)
    }

    pub fn get_mut<'r>(&self, record: &'r mut R) -> &'r mut T {
        (self.get_mut)(record)
    }
}

impl<R, T> Clone for Lens<R, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R, T> Copy for Lens<R, T> {}

/// Type-erased primitive field
pub trait PrimitiveSlot<R>: Send + Sync {
    fn primitive_type(&self) -> PrimitiveType;

    fn decode(&self, record: &mut R, cursor: &mut Cursor<'_>) -> Result<()>;

    fn encode(&self, record: &R, out: &mut Vec<u8>) -> Result<()>;
}

impl<R, T: Primitive> PrimitiveSlot<R> for Lens<R, T> {
    fn primitive_type(&self) -> PrimitiveType {
        T::TYPE
    }

    fn decode(&self, record: &mut R, cursor: &mut Cursor<'_>) -> Result<()> {
        *self.get_mut(record) = T::decode(cursor)?;
        Ok(())
    }

    fn encode(&self, record: &R, out: &mut Vec<u8>) -> Result<()> {
        self.get(record).encode(out);
        Ok(())
    }
}

/// Type-erased composite field
pub trait CompositeSlot<R>: Send + Sync {
    fn type_name(&self) -> &'static str;

    fn decode(&self, record: &mut R, cursor: &mut Cursor<'_>) -> Result<()>;

    fn encode(&self, record: &R, out: &mut Vec<u8>) -> Result<()>;
}

impl<R, T: CompositeValue> CompositeSlot<R> for Lens<R, T> {
    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn decode(&self, record: &mut R, cursor: &mut Cursor<'_>) -> Result<()> {
        *self.get_mut(record) = T::decode_self(cursor)?;
        Ok(())
    }

    fn encode(&self, record: &R, out: &mut Vec<u8>) -> Result<()> {
        self.get(record).encode_self(out)
    }
}

/// Type-erased list of nested records.
///
/// The item type and its schema are fixed when the field is defined; the
/// record codec only sees this interface.
pub trait ListSlot<R>: Send + Sync {
    fn item_type(&self) -> TypeId;

    fn item_type_name(&self) -> &'static str;

    fn len(&self, record: &R) -> usize;

    /// Decode `count` items with the item schema, replacing the current list
    fn decode_items(
        &self,
        record: &mut R,
        count: usize,
        cursor: &mut Cursor<'_>,
        ctx: Context,
    ) -> Result<()>;

    fn encode_items(&self, record: &R, out: &mut Vec<u8>, ctx: Context) -> Result<()>;
}

impl<R, I: Record> ListSlot<R> for Lens<R, Vec<I>> {
    fn item_type(&self) -> TypeId {
        TypeId::of::<I>()
    }

    fn item_type_name(&self) -> &'static str {
        std::any::type_name::<I>()
    }

    fn len(&self, record: &R) -> usize {
        self.get(record).len()
    }

    fn decode_items(
        &self,
        record: &mut R,
        count: usize,
        cursor: &mut Cursor<'_>,
        ctx: Context,
    ) -> Result<()> {
        let schema = I::schema()?;
        // Capped by the bytes left in the input
        let mut items = Vec::with_capacity(count.min(cursor.remaining()));
        let start = cursor.position();
        for index in 0..count {
            let item = record::decode_nested(schema, cursor, ctx)
                .map_err(|e| e.in_field(&index.to_string()))?;
            // Every further item would decode identically from the same position
            if index == 0 && cursor.position() == start && count > cursor.remaining() {
                return Err(CodecError::ZeroWidthCount {
                    count,
                    remaining: cursor.remaining(),
                });
            }
            items.push(item);
        }
        *self.get_mut(record) = items;
        Ok(())
    }

    fn encode_items(&self, record: &R, out: &mut Vec<u8>, ctx: Context) -> Result<()> {
        let schema = I::schema()?;
        for (index, item) in self.get(record).iter().enumerate() {
            record::encode_nested(schema, item, out, ctx)
                .map_err(|e| e.in_field(&index.to_string()))?;
        }
        Ok(())
    }
}

/// A single value: either a primitive or a self-encoding composite
pub enum ScalarSlot<R> {
    Primitive(Box<dyn PrimitiveSlot<R>>),
    Composite(Box<dyn CompositeSlot<R>>),
}

/// How a string's extent is determined
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringLayout {
    /// Exactly this many bytes
    Fixed(usize),
    /// Byte length stored before the text
    Prefixed(LengthWidth),
}

impl StringLayout {
    pub(crate) fn decode(self, cursor: &mut Cursor<'_>, format: TextFormat) -> Result<String> {
        match self {
            StringLayout::Fixed(length) => text::decode_fixed(cursor, length, format),
            StringLayout::Prefixed(width) => text::decode_prefixed(cursor, width, format),
        }
    }

    pub(crate) fn encode(self, value: &str, format: TextFormat, out: &mut Vec<u8>) -> Result<()> {
        match self {
            StringLayout::Fixed(length) => text::encode_fixed(value, length, format, out),
            StringLayout::Prefixed(width) => text::encode_prefixed(value, width, format, out),
        }
    }
}

/// Wire shape of a field
pub enum Shape<R> {
    Scalar(ScalarSlot<R>),
    /// Exactly `count` nested records
    FixedList {
        items: Box<dyn ListSlot<R>>,
        count: usize,
    },
    /// Item count of the given width, then the nested records
    PrefixedList {
        items: Box<dyn ListSlot<R>>,
        width: LengthWidth,
    },
    FixedString {
        text: Lens<R, String>,
        length: usize,
        format: TextFormat,
    },
    PrefixedString {
        text: Lens<R, String>,
        width: LengthWidth,
        format: TextFormat,
    },
    /// A string stored with a literal suffix appended; the suffix is stripped on decode
    SuffixedString {
        text: Lens<R, String>,
        suffix: &'static str,
        layout: StringLayout,
        format: TextFormat,
    },
}

impl<R> Shape<R> {
    /// Short description used in logs and errors
    pub fn describe(&self) -> String {
        match self {
            Shape::Scalar(ScalarSlot::Primitive(slot)) => slot.primitive_type().to_string(),
            Shape::Scalar(ScalarSlot::Composite(slot)) => short_type_name(slot.type_name()).to_string(),
            Shape::FixedList { items, count } => {
                format!("[{}; {}]", short_type_name(items.item_type_name()), count)
            }
            Shape::PrefixedList { items, width } => {
                format!("{}-prefixed list of {}", width.primitive(), short_type_name(items.item_type_name()))
            }
            Shape::FixedString { length, format, .. } => {
                format!("{} string[{}]", format.encoding, length)
            }
            Shape::PrefixedString { width, format, .. } => {
                format!("{}-prefixed {} string", width.primitive(), format.encoding)
            }
            Shape::SuffixedString { suffix, format, .. } => {
                format!("{} string with suffix {:?}", format.encoding, suffix)
            }
        }
    }
}

fn short_type_name(name: &'static str) -> &'static str {
    name.rsplit("::").next().unwrap_or(name)
}

/// Descriptor of one field of a record
pub struct FieldSchema<R> {
    name: &'static str,
    condition: Condition,
    shape: Shape<R>,
    version_selector: Option<fn(&R) -> Version>,
    // Reported by `RecordSchema::define`
    deferred: Option<CodecError>,
}

impl<R: 'static> FieldSchema<R> {
    fn with_shape(name: &'static str, shape: Shape<R>) -> Self {
        Self {
            name,
            condition: Condition::Always,
            shape,
            version_selector: None,
            deferred: None,
        }
    }

    fn with_error(name: &'static str, shape: Shape<R>, error: Option<CodecError>) -> Self {
        let mut field = Self::with_shape(name, shape);
        field.deferred = error;
        field
    }

    /// Primitive value (`u8` … `f64`, `bool`)
    pub fn scalar<T: Primitive>(
        name: &'static str,
        get: fn(&R) -> &T,
        get_mut: fn(&mut R) -> &mut T,
    ) -> Self {
        let slot: Box<dyn PrimitiveSlot<R>> = Box::new(Lens::new(get, get_mut));
        Self::with_shape(name, Shape::Scalar(ScalarSlot::Primitive(slot)))
    }

    /// Value implementing [`CompositeValue`]
    pub fn composite<T: CompositeValue>(
        name: &'static str,
        get: fn(&R) -> &T,
        get_mut: fn(&mut R) -> &mut T,
    ) -> Self {
        let slot: Box<dyn CompositeSlot<R>> = Box::new(Lens::new(get, get_mut));
        Self::with_shape(name, Shape::Scalar(ScalarSlot::Composite(slot)))
    }

    /// Exactly `count` nested records
    pub fn fixed_list<I: Record>(
        name: &'static str,
        count: usize,
        get: fn(&R) -> &Vec<I>,
        get_mut: fn(&mut R) -> &mut Vec<I>,
    ) -> Self {
        let items: Box<dyn ListSlot<R>> = Box::new(Lens::new(get, get_mut));
        Self::with_shape(name, Shape::FixedList { items, count })
    }

    /// Nested records preceded by their count, stored as `width`
    pub fn prefixed_list<I: Record>(
        name: &'static str,
        width: PrimitiveType,
        get: fn(&R) -> &Vec<I>,
        get_mut: fn(&mut R) -> &mut Vec<I>,
    ) -> Self {
        let items: Box<dyn ListSlot<R>> = Box::new(Lens::new(get, get_mut));
        let (width, error) = resolve_width(width);
        Self::with_error(name, Shape::PrefixedList { items, width }, error)
    }

    /// String occupying exactly `length` bytes
    pub fn fixed_string(
        name: &'static str,
        length: usize,
        format: TextFormat,
        get: fn(&R) -> &String,
        get_mut: fn(&mut R) -> &mut String,
    ) -> Self {
        let text = Lens::new(get, get_mut);
        let unit = format.encoding.unit();
        let error = if length % unit != 0 {
            Some(CodecError::config(format!(
                "string[{}] is not a whole number of {} code units",
                length, format.encoding
            )))
        } else if format.terminator == text::Terminator::Included && length < unit {
            Some(CodecError::config(format!(
                "string[{}] has no room for its terminator",
                length
            )))
        } else {
            None
        };
        Self::with_error(name, Shape::FixedString { text, length, format }, error)
    }

    /// String preceded by its byte length, stored as `width`
    pub fn prefixed_string(
        name: &'static str,
        width: PrimitiveType,
        format: TextFormat,
        get: fn(&R) -> &String,
        get_mut: fn(&mut R) -> &mut String,
    ) -> Self {
        let text = Lens::new(get, get_mut);
        let (width, error) = resolve_width(width);
        Self::with_error(name, Shape::PrefixedString { text, width, format }, error)
    }

    /// Append `suffix` when writing and strip it when reading.
    ///
    /// Applies to fixed and prefixed string fields.
    pub fn with_suffix(mut self, suffix: &'static str) -> Self {
        self.shape = match self.shape {
            Shape::FixedString { text, length, format } => Shape::SuffixedString {
                text,
                suffix,
                layout: StringLayout::Fixed(length),
                format,
            },
            Shape::PrefixedString { text, width, format } => Shape::SuffixedString {
                text,
                suffix,
                layout: StringLayout::Prefixed(width),
                format,
            },
            other => {
                let error = CodecError::UnsupportedShape {
                    field: self.name.to_string(),
                    reason: format!("suffix {:?} on non-string shape {}", suffix, other.describe()),
                };
                self.deferred.get_or_insert(error);
                other
            }
        };
        self
    }

    /// Present only in `version`
    pub fn exact(mut self, version: impl Into<Version>) -> Self {
        match Condition::exact(version.into()) {
            Ok(condition) => self.condition = condition,
            Err(e) => {
                self.deferred.get_or_insert(e);
            }
        }
        self
    }

    /// Present in `min..=max`
    pub fn range(mut self, min: impl Into<Version>, max: impl Into<Version>) -> Self {
        match Condition::range(min.into(), max.into()) {
            Ok(condition) => self.condition = condition,
            Err(e) => {
                self.deferred.get_or_insert(e);
            }
        }
        self
    }

    /// After this field is processed, derive the version used for the
    /// remaining fields from the record (e.g. a leading format number).
    ///
    /// An `Unknown` result leaves the current version in place.
    pub fn selects_version(mut self, select: fn(&R) -> Version) -> Self {
        self.version_selector = Some(select);
        self
    }
}

impl<R> FieldSchema<R> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn condition(&self) -> Condition {
        self.condition
    }

    pub fn shape(&self) -> &Shape<R> {
        &self.shape
    }

    pub fn version_selector(&self) -> Option<fn(&R) -> Version> {
        self.version_selector
    }
}

impl<R> fmt::Debug for FieldSchema<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSchema")
            .field("name", &self.name)
            .field("condition", &self.condition)
            .field("shape", &self.shape.describe())
            .field("selects_version", &self.version_selector.is_some())
            .finish()
    }
}

fn resolve_width(width: PrimitiveType) -> (LengthWidth, Option<CodecError>) {
    match LengthWidth::from_type(width) {
        Ok(width) => (width, None),
        Err(e) => (LengthWidth::U32, Some(e)),
    }
}

/// Ordered field layout of a record type
pub struct RecordSchema<R> {
    type_name: &'static str,
    fields: Vec<FieldSchema<R>>,
}

impl<R: 'static> RecordSchema<R> {
    /// Build a schema, rejecting invalid field definitions.
    ///
    /// Every configuration problem surfaces here, once, instead of on each
    /// decode or encode call.
    pub fn define(fields: impl IntoIterator<Item = FieldSchema<R>>) -> Result<Self> {
        let type_name = std::any::type_name::<R>();
        let mut fields: Vec<FieldSchema<R>> = fields.into_iter().collect();
        let mut seen = HashSet::new();

        for field in &mut fields {
            let name = field.name;
            if let Some(e) = field.deferred.take() {
                return Err(e.in_field(name));
            }
            if !seen.insert(name) {
                return Err(CodecError::config(format!(
                    "duplicate field `{}` in {}",
                    name, type_name
                )));
            }
            if let Shape::FixedList { items, .. } | Shape::PrefixedList { items, .. } = &field.shape {
                if items.item_type() == TypeId::of::<R>() {
                    return Err(CodecError::UnsupportedShape {
                        field: name.to_string(),
                        reason: format!("{} cannot contain a list of itself", type_name),
                    });
                }
            }
        }

        Ok(Self { type_name, fields })
    }
}

impl<R> RecordSchema<R> {
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn fields(&self) -> &[FieldSchema<R>] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSchema<R>> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Names of the fields present for `version`, in wire order
    pub fn present_fields(&self, version: Version) -> impl Iterator<Item = &'static str> + '_ {
        self.fields
            .iter()
            .filter(move |f| f.condition.includes(version))
            .map(|f| f.name)
    }
}

impl<R> fmt::Debug for RecordSchema<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordSchema")
            .field("type_name", &self.type_name)
            .field("fields", &self.fields)
            .finish()
    }
}

/// Lazily built, process-wide schema storage for a [`Record`] impl
pub struct SchemaCell<R> {
    cell: OnceLock<Result<RecordSchema<R>>>,
}

impl<R: 'static> SchemaCell<R> {
    pub const fn new() -> Self {
        Self {
            cell: OnceLock::new(),
        }
    }

    /// Return the cached schema, building it with `define` on first use
    pub fn get_or_define(
        &'static self,
        define: impl FnOnce() -> Result<RecordSchema<R>>,
    ) -> Result<&'static RecordSchema<R>> {
        self.cell
            .get_or_init(|| {
                let schema = define();
                match &schema {
                    Ok(s) => tracing::debug!(
                        record = s.type_name(),
                        fields = s.fields().len(),
                        "schema registered"
                    ),
                    Err(e) => tracing::error!(
                        record = std::any::type_name::<R>(),
                        error = %e,
                        "schema definition rejected"
                    ),
                }
                schema
            })
            .as_ref()
            .map_err(Clone::clone)
    }
}

impl<R: 'static> Default for SchemaCell<R> {
    fn default() -> Self {
        Self::new()
    }
}
