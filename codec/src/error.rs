//! Codec error types

use crate::primitive::PrimitiveType;
use crate::text::TextEncoding;

/// Result alias used throughout the codec
pub type Result<T> = std::result::Result<T, CodecError>;

/// Errors raised while building schemas or encoding/decoding records
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CodecError {
    /// Invalid schema definition (caught when the schema is built)
    #[error("invalid schema: {0}")]
    Configuration(String),

    /// A shape the dispatcher cannot handle (self-referential or too deeply nested)
    #[error("unsupported shape for field `{field}`: {reason}")]
    UnsupportedShape { field: String, reason: String },

    /// The cursor ran out of bytes
    #[error("truncated data at offset {offset}: needed {needed} bytes, {available} available")]
    TruncatedData {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// A signed length prefix decoded to a negative value
    #[error("negative length {value} at offset {offset}")]
    NegativeLength { offset: usize, value: i64 },

    /// A count or byte length does not fit the configured prefix width
    #[error("length {len} does not fit a {width} length prefix")]
    LengthOverflow { len: usize, width: PrimitiveType },

    /// A fixed-length list holds the wrong number of items
    #[error("fixed list expects {expected} items, found {actual}")]
    CountMismatch { expected: usize, actual: usize },

    /// A list of items that occupy no bytes claims more items than the input could hold
    #[error("count {count} of zero-width items exceeds the {remaining} bytes left")]
    ZeroWidthCount { count: usize, remaining: usize },

    /// Text does not fit a fixed-length string
    #[error("text of {len} bytes does not fit in {capacity} bytes")]
    TextTooLong { len: usize, capacity: usize },

    /// Text cannot be represented in (or decoded from) the encoding
    #[error("invalid {encoding} text: {reason}")]
    InvalidText {
        encoding: TextEncoding,
        reason: String,
    },

    /// A suffixed string was decoded without its suffix
    #[error("text does not end with suffix {suffix:?}")]
    MissingSuffix { suffix: String },

    /// A bool byte other than 0 or 1
    #[error("invalid bool byte 0x{0:02X}")]
    InvalidBool(u8),

    /// Error raised while processing a specific field
    #[error("field `{path}`: {source}")]
    Field {
        path: String,
        #[source]
        source: Box<CodecError>,
    },
}

impl CodecError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        CodecError::Configuration(message.into())
    }

    /// Wrap this error with the name of the field being processed.
    ///
    /// Nested field errors are collapsed into a single dotted path.
    pub fn in_field(self, name: &str) -> Self {
        match self {
            CodecError::Field { path, source } => CodecError::Field {
                path: format!("{}.{}", name, path),
                source,
            },
            other => CodecError::Field {
                path: name.to_string(),
                source: Box::new(other),
            },
        }
    }

    /// The underlying error, with field context stripped
    pub fn root(&self) -> &CodecError {
        match self {
            CodecError::Field { source, .. } => source.root(),
            other => other,
        }
    }

    /// Programmer errors that no amount of retrying will fix
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.root(),
            CodecError::Configuration(_) | CodecError::UnsupportedShape { .. }
        )
    }

    /// True when the input ended early
    pub fn is_truncated(&self) -> bool {
        matches!(self.root(), CodecError::TruncatedData { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            CodecError::TruncatedData {
                offset: 4,
                needed: 8,
                available: 2
            }
            .to_string(),
            "truncated data at offset 4: needed 8 bytes, 2 available"
        );
        assert_eq!(
            CodecError::InvalidBool(0x7F).to_string(),
            "invalid bool byte 0x7F"
        );
        assert_eq!(
            CodecError::LengthOverflow {
                len: 300,
                width: PrimitiveType::U8
            }
            .to_string(),
            "length 300 does not fit a u8 length prefix"
        );
    }

    #[test]
    fn test_field_path_nesting() {
        let err = CodecError::InvalidBool(2)
            .in_field("visible")
            .in_field("effects");
        assert_eq!(err.to_string(), "field `effects.visible`: invalid bool byte 0x02");
        assert_eq!(err.root(), &CodecError::InvalidBool(2));
    }

    #[test]
    fn test_fatal_classification() {
        assert!(CodecError::config("bad").in_field("x").is_fatal());
        assert!(!CodecError::InvalidBool(3).is_fatal());
        assert!(
            CodecError::TruncatedData {
                offset: 0,
                needed: 1,
                available: 0
            }
            .in_field("x")
            .is_truncated()
        );
    }
}
