//! Fixed-width primitive encoding (little-endian)

use std::fmt;

use crate::cursor::Cursor;
use crate::error::{CodecError, Result};

/// Identifies a primitive wire type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    F32,
    F64,
    Bool,
}

impl PrimitiveType {
    /// Encoded size in bytes
    pub const fn size(self) -> usize {
        match self {
            PrimitiveType::U8 | PrimitiveType::I8 | PrimitiveType::Bool => 1,
            PrimitiveType::U16 | PrimitiveType::I16 => 2,
            PrimitiveType::U32 | PrimitiveType::I32 | PrimitiveType::F32 => 4,
            PrimitiveType::U64 | PrimitiveType::I64 | PrimitiveType::F64 => 8,
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PrimitiveType::U8 => "u8",
            PrimitiveType::I8 => "i8",
            PrimitiveType::U16 => "u16",
            PrimitiveType::I16 => "i16",
            PrimitiveType::U32 => "u32",
            PrimitiveType::I32 => "i32",
            PrimitiveType::U64 => "u64",
            PrimitiveType::I64 => "i64",
            PrimitiveType::F32 => "f32",
            PrimitiveType::F64 => "f64",
            PrimitiveType::Bool => "bool",
        };
        f.write_str(name)
    }
}

mod sealed {
    pub trait Sealed {}
}

/// A fixed-width value with a little-endian wire form.
///
/// Sealed: the set of primitives is closed, so an unsupported scalar type is
/// a compile error rather than a runtime failure.
pub trait Primitive: sealed::Sealed + Copy + Default + fmt::Debug + Send + Sync + 'static {
    const TYPE: PrimitiveType;

    fn decode(cursor: &mut Cursor<'_>) -> Result<Self>;

    fn encode(self, out: &mut Vec<u8>);
}

macro_rules! impl_primitive {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl sealed::Sealed for $ty {}

            impl Primitive for $ty {
                const TYPE: PrimitiveType = PrimitiveType::$kind;

                #[inline]
                fn decode(cursor: &mut Cursor<'_>) -> Result<Self> {
                    Ok(<$ty>::from_le_bytes(cursor.take_array()?))
                }

                #[inline]
                fn encode(self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_le_bytes());
                }
            }
        )*
    };
}

impl_primitive! {
    u8 => U8,
    i8 => I8,
    u16 => U16,
    i16 => I16,
    u32 => U32,
    i32 => I32,
    u64 => U64,
    i64 => I64,
    f32 => F32,
    f64 => F64,
}

impl sealed::Sealed for bool {}

impl Primitive for bool {
    const TYPE: PrimitiveType = PrimitiveType::Bool;

    fn decode(cursor: &mut Cursor<'_>) -> Result<Self> {
        match u8::decode(cursor)? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(CodecError::InvalidBool(other)),
        }
    }

    fn encode(self, out: &mut Vec<u8>) {
        out.push(self as u8);
    }
}

/// Integer type used for a count or byte-length prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LengthWidth {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
}

impl LengthWidth {
    /// Map a primitive to a length width, rejecting non-length types
    pub fn from_type(ty: PrimitiveType) -> Result<Self> {
        match ty {
            PrimitiveType::U8 => Ok(LengthWidth::U8),
            PrimitiveType::I8 => Ok(LengthWidth::I8),
            PrimitiveType::U16 => Ok(LengthWidth::U16),
            PrimitiveType::I16 => Ok(LengthWidth::I16),
            PrimitiveType::U32 => Ok(LengthWidth::U32),
            PrimitiveType::I32 => Ok(LengthWidth::I32),
            other => Err(CodecError::config(format!(
                "{} cannot be used as a length prefix (expected 8, 16 or 32-bit integer)",
                other
            ))),
        }
    }

    pub fn primitive(self) -> PrimitiveType {
        match self {
            LengthWidth::U8 => PrimitiveType::U8,
            LengthWidth::I8 => PrimitiveType::I8,
            LengthWidth::U16 => PrimitiveType::U16,
            LengthWidth::I16 => PrimitiveType::I16,
            LengthWidth::U32 => PrimitiveType::U32,
            LengthWidth::I32 => PrimitiveType::I32,
        }
    }

    /// Largest length this width can carry
    pub fn max_len(self) -> usize {
        match self {
            LengthWidth::U8 => u8::MAX as usize,
            LengthWidth::I8 => i8::MAX as usize,
            LengthWidth::U16 => u16::MAX as usize,
            LengthWidth::I16 => i16::MAX as usize,
            LengthWidth::U32 => u32::MAX as usize,
            LengthWidth::I32 => i32::MAX as usize,
        }
    }

    /// Read a length prefix; negative signed values are rejected
    pub fn read(self, cursor: &mut Cursor<'_>) -> Result<usize> {
        let offset = cursor.position();
        let value: i64 = match self {
            LengthWidth::U8 => u8::decode(cursor)? as i64,
            LengthWidth::I8 => i8::decode(cursor)? as i64,
            LengthWidth::U16 => u16::decode(cursor)? as i64,
            LengthWidth::I16 => i16::decode(cursor)? as i64,
            LengthWidth::U32 => u32::decode(cursor)? as i64,
            LengthWidth::I32 => i32::decode(cursor)? as i64,
        };
        usize::try_from(value).map_err(|_| CodecError::NegativeLength { offset, value })
    }

    /// Write a length prefix
    pub fn write(self, len: usize, out: &mut Vec<u8>) -> Result<()> {
        if len > self.max_len() {
            return Err(CodecError::LengthOverflow {
                len,
                width: self.primitive(),
            });
        }
        // Range checked above
        match self {
            LengthWidth::U8 => (len as u8).encode(out),
            LengthWidth::I8 => (len as i8).encode(out),
            LengthWidth::U16 => (len as u16).encode(out),
            LengthWidth::I16 => (len as i16).encode(out),
            LengthWidth::U32 => (len as u32).encode(out),
            LengthWidth::I32 => (len as i32).encode(out),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded<T: Primitive>(value: T) -> Vec<u8> {
        let mut out = Vec::new();
        value.encode(&mut out);
        out
    }

    #[test]
    fn test_little_endian_layout() {
        assert_eq!(encoded(0x0102_0304u32), vec![0x04, 0x03, 0x02, 0x01]);
        assert_eq!(encoded(-2i16), vec![0xFE, 0xFF]);
        assert_eq!(encoded(1.0f32), vec![0x00, 0x00, 0x80, 0x3F]);
        assert_eq!(encoded(true), vec![0x01]);
    }

    #[test]
    fn test_decode_values() {
        let data = [0x2A, 0x00, 0x00, 0x00, 0xFF, 0x00, 0x00, 0x80, 0xBF];
        let mut cursor = Cursor::new(&data);
        assert_eq!(i32::decode(&mut cursor).unwrap(), 42);
        assert_eq!(u8::decode(&mut cursor).unwrap(), 0xFF);
        assert_eq!(f32::decode(&mut cursor).unwrap(), -1.0);
        assert!(cursor.is_empty());
    }

    #[test]
    fn test_decode_truncated() {
        let mut cursor = Cursor::new(&[0x01, 0x02, 0x03]);
        assert!(matches!(
            u64::decode(&mut cursor),
            Err(CodecError::TruncatedData { needed: 8, .. })
        ));
    }

    #[test]
    fn test_bool_rejects_other_bytes() {
        let mut cursor = Cursor::new(&[0x00, 0x01, 0x02]);
        assert!(!bool::decode(&mut cursor).unwrap());
        assert!(bool::decode(&mut cursor).unwrap());
        assert_eq!(bool::decode(&mut cursor), Err(CodecError::InvalidBool(2)));
    }

    #[test]
    fn test_length_width_rejects_non_integers() {
        assert!(LengthWidth::from_type(PrimitiveType::I16).is_ok());
        for ty in [
            PrimitiveType::F32,
            PrimitiveType::F64,
            PrimitiveType::U64,
            PrimitiveType::I64,
            PrimitiveType::Bool,
        ] {
            assert!(matches!(
                LengthWidth::from_type(ty),
                Err(CodecError::Configuration(_))
            ));
        }
    }

    #[test]
    fn test_negative_length_rejected() {
        let mut cursor = Cursor::new(&[0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(
            LengthWidth::I32.read(&mut cursor),
            Err(CodecError::NegativeLength {
                offset: 0,
                value: -1
            })
        );

        // Same bytes as unsigned are a valid (large) length
        let mut cursor = Cursor::new(&[0xFF, 0xFF]);
        assert_eq!(LengthWidth::U16.read(&mut cursor).unwrap(), 0xFFFF);
    }

    #[test]
    fn test_length_overflow() {
        let mut out = Vec::new();
        assert!(LengthWidth::U8.write(255, &mut out).is_ok());
        assert_eq!(
            LengthWidth::I8.write(128, &mut out),
            Err(CodecError::LengthOverflow {
                len: 128,
                width: PrimitiveType::I8
            })
        );
        assert_eq!(out, vec![0xFF]);
    }
}
