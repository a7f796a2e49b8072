//! Composite values that encode themselves
//!
//! Small fixed-shape aggregates (vectors, quaternions, bounding boxes) are
//! shared by many formats. Instead of describing them with a schema, they
//! implement [`CompositeValue`] and the record codec hands the cursor over
//! to them directly.

use glam::{Quat, Vec2, Vec3};

use crate::cursor::Cursor;
use crate::error::Result;
use crate::primitive::Primitive;

/// Direct self-decode/self-encode.
///
/// Implementations must be exact inverses: `encode_self(decode_self(bytes))`
/// reproduces `bytes` for well-formed input.
pub trait CompositeValue: Sized + Default + Send + Sync + 'static {
    fn decode_self(cursor: &mut Cursor<'_>) -> Result<Self>;

    fn encode_self(&self, out: &mut Vec<u8>) -> Result<()>;
}

/// `x y` as two `f32`
impl CompositeValue for Vec2 {
    fn decode_self(cursor: &mut Cursor<'_>) -> Result<Self> {
        Ok(Vec2::new(f32::decode(cursor)?, f32::decode(cursor)?))
    }

    fn encode_self(&self, out: &mut Vec<u8>) -> Result<()> {
        self.x.encode(out);
        self.y.encode(out);
        Ok(())
    }
}

/// `x y z` as three `f32`
impl CompositeValue for Vec3 {
    fn decode_self(cursor: &mut Cursor<'_>) -> Result<Self> {
        Ok(Vec3::new(
            f32::decode(cursor)?,
            f32::decode(cursor)?,
            f32::decode(cursor)?,
        ))
    }

    fn encode_self(&self, out: &mut Vec<u8>) -> Result<()> {
        self.x.encode(out);
        self.y.encode(out);
        self.z.encode(out);
        Ok(())
    }
}

/// `x y z w` as four `f32`, stored as-is (not normalized)
impl CompositeValue for Quat {
    fn decode_self(cursor: &mut Cursor<'_>) -> Result<Self> {
        Ok(Quat::from_xyzw(
            f32::decode(cursor)?,
            f32::decode(cursor)?,
            f32::decode(cursor)?,
            f32::decode(cursor)?,
        ))
    }

    fn encode_self(&self, out: &mut Vec<u8>) -> Result<()> {
        for component in self.to_array() {
            component.encode(out);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_layout() {
        let mut out = Vec::new();
        Vec3::new(1.0, 2.0, -1.0).encode_self(&mut out).unwrap();
        assert_eq!(
            out,
            vec![
                0x00, 0x00, 0x80, 0x3F, // 1.0
                0x00, 0x00, 0x00, 0x40, // 2.0
                0x00, 0x00, 0x80, 0xBF, // -1.0
            ]
        );

        let mut cursor = Cursor::new(&out);
        assert_eq!(Vec3::decode_self(&mut cursor).unwrap(), Vec3::new(1.0, 2.0, -1.0));
        assert!(cursor.is_empty());
    }

    #[test]
    fn test_quat_keeps_component_order() {
        let q = Quat::from_xyzw(0.1, 0.2, 0.3, 0.9);
        let mut out = Vec::new();
        q.encode_self(&mut out).unwrap();
        assert_eq!(out.len(), 16);
        assert_eq!(&out[12..16], &0.9f32.to_le_bytes());

        let decoded = Quat::decode_self(&mut Cursor::new(&out)).unwrap();
        assert_eq!(decoded.to_array(), q.to_array());
    }

    #[test]
    fn test_composite_bytes_round_trip() {
        let bytes: Vec<u8> = (0u8..8).collect();
        let v = Vec2::decode_self(&mut Cursor::new(&bytes)).unwrap();
        let mut out = Vec::new();
        v.encode_self(&mut out).unwrap();
        assert_eq!(out, bytes);
    }

    #[test]
    fn test_truncated_vector() {
        let err = Vec3::decode_self(&mut Cursor::new(&[0u8; 10])).unwrap_err();
        assert!(err.is_truncated());
    }
}
