//! Composite values shared by several formats

use glam::Vec3;
use relic_codec::{CompositeValue, Cursor, Primitive};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Two reference corners plus a scalar (7 floats on the wire).
///
/// The corners span the region's box; `radius` is the culling radius used
/// by the client.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
    pub radius: f32,
}

impl Bounds {
    pub const SIZE: usize = 28;

    pub fn new(min: Vec3, max: Vec3, radius: f32) -> Self {
        Self { min, max, radius }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min.min(self.max)).all() && point.cmple(self.min.max(self.max)).all()
    }
}

impl CompositeValue for Bounds {
    fn decode_self(cursor: &mut Cursor<'_>) -> relic_codec::Result<Self> {
        Ok(Self {
            min: Vec3::decode_self(cursor)?,
            max: Vec3::decode_self(cursor)?,
            radius: f32::decode(cursor)?,
        })
    }

    fn encode_self(&self, out: &mut Vec<u8>) -> relic_codec::Result<()> {
        self.min.encode_self(out)?;
        self.max.encode_self(out)?;
        self.radius.encode(out);
        Ok(())
    }
}

/// Opaque bytes of a fixed-size region, kept so files re-encode unchanged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawBytes<const N: usize>(pub [u8; N]);

impl<const N: usize> RawBytes<N> {
    pub fn is_zeroed(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }
}

impl<const N: usize> Default for RawBytes<N> {
    fn default() -> Self {
        Self([0; N])
    }
}

impl<const N: usize> CompositeValue for RawBytes<N> {
    fn decode_self(cursor: &mut Cursor<'_>) -> relic_codec::Result<Self> {
        Ok(Self(cursor.take_array()?))
    }

    fn encode_self(&self, out: &mut Vec<u8>) -> relic_codec::Result<()> {
        out.extend_from_slice(&self.0);
        Ok(())
    }
}

impl<const N: usize> Serialize for RawBytes<N> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.as_slice().serialize(serializer)
    }
}

impl<'de, const N: usize> Deserialize<'de> for RawBytes<N> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bytes = Vec::<u8>::deserialize(deserializer)?;
        let len = bytes.len();
        <[u8; N]>::try_from(bytes).map(Self).map_err(|_| {
            serde::de::Error::custom(format!("expected {} bytes, found {}", N, len))
        })
    }
}
