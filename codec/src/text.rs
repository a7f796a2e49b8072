//! String encoding: fixed-length and length-prefixed framing

use std::fmt;

use crate::cursor::Cursor;
use crate::error::{CodecError, Result};
use crate::primitive::LengthWidth;

/// Character encoding of stored text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextEncoding {
    /// 7-bit ASCII; bytes >= 0x80 are rejected
    #[default]
    Ascii,
    /// ISO-8859-1, one byte per code point (lossless for any byte)
    Latin1,
    Utf8,
    /// UTF-16, little-endian code units
    Utf16Le,
}

impl TextEncoding {
    /// Size of one code unit (and therefore of the NUL terminator)
    pub const fn unit(self) -> usize {
        match self {
            TextEncoding::Utf16Le => 2,
            _ => 1,
        }
    }

    /// Encode text to bytes, without terminator
    pub fn encode(self, text: &str) -> Result<Vec<u8>> {
        match self {
            TextEncoding::Ascii => {
                if let Some(c) = text.chars().find(|c| !c.is_ascii()) {
                    return Err(self.invalid(format!("{:?} is not ASCII", c)));
                }
                Ok(text.as_bytes().to_vec())
            }
            TextEncoding::Latin1 => text
                .chars()
                .map(|c| {
                    u8::try_from(u32::from(c))
                        .map_err(|_| self.invalid(format!("{:?} is outside Latin-1", c)))
                })
                .collect(),
            TextEncoding::Utf8 => Ok(text.as_bytes().to_vec()),
            TextEncoding::Utf16Le => Ok(text
                .encode_utf16()
                .flat_map(|unit| unit.to_le_bytes())
                .collect()),
        }
    }

    /// Decode bytes (terminator already removed) to text
    pub fn decode(self, bytes: &[u8]) -> Result<String> {
        match self {
            TextEncoding::Ascii => {
                if let Some(b) = bytes.iter().find(|b| !b.is_ascii()) {
                    return Err(self.invalid(format!("byte 0x{:02X} is not ASCII", b)));
                }
                Ok(bytes.iter().map(|&b| b as char).collect())
            }
            TextEncoding::Latin1 => Ok(bytes.iter().map(|&b| b as char).collect()),
            TextEncoding::Utf8 => String::from_utf8(bytes.to_vec())
                .map_err(|e| self.invalid(e.to_string())),
            TextEncoding::Utf16Le => {
                if bytes.len() % 2 != 0 {
                    return Err(self.invalid(format!("odd byte length {}", bytes.len())));
                }
                let units: Vec<u16> = bytes
                    .chunks_exact(2)
                    .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                    .collect();
                String::from_utf16(&units).map_err(|e| self.invalid(e.to_string()))
            }
        }
    }

    fn invalid(self, reason: String) -> CodecError {
        CodecError::InvalidText {
            encoding: self,
            reason,
        }
    }

    fn is_nul_unit(self, unit: &[u8]) -> bool {
        unit.iter().all(|&b| b == 0)
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TextEncoding::Ascii => "ASCII",
            TextEncoding::Latin1 => "Latin-1",
            TextEncoding::Utf8 => "UTF-8",
            TextEncoding::Utf16Le => "UTF-16LE",
        };
        f.write_str(name)
    }
}

/// Whether a NUL terminator is stored with the text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Terminator {
    #[default]
    None,
    /// One NUL code unit follows the text and counts toward its length
    Included,
}

/// Encoding plus terminator policy for a string field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextFormat {
    pub encoding: TextEncoding,
    pub terminator: Terminator,
}

impl TextFormat {
    pub const fn new(encoding: TextEncoding, terminator: Terminator) -> Self {
        Self {
            encoding,
            terminator,
        }
    }

    /// ASCII without terminator
    pub const fn ascii() -> Self {
        Self::new(TextEncoding::Ascii, Terminator::None)
    }

    /// ASCII followed by a NUL byte
    pub const fn c_string() -> Self {
        Self::new(TextEncoding::Ascii, Terminator::Included)
    }

    fn terminated(&self) -> bool {
        self.terminator == Terminator::Included
    }
}

/// Decode a string stored in exactly `length` bytes
pub fn decode_fixed(cursor: &mut Cursor<'_>, length: usize, format: TextFormat) -> Result<String> {
    let raw = cursor.take(length)?;
    let unit = format.encoding.unit();

    let text_len = if format.terminated() {
        // Everything before the first NUL unit
        raw.chunks_exact(unit)
            .position(|u| format.encoding.is_nul_unit(u))
            .map(|units| units * unit)
            .ok_or_else(|| format.encoding.invalid(format!("no terminator within {} bytes", length)))?
    } else {
        // Trailing NUL padding is not part of the value
        let units = raw.len() / unit;
        let padding = raw
            .chunks_exact(unit)
            .rev()
            .take_while(|u| format.encoding.is_nul_unit(u))
            .count();
        (units - padding) * unit
    };

    format.encoding.decode(&raw[..text_len])
}

/// Encode a string into exactly `length` bytes, padding with NUL
pub fn encode_fixed(text: &str, length: usize, format: TextFormat, out: &mut Vec<u8>) -> Result<()> {
    let bytes = format.encoding.encode(text)?;
    let capacity = if format.terminated() {
        length.saturating_sub(format.encoding.unit())
    } else {
        length
    };
    if bytes.len() > capacity {
        return Err(CodecError::TextTooLong {
            len: bytes.len(),
            capacity,
        });
    }
    out.extend_from_slice(&bytes);
    out.resize(out.len() + (length - bytes.len()), 0);
    Ok(())
}

/// Decode a string whose byte length precedes it
pub fn decode_prefixed(cursor: &mut Cursor<'_>, width: LengthWidth, format: TextFormat) -> Result<String> {
    let len = width.read(cursor)?;
    let raw = cursor.take(len)?;
    let unit = format.encoding.unit();

    let text = if format.terminated() && !raw.is_empty() {
        let (text, terminator) = raw.split_at(raw.len().saturating_sub(unit));
        if terminator.len() != unit || !format.encoding.is_nul_unit(terminator) {
            return Err(format.encoding.invalid("missing terminator".to_string()));
        }
        text
    } else {
        raw
    };

    format.encoding.decode(text)
}

/// Encode a string preceded by its byte length
pub fn encode_prefixed(text: &str, width: LengthWidth, format: TextFormat, out: &mut Vec<u8>) -> Result<()> {
    let mut bytes = format.encoding.encode(text)?;
    if format.terminated() {
        bytes.resize(bytes.len() + format.encoding.unit(), 0);
    }
    width.write(bytes.len(), out)?;
    out.extend_from_slice(&bytes);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_with_terminator() {
        let mut out = Vec::new();
        encode_fixed("abc", 8, TextFormat::c_string(), &mut out).unwrap();
        assert_eq!(out, b"abc\0\0\0\0\0");

        let mut cursor = Cursor::new(&out);
        assert_eq!(decode_fixed(&mut cursor, 8, TextFormat::c_string()).unwrap(), "abc");
        assert!(cursor.is_empty());
    }

    #[test]
    fn test_fixed_terminator_takes_one_byte() {
        let mut out = Vec::new();
        assert_eq!(
            encode_fixed("abcd", 4, TextFormat::c_string(), &mut out),
            Err(CodecError::TextTooLong { len: 4, capacity: 3 })
        );
        assert!(encode_fixed("abcd", 4, TextFormat::ascii(), &mut out).is_ok());
        assert_eq!(out, b"abcd");
    }

    #[test]
    fn test_fixed_stops_at_first_nul() {
        // Garbage after the terminator is ignored
        let data = b"SAH\0xyz\0";
        let mut cursor = Cursor::new(data);
        assert_eq!(decode_fixed(&mut cursor, 8, TextFormat::c_string()).unwrap(), "SAH");
    }

    #[test]
    fn test_fixed_missing_terminator() {
        let mut cursor = Cursor::new(b"abcd");
        assert!(matches!(
            decode_fixed(&mut cursor, 4, TextFormat::c_string()),
            Err(CodecError::InvalidText { .. })
        ));
    }

    #[test]
    fn test_fixed_truncated() {
        let mut cursor = Cursor::new(b"abc");
        assert!(matches!(
            decode_fixed(&mut cursor, 8, TextFormat::ascii()),
            Err(CodecError::TruncatedData { needed: 8, available: 3, .. })
        ));
    }

    #[test]
    fn test_prefixed_counts_terminator() {
        let mut out = Vec::new();
        encode_prefixed("data", LengthWidth::I32, TextFormat::c_string(), &mut out).unwrap();
        assert_eq!(out, b"\x05\x00\x00\x00data\0");

        let mut cursor = Cursor::new(&out);
        let text = decode_prefixed(&mut cursor, LengthWidth::I32, TextFormat::c_string()).unwrap();
        assert_eq!(text, "data");
    }

    #[test]
    fn test_prefixed_without_terminator() {
        let mut out = Vec::new();
        encode_prefixed("hi", LengthWidth::U8, TextFormat::ascii(), &mut out).unwrap();
        assert_eq!(out, b"\x02hi");
    }

    #[test]
    fn test_prefixed_empty_with_terminator_accepts_zero_length() {
        let mut cursor = Cursor::new(&[0x00]);
        let text = decode_prefixed(&mut cursor, LengthWidth::U8, TextFormat::c_string()).unwrap();
        assert_eq!(text, "");
    }

    #[test]
    fn test_utf16_round_trip() {
        let format = TextFormat::new(TextEncoding::Utf16Le, Terminator::Included);
        let mut out = Vec::new();
        encode_prefixed("é!", LengthWidth::U16, format, &mut out).unwrap();
        assert_eq!(out, vec![0x06, 0x00, 0xE9, 0x00, 0x21, 0x00, 0x00, 0x00]);

        let mut cursor = Cursor::new(&out);
        assert_eq!(decode_prefixed(&mut cursor, LengthWidth::U16, format).unwrap(), "é!");
    }

    #[test]
    fn test_ascii_rejects_high_bytes() {
        assert!(TextEncoding::Ascii.decode(&[0x41, 0xC0]).is_err());
        assert!(TextEncoding::Ascii.encode("naïve").is_err());
        assert_eq!(TextEncoding::Latin1.decode(&[0x41, 0xC0]).unwrap(), "AÀ");
        assert_eq!(TextEncoding::Latin1.encode("À").unwrap(), vec![0xC0]);
        assert!(TextEncoding::Latin1.encode("€").is_err());
    }
}
