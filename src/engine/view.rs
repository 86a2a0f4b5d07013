//! Element views
//!
//! A [`View`] decides how the bytes at the cursor are grouped into the
//! elements that `any`, `one_of` and `range` rules compare against: raw
//! bytes, or code points in one of the Unicode encodings.

use serde::{Deserialize, Serialize};

/// How input bytes are decoded into elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum View {
    /// One byte per element
    #[default]
    Byte,
    /// UTF-8 code points
    Utf8,
    /// UTF-16 big endian code points
    Utf16Be,
    /// UTF-16 little endian code points
    Utf16Le,
    /// UTF-32 big endian code points
    Utf32Be,
    /// UTF-32 little endian code points
    Utf32Le,
}

impl View {
    /// Lookahead needed to decode any single element
    #[inline]
    pub fn max_len(self) -> usize {
        match self {
            View::Byte => 1,
            _ => 4,
        }
    }

    /// Decode the element at the start of `bytes`.
    ///
    /// Returns the element and its length in bytes, or `None` when `bytes`
    /// is empty or does not start with a valid element.
    pub fn peek(self, bytes: &[u8]) -> Option<(u32, usize)> {
        match self {
            View::Byte => bytes.first().map(|&b| (u32::from(b), 1)),
            View::Utf8 => peek_utf8(bytes),
            View::Utf16Be => peek_utf16(bytes, u16::from_be_bytes),
            View::Utf16Le => peek_utf16(bytes, u16::from_le_bytes),
            View::Utf32Be => peek_utf32(bytes, u32::from_be_bytes),
            View::Utf32Le => peek_utf32(bytes, u32::from_le_bytes),
        }
    }
}

fn peek_utf8(bytes: &[u8]) -> Option<(u32, usize)> {
    let len = match *bytes.first()? {
        0x00..=0x7F => 1,
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => return None,
    };
    let text = std::str::from_utf8(bytes.get(..len)?).ok()?;
    text.chars().next().map(|c| (u32::from(c), len))
}

fn peek_utf16(bytes: &[u8], decode: fn([u8; 2]) -> u16) -> Option<(u32, usize)> {
    let unit = |i: usize| -> Option<u16> {
        let pair = bytes.get(i..i + 2)?;
        Some(decode([pair[0], pair[1]]))
    };
    let first = unit(0)?;
    match first {
        0xD800..=0xDBFF => {
            let second = unit(2)?;
            if !(0xDC00..=0xDFFF).contains(&second) {
                return None;
            }
            let c = 0x10000 + ((u32::from(first) - 0xD800) << 10) + (u32::from(second) - 0xDC00);
            Some((c, 4))
        }
        0xDC00..=0xDFFF => None,
        _ => Some((u32::from(first), 2)),
    }
}

fn peek_utf32(bytes: &[u8], decode: fn([u8; 4]) -> u32) -> Option<(u32, usize)> {
    let quad = bytes.get(..4)?;
    let c = decode([quad[0], quad[1], quad[2], quad[3]]);
    char::from_u32(c).map(|_| (c, 4))
}
