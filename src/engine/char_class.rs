//! ASCII character classes
//!
//! Each class is one bit in a pre-computed 256-entry table, so a class test
//! is a single lookup. Bytes outside ASCII belong to no class.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Static lookup table for class name -> CharClass
static NAME_MAP: OnceLock<AHashMap<&'static str, CharClass>> = OnceLock::new();

/// A named ASCII character class
///
/// ```rust
/// use pegkit::engine::CharClass;
///
/// let class = CharClass::from_name("xdigit").unwrap();
/// assert!(class.matches(b'F'));
/// assert!(!class.matches(b'g'));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CharClass {
    /// `[a-zA-Z]`
    Alpha,
    /// `[0-9]`
    Digit,
    /// `[a-zA-Z0-9]`
    Alnum,
    /// `[0-9a-fA-F]`
    XDigit,
    /// `[a-z]`
    Lower,
    /// `[A-Z]`
    Upper,
    /// Space, tab, newline, carriage return, vertical tab, form feed
    Space,
    /// Space and tab
    Blank,
    /// Printable non-alphanumeric characters
    Punct,
    /// Printable characters including space
    Print,
    /// Printable characters excluding space
    Graph,
    /// Control characters (0-31 and 127)
    Cntrl,
    /// `[a-zA-Z_]`, the first character of an identifier
    IdentifierFirst,
    /// `[a-zA-Z0-9_]`, the remaining characters of an identifier
    IdentifierOther,
}

impl CharClass {
    /// All classes, in declaration order
    pub const ALL: [CharClass; 14] = [
        CharClass::Alpha,
        CharClass::Digit,
        CharClass::Alnum,
        CharClass::XDigit,
        CharClass::Lower,
        CharClass::Upper,
        CharClass::Space,
        CharClass::Blank,
        CharClass::Punct,
        CharClass::Print,
        CharClass::Graph,
        CharClass::Cntrl,
        CharClass::IdentifierFirst,
        CharClass::IdentifierOther,
    ];

    #[inline(always)]
    const fn bit(self) -> u16 {
        1 << (self as u16)
    }

    /// Check if a byte belongs to this class
    #[inline(always)]
    pub fn matches(self, b: u8) -> bool {
        CLASS_TABLE[b as usize] & self.bit() != 0
    }

    /// Short lowercase name, as accepted by [`CharClass::from_name`]
    pub fn name(self) -> &'static str {
        match self {
            CharClass::Alpha => "alpha",
            CharClass::Digit => "digit",
            CharClass::Alnum => "alnum",
            CharClass::XDigit => "xdigit",
            CharClass::Lower => "lower",
            CharClass::Upper => "upper",
            CharClass::Space => "space",
            CharClass::Blank => "blank",
            CharClass::Punct => "punct",
            CharClass::Print => "print",
            CharClass::Graph => "graph",
            CharClass::Cntrl => "cntrl",
            CharClass::IdentifierFirst => "identifier_first",
            CharClass::IdentifierOther => "identifier_other",
        }
    }

    /// Look a class up by its short name or by an equivalent bracket pattern
    pub fn from_name(name: &str) -> Option<Self> {
        NAME_MAP
            .get_or_init(|| {
                let mut map: AHashMap<&'static str, CharClass> =
                    CharClass::ALL.iter().map(|&c| (c.name(), c)).collect();
                map.extend([
                    ("[a-zA-Z]", CharClass::Alpha),
                    ("[0-9]", CharClass::Digit),
                    ("\\d", CharClass::Digit),
                    ("[a-zA-Z0-9]", CharClass::Alnum),
                    ("[0-9a-fA-F]", CharClass::XDigit),
                    ("[a-z]", CharClass::Lower),
                    ("[A-Z]", CharClass::Upper),
                    ("\\s", CharClass::Space),
                    ("[ \t]", CharClass::Blank),
                    ("[a-zA-Z_]", CharClass::IdentifierFirst),
                    ("\\w", CharClass::IdentifierOther),
                    ("[a-zA-Z0-9_]", CharClass::IdentifierOther),
                ]);
                map
            })
            .get(name)
            .copied()
    }
}

/// Class membership bits for every byte value
static CLASS_TABLE: [u16; 256] = build_table();

const fn build_table() -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut i = 0usize;
    while i < 256 {
        let b = i as u8;
        let lower = b.is_ascii_lowercase();
        let upper = b.is_ascii_uppercase();
        let digit = b.is_ascii_digit();
        let alpha = lower || upper;
        let alnum = alpha || digit;
        let mut bits = 0u16;
        if alpha {
            bits |= CharClass::Alpha.bit();
        }
        if digit {
            bits |= CharClass::Digit.bit();
        }
        if alnum {
            bits |= CharClass::Alnum.bit();
        }
        if b.is_ascii_hexdigit() {
            bits |= CharClass::XDigit.bit();
        }
        if lower {
            bits |= CharClass::Lower.bit();
        }
        if upper {
            bits |= CharClass::Upper.bit();
        }
        if matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0B | 0x0C) {
            bits |= CharClass::Space.bit();
        }
        if b == b' ' || b == b'\t' {
            bits |= CharClass::Blank.bit();
        }
        if b.is_ascii_punctuation() {
            bits |= CharClass::Punct.bit();
        }
        if b >= 32 && b < 127 {
            bits |= CharClass::Print.bit();
        }
        if b > 32 && b < 127 {
            bits |= CharClass::Graph.bit();
        }
        if b < 32 || b == 127 {
            bits |= CharClass::Cntrl.bit();
        }
        if alpha || b == b'_' {
            bits |= CharClass::IdentifierFirst.bit();
        }
        if alnum || b == b'_' {
            bits |= CharClass::IdentifierOther.bit();
        }
        table[i] = bits;
        i += 1;
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digit() {
        for b in b'0'..=b'9' {
            assert!(CharClass::Digit.matches(b));
        }
        assert!(!CharClass::Digit.matches(b'a'));
        assert!(!CharClass::Digit.matches(0xB2));
    }

    #[test]
    fn test_identifier() {
        assert!(CharClass::IdentifierFirst.matches(b'_'));
        assert!(!CharClass::IdentifierFirst.matches(b'1'));
        assert!(CharClass::IdentifierOther.matches(b'1'));
    }

    #[test]
    fn test_space_and_blank() {
        assert!(CharClass::Space.matches(b'\n'));
        assert!(!CharClass::Blank.matches(b'\n'));
        assert!(CharClass::Blank.matches(b'\t'));
    }

    #[test]
    fn test_print_graph_cntrl() {
        assert!(CharClass::Print.matches(b' '));
        assert!(!CharClass::Graph.matches(b' '));
        assert!(CharClass::Cntrl.matches(0x7F));
        assert!(CharClass::Punct.matches(b'{'));
        assert!(!CharClass::Punct.matches(b'a'));
    }

    #[test]
    fn test_names_round_trip() {
        for class in CharClass::ALL {
            assert_eq!(CharClass::from_name(class.name()), Some(class));
        }
        assert_eq!(CharClass::from_name("[0-9]"), Some(CharClass::Digit));
        assert_eq!(CharClass::from_name("nope"), None);
    }
}
