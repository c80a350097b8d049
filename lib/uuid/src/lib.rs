//! Universally Unique Identifier (RFC 4122) and UEFI GUID text decoding
#![cfg_attr(not(test), no_std)]

use core::{fmt, str::FromStr};

/// Universally Unique Identifier (RFC 4122)
///
/// The bytes are kept in canonical (big-endian field) order, i.e. the order
/// in which the hex digits appear in the textual form.
#[repr(transparent)]
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Uuid([u8; 16]);

impl Uuid {
    /// Length of the textual form `XXXXXXXX-XXXX-XXXX-XXXX-XXXXXXXXXXXX`
    pub const TEXT_LEN: usize = 36;

    /// Positions of the hyphens in the textual form
    const SEPARATORS: [usize; 4] = [8, 13, 18, 23];

    #[inline]
    pub const fn from_parts(a: u32, b: u16, c: u16, d: u16, e: [u8; 6]) -> Self {
        Self([
            ((a >> 24) & 0xFF) as u8,
            ((a >> 16) & 0xFF) as u8,
            ((a >> 8) & 0xFF) as u8,
            (a & 0xFF) as u8,
            ((b >> 8) & 0xFF) as u8,
            (b & 0xFF) as u8,
            ((c >> 8) & 0xFF) as u8,
            (c & 0xFF) as u8,
            ((d >> 8) & 0xFF) as u8,
            (d & 0xFF) as u8,
            e[0],
            e[1],
            e[2],
            e[3],
            e[4],
            e[5],
        ])
    }

    /// Creates from the UEFI `EFI_GUID` memory layout, where the first three
    /// fields are stored little-endian.
    #[inline]
    pub const fn from_guid_bytes(g: [u8; 16]) -> Self {
        Self([
            g[3], g[2], g[1], g[0], g[5], g[4], g[7], g[6], g[8], g[9], g[10], g[11], g[12],
            g[13], g[14], g[15],
        ])
    }

    /// Returns the bytes in the UEFI `EFI_GUID` memory layout.
    #[inline]
    pub const fn to_guid_bytes(&self) -> [u8; 16] {
        let r = &self.0;
        [
            r[3], r[2], r[1], r[0], r[5], r[4], r[7], r[6], r[8], r[9], r[10], r[11], r[12],
            r[13], r[14], r[15],
        ]
    }

    /// Parses the canonical 36-character hyphenated form.
    ///
    /// Unlike [`hex_to_int`], every digit must be a hex digit, so a malformed
    /// string can never turn into a partially parsed identifier.
    pub fn parse(text: &str) -> Result<Self, UuidError> {
        let bytes = text.as_bytes();
        if bytes.len() != Self::TEXT_LEN {
            return Err(UuidError::InvalidLength(bytes.len()));
        }
        for (index, &byte) in bytes.iter().enumerate() {
            if Self::SEPARATORS.contains(&index) {
                if byte != b'-' {
                    return Err(UuidError::InvalidSeparator(index));
                }
            } else if !byte.is_ascii_hexdigit() {
                return Err(UuidError::InvalidDigit(index));
            }
        }

        let a = hex_to_int(&text[0..], 8);
        let b = hex_to_int(&text[9..], 4) as u16;
        let c = hex_to_int(&text[14..], 4) as u16;
        let d = hex_to_int(&text[19..], 4) as u16;
        let mut e = [0u8; 6];
        for (i, byte) in e.iter_mut().enumerate() {
            *byte = hex_to_int(&text[24 + i * 2..], 2) as u8;
        }

        Ok(Self::from_parts(a, b, c, d, e))
    }

    #[inline]
    pub const fn a(&self) -> u32 {
        ((self.0[0] as u32) << 24)
            + ((self.0[1] as u32) << 16)
            + ((self.0[2] as u32) << 8)
            + (self.0[3] as u32)
    }

    #[inline]
    pub const fn b(&self) -> u16 {
        ((self.0[4] as u16) << 8) + (self.0[5] as u16)
    }

    #[inline]
    pub const fn c(&self) -> u16 {
        ((self.0[6] as u16) << 8) + (self.0[7] as u16)
    }

    #[inline]
    pub const fn d(&self) -> u16 {
        ((self.0[8] as u16) << 8) + (self.0[9] as u16)
    }

    #[inline]
    pub fn e(&self) -> &[u8] {
        &self.0[10..]
    }

    #[inline]
    pub fn e_u48(&self) -> u64 {
        self.e().iter().fold(0, |acc, v| (acc << 8) + (*v as u64))
    }
}

impl FromStr for Uuid {
    type Err = UuidError;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Debug for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:08x}-{:04x}-{:04x}-{:04x}-{:012x}",
            self.a(),
            self.b(),
            self.c(),
            self.d(),
            self.e_u48(),
        )
    }
}

impl fmt::Display for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:08X}-{:04X}-{:04X}-{:04X}-{:012X}",
            self.a(),
            self.b(),
            self.c(),
            self.d(),
            self.e_u48(),
        )
    }
}

/// Reasons a GUID string is rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UuidError {
    /// The text is not 36 characters long
    InvalidLength(usize),
    /// A hyphen is missing at the given position
    InvalidSeparator(usize),
    /// A non-hex character at the given position
    InvalidDigit(usize),
}

impl fmt::Display for UuidError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidLength(len) => {
                write!(f, "expected {} characters, found {}", Uuid::TEXT_LEN, len)
            }
            Self::InvalidSeparator(pos) => write!(f, "expected '-' at position {}", pos),
            Self::InvalidDigit(pos) => write!(f, "invalid hex digit at position {}", pos),
        }
    }
}

/// Interprets the first `len` characters of `text` as big-endian hex digits.
///
/// Characters other than `0-9`, `A-F` and `a-f`, as well as positions past
/// the end of `text`, contribute a zero nibble. Callers that need strict
/// validation must check the input themselves (see [`Uuid::parse`]).
pub fn hex_to_int(text: &str, len: usize) -> u32 {
    let bytes = text.as_bytes();
    (0..len).fold(0u32, |acc, i| {
        let nibble = match bytes.get(i).copied() {
            Some(c @ b'0'..=b'9') => c - b'0',
            Some(c @ b'A'..=b'F') => c - b'A' + 10,
            Some(c @ b'a'..=b'f') => c - b'a' + 10,
            _ => 0,
        };
        (acc << 4) | nibble as u32
    })
}
