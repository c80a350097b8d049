// Wake-up Type to Boot File Mapping
//
// The mapping is a list of up to nine whitespace separated entries. The entry
// at position `n` is used when the wake-up type is `n`. An entry is either
// `<partition GUID>=<path>` or a bare `<path>` on the volume this loader was
// started from.

use crate::{smbios::WakeCode, words::*, BootError};
use alloc::string::String;
use alloc::vec::Vec;
use core::{char, fmt};
use uuid::Uuid;

/// Decodes the raw variable contents.
///
/// Firmware stores the mapping as a `CHAR16` string; plain ASCII is accepted
/// too. The text ends at the first NUL.
pub fn decode_text(bytes: &[u8]) -> Result<String, BootError> {
    let is_utf16 = match bytes {
        [0xFF, 0xFE, ..] => true,
        [_, 0, ..] => true,
        _ => false,
    };
    let text = if is_utf16 {
        let units = bytes
            .chunks_exact(2)
            .map(|v| u16::from_le_bytes([v[0], v[1]]))
            .collect::<Vec<_>>();
        let units = match units.iter().position(|&v| v == 0) {
            Some(len) => &units[..len],
            None if bytes.len() % 2 != 0 => return Err(BootError::ConfigUnavailable),
            None => &units[..],
        };
        char::decode_utf16(units.iter().copied().skip_while(|&v| v == 0xFEFF))
            .collect::<Result<String, _>>()
            .map_err(|_| BootError::ConfigUnavailable)?
    } else {
        let len = bytes.iter().position(|&v| v == 0).unwrap_or(bytes.len());
        let text = core::str::from_utf8(&bytes[..len]).map_err(|_| BootError::ConfigUnavailable)?;
        String::from(text)
    };

    if text.trim().is_empty() {
        return Err(BootError::ConfigUnavailable);
    }
    Ok(text)
}

/// The parsed mapping, borrowing the decoded text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WakeMap<'a> {
    entries: Vec<&'a str>,
}

impl<'a> WakeMap<'a> {
    /// Maximum number of entries, one per wake-up type 0 to 8
    pub const MAX_ENTRIES: usize = 9;

    pub fn parse(text: &'a str) -> Result<Self, BootError> {
        let mut words = Words::new(text, Self::MAX_ENTRIES, Separator::Whitespace);
        let entries = words.by_ref().collect::<Vec<_>>();
        if entries.is_empty() {
            return Err(BootError::ConfigUnavailable);
        }
        if words.is_truncated() {
            log::warn!("Boot mapping has more than {} entries", Self::MAX_ENTRIES);
        }
        Ok(Self { entries })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn entries(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.entries.iter().copied()
    }

    /// Selects the entry for `code` by position.
    pub fn select(&self, code: WakeCode) -> Result<MapEntry<'a>, BootError> {
        let entry = self
            .entries
            .get(code.index())
            .copied()
            .ok_or(BootError::MappingIndexOutOfRange {
                code: code.as_u8(),
                entries: self.entries.len(),
            })?;
        MapEntry::parse(entry)
    }
}

/// One mapping entry, split but not yet validated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapEntry<'a> {
    /// Volume GUID text, `None` for a bare path
    pub volume: Option<&'a str>,
    pub path: &'a str,
}

impl<'a> MapEntry<'a> {
    pub fn parse(entry: &'a str) -> Result<Self, BootError> {
        if !entry.contains('=') {
            return Ok(Self {
                volume: None,
                path: entry,
            });
        }
        let mut parts = Words::new(entry, 2, '=');
        match (parts.next(), parts.next()) {
            (Some(volume), Some(path)) => Ok(Self {
                volume: Some(volume),
                path,
            }),
            _ => Err(BootError::MissingPath),
        }
    }

    /// Validates the volume GUID.
    pub fn target(&self) -> Result<Target<'a>, BootError> {
        match self.volume {
            Some(volume) => Ok(Target::Volume {
                volume: Uuid::parse(volume)?,
                path: self.path,
            }),
            None => Ok(Target::BootVolume { path: self.path }),
        }
    }
}

impl fmt::Display for MapEntry<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.volume {
            Some(volume) => write!(f, "{} on {}", self.path, volume),
            None => write!(f, "{}", self.path),
        }
    }
}

/// Where the boot file lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target<'a> {
    /// On the GPT partition with this unique GUID
    Volume { volume: Uuid, path: &'a str },
    /// On the volume this loader was started from
    BootVolume { path: &'a str },
}

impl<'a> Target<'a> {
    #[inline]
    pub fn volume(&self) -> Option<Uuid> {
        match *self {
            Self::Volume { volume, .. } => Some(volume),
            Self::BootVolume { .. } => None,
        }
    }

    #[inline]
    pub fn path(&self) -> &'a str {
        match *self {
            Self::Volume { path, .. } | Self::BootVolume { path } => path,
        }
    }
}

/// Decodes `bytes` and resolves the target for `code`.
///
/// The returned target owns its path, so the decoded text does not have to
/// outlive the call.
pub fn resolve(bytes: &[u8], code: WakeCode) -> Result<(Option<Uuid>, String), BootError> {
    let text = decode_text(bytes)?;
    let map = WakeMap::parse(&text)?;
    for (index, entry) in map.entries().enumerate() {
        log::debug!("Wake-up Type {:#04x} : Bootfile {}", index, entry);
    }
    let target = map.select(code)?.target()?;
    Ok((target.volume(), String::from(target.path())))
}
