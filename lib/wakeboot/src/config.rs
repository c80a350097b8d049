// Boot Settings

use bitflags::bitflags;
use core::{fmt, str::Utf8Error};
use serde::Deserialize;
use uuid::{Uuid, UuidError};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSettings<'a> {
    #[serde(default = "config_default_variable")]
    variable: &'a str,

    #[serde(default = "config_default_vendor")]
    vendor: &'a str,

    #[serde(default = "config_default_true")]
    pause_on_error: bool,

    #[serde(default = "config_default_true")]
    clear_screen: bool,

    #[serde(default)]
    debug_mode: bool,
}

fn config_default_variable() -> &'static str {
    BootSettings::DEFAULT_VARIABLE
}

fn config_default_vendor() -> &'static str {
    "1BE4DF61-93CA-11D2-AA0D-00E098032B8C"
}

fn config_default_true() -> bool {
    true
}

bitflags! {
    #[derive(Default)]
    pub struct RunFlags: u32 {
        /// Wait for a key after reporting a failure
        const PAUSE_ON_ERROR = 0b0000_0001;
        /// Clear the console before the banner
        const CLEAR_SCREEN = 0b0000_0010;
        /// Print the mapping table and state transitions
        const DEBUG_MODE = 0b0000_0100;
    }
}

/// Settings read from `config.json` next to the loader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootSettings<'a> {
    variable: &'a str,
    vendor: Uuid,
    flags: RunFlags,
}

impl Default for BootSettings<'_> {
    fn default() -> Self {
        Self {
            variable: Self::DEFAULT_VARIABLE,
            vendor: Self::DEFAULT_VENDOR,
            flags: RunFlags::PAUSE_ON_ERROR | RunFlags::CLEAR_SCREEN,
        }
    }
}

impl<'a> BootSettings<'a> {
    pub const DEFAULT_CONFIG_PATH: &'static str = "/EFI/WAKEBOOT/config.json";

    pub const DEFAULT_VARIABLE: &'static str = "WakeUpType";

    pub const DEFAULT_VENDOR: Uuid = Uuid::from_parts(
        0x1BE4_DF61,
        0x93CA,
        0x11D2,
        0xAA0D,
        [0x00, 0xE0, 0x98, 0x03, 0x2B, 0x8C],
    );

    pub fn load(json: &'a str) -> Result<Self, SettingsError> {
        let raw: RawSettings = serde_json_core::from_str(json)
            .map(|v| v.0)
            .map_err(SettingsError::Json)?;

        let mut flags = RunFlags::empty();
        if raw.pause_on_error {
            flags.insert(RunFlags::PAUSE_ON_ERROR);
        }
        if raw.clear_screen {
            flags.insert(RunFlags::CLEAR_SCREEN);
        }
        if raw.debug_mode {
            flags.insert(RunFlags::DEBUG_MODE);
        }

        Ok(Self {
            variable: raw.variable,
            vendor: Uuid::parse(raw.vendor).map_err(SettingsError::Vendor)?,
            flags,
        })
    }

    /// Parses a raw file, which must be UTF-8.
    #[inline]
    pub fn from_bytes(blob: &'a [u8]) -> Result<Self, SettingsError> {
        core::str::from_utf8(blob)
            .map_err(SettingsError::Utf8)
            .and_then(Self::load)
    }

    /// Name of the variable holding the mapping
    #[inline]
    pub const fn variable(&self) -> &'a str {
        self.variable
    }

    /// Vendor GUID of the variable holding the mapping
    #[inline]
    pub const fn vendor(&self) -> &Uuid {
        &self.vendor
    }

    #[inline]
    pub const fn flags(&self) -> RunFlags {
        self.flags
    }

    #[inline]
    pub const fn is_debug_mode(&self) -> bool {
        self.flags.contains(RunFlags::DEBUG_MODE)
    }
}

#[derive(Debug)]
pub enum SettingsError {
    Utf8(Utf8Error),
    Json(serde_json_core::de::Error),
    Vendor(UuidError),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Utf8(err) => write!(f, "{}", err),
            Self::Json(err) => write!(f, "{}", err),
            Self::Vendor(err) => write!(f, "vendor: {}", err),
        }
    }
}
