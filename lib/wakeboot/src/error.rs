// Boot Errors

use core::fmt;
use uuid::UuidError;

/// Reasons a boot selection run stops.
///
/// Every variant is terminal for the run. Firmware status codes are carried
/// as their raw value so this crate stays independent of the firmware
/// bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootError {
    /// Neither SMBIOS entry point is published by the firmware
    InventoryUnavailable,
    /// No system information structure carries a wake-up type
    WakeCodeNotFound,
    /// The mapping variable is missing, empty or undecodable
    ConfigUnavailable,
    /// The mapping has no entry for this wake-up type
    MappingIndexOutOfRange { code: u8, entries: usize },
    /// The volume GUID of the selected entry cannot be parsed
    MalformedIdentifier(UuidError),
    /// The selected entry is `<GUID>=` without a file path
    MissingPath,
    /// No partition carries the requested GUID
    VolumeNotFound,
    /// More than one partition carries the requested GUID
    VolumeAmbiguous { count: usize },
    /// The device path for the target image cannot be built
    PathConstructionFailed,
    /// The firmware refused to load the image
    LoadFailed(usize),
    /// The firmware failed to start the image
    StartFailed(usize),
}

impl fmt::Display for BootError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InventoryUnavailable => write!(f, "SMBIOS table not available"),
            Self::WakeCodeNotFound => write!(f, "No valid SMBIOS WakeUpType entry found"),
            Self::ConfigUnavailable => write!(f, "Could not get boot mapping"),
            Self::MappingIndexOutOfRange { code, entries } => write!(
                f,
                "No mapping for wake-up type {:#04x} ({} entries)",
                code, entries
            ),
            Self::MalformedIdentifier(err) => write!(f, "Invalid GUID format: {}", err),
            Self::MissingPath => write!(f, "Mapping entry has no boot file"),
            Self::VolumeNotFound => write!(f, "Failed to locate EFI partition"),
            Self::VolumeAmbiguous { count } => {
                write!(f, "Found {} EFI partitions, but expected 1", count)
            }
            Self::PathConstructionFailed => write!(f, "Unable to build file path"),
            Self::LoadFailed(status) => write!(f, "LoadImage failed: {:#x}", status),
            Self::StartFailed(status) => write!(f, "StartImage failed: {:#x}", status),
        }
    }
}

impl From<UuidError> for BootError {
    #[inline]
    fn from(err: UuidError) -> Self {
        Self::MalformedIdentifier(err)
    }
}
