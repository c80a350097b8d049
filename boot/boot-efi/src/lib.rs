#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod platform;

use uefi::Status;
use wakeboot::BootError;

/// EFI status returned from the image entry point for a failed run
pub fn status_of(error: &BootError) -> Status {
    match *error {
        BootError::InventoryUnavailable
        | BootError::WakeCodeNotFound
        | BootError::VolumeNotFound
        | BootError::PathConstructionFailed => Status::NOT_FOUND,
        BootError::ConfigUnavailable
        | BootError::MappingIndexOutOfRange { .. }
        | BootError::VolumeAmbiguous { .. } => Status::ABORTED,
        BootError::MalformedIdentifier(_) | BootError::MissingPath => Status::INVALID_PARAMETER,
        BootError::LoadFailed(status) | BootError::StartFailed(status) => Status(status),
    }
}
