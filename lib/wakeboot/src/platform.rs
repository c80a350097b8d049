// Firmware services used by the selector

use crate::{smbios::StructureTable, BootError};
use alloc::string::String;
use alloc::vec::Vec;
use uuid::Uuid;

/// Platform inventory (SMBIOS)
pub trait Inventory {
    /// Returns the structure table bounded by its declared size.
    fn structure_table(&self) -> Result<StructureTable<'_>, BootError>;
}

/// Persistent firmware variables
pub trait VariableStore {
    fn get(&self, name: &str, vendor: &Uuid) -> Option<Vec<u8>>;
}

/// Storage enumeration and device paths
pub trait Storage {
    type Device: Copy;
    type Path;

    /// Every GPT partition whose unique partition GUID is `signature`,
    /// enumerated fresh on each call.
    fn devices_with_signature(&self, signature: &Uuid) -> Vec<Self::Device>;

    /// The device this loader was started from
    fn boot_device(&self) -> Option<Self::Device>;

    /// Appends `path` to the device path of `device`.
    fn file_path(&self, device: Self::Device, path: &str) -> Result<Self::Path, BootError>;

    /// Human readable form of a path for the console
    fn describe(&self, path: &Self::Path) -> String;
}

/// Image loading and execution
pub trait ImageLoader: Storage {
    type Image;

    fn load(&mut self, path: &Self::Path) -> Result<Self::Image, BootError>;

    /// Transfers control to `image`. Returns `Ok` only if the image exits.
    fn start(&mut self, image: Self::Image) -> Result<(), BootError>;
}

pub trait Console {
    /// Discards pending keystrokes and waits for one key.
    fn pause(&mut self);
}

/// Everything the selector needs from the firmware
pub trait Firmware: Inventory + VariableStore + ImageLoader + Console {}

impl<T> Firmware for T where T: Inventory + VariableStore + ImageLoader + Console {}
