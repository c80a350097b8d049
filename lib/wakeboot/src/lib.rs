//! Wake-up type boot selector
//!
//! Reads the SMBIOS wake-up type, looks it up in a mapping stored in a
//! firmware variable and chain-loads the boot file it names. Firmware
//! services are reached only through the traits in [`platform`], so the
//! whole selection runs on the host in tests.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod boot;
pub mod config;
pub mod mapping;
pub mod platform;
pub mod smbios;
pub mod volume;
pub mod words;

mod error;
pub use error::*;
