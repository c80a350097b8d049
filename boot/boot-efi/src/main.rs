// Wake-up type boot selector for UEFI

#![no_std]
#![no_main]

use log::{error, info, LevelFilter};
use uefi::{boot, prelude::*};
use wakeboot::{boot::Selector, config::*};
use wakeboot_efi::{platform::EfiFirmware, status_of};

#[entry]
fn efi_main() -> Status {
    if uefi::helpers::init().is_err() {
        return Status::ABORTED;
    }
    let handle = boot::image_handle();

    // Load CONFIG
    let blob = match lib_efi::get_file(handle, BootSettings::DEFAULT_CONFIG_PATH) {
        Ok(blob) => Some(blob),
        Err(Status::NOT_FOUND) => None,
        Err(status) => {
            error!("Error: Load failed {}", BootSettings::DEFAULT_CONFIG_PATH);
            return status;
        }
    };
    let settings = match blob.as_deref().map(BootSettings::from_bytes) {
        Some(Ok(settings)) => settings,
        Some(Err(err)) => {
            error!("Error in config: {}", err);
            return Status::LOAD_ERROR;
        }
        None => BootSettings::default(),
    };

    log::set_max_level(if settings.is_debug_mode() {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    });
    if let Err(err) = lib_efi::init_console(settings.flags().contains(RunFlags::CLEAR_SCREEN)) {
        error!("Console: {:?}", err.status());
    }

    info!("WakeBoot v{}", env!("CARGO_PKG_VERSION"));

    let mut firmware = EfiFirmware::new(handle);
    match Selector::new(&mut firmware, &settings).boot() {
        Ok(()) => Status::SUCCESS,
        Err(failure) => status_of(&failure.error),
    }
}
