#![no_std]

use alloc::boxed::Box;
use alloc::vec::Vec;
use uefi::boot;
use uefi::proto::console::text::Color;
use uefi::proto::media::file::*;
use uefi::{system, CStr16, Handle, ResultExt, Status};

extern crate alloc;

#[cfg(target_os = "uefi")]
#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    log::error!("{}", info);
    loop {
        core::hint::spin_loop();
    }
}

/// Reads a whole file from the volume the image was loaded from.
///
/// `path` may use `/` as separator.
pub fn get_file(handle: Handle, path: &str) -> Result<Box<[u8]>, Status> {
    let Ok(mut fs) = boot::get_image_file_system(handle) else {
        return Err(Status::LOAD_ERROR);
    };
    let mut root = match fs.open_volume() {
        Ok(val) => val,
        Err(err) => return Err(err.status()),
    };

    let mut path = path
        .chars()
        .map(|c| match c {
            '/' => '\\',
            _ => c,
        })
        .collect::<alloc::string::String>()
        .encode_utf16()
        .collect::<Vec<u16>>();
    path.push(0);
    let Ok(path) = CStr16::from_u16_with_nul(&path) else {
        return Err(Status::INVALID_PARAMETER);
    };

    let handle = match root.open(path, FileMode::Read, FileAttribute::empty()) {
        Ok(handle) => handle,
        Err(err) => {
            return Err(err.status());
        }
    };

    let mut file = match handle.into_type() {
        Ok(FileType::Regular(file)) => file,
        Ok(FileType::Dir(_)) => return Err(Status::UNSUPPORTED),
        Err(err) => return Err(err.status()),
    };

    match file.set_position(RegularFile::END_OF_FILE) {
        Ok(_) => (),
        Err(err) => return Err(err.status()),
    };
    let file_size = match file.get_position() {
        Ok(val) => val,
        Err(err) => return Err(err.status()),
    } as usize;
    match file.set_position(0) {
        Ok(_) => (),
        Err(err) => return Err(err.status()),
    };

    let mut buffer = Vec::new();
    if buffer.try_reserve(file_size).is_err() {
        return Err(Status::OUT_OF_RESOURCES);
    }
    buffer.resize(file_size, 0);

    file.read(buffer.as_mut_slice())
        .map(|size| {
            buffer.truncate(size);
            buffer.into_boxed_slice()
        })
        .map_err(|v| v.status())
}

/// Prepares the text console: optional clear, white on black, cursor on.
pub fn init_console(clear: bool) -> uefi::Result {
    system::with_stdout(|stdout| {
        if clear {
            stdout.clear()?;
        }
        stdout.set_color(Color::White, Color::Black)?;
        // not every console can show a cursor
        if let Err(err) = stdout.enable_cursor(true) {
            log::debug!("EnableCursor: {:?}", err.status());
        }
        Ok(())
    })
}

/// Flushes pending keystrokes, then blocks until a key is pressed.
pub fn pause() -> uefi::Result {
    system::with_stdin(|stdin| {
        stdin.reset(false)?;
        let Some(event) = stdin.wait_for_key_event() else {
            return Ok(());
        };
        boot::wait_for_event(&mut [event]).discard_errdata()?;
        stdin.read_key()?;
        Ok(())
    })
}
