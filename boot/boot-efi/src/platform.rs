// Firmware services on top of UEFI boot and runtime services

use alloc::boxed::Box;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::slice;
use log::{debug, warn};
use uefi::boot::{self, LoadImageSource, OpenProtocolAttributes, OpenProtocolParams, ScopedProtocol};
use uefi::proto::device_path::build::{self, DevicePathBuilder};
use uefi::proto::device_path::media::{PartitionFormat, PartitionSignature};
use uefi::proto::device_path::text::{AllowShortcuts, DisplayOnly};
use uefi::proto::device_path::{DevicePath, DevicePathNodeEnum};
use uefi::proto::loaded_image::LoadedImage;
use uefi::proto::media::block::BlockIO;
use uefi::proto::BootPolicy;
use uefi::runtime::{self, VariableVendor};
use uefi::table::cfg::{SMBIOS3_GUID, SMBIOS_GUID};
use uefi::{system, CString16, Guid, Handle};
use uuid::Uuid;
use wakeboot::platform::*;
use wakeboot::smbios::{SmBiosEntry, StructureTable};
use wakeboot::BootError;

pub struct EfiFirmware {
    image: Handle,
}

impl EfiFirmware {
    #[inline]
    pub const fn new(image: Handle) -> Self {
        Self { image }
    }

    fn device_path(&self, handle: Handle) -> Option<ScopedProtocol<DevicePath>> {
        unsafe {
            boot::open_protocol::<DevicePath>(
                OpenProtocolParams {
                    handle,
                    agent: self.image,
                    controller: None,
                },
                OpenProtocolAttributes::GetProtocol,
            )
        }
        .ok()
    }

    /// Locates the SMBIOS entry point, 3.x first.
    fn smbios_entry() -> Option<SmBiosEntry> {
        system::with_config_table(|tables| {
            let find = |guid: Guid| {
                tables
                    .iter()
                    .find(|v| v.guid == guid)
                    .map(|v| v.address as *const u8)
            };
            let v3 = find(SMBIOS3_GUID).and_then(|ptr| unsafe {
                SmBiosEntry::from_v3(slice::from_raw_parts(ptr, SmBiosEntry::V3_LEN))
            });
            v3.or_else(|| {
                find(SMBIOS_GUID).and_then(|ptr| unsafe {
                    SmBiosEntry::from_v2(slice::from_raw_parts(ptr, SmBiosEntry::V2_LEN))
                })
            })
        })
    }
}

#[inline]
fn to_guid(uuid: &Uuid) -> Guid {
    Guid::from_bytes(uuid.to_guid_bytes())
}

/// Whether `path` ends in a GPT partition whose unique GUID is `guid`
fn is_gpt_partition(path: &DevicePath, guid: Guid) -> bool {
    path.node_iter().any(|node| match node.as_enum() {
        Ok(DevicePathNodeEnum::MediaHardDrive(hd)) => {
            hd.partition_format() == PartitionFormat::GPT
                && matches!(hd.partition_signature(), PartitionSignature::Guid(v) if v == guid)
        }
        _ => false,
    })
}

/// Converts a mapping path to a `FilePath` node name, `/` becoming `\`
fn file_name(path: &str) -> Result<CString16, BootError> {
    let name = path
        .chars()
        .map(|c| match c {
            '/' => '\\',
            _ => c,
        })
        .collect::<String>();
    CString16::try_from(name.as_str()).map_err(|_| BootError::PathConstructionFailed)
}

impl Inventory for EfiFirmware {
    fn structure_table(&self) -> Result<StructureTable<'_>, BootError> {
        let entry = Self::smbios_entry().ok_or(BootError::InventoryUnavailable)?;
        log::info!("SMBIOS Version: {}", entry);
        let data = unsafe {
            slice::from_raw_parts(entry.table_address as usize as *const u8, entry.table_len)
        };
        Ok(StructureTable::new(data, entry.n_structures))
    }
}

impl VariableStore for EfiFirmware {
    fn get(&self, name: &str, vendor: &Uuid) -> Option<Vec<u8>> {
        let name = CString16::try_from(name).ok()?;
        match runtime::get_variable_boxed(&name, &VariableVendor(to_guid(vendor))) {
            Ok((data, _)) => Some(data.into_vec()),
            Err(err) => {
                warn!("GetVariable {}: {:?}", name, err.status());
                None
            }
        }
    }
}

impl Storage for EfiFirmware {
    type Device = Handle;
    type Path = Box<DevicePath>;

    fn devices_with_signature(&self, signature: &Uuid) -> Vec<Handle> {
        let guid = to_guid(signature);
        let Ok(handles) = boot::locate_handle_buffer(boot::SearchType::from_proto::<BlockIO>())
        else {
            return Vec::new();
        };
        handles
            .iter()
            .copied()
            .filter(|&handle| {
                self.device_path(handle)
                    .is_some_and(|path| is_gpt_partition(&path, guid))
            })
            .collect()
    }

    fn boot_device(&self) -> Option<Handle> {
        boot::open_protocol_exclusive::<LoadedImage>(self.image)
            .ok()
            .and_then(|image| image.device())
    }

    fn file_path(&self, device: Handle, path: &str) -> Result<Box<DevicePath>, BootError> {
        let device_path = self
            .device_path(device)
            .ok_or(BootError::PathConstructionFailed)?;
        debug!("Device Path: {}", self.describe_path(&device_path));

        let file_name = file_name(path)?;

        let mut buf = Vec::<u8>::new();
        let mut builder = DevicePathBuilder::with_vec(&mut buf);
        for node in device_path.node_iter() {
            builder = builder
                .push(&node)
                .map_err(|_| BootError::PathConstructionFailed)?;
        }
        let file_path = builder
            .push(&build::media::FilePath {
                path_name: &file_name,
            })
            .and_then(|v| v.finalize())
            .map_err(|_| BootError::PathConstructionFailed)?;
        Ok(file_path.to_boxed())
    }

    fn describe(&self, path: &Box<DevicePath>) -> String {
        self.describe_path(path)
    }
}

impl EfiFirmware {
    fn describe_path(&self, path: &DevicePath) -> String {
        match path.to_string(DisplayOnly(false), AllowShortcuts(false)) {
            Ok(text) => text.to_string(),
            Err(_) => String::from("<unavailable>"),
        }
    }
}

impl ImageLoader for EfiFirmware {
    type Image = Handle;

    fn load(&mut self, path: &Box<DevicePath>) -> Result<Handle, BootError> {
        boot::load_image(
            self.image,
            LoadImageSource::FromDevicePath {
                device_path: path,
                boot_policy: BootPolicy::ExactMatch,
            },
        )
        .map_err(|err| BootError::LoadFailed(err.status().0))
    }

    fn start(&mut self, image: Handle) -> Result<(), BootError> {
        boot::start_image(image).map_err(|err| BootError::StartFailed(err.status().0))
    }
}

impl Console for EfiFirmware {
    fn pause(&mut self) {
        if let Err(err) = lib_efi::pause() {
            warn!("Failed to wait for a key: {:?}", err.status());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names() {
        let name = file_name("/EFI/ubuntu/shimx64.efi").unwrap();
        assert_eq!(name.to_string(), "\\EFI\\ubuntu\\shimx64.efi");
        assert_eq!(
            file_name("\\EFI\\BOOT\\BOOTX64.EFI").unwrap().to_string(),
            "\\EFI\\BOOT\\BOOTX64.EFI"
        );
        assert_eq!(
            file_name("A.EFI\0B.EFI"),
            Err(BootError::PathConstructionFailed)
        );
    }
}
