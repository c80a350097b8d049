// Volume Locator

use crate::{platform::Storage, BootError};
use alloc::string::String;
use uuid::Uuid;

/// Finds the one partition carrying `volume`.
///
/// A GUID found on more than one partition is an error rather than a
/// reason to pick one of them.
pub fn locate<S: Storage + ?Sized>(storage: &S, volume: &Uuid) -> Result<S::Device, BootError> {
    let devices = storage.devices_with_signature(volume);
    log::info!("Found {} EFI partitions", devices.len());
    match devices.as_slice() {
        [] => Err(BootError::VolumeNotFound),
        [device] => Ok(*device),
        _ => Err(BootError::VolumeAmbiguous {
            count: devices.len(),
        }),
    }
}

/// A resolved boot file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootTarget<D> {
    /// `None` when the file lives on the boot volume
    pub volume: Option<Uuid>,
    pub device: D,
    pub path: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    struct Disks(Vec<(u32, Uuid)>);

    impl Storage for Disks {
        type Device = u32;
        type Path = String;

        fn devices_with_signature(&self, signature: &Uuid) -> Vec<u32> {
            self.0
                .iter()
                .filter(|(_, v)| v == signature)
                .map(|(d, _)| *d)
                .collect()
        }

        fn boot_device(&self) -> Option<u32> {
            None
        }

        fn file_path(&self, device: u32, path: &str) -> Result<String, BootError> {
            Ok(format!("{}:{}", device, path))
        }

        fn describe(&self, path: &String) -> String {
            path.clone()
        }
    }

    const ESP: Uuid = Uuid::from_parts(
        0xC12A_7328,
        0xF81F,
        0x11D2,
        0xBA4B,
        [0x00, 0xA0, 0xC9, 0x3E, 0xC9, 0x3B],
    );
    const ROOT: Uuid = Uuid::from_parts(
        0x4F68_BCE3,
        0xE8CD,
        0x4DB1,
        0x96E7,
        [0xFB, 0xCA, 0xF9, 0x84, 0xB7, 0x09],
    );

    #[test]
    fn exactly_one() {
        let disks = Disks(vec![(1, ROOT), (2, ESP)]);
        assert_eq!(locate(&disks, &ESP), Ok(2));
    }

    #[test]
    fn none() {
        let disks = Disks(vec![(1, ROOT)]);
        assert_eq!(locate(&disks, &ESP), Err(BootError::VolumeNotFound));
        assert_eq!(locate(&Disks(vec![]), &ESP), Err(BootError::VolumeNotFound));
    }

    #[test]
    fn ambiguous() {
        let disks = Disks(vec![(1, ESP), (2, ROOT), (3, ESP)]);
        assert_eq!(
            locate(&disks, &ESP),
            Err(BootError::VolumeAmbiguous { count: 2 })
        );
    }
}
