// System Management BIOS

use crate::BootError;
use byteorder::{ByteOrder, LittleEndian};
use core::{fmt, str};

/// SMBIOS entry point, either 2.x (`_SM_`) or 3.x (`_SM3_`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmBiosEntry {
    pub major: u8,
    pub minor: u8,
    /// Only present in 3.x entry points
    pub docrev: Option<u8>,
    pub revision: u8,
    /// Physical address of the structure table
    pub table_address: u64,
    /// Declared size of the structure table in bytes
    pub table_len: usize,
    /// Declared number of structures, only present in 2.x entry points
    pub n_structures: Option<usize>,
}

impl SmBiosEntry {
    pub const V2_ANCHOR: &'static [u8; 4] = b"_SM_";
    pub const V3_ANCHOR: &'static [u8; 5] = b"_SM3_";
    pub const V2_LEN: usize = 0x1F;
    pub const V3_LEN: usize = 0x18;

    /// Parses a 64-bit SMBIOS 3.x entry point
    pub fn from_v3(bytes: &[u8]) -> Option<Self> {
        let bytes = bytes.get(..Self::V3_LEN)?;
        if &bytes[0..5] != Self::V3_ANCHOR || !Self::checksum_ok(bytes, bytes[6]) {
            return None;
        }
        Some(Self {
            major: bytes[7],
            minor: bytes[8],
            docrev: Some(bytes[9]),
            revision: bytes[10],
            table_len: LittleEndian::read_u32(&bytes[12..16]) as usize,
            table_address: LittleEndian::read_u64(&bytes[16..24]),
            n_structures: None,
        })
    }

    /// Parses a 32-bit SMBIOS 2.x entry point
    pub fn from_v2(bytes: &[u8]) -> Option<Self> {
        let bytes = bytes.get(..Self::V2_LEN)?;
        if &bytes[0..4] != Self::V2_ANCHOR
            || &bytes[16..21] != b"_DMI_"
            || !Self::checksum_ok(bytes, bytes[5])
        {
            return None;
        }
        Some(Self {
            major: bytes[6],
            minor: bytes[7],
            docrev: None,
            revision: bytes[10],
            table_len: LittleEndian::read_u16(&bytes[22..24]) as usize,
            table_address: LittleEndian::read_u32(&bytes[24..28]) as u64,
            n_structures: Some(LittleEndian::read_u16(&bytes[28..30]) as usize),
        })
    }

    #[inline]
    fn checksum_ok(bytes: &[u8], len: u8) -> bool {
        bytes
            .get(..len as usize)
            .map(|v| v.iter().fold(0u8, |a, &b| a.wrapping_add(b)) == 0)
            .unwrap_or(false)
    }
}

impl fmt::Display for SmBiosEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.docrev {
            Some(docrev) => write!(f, "{}.{}.{}", self.major, self.minor, docrev)?,
            None => write!(f, "{}.{}", self.major, self.minor)?,
        }
        write!(f, " (entry point revision {})", self.revision)
    }
}

#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct HeaderType(pub u8);

impl HeaderType {
    pub const BIOS_INFO: Self = Self(0);
    pub const SYSTEM_INFO: Self = Self(1);
    /// This and every larger type ends the walk
    pub const END_OF_TABLE: Self = Self(127);
}

/// The SMBIOS structure table, bounded by its declared size
#[derive(Debug, Clone, Copy)]
pub struct StructureTable<'a> {
    data: &'a [u8],
    limit: usize,
}

impl<'a> StructureTable<'a> {
    /// `data` must cover exactly the declared table length. `n_structures`
    /// further caps the walk when the entry point declares it.
    #[inline]
    pub const fn new(data: &'a [u8], n_structures: Option<usize>) -> Self {
        let limit = match n_structures {
            Some(v) => v,
            None => usize::MAX,
        };
        Self { data, limit }
    }

    /// Returns an iterator that iterates through the SMBIOS structure
    #[inline]
    pub fn iter(&self) -> SmBiosStructIterator<'a> {
        SmBiosStructIterator {
            data: self.data,
            offset: 0,
            index: 0,
            limit: self.limit,
        }
    }

    /// Find the first structure matching the specified header type.
    #[inline]
    pub fn find(&self, header_type: HeaderType) -> Option<SmBiosStruct<'a>> {
        self.iter().find(|v| v.header_type() == header_type)
    }
}

/// Walks the structure table once.
///
/// Stops at the end-of-table marker (any type >= 127), at a record that does
/// not fit in the remaining bytes, or after the declared structure count.
pub struct SmBiosStructIterator<'a> {
    data: &'a [u8],
    offset: usize,
    index: usize,
    limit: usize,
}

impl<'a> SmBiosStructIterator<'a> {
    #[inline]
    fn finish(&mut self) -> Option<SmBiosStruct<'a>> {
        self.offset = self.data.len();
        None
    }
}

impl<'a> Iterator for SmBiosStructIterator<'a> {
    type Item = SmBiosStruct<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.limit {
            return None;
        }
        let data = &self.data[self.offset..];
        if data.len() < SmBiosStruct::HEADER_SIZE {
            return self.finish();
        }
        let header_type = HeaderType(data[0]);
        let len = data[1] as usize;
        if header_type >= HeaderType::END_OF_TABLE
            || len < SmBiosStruct::HEADER_SIZE
            || len > data.len()
        {
            return self.finish();
        }

        // The string set ends with a double NULL, even when it is empty
        let Some(end) = data[len..]
            .windows(2)
            .position(|v| v == [0, 0])
            .map(|v| len + v + 2)
        else {
            return self.finish();
        };

        self.offset += end;
        self.index += 1;
        Some(SmBiosStruct {
            formatted: &data[..len],
            strings: &data[len..end],
        })
    }
}

/// Common definition of SmBios's structures
#[derive(Debug, Clone, Copy)]
pub struct SmBiosStruct<'a> {
    formatted: &'a [u8],
    strings: &'a [u8],
}

impl<'a> SmBiosStruct<'a> {
    pub const HEADER_SIZE: usize = 4;

    /// Some products return meaningless strings.
    pub const DEFAULT_STRING: &'static str = "Default string";
    /// Some products return meaningless strings.
    pub const TO_BE_FILLED_BY_OEM: &'static str = "To be filled by O.E.M.";

    #[inline]
    pub fn header_type(&self) -> HeaderType {
        HeaderType(self.formatted[0])
    }

    #[inline]
    pub fn byte(&self, offset: usize) -> Option<u8> {
        self.formatted.get(offset).copied()
    }

    /// Returns the 1-based string `index`, skipping placeholder strings
    pub fn string(&self, index: usize) -> Option<&'a str> {
        if index == 0 {
            return None;
        }
        self.strings
            .split(|&v| v == 0)
            .take_while(|v| !v.is_empty())
            .nth(index - 1)
            .map(|v| str::from_utf8(v).unwrap_or("?"))
            .and_then(|v| match v {
                Self::DEFAULT_STRING | Self::TO_BE_FILLED_BY_OEM => None,
                _ => Some(v),
            })
    }
}

/// The type 1 structure
#[derive(Debug, Clone, Copy)]
pub struct SystemInfo<'a>(SmBiosStruct<'a>);

impl<'a> SystemInfo<'a> {
    const MANUFACTURER: usize = 0x04;
    const PRODUCT_NAME: usize = 0x05;
    const WAKE_UP_TYPE: usize = 0x18;

    /// Finds the first system information structure in a single pass.
    pub fn find(table: &StructureTable<'a>) -> Result<Self, BootError> {
        table
            .find(HeaderType::SYSTEM_INFO)
            .map(Self)
            .ok_or(BootError::WakeCodeNotFound)
    }

    #[inline]
    pub fn manufacturer(&self) -> Option<&'a str> {
        self.0
            .byte(Self::MANUFACTURER)
            .and_then(|v| self.0.string(v as usize))
    }

    #[inline]
    pub fn product_name(&self) -> Option<&'a str> {
        self.0
            .byte(Self::PRODUCT_NAME)
            .and_then(|v| self.0.string(v as usize))
    }

    /// The wake-up type, absent from SMBIOS 2.0 structures
    pub fn wake_code(&self) -> Result<WakeCode, BootError> {
        self.0
            .byte(Self::WAKE_UP_TYPE)
            .and_then(WakeCode::new)
            .ok_or(BootError::WakeCodeNotFound)
    }
}

/// Reads the wake-up type of the first system information structure.
#[inline]
pub fn read_wake_code(table: &StructureTable) -> Result<WakeCode, BootError> {
    SystemInfo::find(table)?.wake_code()
}

/// Event that caused the system to power up
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct WakeCode(u8);

impl WakeCode {
    pub const RESERVED: Self = Self(0);
    pub const OTHER: Self = Self(1);
    pub const UNKNOWN: Self = Self(2);
    pub const APM_TIMER: Self = Self(3);
    pub const MODEM_RING: Self = Self(4);
    pub const LAN_REMOTE: Self = Self(5);
    pub const POWER_SWITCH: Self = Self(6);
    pub const PCI_PME: Self = Self(7);
    pub const AC_POWER_RESTORED: Self = Self(8);

    /// Never reported by firmware, treated as "no wake-up type"
    pub const NOT_FOUND: u8 = 9;

    /// Returns `None` for the not-found sentinel
    #[inline]
    pub const fn new(value: u8) -> Option<Self> {
        if value == Self::NOT_FOUND {
            None
        } else {
            Some(Self(value))
        }
    }

    #[inline]
    pub const fn as_u8(&self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }

    pub const fn name(&self) -> &'static str {
        match *self {
            Self::RESERVED => "Reserved",
            Self::OTHER => "Other",
            Self::UNKNOWN => "Unknown",
            Self::APM_TIMER => "APM Timer",
            Self::MODEM_RING => "Modem Ring",
            Self::LAN_REMOTE => "LAN Remote",
            Self::POWER_SWITCH => "Power Switch",
            Self::PCI_PME => "PCI PME#",
            Self::AC_POWER_RESTORED => "AC Power Restored",
            _ => "Undefined",
        }
    }
}

impl fmt::Display for WakeCode {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#04x} ({})", self.0, self.name())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Builds a structure: header, formatted body, then strings
    pub(crate) fn structure(kind: u8, handle: u16, body: &[u8], strings: &[&str]) -> Vec<u8> {
        let mut v = vec![kind, (4 + body.len()) as u8];
        v.extend_from_slice(&handle.to_le_bytes());
        v.extend_from_slice(body);
        if strings.is_empty() {
            v.push(0);
        }
        for s in strings {
            v.extend_from_slice(s.as_bytes());
            v.push(0);
        }
        v.push(0);
        v
    }

    /// A type 1 structure as laid out by SMBIOS 2.1+ (length 0x1B)
    pub(crate) fn system_info(wake: u8) -> Vec<u8> {
        let mut body = [0u8; 0x17];
        body[0] = 1; // manufacturer
        body[1] = 2; // product
        body[0x18 - 4] = wake;
        structure(1, 0x0100, &body, &["ACME", "Default string"])
    }

    pub(crate) fn end_of_table() -> Vec<u8> {
        structure(127, 0xFFFF, &[], &[])
    }

    pub(crate) fn table_with_wake(wake: u8) -> Vec<u8> {
        let mut table = structure(0, 0, &[1, 2, 0, 0xE8, 0], &["Vendor", "1.0"]);
        table.extend(system_info(wake));
        table.extend(end_of_table());
        table
    }

    #[test]
    fn walk() {
        let data = table_with_wake(0x06);
        let table = StructureTable::new(&data, None);
        let types = table.iter().map(|v| v.header_type()).collect::<Vec<_>>();
        assert_eq!(types, [HeaderType::BIOS_INFO, HeaderType::SYSTEM_INFO]);

        let bios = table.find(HeaderType::BIOS_INFO).unwrap();
        assert_eq!(bios.byte(1), Some(9));
        assert_eq!(bios.byte(9), None);
        assert_eq!(bios.string(1), Some("Vendor"));
        assert_eq!(bios.string(2), Some("1.0"));
        assert_eq!(bios.string(3), None);
        assert_eq!(bios.string(0), None);
    }

    #[test]
    fn wake_code() {
        let data = table_with_wake(0x06);
        let table = StructureTable::new(&data, None);
        assert_eq!(read_wake_code(&table), Ok(WakeCode::POWER_SWITCH));

        let info = SystemInfo::find(&table).unwrap();
        assert_eq!(info.manufacturer(), Some("ACME"));
        assert_eq!(info.product_name(), None);
    }

    #[test]
    fn sentinel_is_not_found() {
        let data = table_with_wake(WakeCode::NOT_FOUND);
        let table = StructureTable::new(&data, None);
        assert_eq!(read_wake_code(&table), Err(BootError::WakeCodeNotFound));
    }

    #[test]
    fn missing_system_info() {
        let mut data = structure(0, 0, &[1, 2, 0, 0xE8, 0], &["Vendor"]);
        data.extend(end_of_table());
        // a type 1 after the end marker must not be seen
        data.extend(system_info(0x05));
        let table = StructureTable::new(&data, None);
        assert_eq!(read_wake_code(&table), Err(BootError::WakeCodeNotFound));
    }

    #[test]
    fn first_system_info_wins() {
        let mut data = system_info(0x03);
        data.extend(system_info(0x05));
        let table = StructureTable::new(&data, None);
        assert_eq!(read_wake_code(&table), Ok(WakeCode::APM_TIMER));
    }

    #[test]
    fn smbios_20_system_info_is_too_short() {
        let data = structure(1, 1, &[1, 2, 3, 4], &["A", "B", "C", "D"]);
        let table = StructureTable::new(&data, None);
        assert_eq!(read_wake_code(&table), Err(BootError::WakeCodeNotFound));
    }

    #[test]
    fn corrupt_tables_terminate() {
        // length byte pointing past the end
        let data = [1u8, 0xF0, 0, 0, 0, 0];
        let table = StructureTable::new(&data, None);
        assert_eq!(table.iter().count(), 0);

        // length smaller than the header
        let data = [1u8, 2, 0, 0, 0, 0];
        let table = StructureTable::new(&data, None);
        assert_eq!(table.iter().count(), 0);

        // string set without its terminator
        let mut data = system_info(0x06);
        data.truncate(data.len() - 1);
        let table = StructureTable::new(&data, None);
        assert_eq!(read_wake_code(&table), Err(BootError::WakeCodeNotFound));

        assert_eq!(StructureTable::new(&[], None).iter().count(), 0);
    }

    #[test]
    fn walk_is_bounded_by_declared_size() {
        let data = table_with_wake(0x06);
        // the declared length cuts the system information structure
        let table = StructureTable::new(&data[..20], None);
        assert_eq!(read_wake_code(&table), Err(BootError::WakeCodeNotFound));

        // the declared count stops before it
        let table = StructureTable::new(&data, Some(1));
        assert_eq!(table.iter().count(), 1);
        assert_eq!(read_wake_code(&table), Err(BootError::WakeCodeNotFound));
    }

    fn with_checksum(mut bytes: Vec<u8>, at: usize, len: usize) -> Vec<u8> {
        let sum = bytes[..len].iter().fold(0u8, |a, &b| a.wrapping_add(b));
        bytes[at] = 0u8.wrapping_sub(sum);
        bytes
    }

    #[test]
    fn entry_point_v3() {
        let mut raw = vec![0u8; SmBiosEntry::V3_LEN];
        raw[0..5].copy_from_slice(b"_SM3_");
        raw[6] = 0x18;
        raw[7] = 3;
        raw[8] = 4;
        raw[9] = 0;
        raw[10] = 1;
        raw[12..16].copy_from_slice(&0x1234u32.to_le_bytes());
        raw[16..24].copy_from_slice(&0x7F00_0000u64.to_le_bytes());
        let raw = with_checksum(raw, 5, 0x18);

        let entry = SmBiosEntry::from_v3(&raw).unwrap();
        assert_eq!(entry.table_len, 0x1234);
        assert_eq!(entry.table_address, 0x7F00_0000);
        assert_eq!(entry.n_structures, None);
        assert_eq!(format!("{}", entry), "3.4.0 (entry point revision 1)");
        assert!(SmBiosEntry::from_v2(&raw).is_none());

        let mut bad = raw.clone();
        bad[7] ^= 1;
        assert!(SmBiosEntry::from_v3(&bad).is_none());
    }

    #[test]
    fn entry_point_v2() {
        let mut raw = vec![0u8; SmBiosEntry::V2_LEN];
        raw[0..4].copy_from_slice(b"_SM_");
        raw[5] = 0x1F;
        raw[6] = 2;
        raw[7] = 8;
        raw[16..21].copy_from_slice(b"_DMI_");
        raw[22..24].copy_from_slice(&0x0456u16.to_le_bytes());
        raw[24..28].copy_from_slice(&0x000F_0000u32.to_le_bytes());
        raw[28..30].copy_from_slice(&42u16.to_le_bytes());
        let raw = with_checksum(raw, 4, 0x1F);

        let entry = SmBiosEntry::from_v2(&raw).unwrap();
        assert_eq!((entry.major, entry.minor), (2, 8));
        assert_eq!(entry.table_len, 0x456);
        assert_eq!(entry.table_address, 0xF_0000);
        assert_eq!(entry.n_structures, Some(42));
        assert!(SmBiosEntry::from_v2(&raw[..20]).is_none());
    }

    #[test]
    fn wake_code_names() {
        assert_eq!(WakeCode::new(9), None);
        assert_eq!(WakeCode::new(6), Some(WakeCode::POWER_SWITCH));
        assert_eq!(format!("{}", WakeCode::LAN_REMOTE), "0x05 (LAN Remote)");
        assert_eq!(WakeCode::new(0x42).unwrap().name(), "Undefined");
    }
}
