//! `name` table strings.

use crate::cursor::{ByteCursor, slice};
use crate::error::FontResult;

/// Well-known name ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NameId(pub u16);

impl NameId {
    pub const FAMILY: Self = Self(1);
    pub const SUBFAMILY: Self = Self(2);
    pub const FULL_NAME: Self = Self(4);
    pub const POSTSCRIPT_NAME: Self = Self(6);
    pub const TYPOGRAPHIC_FAMILY: Self = Self(16);
}

const PLATFORM_UNICODE: u16 = 0;
const PLATFORM_MAC: u16 = 1;
const PLATFORM_WINDOWS: u16 = 3;
const LANGUAGE_EN_US: u16 = 0x0409;

#[derive(Debug, Clone)]
struct NameRecord {
    platform_id: u16,
    language_id: u16,
    name_id: u16,
    value: String,
}

impl NameRecord {
    /// Lower is better: Windows en-US, any Windows, Unicode, Mac.
    fn rank(&self) -> u8 {
        match (self.platform_id, self.language_id) {
            (PLATFORM_WINDOWS, LANGUAGE_EN_US) => 0,
            (PLATFORM_WINDOWS, _) => 1,
            (PLATFORM_UNICODE, _) => 2,
            _ => 3,
        }
    }
}

/// Decoded `name` table.
#[derive(Debug, Clone, Default)]
pub struct NameTable {
    records: Vec<NameRecord>,
}

impl NameTable {
    pub fn parse(data: &[u8]) -> FontResult<Self> {
        let mut c = ByteCursor::new(data);
        let _version = c.read_u16()?;
        let count = c.read_u16()?;
        let storage_offset = c.read_u16()? as usize;

        let mut records = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let platform_id = c.read_u16()?;
            let _encoding_id = c.read_u16()?;
            let language_id = c.read_u16()?;
            let name_id = c.read_u16()?;
            let length = c.read_u16()? as usize;
            let offset = c.read_u16()? as usize;

            let Ok(bytes) = slice(data, storage_offset + offset, length) else {
                tracing::warn!("name record {} points outside the table; skipped", name_id);
                continue;
            };
            let value = match platform_id {
                PLATFORM_WINDOWS | PLATFORM_UNICODE => decode_utf16_be(bytes),
                PLATFORM_MAC => decode_single_byte(bytes),
                _ => continue,
            };
            records.push(NameRecord {
                platform_id,
                language_id,
                name_id,
                value,
            });
        }

        Ok(Self { records })
    }

    /// Best available string for a name id.
    pub fn get(&self, id: NameId) -> Option<&str> {
        self.records
            .iter()
            .filter(|r| r.name_id == id.0)
            .min_by_key(|r| r.rank())
            .map(|r| r.value.as_str())
    }

    /// Family name, or an empty string when the font has none.
    pub fn family_name(&self) -> &str {
        self.get(NameId::TYPOGRAPHIC_FAMILY)
            .or_else(|| self.get(NameId::FAMILY))
            .unwrap_or("")
    }

    pub fn full_name(&self) -> &str {
        self.get(NameId::FULL_NAME).unwrap_or("")
    }

    pub fn subfamily_name(&self) -> &str {
        self.get(NameId::SUBFAMILY).unwrap_or("")
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn decode_utf16_be(bytes: &[u8]) -> String {
    let units = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]));
    char::decode_utf16(units)
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

/// Mac Roman: ASCII below 0x80, [`MAC_ROMAN_UPPER`] above.
fn decode_single_byte(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| match b {
            0..=0x7F => b as char,
            _ => char::from_u32(MAC_ROMAN_UPPER[(b - 0x80) as usize] as u32)
                .unwrap_or(char::REPLACEMENT_CHARACTER),
        })
        .collect()
}

/// Unicode scalar for each Mac Roman byte in 0x80..=0xFF.
#[rustfmt::skip]
static MAC_ROMAN_UPPER: [u16; 128] = [
    196, 197, 199, 201, 209, 214, 220, 225, 224, 226, 228, 227, 229, 231, 233,
    232, 234, 235, 237, 236, 238, 239, 241, 243, 242, 244, 246, 245, 250, 249,
    251, 252, 8224, 176, 162, 163, 167, 8226, 182, 223, 174, 169, 8482, 180,
    168, 8800, 198, 216, 8734, 177, 8804, 8805, 165, 181, 8706, 8721, 8719,
    960, 8747, 170, 186, 937, 230, 248, 191, 161, 172, 8730, 402, 8776, 8710,
    171, 187, 8230, 160, 192, 195, 213, 338, 339, 8211, 8212, 8220, 8221, 8216,
    8217, 247, 9674, 255, 376, 8260, 8364, 8249, 8250, 64257, 64258, 8225, 183,
    8218, 8222, 8240, 194, 202, 193, 203, 200, 205, 206, 207, 204, 211, 212,
    63743, 210, 218, 219, 217, 305, 710, 732, 175, 728, 729, 730, 184, 733,
    731, 711,
];

#[cfg(test)]
mod tests {
    use super::*;

    fn name_table(records: &[(u16, u16, u16, &[u8])]) -> Vec<u8> {
        let mut header = Vec::new();
        let mut storage = Vec::new();
        header.extend_from_slice(&0u16.to_be_bytes());
        header.extend_from_slice(&(records.len() as u16).to_be_bytes());
        header.extend_from_slice(&((6 + records.len() * 12) as u16).to_be_bytes());
        for (platform, language, name_id, bytes) in records {
            for v in [*platform, 0, *language, *name_id, bytes.len() as u16, storage.len() as u16] {
                header.extend_from_slice(&v.to_be_bytes());
            }
            storage.extend_from_slice(bytes);
        }
        header.extend_from_slice(&storage);
        header
    }

    #[test]
    fn test_windows_utf16_preferred() {
        let utf16: Vec<u8> = "Lumina Sans"
            .encode_utf16()
            .flat_map(|u| u.to_be_bytes())
            .collect();
        let data = name_table(&[(1, 0, 1, b"Mac Family"), (3, 0x409, 1, &utf16)]);
        let names = NameTable::parse(&data).unwrap();
        assert_eq!(names.family_name(), "Lumina Sans");
    }

    #[test]
    fn test_mac_single_byte() {
        let data = name_table(&[(1, 0, 4, b"Caf\x8e Bold")]);
        let names = NameTable::parse(&data).unwrap();
        assert_eq!(names.full_name(), "Café Bold");
        assert_eq!(names.family_name(), "");
    }

    #[test]
    fn test_mac_roman_upper_half() {
        assert_eq!(decode_single_byte(b"Caf\x8e"), "Café");
        assert_eq!(decode_single_byte(b"\xe9\xa5\xdb"), "È•€");
        assert_eq!(decode_single_byte(b"\xff"), "\u{2c7}");
    }

    #[test]
    fn test_out_of_bounds_record_skipped() {
        let mut data = name_table(&[(3, 0x409, 1, b"\0A")]);
        // Corrupt the length so it runs past the storage area.
        let len_pos = 6 + 8;
        data[len_pos..len_pos + 2].copy_from_slice(&100u16.to_be_bytes());
        let names = NameTable::parse(&data).unwrap();
        assert!(names.is_empty());
    }
}
