use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Cursor, Write};

use crate::error::{Error, Result};

/// ZIP compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Stored,
    Deflate,
    Unknown(u16),
}

impl CompressionMethod {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => CompressionMethod::Stored,
            8 => CompressionMethod::Deflate,
            _ => CompressionMethod::Unknown(value),
        }
    }

    pub fn as_u16(&self) -> u16 {
        match self {
            CompressionMethod::Stored => 0,
            CompressionMethod::Deflate => 8,
            CompressionMethod::Unknown(v) => *v,
        }
    }
}

/// MS-DOS packed modification time as stored in ZIP headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DosTimestamp {
    pub time: u16,
    pub date: u16,
}

impl DosTimestamp {
    /// 1980-01-01 00:00:00, the earliest representable instant.
    pub const EPOCH: DosTimestamp = DosTimestamp {
        time: 0,
        date: (1 << 5) | 1,
    };

    /// Pack a calendar time. Seconds are stored with two-second resolution.
    pub fn new(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Self {
        let year = year.clamp(1980, 2107) - 1980;
        Self {
            time: ((hour as u16) << 11) | ((minute as u16) << 5) | (second as u16 / 2),
            date: (year << 9) | ((month as u16) << 5) | day as u16,
        }
    }

    /// Unpack the date to (year, month, day)
    pub fn date(&self) -> (u16, u8, u8) {
        let day = (self.date & 0x1F) as u8;
        let month = ((self.date >> 5) & 0x0F) as u8;
        let year = ((self.date >> 9) & 0x7F) + 1980;
        (year, month, day)
    }

    /// Unpack the time to (hour, minute, second)
    pub fn time(&self) -> (u8, u8, u8) {
        let second = ((self.time & 0x1F) * 2) as u8;
        let minute = ((self.time >> 5) & 0x3F) as u8;
        let hour = ((self.time >> 11) & 0x1F) as u8;
        (hour, minute, second)
    }
}

impl Default for DosTimestamp {
    fn default() -> Self {
        Self::EPOCH
    }
}

/// End of Central Directory (EOCD) - 22 bytes minimum
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndOfCentralDirectory {
    pub disk_number: u16,
    pub disk_with_cd: u16,
    pub disk_entries: u16,
    pub total_entries: u16,
    pub cd_size: u32,
    pub cd_offset: u32,
    pub comment_len: u16,
}

impl EndOfCentralDirectory {
    pub const SIGNATURE: &'static [u8] = b"PK\x05\x06";
    pub const SIZE: usize = 22;

    /// Single-disk EOCD with no archive comment.
    pub fn new(total_entries: u16, cd_size: u32, cd_offset: u32) -> Self {
        Self {
            disk_number: 0,
            disk_with_cd: 0,
            disk_entries: total_entries,
            total_entries,
            cd_size,
            cd_offset,
            comment_len: 0,
        }
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE || &data[0..4] != Self::SIGNATURE {
            return Err(Error::archive("invalid end of central directory record"));
        }

        let mut cursor = Cursor::new(&data[4..]);

        Ok(Self {
            disk_number: cursor.read_u16::<LittleEndian>()?,
            disk_with_cd: cursor.read_u16::<LittleEndian>()?,
            disk_entries: cursor.read_u16::<LittleEndian>()?,
            total_entries: cursor.read_u16::<LittleEndian>()?,
            cd_size: cursor.read_u32::<LittleEndian>()?,
            cd_offset: cursor.read_u32::<LittleEndian>()?,
            comment_len: cursor.read_u16::<LittleEndian>()?,
        })
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        out.write_all(Self::SIGNATURE)?;
        out.write_u16::<LittleEndian>(self.disk_number)?;
        out.write_u16::<LittleEndian>(self.disk_with_cd)?;
        out.write_u16::<LittleEndian>(self.disk_entries)?;
        out.write_u16::<LittleEndian>(self.total_entries)?;
        out.write_u32::<LittleEndian>(self.cd_size)?;
        out.write_u32::<LittleEndian>(self.cd_offset)?;
        out.write_u16::<LittleEndian>(self.comment_len)?;
        Ok(())
    }

    pub fn is_zip64(&self) -> bool {
        self.disk_entries == 0xFFFF
            || self.total_entries == 0xFFFF
            || self.cd_size == 0xFFFFFFFF
            || self.cd_offset == 0xFFFFFFFF
    }
}

/// ZIP64 End of Central Directory Locator - 20 bytes
pub struct Zip64EOCDLocator {
    pub disk_with_eocd64: u32,
    pub eocd64_offset: u64,
    pub total_disks: u32,
}

impl Zip64EOCDLocator {
    pub const SIGNATURE: &'static [u8] = b"PK\x06\x07";
    pub const SIZE: usize = 20;

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE || &data[0..4] != Self::SIGNATURE {
            return Err(Error::archive("invalid ZIP64 end of central directory locator"));
        }

        let mut cursor = Cursor::new(&data[4..]);

        Ok(Self {
            disk_with_eocd64: cursor.read_u32::<LittleEndian>()?,
            eocd64_offset: cursor.read_u64::<LittleEndian>()?,
            total_disks: cursor.read_u32::<LittleEndian>()?,
        })
    }
}

/// ZIP64 End of Central Directory - 56 bytes minimum
pub struct Zip64EOCD {
    pub eocd64_size: u64,
    pub version_made_by: u16,
    pub version_needed: u16,
    pub disk_number: u32,
    pub disk_with_cd: u32,
    pub disk_entries: u64,
    pub total_entries: u64,
    pub cd_size: u64,
    pub cd_offset: u64,
}

impl Zip64EOCD {
    pub const SIGNATURE: &'static [u8] = b"PK\x06\x06";
    pub const MIN_SIZE: usize = 56;

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::MIN_SIZE || &data[0..4] != Self::SIGNATURE {
            return Err(Error::archive("invalid ZIP64 end of central directory record"));
        }

        let mut cursor = Cursor::new(&data[4..]);

        Ok(Self {
            eocd64_size: cursor.read_u64::<LittleEndian>()?,
            version_made_by: cursor.read_u16::<LittleEndian>()?,
            version_needed: cursor.read_u16::<LittleEndian>()?,
            disk_number: cursor.read_u32::<LittleEndian>()?,
            disk_with_cd: cursor.read_u32::<LittleEndian>()?,
            disk_entries: cursor.read_u64::<LittleEndian>()?,
            total_entries: cursor.read_u64::<LittleEndian>()?,
            cd_size: cursor.read_u64::<LittleEndian>()?,
            cd_offset: cursor.read_u64::<LittleEndian>()?,
        })
    }
}

/// Central Directory File Header (CDFH) - 46 bytes minimum
pub const CDFH_SIGNATURE: &[u8] = b"PK\x01\x02";
pub const CDFH_MIN_SIZE: usize = 46;

/// Local File Header (LFH) - 30 bytes
pub const LFH_SIGNATURE: &[u8] = b"PK\x03\x04";
pub const LFH_SIZE: usize = 30;

/// General purpose flag: entry is encrypted.
pub const FLAG_ENCRYPTED: u16 = 0x0001;
/// General purpose flag: file name is UTF-8.
pub const FLAG_UTF8: u16 = 0x0800;

/// Version needed to extract: 2.0 (DEFLATE, directories).
pub const VERSION_NEEDED: u16 = 20;
/// Version made by: host 3 (Unix), APPNOTE 2.0.
pub const VERSION_MADE_BY: u16 = (3 << 8) | 20;

/// An entry name exactly as stored in the archive.
///
/// Without the UTF-8 flag the bytes are in whatever code page the producer
/// used (CP437 per APPNOTE), so they are carried through untouched and only
/// decoded for display and filesystem paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RawName {
    bytes: Vec<u8>,
    utf8: bool,
}

impl RawName {
    pub fn new(bytes: Vec<u8>, flags: u16) -> Self {
        Self {
            bytes,
            utf8: flags & FLAG_UTF8 != 0,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// True if the UTF-8 flag is set for this name.
    pub fn is_utf8(&self) -> bool {
        self.utf8
    }

    pub fn ends_with_slash(&self) -> bool {
        self.bytes.last() == Some(&b'/')
    }

    pub fn push_slash(&mut self) {
        self.bytes.push(b'/');
    }

    /// Decoded name; bytes that are not UTF-8 become U+FFFD.
    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

impl From<&str> for RawName {
    fn from(name: &str) -> Self {
        Self {
            bytes: name.as_bytes().to_vec(),
            utf8: !name.is_ascii(),
        }
    }
}

impl From<String> for RawName {
    fn from(name: String) -> Self {
        let utf8 = !name.is_ascii();
        Self {
            bytes: name.into_bytes(),
            utf8,
        }
    }
}

/// Parsed ZIP file entry information
#[derive(Debug, Clone)]
pub struct ZipFileEntry {
    /// Decoded name, for display and paths.
    pub file_name: String,
    /// Name bytes as stored, for writing the entry back out.
    pub raw_name: RawName,
    pub flags: u16,
    pub compression_method: CompressionMethod,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub crc32: u32,
    pub lfh_offset: u64,
    pub modified: DosTimestamp,
    pub is_directory: bool,
}

impl ZipFileEntry {
    pub fn is_encrypted(&self) -> bool {
        self.flags & FLAG_ENCRYPTED != 0
    }
}

/// Fields shared by the local and central headers of an entry being written.
#[derive(Debug, Clone)]
pub struct EntryHeader {
    pub name: RawName,
    pub compression_method: CompressionMethod,
    pub modified: DosTimestamp,
    pub crc32: u32,
    pub compressed_size: u32,
    pub uncompressed_size: u32,
    pub external_attrs: u32,
}

impl EntryHeader {
    fn flags(&self) -> u16 {
        if self.name.is_utf8() { FLAG_UTF8 } else { 0 }
    }

    fn name_len(&self) -> Result<u16> {
        u16::try_from(self.name.as_bytes().len()).map_err(|_| {
            Error::archive(format!("entry name too long: {}", self.name.to_string_lossy()))
        })
    }

    /// Write the local file header; the entry data follows immediately.
    pub fn write_local<W: Write>(&self, out: &mut W) -> Result<()> {
        out.write_all(LFH_SIGNATURE)?;
        out.write_u16::<LittleEndian>(VERSION_NEEDED)?;
        out.write_u16::<LittleEndian>(self.flags())?;
        out.write_u16::<LittleEndian>(self.compression_method.as_u16())?;
        out.write_u16::<LittleEndian>(self.modified.time)?;
        out.write_u16::<LittleEndian>(self.modified.date)?;
        out.write_u32::<LittleEndian>(self.crc32)?;
        out.write_u32::<LittleEndian>(self.compressed_size)?;
        out.write_u32::<LittleEndian>(self.uncompressed_size)?;
        out.write_u16::<LittleEndian>(self.name_len()?)?;
        out.write_u16::<LittleEndian>(0)?;
        out.write_all(self.name.as_bytes())?;
        Ok(())
    }

    /// Write the central directory header pointing back at `lfh_offset`.
    pub fn write_central<W: Write>(&self, out: &mut W, lfh_offset: u32) -> Result<()> {
        out.write_all(CDFH_SIGNATURE)?;
        out.write_u16::<LittleEndian>(VERSION_MADE_BY)?;
        out.write_u16::<LittleEndian>(VERSION_NEEDED)?;
        out.write_u16::<LittleEndian>(self.flags())?;
        out.write_u16::<LittleEndian>(self.compression_method.as_u16())?;
        out.write_u16::<LittleEndian>(self.modified.time)?;
        out.write_u16::<LittleEndian>(self.modified.date)?;
        out.write_u32::<LittleEndian>(self.crc32)?;
        out.write_u32::<LittleEndian>(self.compressed_size)?;
        out.write_u32::<LittleEndian>(self.uncompressed_size)?;
        out.write_u16::<LittleEndian>(self.name_len()?)?;
        out.write_u16::<LittleEndian>(0)?; // extra field
        out.write_u16::<LittleEndian>(0)?; // comment
        out.write_u16::<LittleEndian>(0)?; // disk number start
        out.write_u16::<LittleEndian>(0)?; // internal attributes
        out.write_u32::<LittleEndian>(self.external_attrs)?;
        out.write_u32::<LittleEndian>(lfh_offset)?;
        out.write_all(self.name.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dos_timestamp_packs_and_unpacks() {
        let ts = DosTimestamp::new(2024, 9, 3, 14, 25, 31);
        assert_eq!(ts.date(), (2024, 9, 3));
        // two-second resolution
        assert_eq!(ts.time(), (14, 25, 30));
    }

    #[test]
    fn epoch_is_first_of_january_1980() {
        assert_eq!(DosTimestamp::EPOCH.date(), (1980, 1, 1));
        assert_eq!(DosTimestamp::EPOCH.time(), (0, 0, 0));
    }

    #[test]
    fn eocd_written_then_parsed() {
        let eocd = EndOfCentralDirectory::new(3, 150, 4096);
        let mut buf = Vec::new();
        eocd.write_to(&mut buf).unwrap();
        assert_eq!(buf.len(), EndOfCentralDirectory::SIZE);
        assert_eq!(EndOfCentralDirectory::from_bytes(&buf).unwrap(), eocd);
        assert!(!eocd.is_zip64());
    }

    #[test]
    fn eocd_rejects_bad_signature() {
        let buf = [0u8; EndOfCentralDirectory::SIZE];
        assert!(matches!(
            EndOfCentralDirectory::from_bytes(&buf),
            Err(Error::Archive(_))
        ));
    }

    #[test]
    fn non_ascii_names_set_utf8_flag() {
        let header = EntryHeader {
            name: "media/ä.png".into(),
            compression_method: CompressionMethod::Stored,
            modified: DosTimestamp::EPOCH,
            crc32: 0,
            compressed_size: 0,
            uncompressed_size: 0,
            external_attrs: 0,
        };
        let mut buf = Vec::new();
        header.write_local(&mut buf).unwrap();
        assert_eq!(&buf[0..4], LFH_SIGNATURE);
        assert_eq!(u16::from_le_bytes([buf[6], buf[7]]), FLAG_UTF8);
        assert_eq!(buf.len(), LFH_SIZE + "media/ä.png".len());
    }

    #[test]
    fn raw_names_keep_their_bytes_and_flag() {
        // "café" in CP437, no UTF-8 flag
        let name = RawName::new(b"caf\x82.txt".to_vec(), 0);
        assert!(!name.is_utf8());
        assert_eq!(name.to_string_lossy(), "caf\u{FFFD}.txt");

        let header = EntryHeader {
            name: name.clone(),
            compression_method: CompressionMethod::Stored,
            modified: DosTimestamp::EPOCH,
            crc32: 0,
            compressed_size: 0,
            uncompressed_size: 0,
            external_attrs: 0,
        };
        let mut buf = Vec::new();
        header.write_central(&mut buf, 0).unwrap();
        assert_eq!(u16::from_le_bytes([buf[8], buf[9]]), 0);
        assert_eq!(&buf[CDFH_MIN_SIZE..], name.as_bytes());
    }
}
