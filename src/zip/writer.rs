//! In-memory ZIP archive writer.
//!
//! Produces single-disk, non-ZIP64 archives: each entry is a local file
//! header followed by its data, then the central directory and EOCD.

use flate2::Compression;
use flate2::write::DeflateEncoder;
use std::io::Write;

use crate::error::{Error, Result};

use super::structures::{
    CompressionMethod, DosTimestamp, EndOfCentralDirectory, EntryHeader, RawName,
};

/// Unix mode bits stored in the upper half of the external attributes.
const FILE_MODE: u32 = 0o100644;
const DIR_MODE: u32 = 0o040755;
/// MS-DOS directory attribute.
const DOS_DIRECTORY: u32 = 0x10;

/// Builds a ZIP archive into a byte buffer.
pub struct ZipWriter {
    buf: Vec<u8>,
    central: Vec<(EntryHeader, u32)>,
}

impl ZipWriter {
    pub fn new() -> Self {
        Self {
            buf: Vec::new(),
            central: Vec::new(),
        }
    }

    /// Number of entries written so far.
    pub fn len(&self) -> usize {
        self.central.len()
    }

    pub fn is_empty(&self) -> bool {
        self.central.is_empty()
    }

    /// Append a file entry compressed with `method`.
    ///
    /// A `&str` name is stored as UTF-8; a [`RawName`] is stored exactly.
    pub fn add_file(
        &mut self,
        name: impl Into<RawName>,
        data: &[u8],
        method: CompressionMethod,
        modified: DosTimestamp,
    ) -> Result<()> {
        let payload = match method {
            CompressionMethod::Stored => data.to_vec(),
            CompressionMethod::Deflate => {
                let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(data)?;
                encoder.finish()?
            }
            CompressionMethod::Unknown(m) => {
                return Err(Error::archive(format!(
                    "cannot write compression method {m}"
                )));
            }
        };

        let mut crc = flate2::Crc::new();
        crc.update(data);

        let name = name.into();
        let label = name.to_string_lossy();
        let header = EntryHeader {
            name,
            compression_method: method,
            modified,
            crc32: crc.sum(),
            compressed_size: to_u32(payload.len() as u64, &label)?,
            uncompressed_size: to_u32(data.len() as u64, &label)?,
            external_attrs: FILE_MODE << 16,
        };
        self.push(header, &payload)
    }

    /// Append a directory entry. A trailing `/` is added if missing.
    pub fn add_directory(
        &mut self,
        name: impl Into<RawName>,
        modified: DosTimestamp,
    ) -> Result<()> {
        let mut name = name.into();
        if !name.ends_with_slash() {
            name.push_slash();
        }
        let header = EntryHeader {
            name,
            compression_method: CompressionMethod::Stored,
            modified,
            crc32: 0,
            compressed_size: 0,
            uncompressed_size: 0,
            external_attrs: (DIR_MODE << 16) | DOS_DIRECTORY,
        };
        self.push(header, &[])
    }

    fn push(&mut self, header: EntryHeader, payload: &[u8]) -> Result<()> {
        let offset = to_u32(self.buf.len() as u64, &header.name.to_string_lossy())?;
        header.write_local(&mut self.buf)?;
        self.buf.extend_from_slice(payload);
        self.central.push((header, offset));
        Ok(())
    }

    /// Write the central directory and EOCD, returning the archive bytes.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        let cd_offset = to_u32(self.buf.len() as u64, "central directory")?;
        for (header, offset) in &self.central {
            header.write_central(&mut self.buf, *offset)?;
        }
        let cd_size = to_u32(self.buf.len() as u64 - cd_offset as u64, "central directory")?;
        let total = u16::try_from(self.central.len())
            .map_err(|_| Error::archive("too many entries for a non-ZIP64 archive"))?;

        EndOfCentralDirectory::new(total, cd_size, cd_offset).write_to(&mut self.buf)?;
        Ok(self.buf)
    }
}

impl Default for ZipWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn to_u32(value: u64, what: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::archive(format!("{what} exceeds 4 GiB")))
}
