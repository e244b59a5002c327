//! Streaming ZIP archive writer.
//!
//! Entries are written one after another: a Local File Header with
//! placeholder CRC and sizes, the DEFLATE stream, then the header fields are
//! patched in place. Because the sizes end up in the local header itself, no
//! data descriptor is needed and the archive can be decoded by both
//! central-directory and streaming readers.
//!
//! Only the classic (non-ZIP64) layout is produced. Anything exceeding its
//! 16/32-bit fields is rejected with [`io::ErrorKind::InvalidInput`].

use byteorder::{LittleEndian, WriteBytesExt};
use flate2::write::DeflateEncoder;
use flate2::{Compression, Crc};
use std::io::{self, Read, Seek, SeekFrom, Write};

use super::structures::*;

/// Largest entry count the classic EOCD can hold; 0xFFFF marks ZIP64.
pub const MAX_ENTRIES: usize = u16::MAX as usize - 1;

/// ZIP archive writer over any seekable sink.
pub struct ZipWriter<W: Write + Seek> {
    /// The output sink
    inner: W,
    /// Entries written so far, in order, for the Central Directory
    entries: Vec<ZipFileEntry>,
    /// Modification timestamp stamped on every entry
    timestamp: DosDateTime,
}

impl<W: Write + Seek> ZipWriter<W> {
    /// Create a writer that starts the archive at the sink's current position.
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            entries: Vec::new(),
            timestamp: DosDateTime::now(),
        }
    }

    /// Override the modification time written for every entry.
    pub fn with_timestamp(mut self, timestamp: DosDateTime) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Number of entries written so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Compress everything `source` yields into a new entry named `name`.
    ///
    /// The source is drained through a buffer of `buffer_size` bytes; the
    /// result does not depend on that size.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by `source` or the sink, or
    /// `InvalidInput` if the entry does not fit the classic ZIP limits.
    pub fn write_entry<R: Read + ?Sized>(
        &mut self,
        name: &str,
        source: &mut R,
        buffer_size: usize,
    ) -> io::Result<&ZipFileEntry> {
        if name.len() > u16::MAX as usize {
            return Err(limit_exceeded("entry name longer than 65535 bytes"));
        }
        if self.entries.len() >= MAX_ENTRIES {
            return Err(limit_exceeded("more than 65534 entries"));
        }

        let lfh_offset = self.inner.stream_position()?;
        check_u32(lfh_offset, "archive larger than 4 GiB")?;

        let mut entry = ZipFileEntry {
            file_name: name.to_string(),
            compression_method: CompressionMethod::Deflate,
            compressed_size: 0,
            uncompressed_size: 0,
            crc32: 0,
            lfh_offset,
            last_mod_time: self.timestamp.time,
            last_mod_date: self.timestamp.date,
            is_directory: false,
        };
        entry.write_local_header(&mut self.inner)?;
        let data_offset = self.inner.stream_position()?;

        // Copy the source through a bounded buffer, tracking the CRC of the
        // uncompressed bytes as they pass.
        let mut crc = Crc::new();
        let mut total: u64 = 0;
        let mut buf = vec![0u8; buffer_size.max(1)];
        let mut encoder = DeflateEncoder::new(&mut self.inner, Compression::default());
        loop {
            let n = match source.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            crc.update(&buf[..n]);
            total += n as u64;
            encoder.write_all(&buf[..n])?;
        }
        encoder.finish()?;

        let end_offset = self.inner.stream_position()?;
        entry.crc32 = crc.sum();
        entry.uncompressed_size = check_u32(total, "entry larger than 4 GiB")?;
        entry.compressed_size =
            check_u32(end_offset - data_offset, "compressed entry larger than 4 GiB")?;

        // Patch CRC and sizes into the local header
        self.inner
            .seek(SeekFrom::Start(lfh_offset + LFH_CRC_OFFSET))?;
        self.inner.write_u32::<LittleEndian>(entry.crc32)?;
        self.inner
            .write_u32::<LittleEndian>(entry.compressed_size as u32)?;
        self.inner
            .write_u32::<LittleEndian>(entry.uncompressed_size as u32)?;
        self.inner.seek(SeekFrom::Start(end_offset))?;

        self.entries.push(entry);
        Ok(&self.entries[self.entries.len() - 1])
    }

    /// Write the Central Directory and End of Central Directory record, and
    /// return the sink.
    pub fn finish(mut self) -> io::Result<W> {
        let cd_offset = check_u32(self.inner.stream_position()?, "archive larger than 4 GiB")?;

        for entry in &self.entries {
            entry.write_central_header(&mut self.inner)?;
        }

        let cd_end = self.inner.stream_position()?;
        let cd_size = check_u32(cd_end - cd_offset, "central directory larger than 4 GiB")?;

        EndOfCentralDirectory::new(self.entries.len() as u16, cd_size as u32, cd_offset as u32)
            .write_to(&mut self.inner)?;
        self.inner.flush()?;

        Ok(self.inner)
    }
}

fn limit_exceeded(what: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("ZIP64 is not supported: {}", what),
    )
}

/// Values of 0xFFFFFFFF and above would be read as ZIP64 markers.
fn check_u32(value: u64, what: &str) -> io::Result<u64> {
    if value >= 0xFFFFFFFF {
        return Err(limit_exceeded(what));
    }
    Ok(value)
}
