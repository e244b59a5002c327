//! Bundling a set of files into one ZIP archive.
//!
//! [`Archiver::build_archive`] takes the entries of a single request and
//! returns the finished archive bytes. It is synchronous and holds no state
//! between calls; async callers should run it on the blocking pool.

mod entry;
mod error;

pub use entry::{EntryContent, FileEntry};
pub use error::{ArchiveError, Result};

use bytes::Bytes;
use std::io::Cursor;

use crate::zip::ZipWriter;

/// Tracing target for archive assembly.
const TRACING_TARGET: &str = "zipcast::archive";

/// Default size of the copy buffer between a source and the encoder.
pub const DEFAULT_BUFFER_SIZE: usize = 8 * 1024;

/// Stateless archive builder.
#[derive(Debug, Clone, Copy)]
pub struct Archiver {
    buffer_size: usize,
}

impl Archiver {
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }

    /// Use a copy buffer of `buffer_size` bytes (at least one).
    #[must_use]
    pub fn with_buffer_size(buffer_size: usize) -> Self {
        Self {
            buffer_size: buffer_size.max(1),
        }
    }

    /// Build one archive holding one entry per input entry.
    ///
    /// Entries without a usable name are called `"1"`, `"2"`, ... in the
    /// order they are reached; explicitly named entries do not advance that
    /// counter and are not checked against it. Entry order in the archive is
    /// not part of the contract.
    ///
    /// # Errors
    ///
    /// - [`ArchiveError::EmptyInput`] if `entries` is empty; nothing is read.
    /// - [`ArchiveError::SourceUnavailable`] if an entry cannot be opened.
    /// - [`ArchiveError::IoFailure`] if reading an entry or writing the
    ///   archive fails.
    ///
    /// On error the partially written archive is dropped along with every
    /// source opened so far.
    pub fn build_archive(&self, entries: Vec<FileEntry>) -> Result<Bytes> {
        if entries.is_empty() {
            tracing::debug!(target: TRACING_TARGET, "rejecting empty archive request");
            return Err(ArchiveError::EmptyInput);
        }

        let entry_count = entries.len();
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let mut fallback_index = 0usize;

        for entry in entries {
            let name = match entry.declared_name() {
                Some(name) => name.to_owned(),
                None => {
                    fallback_index += 1;
                    fallback_index.to_string()
                }
            };

            let mut source = entry.content.open().map_err(|err| {
                tracing::warn!(
                    target: TRACING_TARGET,
                    name = %name,
                    error = %err,
                    "entry source unavailable"
                );
                ArchiveError::SourceUnavailable(err)
            })?;

            let written = writer
                .write_entry(&name, &mut source, self.buffer_size)
                .map_err(|err| {
                    tracing::warn!(
                        target: TRACING_TARGET,
                        name = %name,
                        error = %err,
                        "failed to write entry"
                    );
                    ArchiveError::IoFailure(err)
                })?;

            tracing::trace!(
                target: TRACING_TARGET,
                name = %written.file_name,
                uncompressed = written.uncompressed_size,
                compressed = written.compressed_size,
                "entry written"
            );
        }

        let archive = writer
            .finish()
            .map_err(ArchiveError::IoFailure)?
            .into_inner();

        tracing::debug!(
            target: TRACING_TARGET,
            entries = entry_count,
            archive_size = archive.len(),
            "archive built"
        );

        Ok(Bytes::from(archive))
    }
}

impl Default for Archiver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::{self, Read};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;
    use crate::io::MemoryReader;
    use crate::zip::ZipExtractor;

    /// Decode an archive into (name, content) pairs in directory order.
    async fn decode(archive: Bytes) -> anyhow::Result<Vec<(String, String)>> {
        let extractor = ZipExtractor::new(Arc::new(MemoryReader::new(archive)));
        let mut decoded = Vec::new();
        for entry in extractor.list_files().await? {
            let data = extractor.extract_to_memory(&entry).await?;
            decoded.push((entry.file_name, String::from_utf8(data)?));
        }
        Ok(decoded)
    }

    fn named(name: &str, content: &str) -> FileEntry {
        FileEntry::from_bytes(Some(name.to_string()), content.as_bytes().to_vec())
    }

    #[tokio::test]
    async fn single_file_archive() -> anyhow::Result<()> {
        let archive =
            Archiver::new().build_archive(vec![named("example-file.txt", "this is some text")])?;

        let decoded = decode(archive).await?;
        assert_eq!(
            decoded,
            vec![("example-file.txt".to_string(), "this is some text".to_string())]
        );
        Ok(())
    }

    #[tokio::test]
    async fn multiple_files_archive() -> anyhow::Result<()> {
        let archive = Archiver::new().build_archive(vec![
            named("example-1.txt", "yepe"),
            named("example-2.txt", "julepe"),
        ])?;

        let decoded: HashMap<_, _> = decode(archive).await?.into_iter().collect();
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded["example-1.txt"], "yepe");
        assert_eq!(decoded["example-2.txt"], "julepe");
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_names_are_kept() -> anyhow::Result<()> {
        let archive = Archiver::new()
            .build_archive(vec![named("same.txt", "a"), named("same.txt", "b")])?;

        let decoded = decode(archive).await?;
        assert_eq!(decoded.len(), 2);
        assert!(decoded.iter().all(|(name, _)| name == "same.txt"));
        Ok(())
    }

    #[tokio::test]
    async fn unnamed_entries_get_sequential_names() -> anyhow::Result<()> {
        let archive = Archiver::new().build_archive(vec![
            FileEntry::from_bytes(None, "first"),
            named("named.txt", "second"),
            FileEntry::from_bytes(Some(String::new()), "third"),
            FileEntry::from_bytes(None, "fourth"),
        ])?;

        let decoded: HashMap<_, _> = decode(archive).await?.into_iter().collect();
        assert_eq!(decoded.len(), 4);
        assert_eq!(decoded["1"], "first");
        assert_eq!(decoded["named.txt"], "second");
        assert_eq!(decoded["2"], "third");
        assert_eq!(decoded["3"], "fourth");
        Ok(())
    }

    #[tokio::test]
    async fn explicit_numeric_name_may_repeat_synthetic_one() -> anyhow::Result<()> {
        let archive = Archiver::new().build_archive(vec![
            named("1", "explicit"),
            FileEntry::from_bytes(None, "synthetic"),
        ])?;

        let decoded = decode(archive).await?;
        assert_eq!(decoded.len(), 2);
        assert!(decoded.iter().all(|(name, _)| name == "1"));
        Ok(())
    }

    #[tokio::test]
    async fn content_survives_any_buffer_size() -> anyhow::Result<()> {
        let payload: String = (0..5000).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        for buffer_size in [1, 7, 4096, 1 << 20] {
            let archive = Archiver::with_buffer_size(buffer_size)
                .build_archive(vec![named("alphabet.txt", &payload), named("empty.txt", "")])?;

            let decoded: HashMap<_, _> = decode(archive).await?.into_iter().collect();
            assert_eq!(decoded["alphabet.txt"], payload);
            assert_eq!(decoded["empty.txt"], "");
        }
        Ok(())
    }

    #[test]
    fn output_decodes_with_the_zip_crate() -> anyhow::Result<()> {
        let payload = b"julepe ".repeat(3000);
        let archive = Archiver::with_buffer_size(7).build_archive(vec![
            named("empty.txt", ""),
            named("résumé-ñ.txt", "yepe"),
            FileEntry::from_bytes(Some("big.bin".to_string()), payload.clone()),
            FileEntry::from_bytes(None, "unnamed"),
        ])?;

        let expected: [(&str, &[u8]); 4] = [
            ("empty.txt", &b""[..]),
            ("résumé-ñ.txt", &b"yepe"[..]),
            ("big.bin", payload.as_slice()),
            ("1", &b"unnamed"[..]),
        ];

        let mut zip = ::zip::ZipArchive::new(Cursor::new(archive.to_vec()))?;
        assert_eq!(zip.len(), expected.len());
        for (index, (name, content)) in expected.into_iter().enumerate() {
            let mut file = zip.by_index(index)?;
            assert_eq!(file.name(), name);
            assert_eq!(file.compression(), ::zip::CompressionMethod::Deflated);
            assert_eq!(file.size(), content.len() as u64);

            let mut crc = flate2::Crc::new();
            crc.update(content);
            assert_eq!(file.crc32(), crc.sum(), "{name}");

            let mut data = Vec::new();
            file.read_to_end(&mut data)?;
            assert_eq!(data, content, "{name}");
        }
        Ok(())
    }

    /// Records whether it was ever read.
    struct ReadTracker(Arc<AtomicBool>);

    impl Read for ReadTracker {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            self.0.store(true, Ordering::SeqCst);
            Ok(0)
        }
    }

    #[test]
    fn empty_input_is_rejected() {
        let err = Archiver::new().build_archive(Vec::new()).unwrap_err();
        assert!(matches!(err, ArchiveError::EmptyInput));
        assert_eq!(err.to_string(), "No files provided");
    }

    #[test]
    fn missing_path_is_source_unavailable() {
        let touched = Arc::new(AtomicBool::new(false));
        let entries = vec![
            FileEntry::from_path("/definitely/not/here.txt"),
            FileEntry::new(None, EntryContent::Reader(Box::new(ReadTracker(touched.clone())))),
        ];

        let err = Archiver::new().build_archive(entries).unwrap_err();
        assert!(matches!(err, ArchiveError::SourceUnavailable(_)));
        assert!(err.to_string().starts_with("File not found: "));
        // The run stops at the first failing entry
        assert!(!touched.load(Ordering::SeqCst));
    }

    /// Yields some bytes, then fails.
    struct FailsMidway {
        served: bool,
    }

    impl Read for FailsMidway {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.served {
                return Err(io::Error::new(
                    io::ErrorKind::ConnectionReset,
                    "upload interrupted",
                ));
            }
            self.served = true;
            let n = buf.len().min(4);
            buf[..n].copy_from_slice(&b"yepe"[..n]);
            Ok(n)
        }
    }

    #[test]
    fn read_failure_is_io_failure() {
        let entries = vec![
            named("example-1.txt", "yepe"),
            FileEntry::new(
                Some("broken.txt".to_string()),
                EntryContent::Reader(Box::new(FailsMidway { served: false })),
            ),
        ];

        let err = Archiver::new().build_archive(entries).unwrap_err();
        assert!(matches!(err, ArchiveError::IoFailure(_)));
        assert_eq!(
            err.to_string(),
            "One or more files cannot be processed: upload interrupted"
        );
    }

    #[test]
    fn local_files_are_read_from_disk() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "on disk")?;

        let entry = FileEntry::from_path(&path);
        assert_eq!(entry.declared_name(), Some("notes.txt"));

        let archive = Archiver::new().build_archive(vec![entry])?;
        assert_eq!(&archive[0..4], b"PK\x03\x04");
        Ok(())
    }
}
