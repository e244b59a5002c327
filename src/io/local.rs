use super::ReadAt;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::Path;

/// Local file reader with random access support
pub struct LocalFileReader {
    file: std::fs::File,
    size: u64,
}

impl LocalFileReader {
    pub fn new(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("cannot open {}", path.display()))?;
        let size = file.metadata()?.len();
        Ok(Self { file, size })
    }
}

#[async_trait]
impl ReadAt for LocalFileReader {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        // Positional reads fill the buffer unless the file ends first
        let mut filled = 0;
        while filled < buf.len() {
            let n = pread(&self.file, &mut buf[filled..], offset + filled as u64)?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        Ok(filled)
    }

    fn size(&self) -> u64 {
        self.size
    }
}

#[cfg(unix)]
fn pread(file: &std::fs::File, buf: &mut [u8], offset: u64) -> std::io::Result<usize> {
    use std::os::unix::fs::FileExt;
    file.read_at(buf, offset)
}

#[cfg(windows)]
fn pread(file: &std::fs::File, buf: &mut [u8], offset: u64) -> std::io::Result<usize> {
    use std::os::windows::fs::FileExt;
    file.seek_read(buf, offset)
}

#[cfg(not(any(unix, windows)))]
fn pread(mut file: &std::fs::File, buf: &mut [u8], offset: u64) -> std::io::Result<usize> {
    use std::io::{Read, Seek, SeekFrom};
    file.seek(SeekFrom::Start(offset))?;
    file.read(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn reads_at_offset_and_stops_at_eof() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(b"yepe julepe")?;

        let reader = LocalFileReader::new(file.path())?;
        assert_eq!(reader.size(), 11);

        let mut buf = [0u8; 6];
        assert_eq!(reader.read_at(5, &mut buf).await?, 6);
        assert_eq!(&buf, b"julepe");

        let mut tail = [0u8; 8];
        assert_eq!(reader.read_at(9, &mut tail).await?, 2);
        assert_eq!(&tail[..2], b"pe");
        Ok(())
    }

    #[test]
    fn missing_file_reports_path() {
        let err = LocalFileReader::new(Path::new("/definitely/not/here.zip"))
            .err()
            .unwrap();
        assert!(err.to_string().contains("/definitely/not/here.zip"));
    }
}
