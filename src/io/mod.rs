//! Random-access sources for reading archives back.

mod local;
mod memory;

pub use local::LocalFileReader;
pub use memory::MemoryReader;

use anyhow::{Result, bail};
use async_trait::async_trait;

/// Positional reads over an archive source
#[async_trait]
pub trait ReadAt: Send + Sync {
    /// Read data at the specified offset into the buffer, returning how many
    /// bytes were read. Fewer than `buf.len()` means the source ended.
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize>;

    /// Get the total size of the data source
    fn size(&self) -> u64;

    /// Fill the whole buffer or fail.
    async fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let n = self.read_at(offset, buf).await?;
        if n < buf.len() {
            bail!(
                "Unexpected end of archive: wanted {} bytes at offset {}, got {}",
                buf.len(),
                offset,
                n
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn read_exact_at_rejects_short_reads() {
        let reader = MemoryReader::new(&b"PK\x05\x06"[..]);

        let mut buf = [0u8; 4];
        reader.read_exact_at(0, &mut buf).await.unwrap();
        assert_eq!(&buf, b"PK\x05\x06");

        let err = reader.read_exact_at(2, &mut buf).await.unwrap_err();
        assert!(err.to_string().contains("wanted 4 bytes at offset 2, got 2"));

        // Offsets past the end read nothing
        assert_eq!(reader.read_at(100, &mut buf).await.unwrap(), 0);
    }
}
