//! # zipcast
//!
//! Bundles a set of files into a single ZIP archive, served over HTTP.
//!
//! The core is [`Archiver::build_archive`]: given named byte streams it
//! produces one complete, independently decodable archive, or fails without
//! returning partial output. Around it sit a small ZIP codec built on
//! `flate2`, an axum endpoint (`POST /api/zip`, multipart field `files`) and
//! a CLI that can also pack and list archives locally.
//!
//! ## Example
//!
//! ```no_run
//! use zipcast::{Archiver, FileEntry};
//!
//! fn main() -> anyhow::Result<()> {
//!     let archive = Archiver::new().build_archive(vec![
//!         FileEntry::from_bytes(Some("example-1.txt".to_string()), "yepe"),
//!         FileEntry::from_bytes(None, "julepe"),
//!     ])?;
//!     std::fs::write("bundle.zip", &archive)?;
//!     Ok(())
//! }
//! ```

pub mod archive;
pub mod cli;
pub mod io;
pub mod server;
pub mod telemetry;
pub mod zip;

pub use archive::{ArchiveError, Archiver, EntryContent, FileEntry};
pub use cli::{Cli, Command, ServeArgs};
pub use io::{LocalFileReader, MemoryReader, ReadAt};
pub use zip::{ZipExtractor, ZipFileEntry, ZipWriter};
