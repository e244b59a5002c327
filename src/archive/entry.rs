use bytes::Bytes;
use std::fmt;
use std::fs::File;
use std::io::{self, Cursor, Read};
use std::path::PathBuf;

/// One file to place into an archive.
#[derive(Debug)]
pub struct FileEntry {
    /// Entry name inside the archive. `None` or empty means a numeric name
    /// is assigned while archiving.
    pub name: Option<String>,
    pub content: EntryContent,
}

impl FileEntry {
    pub fn new(name: Option<String>, content: EntryContent) -> Self {
        Self { name, content }
    }

    /// An in-memory entry, e.g. one uploaded multipart part.
    pub fn from_bytes(name: Option<String>, data: impl Into<Bytes>) -> Self {
        Self::new(name, EntryContent::Bytes(data.into()))
    }

    /// An entry backed by a local file, named after the file's base name.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned());
        Self::new(name, EntryContent::Path(path))
    }

    /// The declared name, if present and non-empty.
    pub fn declared_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|name| !name.is_empty())
    }
}

/// Where an entry's bytes come from. Each variant is read exactly once.
pub enum EntryContent {
    Bytes(Bytes),
    /// Opened lazily when the entry is written.
    Path(PathBuf),
    Reader(Box<dyn Read + Send>),
}

impl EntryContent {
    /// Open the content for a single sequential read.
    pub(crate) fn open(self) -> io::Result<Box<dyn Read + Send>> {
        match self {
            EntryContent::Bytes(data) => Ok(Box::new(Cursor::new(data))),
            EntryContent::Path(path) => Ok(Box::new(File::open(path)?)),
            EntryContent::Reader(reader) => Ok(reader),
        }
    }
}

impl fmt::Debug for EntryContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryContent::Bytes(data) => f.debug_tuple("Bytes").field(&data.len()).finish(),
            EntryContent::Path(path) => f.debug_tuple("Path").field(path).finish(),
            EntryContent::Reader(_) => f.write_str("Reader(..)"),
        }
    }
}
