use std::io;

/// Why an archive could not be built.
///
/// Every variant is terminal: nothing is retried and no partial archive is
/// ever handed back.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// The request carried no entries at all.
    #[error("No files provided")]
    EmptyInput,

    /// An entry's backing content could not be opened.
    #[error("File not found: {0}")]
    SourceUnavailable(#[source] io::Error),

    /// Reading an entry or writing the archive failed.
    #[error("One or more files cannot be processed: {0}")]
    IoFailure(#[source] io::Error),
}

/// Result alias for archive operations.
pub type Result<T, E = ArchiveError> = std::result::Result<T, E>;
