//! Main entry point for the zipcast CLI application.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use zipcast::{
    Archiver, Cli, Command, FileEntry, LocalFileReader, ZipExtractor, server, telemetry,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init_tracing()?;

    match cli.command {
        Command::Serve(args) => server::serve(&args).await?,
        Command::Pack { output, files } => pack(&output, files).await?,
        Command::List { file, verbose } => list_files(&file, verbose).await?,
    }

    Ok(())
}

/// Archive local files into `output`, each under its base name.
async fn pack(output: &Path, files: Vec<PathBuf>) -> Result<()> {
    let entries: Vec<_> = files.into_iter().map(FileEntry::from_path).collect();
    let entry_count = entries.len();

    let archive = tokio::task::spawn_blocking(move || Archiver::new().build_archive(entries))
        .await??;

    tokio::fs::write(output, &archive)
        .await
        .with_context(|| format!("cannot write {}", output.display()))?;

    tracing::info!(
        output = %output.display(),
        files = entry_count,
        size = %format_size(archive.len() as u64),
        "archive written"
    );
    Ok(())
}

/// List files in the ZIP archive.
///
/// Supports two output formats:
/// - Simple format: just file names, one per line
/// - Verbose format (`-v`): table with sizes, compression ratio and timestamps
async fn list_files(path: &Path, verbose: bool) -> Result<()> {
    let reader = Arc::new(LocalFileReader::new(path)?);
    let entries = ZipExtractor::new(reader).list_files().await?;

    if !verbose {
        for entry in &entries {
            println!("{}", entry.file_name);
        }
        return Ok(());
    }

    println!(
        "{:>10}  {:>10}  {:>5}  {:>10}  {:>5}  Name",
        "Length", "Size", "Cmpr", "Date", "Time"
    );
    println!("{}", "-".repeat(70));

    let mut total_uncompressed = 0u64;
    let mut total_compressed = 0u64;
    let mut file_count = 0usize;

    for entry in &entries {
        let (year, month, day) = entry.mod_date();
        let (hour, minute, _second) = entry.mod_time();

        println!(
            "{:>10}  {:>10}  {}  {:04}-{:02}-{:02}  {:02}:{:02}  {}",
            entry.uncompressed_size,
            entry.compressed_size,
            ratio(entry.compressed_size, entry.uncompressed_size),
            year,
            month,
            day,
            hour,
            minute,
            entry.file_name
        );

        if !entry.is_directory {
            total_uncompressed += entry.uncompressed_size;
            total_compressed += entry.compressed_size;
            file_count += 1;
        }
    }

    println!("{}", "-".repeat(70));
    println!(
        "{:>10}  {:>10}  {}  {:>21}  {} files",
        total_uncompressed,
        total_compressed,
        ratio(total_compressed, total_uncompressed),
        "",
        file_count
    );

    Ok(())
}

/// Space saved by compression, as a right-aligned percentage.
///
/// Tiny inputs can grow under DEFLATE, which shows as a negative ratio.
fn ratio(compressed: u64, uncompressed: u64) -> String {
    if uncompressed == 0 {
        return format!("{:>4}%", 0);
    }
    let saved = 100 - (compressed as i128 * 100 / uncompressed as i128);
    format!("{:>4}%", saved)
}

/// Format a byte size into a human-readable string.
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_handles_growth_and_empty() {
        assert_eq!(ratio(0, 0), "   0%");
        assert_eq!(ratio(0, 0).len(), ratio(25, 100).len());
        assert_eq!(ratio(25, 100), "  75%");
        assert_eq!(ratio(12, 4), "-200%");
    }

    #[test]
    fn format_size_picks_unit() {
        assert_eq!(format_size(500), "500 bytes");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(1048576), "1.00 MB");
    }

    #[tokio::test]
    async fn pack_then_list_round_trip() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let first = dir.path().join("example-1.txt");
        let second = dir.path().join("example-2.txt");
        std::fs::write(&first, "yepe")?;
        std::fs::write(&second, "julepe")?;
        let output = dir.path().join("bundle.zip");

        pack(&output, vec![first, second]).await?;

        let reader = Arc::new(LocalFileReader::new(&output)?);
        let extractor = ZipExtractor::new(reader);
        let entries = extractor.list_files().await?;
        let names: Vec<_> = entries.iter().map(|e| e.file_name.as_str()).collect();
        assert_eq!(names, ["example-1.txt", "example-2.txt"]);
        assert_eq!(extractor.extract_to_memory(&entries[1]).await?, b"julepe");

        list_files(&output, true).await?;
        Ok(())
    }

    #[tokio::test]
    async fn pack_fails_on_missing_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let output = dir.path().join("bundle.zip");

        let err = pack(&output, vec![dir.path().join("missing.txt")])
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("File not found"));
        assert!(!output.exists());
        Ok(())
    }
}
