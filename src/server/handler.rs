//! `POST /api/zip`: bundle uploaded files into one archive.

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::http::header;
use axum::response::IntoResponse;

use super::error::{HttpError, Result};
use crate::archive::{Archiver, FileEntry};

/// Tracing target for the zip endpoint.
const TRACING_TARGET: &str = "zipcast::server::handler";

/// Multipart field carrying the files to archive.
pub const FILES_FIELD: &str = "files";

/// Content type of a successful response.
pub const ZIP_CONTENT_TYPE: &str = "application/zip";

/// Archives every `files` part of the upload.
///
/// Parts under any other field name are skipped. A part without a file name
/// is given a numeric name by the archiver. A body that is not multipart at
/// all is answered with the same JSON error shape as every other failure.
#[tracing::instrument(skip_all)]
pub async fn zip_files(
    State(archiver): State<Archiver>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse> {
    let mut multipart = multipart?;
    let mut entries = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILES_FIELD) {
            tracing::debug!(
                target: TRACING_TARGET,
                field = ?field.name(),
                "skipping unrelated field"
            );
            continue;
        }

        let name = field.file_name().map(str::to_owned);
        let data = field.bytes().await?;
        tracing::debug!(
            target: TRACING_TARGET,
            name = ?name,
            size = data.len(),
            "received file"
        );
        entries.push(FileEntry::from_bytes(name, data));
    }

    let entry_count = entries.len();
    let archive = tokio::task::spawn_blocking(move || archiver.build_archive(entries))
        .await
        .map_err(|err| {
            tracing::error!(target: TRACING_TARGET, error = %err, "archive worker failed");
            HttpError::internal("Archive worker failed")
        })??;

    tracing::info!(
        target: TRACING_TARGET,
        files = entry_count,
        archive_size = archive.len(),
        "archive created"
    );

    Ok(([(header::CONTENT_TYPE, ZIP_CONTENT_TYPE)], archive))
}
