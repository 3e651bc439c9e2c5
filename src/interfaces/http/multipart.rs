use actix_multipart::Multipart;
use actix_web::http::header::CONTENT_LENGTH;
use actix_web::HttpRequest;
use futures_util::StreamExt;

use crate::domain::error::{AppError, Result};
use crate::domain::upload::UploadedFile;

pub fn too_large(max_bytes: usize) -> AppError {
    AppError::PayloadTooLarge(format!(
        "The file is too large. The maximum allowed size is {}MB. Please split your files into smaller parts.",
        max_bytes / 1024 / 1024
    ))
}

/// Reject a request whose declared length is over the limit before reading any of it.
pub fn check_content_length(req: &HttpRequest, max_bytes: usize) -> Result<()> {
    let declared = req
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    match declared {
        Some(len) if len > max_bytes => Err(too_large(max_bytes)),
        _ => Ok(()),
    }
}

/// Read every file part named `field`, in order.
///
/// Parts under other names are drained and dropped. The running total of
/// all parts is capped at `max_bytes`.
pub async fn read_files(
    mut payload: Multipart,
    field: &str,
    max_bytes: usize,
) -> Result<Vec<UploadedFile>> {
    let mut files = Vec::new();
    let mut total = 0usize;

    while let Some(item) = payload.next().await {
        let mut part = item.map_err(|e| {
            AppError::ValidationError(format!("Failed to read multipart field: {}", e))
        })?;

        let (name, filename) = match part.content_disposition() {
            Some(cd) => (
                cd.get_name().map(str::to_string),
                cd.get_filename().map(str::to_string),
            ),
            None => (None, None),
        };

        let mut bytes = Vec::new();
        while let Some(chunk) = part.next().await {
            let chunk = chunk.map_err(|e| {
                AppError::ValidationError(format!("Failed to read file data: {}", e))
            })?;
            total += chunk.len();
            if total > max_bytes {
                return Err(too_large(max_bytes));
            }
            bytes.extend_from_slice(&chunk);
        }

        if name.as_deref() == Some(field) {
            files.push(UploadedFile::new(filename.unwrap_or_default(), bytes));
        }
    }

    Ok(files)
}
