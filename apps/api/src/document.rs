use bytes::Bytes;
use tracing::{info, warn};

use crate::errors::AppError;

const PDF_MAGIC: &[u8] = b"%PDF-";

/// Extracts plain text from a PDF, one page after another, newline-joined.
/// Runs on the blocking pool; panics inside the PDF decoder become a 422.
pub async fn extract_text(data: Bytes) -> Result<String, AppError> {
    if !data.starts_with(PDF_MAGIC) {
        return Err(AppError::UnprocessableEntity(
            "Uploaded file is not a PDF".to_string(),
        ));
    }

    let size = data.len();
    let extracted = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&data))
        .await
        .map_err(|e| {
            warn!("PDF extraction task aborted: {e}");
            AppError::UnprocessableEntity("Could not read the PDF".to_string())
        })?
        .map_err(|e| AppError::UnprocessableEntity(format!("Could not read the PDF: {e}")))?;

    let text = normalize_pages(&extracted);
    if text.is_empty() {
        return Err(AppError::UnprocessableEntity(
            "No text could be extracted from the PDF".to_string(),
        ));
    }

    info!("Extracted {} chars from a {} byte PDF", text.len(), size);
    Ok(text)
}

/// Turns form-feed page breaks into newlines and trims the ends.
fn normalize_pages(raw: &str) -> String {
    raw.split('\u{c}')
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
