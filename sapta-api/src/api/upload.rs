//! Image upload API
//!
//! POST /api/uploads — multipart field `images`, up to 6 files → validate → disk
//!
//! Files land at `{UPLOAD_DIR}/{base}-{millis}-{random}.{ext}` and are served
//! back under `/uploads/`.

use std::path::Path;

use axum::extract::multipart::Field;
use axum::{Extension, Json, extract::Multipart, extract::State};
use serde::Serialize;
use shared::error::{AppError, ErrorCode};
use shared::models::Identity;

use super::ApiResult;
use crate::state::AppState;
use crate::util::random_suffix;

/// Multipart field carrying the files
const FIELD_NAME: &str = "images";

/// Maximum files per request
const MAX_FILES: usize = 6;

/// Maximum file size (5MB)
const MAX_FILE_SIZE: usize = 5 * 1024 * 1024;

/// Supported image formats
const SUPPORTED_FORMATS: &[&str] = &["png", "jpg", "jpeg", "webp", "gif"];

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub urls: Vec<String>,
}

struct PendingFile {
    base: String,
    ext: String,
    data: Vec<u8>,
}

/// Filename stem with anything outside `[A-Za-z0-9_-]` replaced by `-`
fn sanitize_base(file_name: &str) -> String {
    let stem = std::path::Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let cleaned: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches('-');
    if cleaned.is_empty() {
        "image".to_string()
    } else {
        cleaned.to_string()
    }
}

fn extension(file_name: &str) -> String {
    std::path::Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default()
}

fn stored_name(base: &str, ext: &str) -> String {
    format!(
        "{base}-{}-{}.{ext}",
        shared::util::now_millis(),
        random_suffix()
    )
}

fn is_supported_image(data: &[u8]) -> bool {
    use image::ImageFormat;
    matches!(
        image::guess_format(data),
        Ok(ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::WebP | ImageFormat::Gif)
    )
}

/// Read one field, enforcing the size limit while streaming
async fn read_limited(field: &mut Field<'_>) -> Result<Vec<u8>, AppError> {
    let mut data = Vec::new();
    while let Some(chunk) = field.chunk().await.map_err(|e| {
        AppError::with_message(ErrorCode::InvalidRequest, format!("Read error: {e}"))
    })? {
        if data.len() + chunk.len() > MAX_FILE_SIZE {
            return Err(AppError::with_message(
                ErrorCode::FileTooLarge,
                format!("File too large (max {} MB)", MAX_FILE_SIZE / 1024 / 1024),
            ));
        }
        data.extend_from_slice(&chunk);
    }
    Ok(data)
}

/// POST /api/uploads — upload product images
pub async fn upload_images(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    mut multipart: Multipart,
) -> ApiResult<UploadResponse> {
    let mut pending = Vec::new();

    while let Some(mut field) = multipart.next_field().await.map_err(|e| {
        AppError::with_message(ErrorCode::InvalidRequest, format!("Multipart error: {e}"))
    })? {
        if field.name() != Some(FIELD_NAME) {
            continue;
        }
        if pending.len() == MAX_FILES {
            return Err(AppError::with_message(
                ErrorCode::TooManyFiles,
                format!("At most {MAX_FILES} files per upload"),
            ));
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let ext = extension(&file_name);
        if !SUPPORTED_FORMATS.contains(&ext.as_str()) {
            return Err(AppError::with_message(
                ErrorCode::UnsupportedFileFormat,
                format!("Unsupported format: {ext}. Supported: png, jpg, jpeg, webp, gif"),
            ));
        }

        let data = read_limited(&mut field).await?;
        if data.is_empty() {
            return Err(AppError::new(ErrorCode::EmptyFile));
        }
        if !is_supported_image(&data) {
            return Err(AppError::new(ErrorCode::InvalidImageFile));
        }

        pending.push(PendingFile {
            base: sanitize_base(&file_name),
            ext,
            data,
        });
    }

    if pending.is_empty() {
        return Ok(Json(UploadResponse { urls: Vec::new() }));
    }

    tokio::fs::create_dir_all(&state.uploads.dir)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to create upload directory");
            AppError::new(ErrorCode::FileStorageFailed)
        })?;

    let files = pending
        .into_iter()
        .map(|file| (stored_name(&file.base, &file.ext), file.data))
        .collect();
    let urls: Vec<String> = write_all(&state.uploads.dir, files)
        .await?
        .iter()
        .map(|name| state.uploads.public_url(name))
        .collect();

    tracing::info!(user_id = identity.id, count = urls.len(), "Images uploaded");
    Ok(Json(UploadResponse { urls }))
}

/// Write every file or none: on failure the ones already written are removed.
async fn write_all(dir: &Path, files: Vec<(String, Vec<u8>)>) -> Result<Vec<String>, AppError> {
    let mut written: Vec<String> = Vec::with_capacity(files.len());
    for (name, data) in files {
        let path = dir.join(&name);
        if let Err(e) = tokio::fs::write(&path, &data).await {
            tracing::error!(path = %path.display(), error = %e, "Failed to write upload");
            for done in &written {
                let stale = dir.join(done);
                if let Err(e) = tokio::fs::remove_file(&stale).await {
                    tracing::warn!(path = %stale.display(), error = %e, "Failed to remove partial upload");
                }
            }
            return Err(AppError::new(ErrorCode::FileStorageFailed));
        }
        written.push(name);
    }
    Ok(written)
}
