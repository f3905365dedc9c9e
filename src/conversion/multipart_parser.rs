use std::path::{Path, PathBuf};

use actix_multipart::Multipart;
use actix_web::HttpResponse;
use futures::StreamExt;
use log::debug;
use sanitize_filename::sanitize;
use tokio::io::AsyncWriteExt;

use crate::ErrorResponse;

/// Extensions the converter is asked to handle.
pub const ALLOWED_EXTENSIONS: &[&str] = &[
    "doc", "docx", "ppt", "pptx", "xls", "xlsx", "odt", "odp", "ods", "rtf",
];

pub const FILE_FIELD: &str = "file";

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Multipart field error: {0}")]
    FieldError(String),
    #[error("No file was uploaded in the 'file' field")]
    MissingFile,
    #[error("Unsupported file type '{0}', expected one of: doc, docx, ppt, pptx, xls, xlsx, odt, odp, ods, rtf")]
    UnsupportedType(String),
    #[error("Uploaded file is empty")]
    EmptyFile,
    #[error("Upload exceeds the limit of {0} bytes")]
    TooLarge(usize),
    #[error("IO error: {0}")]
    IoError(String),
}

impl From<UploadError> for HttpResponse {
    fn from(error: UploadError) -> Self {
        match error {
            UploadError::FieldError(_) | UploadError::MissingFile | UploadError::EmptyFile => {
                HttpResponse::BadRequest().json(ErrorResponse::bad_request(&error.to_string()))
            }
            UploadError::UnsupportedType(_) => HttpResponse::UnsupportedMediaType()
                .json(ErrorResponse::new("UnsupportedMediaType", &error.to_string())),
            UploadError::TooLarge(_) => HttpResponse::PayloadTooLarge()
                .json(ErrorResponse::new("PayloadTooLarge", &error.to_string())),
            UploadError::IoError(_) => HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("Failed to store the uploaded file")),
        }
    }
}

/// The uploaded document after it has been written into a job's input directory.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub path: PathBuf,
    pub original_filename: String,
    pub size: usize,
}

/// Sanitize a client-supplied filename and check its extension.
pub fn validate_filename(raw: &str) -> Result<String, UploadError> {
    let sanitized = sanitize(raw);
    let extension = Path::new(&sanitized)
        .extension()
        .and_then(std::ffi::OsStr::to_str)
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(UploadError::UnsupportedType(extension));
    }

    Ok(sanitized)
}

pub struct MultipartParser;

impl MultipartParser {
    /// Stream the `file` field into `dest_dir`, enforcing `max_bytes`.
    ///
    /// Other fields are ignored, as are any `file` fields after the first.
    pub async fn save_upload(
        mut multipart: Multipart,
        dest_dir: &Path,
        max_bytes: usize,
    ) -> Result<UploadedFile, UploadError> {
        let mut uploaded: Option<UploadedFile> = None;

        while let Some(item) = multipart.next().await {
            let mut field = item.map_err(|e| UploadError::FieldError(e.to_string()))?;
            let content_disposition = field
                .content_disposition()
                .ok_or_else(|| UploadError::FieldError("Content disposition not found".to_string()))?;
            let name = content_disposition
                .get_name()
                .ok_or_else(|| UploadError::FieldError("Field name not found".to_string()))?;

            if name != FILE_FIELD || uploaded.is_some() {
                debug!("Skipping multipart field '{}'", name);
                continue;
            }

            let original_filename = content_disposition
                .get_filename()
                .ok_or_else(|| UploadError::FieldError("No filename in file field".to_string()))?
                .to_string();
            let filename = validate_filename(&original_filename)?;
            let path = dest_dir.join(&filename);

            let mut file = tokio::fs::File::create(&path)
                .await
                .map_err(|e| UploadError::IoError(e.to_string()))?;
            let mut size = 0usize;

            while let Some(chunk) = field.next().await {
                let data = chunk.map_err(|e| UploadError::FieldError(e.to_string()))?;
                size += data.len();
                if size > max_bytes {
                    return Err(UploadError::TooLarge(max_bytes));
                }
                file.write_all(&data)
                    .await
                    .map_err(|e| UploadError::IoError(e.to_string()))?;
            }
            file.flush()
                .await
                .map_err(|e| UploadError::IoError(e.to_string()))?;

            if size == 0 {
                return Err(UploadError::EmptyFile);
            }

            uploaded = Some(UploadedFile {
                path,
                original_filename,
                size,
            });
        }

        uploaded.ok_or(UploadError::MissingFile)
    }
}
