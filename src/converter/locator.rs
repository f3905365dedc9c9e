//! Locating (and optionally checking) the PDF the converter produced.

use std::path::{Path, PathBuf};

use tokio::io::AsyncReadExt;

use super::ConversionError;

const PDF_MAGIC: &[u8] = b"%PDF-";

/// `<output_dir>/<input stem>.pdf`. Only the final extension is stripped.
pub fn expected_output_path(input_path: &Path, output_dir: &Path) -> Result<PathBuf, ConversionError> {
    let stem = input_path
        .file_stem()
        .ok_or_else(|| ConversionError::InvalidInput(input_path.to_path_buf()))?;

    let mut file_name = stem.to_os_string();
    file_name.push(".pdf");
    Ok(output_dir.join(file_name))
}

/// Return the expected output path if a file exists there.
///
/// Existence is the only check: an empty or corrupt file is still returned.
pub fn locate(input_path: &Path, output_dir: &Path) -> Result<PathBuf, ConversionError> {
    let expected = expected_output_path(input_path, output_dir)?;
    if expected.is_file() {
        Ok(expected)
    } else {
        Err(ConversionError::OutputMissing(expected))
    }
}

/// Reject empty files and files that do not start with a PDF header.
pub async fn verify_pdf(path: &Path) -> Result<(), ConversionError> {
    let invalid = |reason: String| ConversionError::InvalidOutput {
        path: path.to_path_buf(),
        reason,
    };

    let mut file = tokio::fs::File::open(path)
        .await
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConversionError::OutputMissing(path.to_path_buf()),
            _ => invalid(e.to_string()),
        })?;

    let len = file.metadata().await.map_err(|e| invalid(e.to_string()))?.len();
    if len == 0 {
        return Err(invalid("file is empty".to_string()));
    }

    if len < PDF_MAGIC.len() as u64 {
        return Err(invalid("missing %PDF- header".to_string()));
    }

    let mut header = [0u8; 5];
    file.read_exact(&mut header)
        .await
        .map_err(|e| invalid(e.to_string()))?;
    if header[..] != *PDF_MAGIC {
        return Err(invalid("missing %PDF- header".to_string()));
    }

    Ok(())
}
