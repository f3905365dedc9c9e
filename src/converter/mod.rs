//! Conversion pipeline - turns an uploaded office document into a PDF.
//!
//! - `invoker` - runs the external converter (LibreOffice) for one document
//! - `locator` - finds the PDF the converter wrote
//! - `service` - façade combining both behind a concurrency gate
//! - `workspace` - per-request job directories and their cleanup

pub mod invoker;
pub mod locator;
pub mod service;
pub mod traits;
pub mod workspace;

#[cfg(all(test, unix))]
pub(crate) mod test_support;

pub use invoker::{Completion, ConverterInvoker};
pub use locator::{expected_output_path, locate, verify_pdf};
pub use service::ConversionService;
pub use traits::DocumentConverter;
pub use workspace::{ConversionJob, JobWorkspace};

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while converting a document.
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("failed to start converter '{program}': {source}")]
    ProcessSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("converter exited with status {code:?}")]
    ProcessExit { code: Option<i32>, stderr: String },
    #[error("converter did not finish within {0:?}")]
    Timeout(Duration),
    #[error("converter reported success but no output was found at {0}")]
    OutputMissing(PathBuf),
    #[error("converter output at {path} is not a usable PDF: {reason}")]
    InvalidOutput { path: PathBuf, reason: String },
    #[error("input path {0} has no file name")]
    InvalidInput(PathBuf),
    #[error("converter is not accepting work")]
    Unavailable,
}

/// Coarse failure classes, as reported in logs and mapped to HTTP statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionErrorKind {
    ProcessError,
    OutputMissing,
    InvalidOutput,
    Timeout,
    InvalidInput,
    Unavailable,
}

impl ConversionError {
    pub fn kind(&self) -> ConversionErrorKind {
        match self {
            ConversionError::ProcessSpawn { .. } | ConversionError::ProcessExit { .. } => {
                ConversionErrorKind::ProcessError
            }
            ConversionError::Timeout(_) => ConversionErrorKind::Timeout,
            ConversionError::OutputMissing(_) => ConversionErrorKind::OutputMissing,
            ConversionError::InvalidOutput { .. } => ConversionErrorKind::InvalidOutput,
            ConversionError::InvalidInput(_) => ConversionErrorKind::InvalidInput,
            ConversionError::Unavailable => ConversionErrorKind::Unavailable,
        }
    }
}

/// One document to convert. `output_dir` must be exclusive to this request.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    pub input_path: PathBuf,
    pub output_dir: PathBuf,
    /// Private converter profile; `None` shares the user's default profile.
    pub profile_dir: Option<PathBuf>,
}

impl ConversionRequest {
    pub fn new(input_path: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_path: input_path.into(),
            output_dir: output_dir.into(),
            profile_dir: None,
        }
    }

    pub fn with_profile_dir(mut self, profile_dir: impl Into<PathBuf>) -> Self {
        self.profile_dir = Some(profile_dir.into());
        self
    }
}

/// Path of the produced PDF, or why there is none.
pub type ConversionResult = Result<PathBuf, ConversionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_failures_share_a_kind() {
        let spawn = ConversionError::ProcessSpawn {
            program: "libreoffice".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        let exit = ConversionError::ProcessExit {
            code: Some(1),
            stderr: String::new(),
        };
        assert_eq!(spawn.kind(), ConversionErrorKind::ProcessError);
        assert_eq!(exit.kind(), ConversionErrorKind::ProcessError);
    }

    #[test]
    fn test_error_display_does_not_leak_stderr() {
        let err = ConversionError::ProcessExit {
            code: Some(77),
            stderr: "secret path /home/user".into(),
        };
        let text = err.to_string();
        assert!(text.contains("77"));
        assert!(!text.contains("secret"));
    }

    #[test]
    fn test_request_builder() {
        let req = ConversionRequest::new("/tmp/in/a.docx", "/tmp/out").with_profile_dir("/tmp/p");
        assert_eq!(req.input_path, PathBuf::from("/tmp/in/a.docx"));
        assert_eq!(req.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(req.profile_dir, Some(PathBuf::from("/tmp/p")));
    }
}
