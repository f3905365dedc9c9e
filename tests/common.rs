#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use office_pdf_server::converter::{
    expected_output_path, ConversionError, ConversionRequest, ConversionResult, DocumentConverter,
};

pub const BOUNDARY: &str = "----office-pdf-test-boundary";

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={BOUNDARY}")
}

/// Multipart body with a single file field.
pub fn multipart_file_body(field: &str, filename: &str, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// Multipart body with a single plain text field.
pub fn multipart_text_body(field: &str, value: &str) -> Vec<u8> {
    format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"\r\n\r\n{value}\r\n--{BOUNDARY}--\r\n"
    )
    .into_bytes()
}

#[derive(Debug, Clone, Copy)]
pub enum MockBehavior {
    /// Writes `%PDF-1.4\n` followed by the input bytes.
    Succeed,
    FailProcess,
    MissingOutput,
    TimeOut,
}

/// In-process stand-in for the LibreOffice-backed converter.
pub struct MockConverter {
    behavior: MockBehavior,
    requests: tokio::sync::Mutex<Vec<ConversionRequest>>,
}

impl MockConverter {
    pub fn new(behavior: MockBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            requests: tokio::sync::Mutex::new(Vec::new()),
        })
    }

    pub async fn requests(&self) -> Vec<ConversionRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait::async_trait]
impl DocumentConverter for MockConverter {
    async fn convert(&self, request: &ConversionRequest) -> ConversionResult {
        self.requests.lock().await.push(request.clone());

        match self.behavior {
            MockBehavior::Succeed => {
                let output = expected_output_path(&request.input_path, &request.output_dir)?;
                let mut pdf = b"%PDF-1.4\n".to_vec();
                pdf.extend(std::fs::read(&request.input_path).unwrap_or_default());
                std::fs::write(&output, pdf).map_err(|e| ConversionError::InvalidOutput {
                    path: output.clone(),
                    reason: e.to_string(),
                })?;
                Ok(output)
            }
            MockBehavior::FailProcess => Err(ConversionError::ProcessExit {
                code: Some(1),
                stderr: "mock failure".to_string(),
            }),
            MockBehavior::MissingOutput => Err(ConversionError::OutputMissing(
                expected_output_path(&request.input_path, &request.output_dir)?,
            )),
            MockBehavior::TimeOut => Err(ConversionError::Timeout(Duration::from_secs(1))),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Number of entries directly under `dir`.
pub fn entry_count(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}

#[cfg(unix)]
#[path = "../src/converter/test_support.rs"]
mod converter_scripts;

#[cfg(unix)]
#[allow(unused_imports)]
pub use converter_scripts::{write_script, SILENT_CONVERTER, WORKING_CONVERTER};
