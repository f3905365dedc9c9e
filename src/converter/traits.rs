//! Seam between the HTTP layer and the conversion pipeline.

use async_trait::async_trait;

use super::{ConversionRequest, ConversionResult};

/// Anything that can turn an office document into a PDF on disk.
#[async_trait]
pub trait DocumentConverter {
    /// Convert `request.input_path` into `request.output_dir`, returning the PDF path.
    async fn convert(&self, request: &ConversionRequest) -> ConversionResult;

    /// Name of the backing converter, reported by the health endpoint.
    fn name(&self) -> &str;
}
