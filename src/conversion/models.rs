use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Multipart body of `POST /convert/office-to-pdf`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UploadDocumentRequest {
    /// A .doc, .docx, .ppt, .pptx (or other supported office) document.
    #[allow(unused)]
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: String,
    #[schema(example = "libreoffice")]
    pub converter: String,
}
