use std::path::Path;

use actix_multipart::Multipart;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{web, HttpResponse, Responder};
use futures_util::StreamExt;
use log::{error, info, warn};
use tokio_util::io::ReaderStream;

use crate::conversion::models::HealthResponse;
use crate::conversion::multipart_parser::MultipartParser;
use crate::converter::{ConversionError, ConversionJob, DocumentConverter};
use crate::{AppState, ErrorResponse};

impl From<ConversionError> for HttpResponse {
    fn from(error: ConversionError) -> Self {
        match error {
            ConversionError::InvalidInput(_) => {
                HttpResponse::BadRequest().json(ErrorResponse::bad_request(&error.to_string()))
            }
            ConversionError::Unavailable => HttpResponse::ServiceUnavailable().json(
                ErrorResponse::new("ConverterUnavailable", "The converter is not accepting work"),
            ),
            ConversionError::Timeout(_) => HttpResponse::GatewayTimeout().json(ErrorResponse::new(
                "ConversionTimeout",
                "The document took too long to convert",
            )),
            _ => HttpResponse::InternalServerError().json(ErrorResponse::new(
                "ConversionFailed",
                "The document could not be converted to PDF",
            )),
        }
    }
}

#[utoipa::path(
    tag = "Conversion",
    post,
    path = "/convert/office-to-pdf",
    request_body(content = inline(crate::conversion::models::UploadDocumentRequest), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "The converted PDF", body = Vec<u8>, content_type = "application/pdf"),
        (status = 400, description = "Missing or malformed upload", body = ErrorResponse),
        (status = 413, description = "Upload too large", body = ErrorResponse),
        (status = 415, description = "Unsupported file type", body = ErrorResponse),
        (status = 500, description = "Conversion failed", body = ErrorResponse),
        (status = 503, description = "Converter not accepting work", body = ErrorResponse),
        (status = 504, description = "Conversion timed out", body = ErrorResponse)
    )
)]
pub async fn convert_office_to_pdf(payload: Multipart, data: web::Data<AppState>) -> HttpResponse {
    let job = match data.workspace.create_job() {
        Ok(job) => job,
        Err(e) => {
            error!("Failed to create job directory: {}", e);
            return HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("Failed to prepare conversion"));
        }
    };
    info!("[job {}] Executing convert_office_to_pdf handler", job.id());

    let upload =
        match MultipartParser::save_upload(payload, &job.input_dir(), data.max_upload_bytes).await {
            Ok(upload) => upload,
            Err(e) => {
                warn!("[job {}] Rejected upload: {}", job.id(), e);
                return e.into();
            }
        };
    info!(
        "[job {}] Received '{}' ({} bytes)",
        job.id(),
        upload.original_filename,
        upload.size
    );

    let request = job.request(&upload.path, data.isolate_profile);
    match data.converter.convert(&request).await {
        Ok(pdf_path) => match stream_pdf(job, &pdf_path).await {
            Ok(response) => response,
            Err(e) => {
                error!("Failed to open converted PDF {}: {}", pdf_path.display(), e);
                HttpResponse::InternalServerError()
                    .json(ErrorResponse::internal_error("Failed to read converted PDF"))
            }
        },
        Err(e) => {
            warn!("[job {}] Conversion failed ({:?})", job.id(), e.kind());
            e.into()
        }
    }
}

/// Stream the PDF back. The job moves into the body so its directory is
/// removed once the last chunk has been sent (or the client goes away).
async fn stream_pdf(job: ConversionJob, pdf_path: &Path) -> std::io::Result<HttpResponse> {
    let file = tokio::fs::File::open(pdf_path).await?;
    let len = file.metadata().await?.len();
    let filename = pdf_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document.pdf".to_string());

    info!("[job {}] Sending {} ({} bytes)", job.id(), filename, len);

    let body = ReaderStream::new(file).map(move |chunk| {
        let _job = &job;
        chunk
    });

    Ok(HttpResponse::Ok()
        .content_type("application/pdf")
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(filename)],
        })
        .no_chunking(len)
        .streaming(body))
}

#[utoipa::path(
    tag = "Conversion",
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    )
)]
pub async fn health(data: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
        converter: data.converter.name().to_string(),
    })
}
