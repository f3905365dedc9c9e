//! HTTP surface of the conversion pipeline.

pub mod handlers;
pub mod models;
pub mod multipart_parser;

use actix_web::web;

/// Register the conversion routes.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/convert/office-to-pdf")
            .route(web::post().to(handlers::convert_office_to_pdf)),
    )
    .service(web::resource("/health").route(web::get().to(handlers::health)));
}
