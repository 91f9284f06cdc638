//! HTTP surface. Each resource has a `configure_routes()` returning its scope;
//! handlers live one per file as `process`, and run their storage and document
//! work on the blocking pool.

pub mod contracts;
pub mod templates;

use crate::documents::pdf;
use crate::error::{AppError, AppResult};
use actix_web::http::header;
use actix_web::{web, HttpResponse};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

/// Registers every resource scope.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(templates::configure_routes())
        .service(contracts::configure_routes());
}

/// Runs `work` on tokio's blocking pool. A panicked task becomes an internal error.
pub(crate) async fn run_blocking<T, F>(work: F) -> AppResult<T>
where
    F: FnOnce() -> AppResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work).await?
}

/// An inline PDF download.
pub(crate) fn pdf_response(bytes: Vec<u8>, file_name: &str) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("application/pdf")
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("inline; filename=\"{}\"", file_name),
        ))
        .body(bytes)
}

/// Decodes an uploaded base64 PDF and checks that it parses.
pub(crate) fn decode_pdf(file_base64: &str) -> AppResult<Vec<u8>> {
    let bytes = BASE64.decode(file_base64.trim())?;
    if bytes.is_empty() {
        return Err(AppError::unprocessable("Uploaded file is empty"));
    }
    pdf::load(&bytes)?;
    Ok(bytes)
}

/// Body of mutations that return nothing else.
pub(crate) fn ok_response() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "ok": true }))
}
