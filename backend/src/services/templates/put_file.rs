use super::uploaded_file;
use crate::error::AppResult;
use crate::services::{decode_pdf, ok_response, run_blocking};
use crate::state::AppState;
use crate::storage::documents::DocumentKind;
use actix_web::{web, HttpResponse};
use common::requests::FileUploadRequest;
use log::info;

/// Handler for `PUT /api/templates/{template_id}/file`: replaces the uploaded
/// PDF wholesale.
pub async fn process(
    state: web::Data<AppState>,
    template_id: web::Path<String>,
    payload: web::Json<FileUploadRequest>,
) -> AppResult<HttpResponse> {
    let state = state.into_inner();
    let id = template_id.into_inner();
    let request = payload.into_inner();
    run_blocking(move || {
        let bytes = decode_pdf(&request.file_base64)?;
        uploaded_file(&state, &state.db.connect()?, &id)?;
        state.store.write(DocumentKind::Template, &id, &bytes)?;
        info!("Replaced the file of template {}", id);
        Ok(())
    })
    .await?;
    Ok(ok_response())
}
