use super::uploaded_file;
use crate::error::AppResult;
use crate::services::{pdf_response, run_blocking};
use crate::state::AppState;
use actix_web::{web, HttpResponse};

/// Handler for `GET /api/templates/{template_id}/file`. Editable templates
/// have no file and answer `404`.
pub async fn process(
    state: web::Data<AppState>,
    template_id: web::Path<String>,
) -> AppResult<HttpResponse> {
    let state = state.into_inner();
    let id = template_id.into_inner();
    let (template, bytes) = run_blocking(move || uploaded_file(&state, &state.db.connect()?, &id)).await?;
    let file_name = template
        .file()
        .map(|file| file.file_name.clone())
        .unwrap_or_default();
    Ok(pdf_response(bytes, &file_name))
}
