use super::uploaded_file;
use crate::documents::forms;
use crate::error::AppResult;
use crate::services::run_blocking;
use crate::state::AppState;
use actix_web::{web, HttpResponse};

/// Handler for `GET /api/templates/{template_id}/fields`: the text and checkbox
/// fields of the uploaded PDF. An empty list means the file should be converted.
pub async fn process(
    state: web::Data<AppState>,
    template_id: web::Path<String>,
) -> AppResult<HttpResponse> {
    let state = state.into_inner();
    let id = template_id.into_inner();
    let fields = run_blocking(move || {
        let (_, bytes) = uploaded_file(&state, &state.db.connect()?, &id)?;
        forms::read_fields(&bytes)
    })
    .await?;
    Ok(HttpResponse::Ok().json(fields))
}
