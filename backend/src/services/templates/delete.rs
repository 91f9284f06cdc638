use crate::error::{AppError, AppResult};
use crate::services::{ok_response, run_blocking};
use crate::state::AppState;
use crate::storage::documents::DocumentKind;
use crate::storage::templates;
use actix_web::{web, HttpResponse};
use log::info;

/// Handler for `DELETE /api/templates/{template_id}`: the record and its file.
pub async fn process(
    state: web::Data<AppState>,
    template_id: web::Path<String>,
) -> AppResult<HttpResponse> {
    let state = state.into_inner();
    let id = template_id.into_inner();
    run_blocking(move || {
        if !templates::delete(&state.db.connect()?, &id)? {
            return Err(AppError::not_found(format!("Template {} not found", id)));
        }
        state.store.delete(DocumentKind::Template, &id)?;
        info!("Deleted template {}", id);
        Ok(())
    })
    .await?;
    Ok(ok_response())
}
