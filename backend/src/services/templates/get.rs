//! # Template Retrieval Service
//!
//! `GET /api/templates/{template_id}` returns the template record. Editable
//! templates carry their stored markup; uploaded ones carry the name of their
//! file, which is fetched separately from `/file`.

use crate::error::AppResult;
use crate::services::run_blocking;
use crate::state::AppState;
use crate::storage::templates;
use actix_web::{web, HttpResponse};

/// # Returns
/// - `200 OK` with the `Template` as JSON.
/// - `404 Not Found` when the id is unknown.
pub async fn process(
    state: web::Data<AppState>,
    template_id: web::Path<String>,
) -> AppResult<HttpResponse> {
    let state = state.into_inner();
    let id = template_id.into_inner();
    let template = run_blocking(move || templates::get(&state.db.connect()?, &id)).await?;
    Ok(HttpResponse::Ok().json(template))
}
