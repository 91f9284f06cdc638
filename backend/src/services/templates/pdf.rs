//! # Template Preview Service
//!
//! `GET /api/templates/{template_id}/preview` renders an editable template,
//! placeholders unmerged, through the same rasterize-and-paginate path used for
//! contract documents, and serves it inline.

use super::editable_markup;
use crate::documents::render;
use crate::error::AppResult;
use crate::services::{pdf_response, run_blocking};
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use log::info;

pub async fn process(
    state: web::Data<AppState>,
    template_id: web::Path<String>,
) -> AppResult<HttpResponse> {
    let state = state.into_inner();
    let id = template_id.into_inner();
    let file_name = format!("{}-preview.pdf", id);
    let bytes = run_blocking(move || {
        let (_, markup) = editable_markup(&state.db.connect()?, &id)?;
        let bytes = render::render(&markup, &state.fonts)?;
        info!("Rendered preview of template {} ({} bytes)", id, bytes.len());
        Ok(bytes)
    })
    .await?;
    Ok(pdf_response(bytes, &file_name))
}
