//! `GET /api/templates/{template_id}/editable`: the editable form of a markup
//! template, as the field-marker tree and as editor HTML in which every marker
//! is a non-editable `data-merge` span.

use super::editable_markup;
use crate::error::AppResult;
use crate::services::run_blocking;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use common::model::markup::to_editable;
use common::requests::EditableResponse;

pub async fn process(
    state: web::Data<AppState>,
    template_id: web::Path<String>,
) -> AppResult<HttpResponse> {
    let state = state.into_inner();
    let id = template_id.into_inner();
    let (_, markup) = run_blocking(move || editable_markup(&state.db.connect()?, &id)).await?;
    let document = to_editable(&markup);
    Ok(HttpResponse::Ok().json(EditableResponse {
        editor_html: document.to_editor_html(),
        document,
    }))
}
