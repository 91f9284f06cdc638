//! # Template Conversion Service
//!
//! `POST /api/templates/{template_id}/convert` turns an uploaded PDF that has
//! no fillable fields into a new editable template. Text comes from the page
//! content streams, or from OCR when the pages are images; when neither yields
//! anything the new template holds a single explanatory paragraph and the
//! response carries the same notice. A PDF with form fields is edited through
//! `/fields` instead and is refused here.

use super::uploaded_file;
use crate::documents::{extract, forms};
use crate::error::{AppError, AppResult};
use crate::services::run_blocking;
use crate::state::AppState;
use crate::storage::templates;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use common::model::template::{Template, TemplateKind};
use common::requests::ConvertResponse;
use log::{info, warn};
use uuid::Uuid;

pub async fn process(
    state: web::Data<AppState>,
    template_id: web::Path<String>,
) -> AppResult<HttpResponse> {
    let state = state.into_inner();
    let id = template_id.into_inner();
    let response = run_blocking(move || convert_template(&state, &id)).await?;
    Ok(HttpResponse::Ok().json(response))
}

pub fn convert_template(state: &AppState, id: &str) -> AppResult<ConvertResponse> {
    let conn = state.db.connect()?;
    let (source, bytes) = uploaded_file(state, &conn, id)?;

    let fields = forms::read_fields(&bytes)?;
    if !fields.is_empty() {
        return Err(AppError::unprocessable(format!(
            "Template {} has {} fillable fields; edit them instead of converting",
            id,
            fields.len()
        )));
    }

    let extraction = extract::extract(&bytes, state.ocr.as_ref())?;
    let notice = extraction.notice().map(str::to_string);
    if notice.is_some() {
        warn!("No text recovered from template {}", id);
    }

    let template = Template {
        id: Uuid::new_v4().to_string(),
        name: source.name,
        kind: TemplateKind::EditableMarkup {
            markup: extraction.to_markup(),
        },
        created_at: Utc::now(),
    };
    templates::save(&conn, &template)?;
    info!(
        "Converted template {} into {} ({} paragraphs, {:?})",
        id,
        template.id,
        extraction.paragraphs.len(),
        extraction.source
    );
    Ok(ConvertResponse {
        id: template.id,
        paragraphs: extraction.paragraphs.len(),
        notice,
    })
}
