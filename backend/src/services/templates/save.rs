//! # Template Update Service
//!
//! `PATCH /api/templates/{template_id}` renames a template and/or replaces the
//! content of an editable one. Content arrives either in stored form
//! (`markupHtml`, placeholders as `{{key}}`) or as editor HTML (`editorHtml`,
//! placeholders as `data-merge` spans); the stored form wins when both are sent.

use crate::error::{AppError, AppResult};
use crate::services::{ok_response, run_blocking};
use crate::state::AppState;
use crate::storage::templates;
use actix_web::{web, HttpResponse};
use common::model::markup::editor_html_to_markup;
use common::model::template::TemplateKind;
use common::requests::UpdateTemplateRequest;
use log::info;

pub async fn process(
    state: web::Data<AppState>,
    template_id: web::Path<String>,
    payload: web::Json<UpdateTemplateRequest>,
) -> AppResult<HttpResponse> {
    let state = state.into_inner();
    let id = template_id.into_inner();
    let request = payload.into_inner();
    run_blocking(move || save_template(&state, &id, request)).await?;
    Ok(ok_response())
}

pub fn save_template(state: &AppState, id: &str, request: UpdateTemplateRequest) -> AppResult<()> {
    let conn = state.db.connect()?;
    let mut template = templates::get(&conn, id)?;

    if let Some(name) = request.name {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::unprocessable("Template name cannot be empty"));
        }
        template.name = name.to_string();
    }

    let content = request
        .markup_html
        .or_else(|| request.editor_html.as_deref().map(editor_html_to_markup));
    if let Some(markup) = content {
        match &mut template.kind {
            TemplateKind::EditableMarkup { markup: stored } => *stored = markup,
            TemplateKind::UploadedFile { .. } => {
                return Err(AppError::unprocessable(format!(
                    "Template {} is an uploaded PDF; convert it before editing its content",
                    id
                )))
            }
        }
    }

    templates::save(&conn, &template)?;
    info!("Updated template {}", id);
    Ok(())
}
