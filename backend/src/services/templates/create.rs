//! # Template Creation Service
//!
//! `POST /api/templates` creates either kind of template. A `markupHtml` field
//! (even an empty one) makes an editable template, seeded with the default
//! agreement when blank; otherwise `fileBase64` must hold a readable PDF,
//! which is stored before the record is written.

use crate::error::{AppError, AppResult};
use crate::services::{decode_pdf, run_blocking};
use crate::state::AppState;
use crate::storage::documents::{DocumentKind, DocumentStore};
use crate::storage::templates;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use common::model::markup::DEFAULT_CONTENT;
use common::model::template::{DocumentRef, Template, TemplateKind};
use common::requests::{CreateTemplateRequest, CreatedResponse};
use log::info;
use uuid::Uuid;

pub async fn process(
    state: web::Data<AppState>,
    payload: web::Json<CreateTemplateRequest>,
) -> AppResult<HttpResponse> {
    let state = state.into_inner();
    let request = payload.into_inner();
    let id = run_blocking(move || create_template(&state, request)).await?;
    Ok(HttpResponse::Ok().json(CreatedResponse { id }))
}

pub fn create_template(state: &AppState, request: CreateTemplateRequest) -> AppResult<String> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(AppError::unprocessable("Template name is required"));
    }
    let id = Uuid::new_v4().to_string();

    let kind = match (request.markup_html, request.file_base64) {
        (Some(markup), _) => {
            let markup = if markup.trim().is_empty() {
                DEFAULT_CONTENT.to_string()
            } else {
                markup
            };
            TemplateKind::EditableMarkup { markup }
        }
        (None, Some(file_base64)) => {
            let bytes = decode_pdf(&file_base64)?;
            state.store.write(DocumentKind::Template, &id, &bytes)?;
            TemplateKind::UploadedFile {
                file: DocumentRef {
                    file_name: DocumentStore::file_name(&id),
                },
            }
        }
        (None, None) => {
            return Err(AppError::unprocessable(
                "Either fileBase64 (PDF) or markupHtml is required",
            ))
        }
    };

    let template = Template {
        id: id.clone(),
        name: name.to_string(),
        kind,
        created_at: Utc::now(),
    };
    templates::save(&state.db.connect()?, &template)?;
    info!("Created template {} ({})", id, template.name);
    Ok(id)
}
