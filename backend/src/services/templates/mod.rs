//! # Template Service Module
//!
//! Routes under `/api/templates`. A template is either editable markup with
//! `{{key}}` placeholders or an uploaded PDF; each handler rejects the kind it
//! does not apply to.
//!
//! ## Registered Routes
//!
//! *   `GET /` and `POST /`: list templates, create one from `markupHtml` or
//!     `fileBase64`.
//! *   `GET`, `PATCH`, `DELETE /{template_id}`: read, rename or edit, remove.
//! *   `GET`, `PUT /{template_id}/file`: the uploaded PDF.
//! *   `GET /{template_id}/editable`: the editable tree and its editor HTML.
//! *   `GET /{template_id}/preview`: the unmerged markup rendered to PDF.
//! *   `GET`, `PUT /{template_id}/fields`: native form fields of the uploaded PDF.
//! *   `POST /{template_id}/convert`: a new editable template extracted from a
//!     PDF without form fields.

mod convert;
mod create;
mod delete;
mod editable;
mod fields;
mod get;
mod get_file;
mod list;
mod pdf;
mod put_file;
mod save;
mod write_fields;

use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::storage::documents::DocumentKind;
use crate::storage::templates;
use actix_web::web::{delete, get, patch, post, put, scope};
use actix_web::Scope;
use common::model::template::Template;
use rusqlite::Connection;

/// The base path for all template-related API endpoints.
const API_PATH: &str = "/api/templates";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", get().to(list::process))
        .route("", post().to(create::process))
        .route("/{template_id}", get().to(get::process))
        .route("/{template_id}", patch().to(save::process))
        .route("/{template_id}", delete().to(delete::process))
        .route("/{template_id}/file", get().to(get_file::process))
        .route("/{template_id}/file", put().to(put_file::process))
        .route("/{template_id}/editable", get().to(editable::process))
        .route("/{template_id}/preview", get().to(pdf::process))
        .route("/{template_id}/fields", get().to(fields::process))
        .route("/{template_id}/fields", put().to(write_fields::process))
        .route("/{template_id}/convert", post().to(convert::process))
}

/// Loads an uploaded template together with its stored PDF.
fn uploaded_file(state: &AppState, conn: &Connection, id: &str) -> AppResult<(Template, Vec<u8>)> {
    let template = templates::get(conn, id)?;
    if template.file().is_none() {
        return Err(AppError::not_found(format!(
            "Template {} is editable markup and has no PDF file",
            id
        )));
    }
    let bytes = state
        .store
        .read(DocumentKind::Template, id)?
        .ok_or_else(|| AppError::not_found(format!("File of template {} not found", id)))?;
    Ok((template, bytes))
}

/// Loads an editable template and returns it with its stored markup.
fn editable_markup(conn: &Connection, id: &str) -> AppResult<(Template, String)> {
    let template = templates::get(conn, id)?;
    let markup = template
        .markup()
        .map(str::to_string)
        .ok_or_else(|| {
            AppError::unprocessable(format!("Template {} is an uploaded PDF, not markup", id))
        })?;
    Ok((template, markup))
}
