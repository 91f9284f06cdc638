//! # Contract Generation Service
//!
//! `POST /api/contracts/{contract_id}/generate` produces the contract's
//! document from its template: editable markup is merged with the contract and
//! client fields and rendered to PDF, an uploaded PDF is copied as is. The
//! result becomes the contract's current document. Regenerating is allowed
//! until the client signs.

use crate::documents::render;
use crate::error::{AppError, AppResult};
use crate::services::{ok_response, run_blocking};
use crate::signing;
use crate::state::AppState;
use crate::storage::contracts;
use crate::storage::documents::DocumentKind;
use crate::storage::ledger::ClientContact;
use crate::storage::templates;
use actix_web::{web, HttpResponse};
use common::model::contract::Contract;
use common::model::merge::{merge, MergeData};
use common::model::template::TemplateKind;
use log::{info, warn};

pub async fn process(
    state: web::Data<AppState>,
    contract_id: web::Path<String>,
) -> AppResult<HttpResponse> {
    let state = state.into_inner();
    let id = contract_id.into_inner();
    run_blocking(move || generate_document(&state, &id)).await?;
    Ok(ok_response())
}

/// Merge values of a contract and its client's contact details.
pub fn merge_data(contract: &Contract, contact: ClientContact) -> MergeData {
    MergeData {
        client_name: contract.client_name.clone(),
        client_email: contact.email,
        client_phone: contact.phone,
        wedding_date: contract.wedding_date.clone(),
        venue: contract.venue.clone(),
        package_type: contract.package_type.clone(),
        value: contract.value,
        title: contract.title.clone(),
    }
}

pub fn generate_document(state: &AppState, id: &str) -> AppResult<()> {
    let conn = state.db.connect()?;
    let contract = contracts::get(&conn, id)?;
    if contract.client_signed_at.is_some() {
        return Err(AppError::Conflict(format!(
            "Contract {} has been signed; its document can no longer be regenerated",
            id
        )));
    }
    let template_id = contract
        .template_id
        .as_deref()
        .ok_or_else(|| AppError::unprocessable(format!("Contract {} has no template", id)))?;
    let template = templates::get(&conn, template_id)?;

    let bytes = match &template.kind {
        TemplateKind::EditableMarkup { markup } => {
            let contact = state
                .ledger
                .client_contact(&contract.project_id)
                .unwrap_or_else(|e| {
                    warn!(
                        "No client contact for project {}: {}",
                        contract.project_id, e
                    );
                    ClientContact::default()
                });
            let merged = merge(markup, &merge_data(&contract, contact));
            render::render(&merged, &state.fonts)?
        }
        TemplateKind::UploadedFile { .. } => state
            .store
            .read(DocumentKind::Template, &template.id)?
            .ok_or_else(|| {
                AppError::not_found(format!("File of template {} not found", template.id))
            })?,
    };

    // Rendering runs outside the lock; the signed check is repeated under it.
    signing::replace_unsigned_document(state, id, &bytes)?;
    info!(
        "Generated the document of contract {} from template {}",
        id, template.id
    );
    Ok(())
}
