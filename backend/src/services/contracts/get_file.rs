use crate::error::AppResult;
use crate::services::{pdf_response, run_blocking};
use crate::signing;
use crate::state::AppState;
use crate::storage::contracts;
use crate::storage::documents::DocumentStore;
use actix_web::{web, HttpResponse};

/// Handler for `GET /api/contracts/{contract_id}/file`: the current document,
/// i.e. the contract's own file or, before one exists, its uploaded template.
pub async fn process(
    state: web::Data<AppState>,
    contract_id: web::Path<String>,
) -> AppResult<HttpResponse> {
    let state = state.into_inner();
    let id = contract_id.into_inner();
    let file_name = DocumentStore::file_name(&id);
    let bytes = run_blocking(move || {
        let conn = state.db.connect()?;
        let contract = contracts::get(&conn, &id)?;
        signing::current_document(&state, &conn, &contract)
    })
    .await?;
    Ok(pdf_response(bytes, &file_name))
}
