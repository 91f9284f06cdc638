use crate::error::{AppError, AppResult};
use crate::services::{ok_response, run_blocking};
use crate::state::AppState;
use crate::storage::contracts;
use crate::storage::documents::DocumentKind;
use actix_web::{web, HttpResponse};
use log::info;

/// Handler for `DELETE /api/contracts/{contract_id}`: the record and its document.
pub async fn process(
    state: web::Data<AppState>,
    contract_id: web::Path<String>,
) -> AppResult<HttpResponse> {
    let state = state.into_inner();
    let id = contract_id.into_inner();
    run_blocking(move || {
        if !contracts::delete(&state.db.connect()?, &id)? {
            return Err(AppError::not_found(format!("Contract {} not found", id)));
        }
        state.store.delete(DocumentKind::Contract, &id)?;
        info!("Deleted contract {}", id);
        Ok(())
    })
    .await?;
    Ok(ok_response())
}
