//! `PUT /api/contracts/{contract_id}/file` sets the contract's document
//! explicitly, e.g. one merged and rendered by a client. Once the client has
//! signed, the stamped document is final and replacing it is refused.

use crate::error::AppResult;
use crate::services::{decode_pdf, ok_response, run_blocking};
use crate::signing;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use common::requests::FileUploadRequest;
use log::info;

pub async fn process(
    state: web::Data<AppState>,
    contract_id: web::Path<String>,
    payload: web::Json<FileUploadRequest>,
) -> AppResult<HttpResponse> {
    let state = state.into_inner();
    let id = contract_id.into_inner();
    let request = payload.into_inner();
    run_blocking(move || {
        let bytes = decode_pdf(&request.file_base64)?;
        signing::replace_unsigned_document(&state, &id, &bytes)?;
        info!("Stored a new document for contract {}", id);
        Ok(())
    })
    .await?;
    Ok(ok_response())
}
