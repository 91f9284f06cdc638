use crate::error::AppResult;
use crate::services::run_blocking;
use crate::state::AppState;
use crate::storage::contracts;
use actix_web::{web, HttpResponse};

/// Handler for `GET /api/contracts/{contract_id}`.
pub async fn process(
    state: web::Data<AppState>,
    contract_id: web::Path<String>,
) -> AppResult<HttpResponse> {
    let state = state.into_inner();
    let id = contract_id.into_inner();
    let contract = run_blocking(move || contracts::get(&state.db.connect()?, &id)).await?;
    Ok(HttpResponse::Ok().json(contract))
}
