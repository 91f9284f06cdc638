use crate::error::AppResult;
use crate::services::run_blocking;
use crate::signing;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use common::requests::SignInfoQuery;

/// Handler for `GET /api/contracts/{contract_id}/sign-info?token=`.
///
/// # Returns
/// - `200 OK` with the contract, whose signature is awaited and a message.
///   A link used after both parties signed reports `complete`.
/// - `403 Forbidden` for a missing, stale or forged token.
pub async fn process(
    state: web::Data<AppState>,
    contract_id: web::Path<String>,
    query: web::Query<SignInfoQuery>,
) -> AppResult<HttpResponse> {
    let state = state.into_inner();
    let id = contract_id.into_inner();
    let token = query.into_inner().token;
    let info = run_blocking(move || signing::sign_info(&state, &id, token.as_deref())).await?;
    Ok(HttpResponse::Ok().json(info))
}
