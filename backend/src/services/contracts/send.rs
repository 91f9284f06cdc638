use crate::error::AppResult;
use crate::services::run_blocking;
use crate::signing;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use common::requests::SentResponse;

/// Handler for `POST /api/contracts/{contract_id}/send`. Returns the token the
/// signing link is built from; sending again before the client signs replaces it.
pub async fn process(
    state: web::Data<AppState>,
    contract_id: web::Path<String>,
) -> AppResult<HttpResponse> {
    let state = state.into_inner();
    let id = contract_id.into_inner();
    let sign_token = run_blocking(move || signing::send(&state, &id)).await?;
    Ok(HttpResponse::Ok().json(SentResponse { sign_token }))
}
