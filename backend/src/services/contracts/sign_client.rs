use crate::error::AppResult;
use crate::services::run_blocking;
use crate::signing;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use common::requests::{ClientSignedResponse, SignClientRequest};

/// Handler for `POST /api/contracts/{contract_id}/sign-client`.
///
/// # Returns
/// - `200 OK` with `clientSignedAt`.
/// - `403 Forbidden` when the token does not authorize signing.
/// - `409 Conflict` when the client has already signed.
/// - `422 Unprocessable Entity` for an empty or unreadable signature.
pub async fn process(
    state: web::Data<AppState>,
    contract_id: web::Path<String>,
    payload: web::Json<SignClientRequest>,
) -> AppResult<HttpResponse> {
    let state = state.into_inner();
    let id = contract_id.into_inner();
    let request = payload.into_inner();
    let client_signed_at = run_blocking(move || {
        signing::sign_client(&state, &id, &request.token, &request.signature)
    })
    .await?;
    Ok(HttpResponse::Ok().json(ClientSignedResponse { client_signed_at }))
}
