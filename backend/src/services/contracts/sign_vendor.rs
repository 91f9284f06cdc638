use crate::error::AppResult;
use crate::services::run_blocking;
use crate::signing;
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use common::requests::{SignVendorRequest, VendorSignedResponse};

/// Handler for `POST /api/contracts/{contract_id}/sign-vendor`. Requires the
/// client's signature first; completes the contract and raises the deposit
/// invoice.
pub async fn process(
    state: web::Data<AppState>,
    contract_id: web::Path<String>,
    payload: web::Json<SignVendorRequest>,
) -> AppResult<HttpResponse> {
    let state = state.into_inner();
    let id = contract_id.into_inner();
    let request = payload.into_inner();
    let signed_at =
        run_blocking(move || signing::sign_vendor(&state, &id, &request.signature)).await?;
    Ok(HttpResponse::Ok().json(VendorSignedResponse { signed_at }))
}
