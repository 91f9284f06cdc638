use crate::error::AppResult;
use crate::services::run_blocking;
use crate::state::AppState;
use crate::storage::contracts;
use actix_web::{web, HttpResponse};

pub async fn process(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let state = state.into_inner();
    let list = run_blocking(move || contracts::list(&state.db.connect()?)).await?;
    Ok(HttpResponse::Ok().json(list))
}
