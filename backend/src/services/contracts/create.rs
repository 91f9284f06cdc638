//! # Contract Creation Service
//!
//! `POST /api/contracts` records a draft contract for a booking. The id is
//! generated unless the caller supplies one, which must then be usable as a
//! document name (letters, digits, `-` and `_`). A referenced template must
//! exist.

use crate::error::{AppError, AppResult};
use crate::services::run_blocking;
use crate::state::AppState;
use crate::storage::documents::valid_id;
use crate::storage::{contracts, templates};
use actix_web::{web, HttpResponse};
use chrono::Utc;
use common::model::contract::{Contract, ContractStatus};
use common::requests::{CreateContractRequest, CreatedResponse};
use log::info;
use uuid::Uuid;

pub async fn process(
    state: web::Data<AppState>,
    payload: web::Json<CreateContractRequest>,
) -> AppResult<HttpResponse> {
    let state = state.into_inner();
    let request = payload.into_inner();
    let id = run_blocking(move || create_contract(&state, request)).await?;
    Ok(HttpResponse::Ok().json(CreatedResponse { id }))
}

fn required(value: &str, name: &str) -> AppResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::unprocessable(format!("{} is required", name)));
    }
    Ok(value.to_string())
}

fn contract_id(requested: Option<&str>) -> AppResult<String> {
    match requested.map(str::trim) {
        Some(id) if !id.is_empty() => {
            if !valid_id(id) {
                return Err(AppError::unprocessable(format!(
                    "Contract id {:?} may only contain letters, digits, '-' and '_'",
                    id
                )));
            }
            Ok(id.to_string())
        }
        _ => Ok(Uuid::new_v4().to_string()),
    }
}

pub fn create_contract(state: &AppState, request: CreateContractRequest) -> AppResult<String> {
    let contract = Contract {
        id: contract_id(request.id.as_deref())?,
        project_id: required(&request.project_id, "projectId")?,
        client_name: required(&request.client_name, "clientName")?,
        title: required(&request.title, "title")?,
        value: request.value,
        wedding_date: required(&request.wedding_date, "weddingDate")?,
        venue: request.venue,
        package_type: request.package_type,
        template_id: request.template_id,
        status: ContractStatus::Draft,
        sign_token: None,
        client_signed_at: None,
        signed_at: None,
        created_at: Utc::now(),
    };
    if contract.value < 0 {
        return Err(AppError::unprocessable("value cannot be negative"));
    }

    let conn = state.db.connect()?;
    if let Some(template_id) = &contract.template_id {
        templates::get(&conn, template_id)?;
    }
    contracts::insert(&conn, &contract)?;
    info!(
        "Created contract {} for project {}",
        contract.id, contract.project_id
    );
    Ok(contract.id)
}
