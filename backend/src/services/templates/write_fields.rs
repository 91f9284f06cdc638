//! `PUT /api/templates/{template_id}/fields` fills the uploaded PDF's form
//! fields, appends any free-text lines to its first page and stores the result
//! in place of the previous file. Unknown and read-only fields are skipped.

use super::uploaded_file;
use crate::documents::forms;
use crate::error::AppResult;
use crate::services::{ok_response, run_blocking};
use crate::state::AppState;
use crate::storage::documents::DocumentKind;
use actix_web::{web, HttpResponse};
use common::requests::WriteFieldsRequest;
use log::info;

pub async fn process(
    state: web::Data<AppState>,
    template_id: web::Path<String>,
    payload: web::Json<WriteFieldsRequest>,
) -> AppResult<HttpResponse> {
    let state = state.into_inner();
    let id = template_id.into_inner();
    let request = payload.into_inner();
    run_blocking(move || {
        let (_, bytes) = uploaded_file(&state, &state.db.connect()?, &id)?;
        let updated = forms::write_fields(&bytes, &request.fields, &request.free_text)?;
        state.store.write(DocumentKind::Template, &id, &updated)?;
        info!(
            "Wrote {} fields and {} text lines to template {}",
            request.fields.len(),
            request.free_text.len(),
            id
        );
        Ok(())
    })
    .await?;
    Ok(ok_response())
}
