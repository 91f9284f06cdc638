//! # Contract Service Module
//!
//! Routes under `/api/contracts`: contract records, their current document and
//! the signing protocol. The public signing page only ever calls `sign-info`
//! and `sign-client`, both authorized by the link token; everything else is a
//! vendor action.

mod create;
mod delete;
mod generate;
mod get;
mod get_file;
mod list;
mod put_file;
mod send;
mod sign_client;
mod sign_info;
mod sign_vendor;

use actix_web::web::{delete, get, post, put, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/contracts";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", get().to(list::process))
        .route("", post().to(create::process))
        .route("/{contract_id}", get().to(get::process))
        .route("/{contract_id}", delete().to(delete::process))
        .route("/{contract_id}/file", get().to(get_file::process))
        .route("/{contract_id}/file", put().to(put_file::process))
        .route("/{contract_id}/generate", post().to(generate::process))
        .route("/{contract_id}/send", post().to(send::process))
        .route("/{contract_id}/sign-info", get().to(sign_info::process))
        .route("/{contract_id}/sign-client", post().to(sign_client::process))
        .route("/{contract_id}/sign-vendor", post().to(sign_vendor::process))
}
