//! Contract drafting and e-signature service.
//!
//! Templates (editable markup or uploaded PDFs) are merged with booking data,
//! rendered to PDF and signed in order by the client and then the vendor.

pub mod config;
pub mod documents;
pub mod error;
pub mod services;
pub mod signing;
pub mod state;
pub mod storage;
