//! Data model shared by the signing backend and its clients: templates,
//! contracts, the placeholder vocabulary, the structured document tree with its
//! merge engine, and the HTTP request payloads.

pub mod model;
pub mod requests;
