//! HTTP API layer for the frest demo service.
//!
//! Provides sample endpoints that exercise body validation, reply
//! normalization and field projection.

pub mod handlers;
mod routes;
mod types;

pub use routes::build_router;
