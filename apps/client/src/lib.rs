//! Client for the Recruit AI backend: authenticated REST access, the
//! signed-in user's entitlement, and one state machine per product page.

pub mod api;
pub mod auth;
pub mod config;
pub mod entitlement;
pub mod errors;
pub mod models;
pub mod store;
pub mod workflows;
