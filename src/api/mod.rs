//! HTTP API
//!
//! Room lifecycle, public verification and account lookups over JSON.

pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;

pub use handlers::AppState;
pub use server::{build_app, ApiServer};
