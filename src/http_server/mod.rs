//! # HTTP Server Module
//!
//! axum API over the record store.
//!
//! # Endpoints
//!
//! - `GET /health` - Health check
//! - `POST /api/submissions/{survey,waitlist}` - Store a new record
//! - `POST /api/auth/authenticate` - Check admin credentials
//! - `POST /api/admin/records/{list,approve,delete}` - Admin record operations

pub mod admin_routes;
pub mod auth_routes;
pub mod config;
pub mod errors;
pub mod observability_routes;
pub mod server;
pub mod state;
pub mod submission_routes;

pub use config::HttpServerConfig;
pub use errors::{ApiError, ApiResult};
pub use server::HttpServer;
pub use state::AppState;
