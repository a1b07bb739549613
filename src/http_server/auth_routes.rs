//! Auth HTTP Routes
//!
//! Credential check used by the admin UI before it calls admin routes.
//! Nothing is issued: every admin request re-authenticates.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::errors::{ApiError, ApiResult};
use super::state::AppState;
use crate::auth::AuthError;
use crate::observability::Event;

/// Auth routes with shared state
pub fn auth_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/authenticate", post(authenticate_handler))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct AuthenticateRequest {
    #[serde(default, alias = "email")]
    pub identity: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthenticateResponse {
    pub success: bool,
    pub identity: String,
    pub timestamp: String,
}

/// Check admin credentials, logging the outcome
pub(crate) fn authorize(state: &AppState, identity: &str, password: &str) -> ApiResult<()> {
    match state.authenticator.authenticate(identity.trim(), password) {
        Ok(()) => {
            tracing::debug!(
                event = Event::AuthAccepted.as_str(),
                identity = identity.trim(),
                "admin authenticated"
            );
            Ok(())
        }
        Err(err @ (AuthError::NotConfigured | AuthError::MalformedConfig(_))) => {
            tracing::error!(
                event = Event::AuthUnavailable.as_str(),
                error = ?err,
                "admin credentials not configured"
            );
            Err(err.into())
        }
        Err(err) => {
            tracing::warn!(event = Event::AuthRejected.as_str(), "admin authentication failed");
            Err(err.into())
        }
    }
}

/// Authenticate handler
async fn authenticate_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Json<AuthenticateRequest>, JsonRejection>,
) -> ApiResult<Json<AuthenticateResponse>> {
    let Json(request) = body.map_err(ApiError::from)?;
    authorize(&state, &request.identity, &request.password)?;

    Ok(Json(AuthenticateResponse {
        success: true,
        identity: request.identity.trim().to_string(),
        timestamp: Utc::now().to_rfc3339(),
    }))
}
