//! Submission HTTP Routes
//!
//! Public endpoints that store a new encrypted record.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use serde::Serialize;
use serde_json::{Map, Value};

use super::errors::{ApiError, ApiResult};
use super::state::AppState;
use crate::geo;
use crate::records::{Payload, RecordKind};

/// Fields every waitlist signup must fill in
const WAITLIST_REQUIRED: [&str; 4] = [
    "email",
    "financialGoals",
    "rightsProtection",
    "idealOutcome",
];

/// Submission routes
pub fn submission_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/survey", post(survey_handler))
        .route("/waitlist", post(waitlist_handler))
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct SurveyResponse {
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct WaitlistResponse {
    pub id: String,
    pub email: String,
}

/// Client address from proxy headers, or `unknown`
pub fn client_ip(headers: &HeaderMap) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    header("x-nf-client-connection-ip")
        .or_else(|| header("client-ip"))
        .or_else(|| {
            header("x-forwarded-for")
                .and_then(|v| v.split(',').next())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        })
        .unwrap_or("unknown")
        .to_string()
}

fn body_object(body: Result<Json<Value>, JsonRejection>) -> ApiResult<Map<String, Value>> {
    match body? {
        Json(Value::Object(object)) => Ok(object),
        _ => Err(ApiError::validation("Request body must be a valid JSON object")),
    }
}

fn required_str<'a>(object: &'a Map<String, Value>, field: &str) -> ApiResult<&'a str> {
    object
        .get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::validation(format!("{} is required", field)))
}

fn looks_like_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

/// Flatten the answers and stamp network metadata
async fn build_payload(
    state: &AppState,
    headers: &HeaderMap,
    object: &Map<String, Value>,
) -> Payload {
    let mut payload = Payload::from_json(object);
    let ip = client_ip(headers);
    let location = geo::describe(state.geo.as_ref(), &ip).await;
    payload.insert("ipAddress", ip);
    payload.insert("location", location);
    payload
}

/// Survey submission handler
async fn survey_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SurveyResponse>)> {
    let object = body_object(body)?;
    let identity = required_str(&object, "userId")?.to_string();

    let payload = build_payload(&state, &headers, &object).await;
    let namespace = state.namespaces.for_kind(RecordKind::Survey);
    let created = state.records.create(namespace, &identity, payload).await?;

    Ok((StatusCode::CREATED, Json(SurveyResponse { id: created.name })))
}

/// Waitlist signup handler
async fn waitlist_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<WaitlistResponse>)> {
    let object = body_object(body)?;
    for field in WAITLIST_REQUIRED {
        required_str(&object, field)?;
    }

    let email = required_str(&object, "email")?.to_string();
    if !looks_like_email(&email) {
        return Err(ApiError::validation("email is not a valid address"));
    }

    let payload = build_payload(&state, &headers, &object).await;
    let namespace = state.namespaces.for_kind(RecordKind::Waitlist);
    let created = state.records.create(namespace, &email, payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(WaitlistResponse {
            id: created.name,
            email,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_client_ip_precedence() {
        let mut headers = HeaderMap::new();
        assert_eq!(client_ip(&headers), "unknown");

        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.9, 10.0.0.1"));
        assert_eq!(client_ip(&headers), "203.0.113.9");

        headers.insert("client-ip", HeaderValue::from_static("198.51.100.4"));
        assert_eq!(client_ip(&headers), "198.51.100.4");

        headers.insert("x-nf-client-connection-ip", HeaderValue::from_static("192.0.2.1"));
        assert_eq!(client_ip(&headers), "192.0.2.1");
    }

    #[test]
    fn test_email_shape() {
        assert!(looks_like_email("a@x.com"));
        assert!(!looks_like_email("a@x"));
        assert!(!looks_like_email("@x.com"));
        assert!(!looks_like_email("ax.com"));
    }
}
