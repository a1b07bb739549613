//! Admin HTTP Routes
//!
//! List, approve and delete records. Every request carries the admin
//! credentials and is authenticated from scratch.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::auth_routes::authorize;
use super::errors::ApiResult;
use super::state::AppState;
use crate::enrollment::EnrollmentOutcome;
use crate::observability::Event;
use crate::records::{scope_blob_name, ListedRecord, Record, RecordKind};

/// Admin routes with shared state
pub fn admin_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/records/list", post(list_handler))
        .route("/records/approve", post(approve_handler))
        .route("/records/delete", post(delete_handler))
        .with_state(state)
}

// ==================
// Request/Response Types
// ==================

/// Credentials sent with every admin request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminCredentials {
    #[serde(default, alias = "adminEmail")]
    pub admin_identity: String,
    #[serde(default)]
    pub admin_password: String,
}

#[derive(Debug, Deserialize)]
pub struct ListRequest {
    #[serde(flatten)]
    pub admin: AdminCredentials,
    #[serde(default)]
    pub kind: RecordKind,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub kind: RecordKind,
    pub count: usize,
    pub records: Vec<ListedRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationRequest {
    #[serde(flatten)]
    pub admin: AdminCredentials,
    #[serde(default)]
    pub kind: RecordKind,
    #[serde(default)]
    pub blob_name: String,
    /// Version token from the list response
    #[serde(default)]
    pub version: Option<String>,
    /// Identity the admin believes the record belongs to
    #[serde(default, alias = "email")]
    pub identity: Option<String>,
}

/// What happened to the beta enrollment side effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    Enrolled,
    AlreadyEnrolled,
    Failed,
    Disabled,
}

impl From<EnrollmentOutcome> for EnrollmentStatus {
    fn from(outcome: EnrollmentOutcome) -> Self {
        match outcome {
            EnrollmentOutcome::Enrolled => EnrollmentStatus::Enrolled,
            EnrollmentOutcome::AlreadyEnrolled => EnrollmentStatus::AlreadyEnrolled,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveResponse {
    pub success: bool,
    pub blob_name: String,
    pub version: String,
    pub already_approved: bool,
    pub record: Record,
    /// Only present for waitlist records
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrollment: Option<EnrollmentStatus>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    pub success: bool,
    pub blob_name: String,
}

// ==================
// Handlers
// ==================

/// List handler
async fn list_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ListRequest>, JsonRejection>,
) -> ApiResult<Json<ListResponse>> {
    let Json(request) = body?;
    authorize(&state, &request.admin.admin_identity, &request.admin.admin_password)?;

    let namespace = state.namespaces.for_kind(request.kind);
    let records = state.records.list_decrypted(namespace).await?;

    Ok(Json(ListResponse {
        kind: request.kind,
        count: records.len(),
        records,
    }))
}

/// Approve handler
///
/// Enrollment runs only after the approval is stored and never undoes it.
/// Re-approving an approved waitlist record retries enrollment.
async fn approve_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Json<MutationRequest>, JsonRejection>,
) -> ApiResult<Json<ApproveResponse>> {
    let Json(request) = body?;
    authorize(&state, &request.admin.admin_identity, &request.admin.admin_password)?;

    let namespace = state.namespaces.for_kind(request.kind);
    let approved = state
        .records
        .approve(
            namespace,
            &request.blob_name,
            request.version.as_deref().filter(|v| !v.is_empty()),
            request.admin.admin_identity.trim(),
        )
        .await?;

    if let Some(expected) = request.identity.as_deref() {
        if !expected.trim().eq_ignore_ascii_case(&approved.record.identity) {
            tracing::warn!(
                blob = %approved.blob.name,
                "approve request identity does not match the stored record"
            );
        }
    }

    let enrollment = match request.kind {
        RecordKind::Waitlist => Some(enroll(&state, &approved.record.identity).await),
        RecordKind::Survey => None,
    };

    Ok(Json(ApproveResponse {
        success: true,
        blob_name: approved.blob.name,
        version: approved.blob.version,
        already_approved: !approved.newly_approved,
        record: approved.record,
        enrollment,
    }))
}

async fn enroll(state: &AppState, identity: &str) -> EnrollmentStatus {
    let Some(enrollment) = state.enrollment.as_ref() else {
        return EnrollmentStatus::Disabled;
    };

    match enrollment.enroll(identity).await {
        Ok(outcome) => {
            tracing::info!(
                event = Event::EnrollmentCompleted.as_str(),
                outcome = ?outcome,
                "beta enrollment done"
            );
            outcome.into()
        }
        Err(e) => {
            tracing::error!(
                event = Event::EnrollmentFailed.as_str(),
                error = %e,
                response_body = e.response_body().unwrap_or(""),
                "beta enrollment failed; approval stands"
            );
            EnrollmentStatus::Failed
        }
    }
}

/// Delete handler
async fn delete_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Json<MutationRequest>, JsonRejection>,
) -> ApiResult<Json<DeleteResponse>> {
    let Json(request) = body?;
    authorize(&state, &request.admin.admin_identity, &request.admin.admin_password)?;

    let namespace = state.namespaces.for_kind(request.kind);
    let blob_name = scope_blob_name(namespace, &request.blob_name)?;
    let version = request.version.as_deref().unwrap_or_default();
    state.records.remove(namespace, &blob_name, version).await?;

    if let Some(identity) = request.identity.as_deref() {
        tracing::info!(identity, blob = %blob_name, "deleted record for identity");
    }

    Ok(Json(DeleteResponse {
        success: true,
        blob_name,
    }))
}
