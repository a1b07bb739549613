//! # Beta Enrollment
//!
//! Side effect run after an approval commits: register the approved
//! identity as a beta tester with an external service.
//!
//! The contract is at-least-once. A "tester already exists" answer counts
//! as success, and nothing reconciles the remote state with local approval
//! beyond that.

pub mod app_store_connect;
pub mod errors;

use async_trait::async_trait;
use serde::Serialize;

pub use app_store_connect::{AppStoreConnectConfig, AppStoreConnectEnrollment};
pub use errors::{EnrollmentError, EnrollmentResult};

/// Successful enrollment outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentOutcome {
    Enrolled,
    AlreadyEnrolled,
}

/// Beta enrollment capability
#[async_trait]
pub trait BetaEnrollment: Send + Sync + std::fmt::Debug {
    async fn enroll(&self, email: &str) -> EnrollmentResult<EnrollmentOutcome>;
}
