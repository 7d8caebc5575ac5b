use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::model::{AuthRecord, User};
use crate::services::mfa::MfaError;
use crate::services::session::SessionStoreError;

// =============================================================================
// REPOSITORY TRAITS
// =============================================================================

pub type Result<T> = std::result::Result<T, AuthFlowError>;

/// Durable wallet accounts plus their MFA bookkeeping row.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Look up a user by canonical address, creating the user and a default
    /// auth record on first sight. Concurrent first logins for the same
    /// address must both resolve to the one row that won the insert.
    async fn find_or_create(&self, address: &str) -> Result<(User, AuthRecord)>;

    async fn find_by_id(&self, user_id: i64) -> Result<Option<User>>;

    async fn auth_record(&self, user_id: i64) -> Result<Option<AuthRecord>>;

    /// Set or clear the pending-MFA deadline.
    async fn set_mfa_timeout(&self, user_id: i64, deadline: Option<DateTime<Utc>>) -> Result<()>;

    async fn set_awaiting_enrollment(&self, user_id: i64, awaiting: bool) -> Result<()>;

    /// Flip mfa_enabled on and awaiting_mfa_enrollment off in one update.
    async fn complete_enrollment(&self, user_id: i64) -> Result<()>;
}

// =============================================================================
// ERROR TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AuthFlowError {
    #[error("Invalid login message")]
    InvalidLoginMessage,

    #[error("Invalid enrollment message")]
    InvalidEnrollmentMessage,

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Not authenticated")]
    Unauthenticated,

    #[error("User not found")]
    UserNotFound,

    #[error("MFA enrollment not started")]
    EnrollmentNotStarted,

    #[error("Invalid MFA code")]
    InvalidMfaCode,

    #[error("No pending MFA login")]
    NoPendingMfa,

    #[error("Invalid bonus phrase")]
    InvalidBonusPhrase,

    #[error("MFA window expired")]
    MfaWindowExpired,

    #[error("Session persist error: {0}")]
    SessionPersist(SessionStoreError),

    #[error("Session error: {0}")]
    Session(#[from] SessionStoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("MFA error: {0}")]
    Mfa(#[from] MfaError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthFlowError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            Self::InvalidLoginMessage => StatusCode::BAD_REQUEST,
            Self::InvalidEnrollmentMessage => StatusCode::BAD_REQUEST,
            Self::InvalidSignature => StatusCode::UNAUTHORIZED,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::UserNotFound => StatusCode::NOT_FOUND,
            Self::EnrollmentNotStarted => StatusCode::BAD_REQUEST,
            Self::InvalidMfaCode => StatusCode::UNAUTHORIZED,
            Self::NoPendingMfa => StatusCode::UNAUTHORIZED,
            Self::InvalidBonusPhrase => StatusCode::UNAUTHORIZED,
            Self::MfaWindowExpired => StatusCode::UNAUTHORIZED,
            Self::SessionPersist(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Mfa(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The stable string sent over the wire. 4xx errors surface verbatim;
    /// 5xx detail stays in the logs.
    pub fn public_message(&self) -> String {
        match self {
            Self::SessionPersist(_) => "Session persist error".to_string(),
            Self::Session(_) | Self::Database(_) | Self::Mfa(_) | Self::Internal(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}
