use serde::{Deserialize, Serialize};

use super::model::User;
use crate::modules::messages::schema::MessageResponse;

// =============================================================================
// LOGIN
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub message: String,
    pub signature: String,
    pub address: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginSuccessResponse {
    pub success: bool,
    pub status: u16,
    pub mfa: bool,
    pub user: UserResponse,
    pub messages: Vec<MessageResponse>,
}

/// Login answer when the account still owes a TOTP code. Carries no user
/// payload, only the phrase binding the pending session to this attempt.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MfaChallengeResponse {
    pub success: bool,
    pub status: u16,
    pub mfa: bool,
    pub mfa_bonus_phrase: String,
}

// =============================================================================
// CURRENT USER
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUserResponse {
    pub success: bool,
    pub status: u16,
    pub user: UserResponse,
    pub mfa_enabled: bool,
    pub messages: Vec<MessageResponse>,
}

// =============================================================================
// LOGOUT
// =============================================================================

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
    pub status: u16,
    pub message: &'static str,
}

// =============================================================================
// MFA ENROLLMENT
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct InitializeMfaRequest {
    pub message: String,
    pub signature: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeMfaResponse {
    pub success: bool,
    pub status: u16,
    pub qr_code: String,
    pub secret: String,
}

#[derive(Debug, Deserialize)]
pub struct CompleteEnrollmentRequest {
    pub mfa_code: String,
}

#[derive(Debug, Serialize)]
pub struct CompleteEnrollmentResponse {
    pub success: bool,
    pub status: u16,
    pub message: &'static str,
}

// =============================================================================
// MFA LOGIN
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CompleteMfaLoginRequest {
    pub mfa_code: String,
    pub mfa_bonus_phrase: String,
}

// =============================================================================
// SHARED SHAPES
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i64,
    pub address: String,
    pub role: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            address: user.address,
            role: user.role,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

// =============================================================================
// ERROR RESPONSE
// =============================================================================

/// Error half of the shared envelope: {success: false, error, status}.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub status: u16,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, status: axum::http::StatusCode) -> Self {
        Self {
            success: false,
            error: error.into(),
            status: status.as_u16(),
        }
    }
}
