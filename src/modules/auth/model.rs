use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    /// Canonical form: 0x-prefixed lower-case hex, unique.
    pub address: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// MFA bookkeeping, one row per user.
///
/// Enrollment is monotonic: once mfa_enabled is set there is no operation
/// that clears it. mfa_timeout_at is non-null only while a login sits in the
/// pending-MFA state.
#[derive(Debug, Clone, FromRow)]
pub struct AuthRecord {
    pub user_id: i64,
    pub mfa_enabled: bool,
    pub awaiting_mfa_enrollment: bool,
    pub mfa_timeout_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
