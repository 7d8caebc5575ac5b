use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// One recorded signature verification attempt. Append-only.
#[derive(Debug, Clone, FromRow)]
pub struct MessageRecord {
    pub id: i64,
    pub user_id: i64,
    pub message: String,
    pub signature: String,
    /// Address the signature actually recovered to.
    pub signer: String,
    /// Whether the signer matched the session's address at the time.
    pub valid: bool,
    pub created_at: DateTime<Utc>,
}

/// Insert payload; id and created_at come from the database.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub user_id: i64,
    pub message: String,
    pub signature: String,
    pub signer: String,
    pub valid: bool,
}
