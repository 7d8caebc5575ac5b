use async_trait::async_trait;

use super::model::{MessageRecord, NewMessage};

pub type Result<T> = std::result::Result<T, MessageError>;

/// Log of verification attempts, newest first everywhere it is read.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Insert and return the stored row.
    async fn record(&self, message: &NewMessage) -> Result<MessageRecord>;

    async fn recent_for_user(&self, user_id: i64, limit: u32) -> Result<Vec<MessageRecord>>;

    /// 1-based page.
    async fn page_for_user(
        &self,
        user_id: i64,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<MessageRecord>>;

    async fn count_for_user(&self, user_id: i64) -> Result<i64>;
}

#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}
