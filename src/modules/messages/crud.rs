use async_trait::async_trait;
use sqlx::{MySql, Pool};

use super::interface::{MessageError, MessageStore, Result};
use super::model::{MessageRecord, NewMessage};

pub struct MessageCrud {
    pool: Pool<MySql>,
}

impl MessageCrud {
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageStore for MessageCrud {
    async fn record(&self, message: &NewMessage) -> Result<MessageRecord> {
        let done = sqlx::query(
            "INSERT INTO messages (user_id, message, signature, signer, valid) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(message.user_id)
        .bind(&message.message)
        .bind(&message.signature)
        .bind(&message.signer)
        .bind(message.valid)
        .execute(&self.pool)
        .await?;

        let id = done.last_insert_id() as i64;
        sqlx::query_as::<_, MessageRecord>("SELECT * FROM messages WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| MessageError::Internal(format!("inserted message {} missing", id)))
    }

    async fn recent_for_user(&self, user_id: i64, limit: u32) -> Result<Vec<MessageRecord>> {
        Ok(sqlx::query_as::<_, MessageRecord>(
            "SELECT * FROM messages WHERE user_id = ? ORDER BY id DESC LIMIT ?",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn page_for_user(
        &self,
        user_id: i64,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<MessageRecord>> {
        let offset = (page.saturating_sub(1) as i64) * per_page as i64;

        Ok(sqlx::query_as::<_, MessageRecord>(
            "SELECT * FROM messages WHERE user_id = ? ORDER BY id DESC LIMIT ? OFFSET ?",
        )
        .bind(user_id)
        .bind(per_page)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn count_for_user(&self, user_id: i64) -> Result<i64> {
        let result: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM messages WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(result.0)
    }
}
