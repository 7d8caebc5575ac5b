use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySql, Pool};

use super::interface::{AuthFlowError, Result, UserStore};
use super::model::{AuthRecord, User};

/// MySQL-backed user store. Row defaults (role, flags, timestamps) live in
/// the schema, so inserts only name the columns the caller decides.
pub struct UserCrud {
    pool: Pool<MySql>,
}

impl UserCrud {
    pub fn new(pool: Pool<MySql>) -> Self {
        Self { pool }
    }

    async fn find_by_address(&self, address: &str) -> Result<Option<User>> {
        Ok(
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE address = ?")
                .bind(address)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    /// Insert, treating a duplicate-key failure as success: the unique index
    /// on address keeps exactly one row under concurrent first logins.
    async fn insert_user(&self, address: &str) -> Result<()> {
        let result = sqlx::query("INSERT INTO users (address) VALUES (?)")
            .bind(address)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn auth_record_or_create(&self, user_id: i64) -> Result<AuthRecord> {
        if let Some(record) = self.auth_record(user_id).await? {
            return Ok(record);
        }

        let insert = sqlx::query("INSERT INTO auth_records (user_id) VALUES (?)")
            .bind(user_id)
            .execute(&self.pool)
            .await;
        match insert {
            Ok(_) => {}
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {}
            Err(e) => return Err(e.into()),
        }

        self.auth_record(user_id).await?.ok_or_else(|| {
            AuthFlowError::Internal(format!("auth record missing for user {}", user_id))
        })
    }
}

#[async_trait]
impl UserStore for UserCrud {
    async fn find_or_create(&self, address: &str) -> Result<(User, AuthRecord)> {
        let user = match self.find_by_address(address).await? {
            Some(user) => user,
            None => {
                self.insert_user(address).await?;
                self.find_by_address(address).await?.ok_or_else(|| {
                    AuthFlowError::Internal(format!("user row missing for {}", address))
                })?
            }
        };

        let record = self.auth_record_or_create(user.id).await?;
        Ok((user, record))
    }

    async fn find_by_id(&self, user_id: i64) -> Result<Option<User>> {
        Ok(sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn auth_record(&self, user_id: i64) -> Result<Option<AuthRecord>> {
        Ok(
            sqlx::query_as::<_, AuthRecord>("SELECT * FROM auth_records WHERE user_id = ?")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn set_mfa_timeout(&self, user_id: i64, deadline: Option<DateTime<Utc>>) -> Result<()> {
        sqlx::query("UPDATE auth_records SET mfa_timeout_at = ? WHERE user_id = ?")
            .bind(deadline)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn set_awaiting_enrollment(&self, user_id: i64, awaiting: bool) -> Result<()> {
        sqlx::query("UPDATE auth_records SET awaiting_mfa_enrollment = ? WHERE user_id = ?")
            .bind(awaiting)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn complete_enrollment(&self, user_id: i64) -> Result<()> {
        sqlx::query(
            "UPDATE auth_records SET mfa_enabled = TRUE, awaiting_mfa_enrollment = FALSE WHERE user_id = ?",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
