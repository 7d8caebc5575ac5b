use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use super::{SessionState, SessionStore, SessionStoreError};

/// Redis-backed session store. State is stored as JSON under
/// "session:{id}" with the TTL applied per key, so expiry needs no sweeper.
pub struct RedisSessionStore {
    connection: MultiplexedConnection,
}

impl RedisSessionStore {
    pub async fn connect(url: &str) -> Result<Self, SessionStoreError> {
        let client = redis::Client::open(url)?;
        let connection = client.get_multiplexed_async_connection().await?;
        Ok(Self { connection })
    }

    fn key(session_id: &str) -> String {
        format!("session:{}", session_id)
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn load(&self, session_id: &str) -> Result<Option<SessionState>, SessionStoreError> {
        let mut connection = self.connection.clone();
        let raw: Option<String> = connection.get(Self::key(session_id)).await?;

        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn save(
        &self,
        session_id: &str,
        state: &SessionState,
        ttl_secs: u64,
    ) -> Result<(), SessionStoreError> {
        let json = serde_json::to_string(state)?;
        let mut connection = self.connection.clone();
        let _: () = connection.set_ex(Self::key(session_id), json, ttl_secs).await?;
        Ok(())
    }

    async fn destroy(&self, session_id: &str) -> Result<(), SessionStoreError> {
        let mut connection = self.connection.clone();
        let _: () = connection.del(Self::key(session_id)).await?;
        Ok(())
    }
}
