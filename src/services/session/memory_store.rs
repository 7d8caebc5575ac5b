use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{SessionState, SessionStore, SessionStoreError};

/// Process-local session store, used when REDIS_URL is not configured and by
/// the test suite. Sessions do not survive a restart and are not shared
/// between instances.
#[derive(Default)]
pub struct MemorySessionStore {
    entries: Mutex<HashMap<String, (SessionState, Instant)>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, session_id: &str) -> Result<Option<SessionState>, SessionStoreError> {
        let mut entries = self.entries.lock().await;
        match entries.get(session_id) {
            Some((state, expires_at)) if *expires_at > Instant::now() => Ok(Some(state.clone())),
            Some(_) => {
                // Expired, drop it on the way out.
                entries.remove(session_id);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn save(
        &self,
        session_id: &str,
        state: &SessionState,
        ttl_secs: u64,
    ) -> Result<(), SessionStoreError> {
        let expires_at = Instant::now() + Duration::from_secs(ttl_secs);
        self.entries
            .lock()
            .await
            .insert(session_id.to_string(), (state.clone(), expires_at));
        Ok(())
    }

    async fn destroy(&self, session_id: &str) -> Result<(), SessionStoreError> {
        self.entries.lock().await.remove(session_id);
        Ok(())
    }
}
