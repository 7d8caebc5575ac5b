pub mod memory_store;
pub mod redis_store;

pub use memory_store::MemorySessionStore;
pub use redis_store::RedisSessionStore;

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{header, HeaderMap, HeaderValue};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const SESSION_COOKIE_NAME: &str = "wallet_auth_session";

/// What the server knows about one browser session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    /// Not logged in, or logged out.
    Anonymous,
    /// Signature checked out but a TOTP code is still owed.
    PendingMfa {
        pending_user_id: i64,
        mfa_bonus_phrase: String,
    },
    /// Fully logged in.
    Authenticated { user_id: i64, address: String },
}

#[derive(Debug, thiserror::Error)]
pub enum SessionStoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("Session serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Backend holding session state keyed by session id, with per-entry TTL.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, session_id: &str) -> Result<Option<SessionState>, SessionStoreError>;

    async fn save(
        &self,
        session_id: &str,
        state: &SessionState,
        ttl_secs: u64,
    ) -> Result<(), SessionStoreError>;

    async fn destroy(&self, session_id: &str) -> Result<(), SessionStoreError>;
}

/// Signed-cookie sessions in front of a pluggable store.
///
/// The cookie carries "{id}.{mac}" where the MAC covers the id with the
/// server secret. A missing, malformed or badly signed cookie reads as no
/// session at all; the store only ever sees ids whose MAC verified.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    secret: String,
    ttl_secs: u64,
    cookie_secure: bool,
}

impl SessionManager {
    pub fn new(
        store: Arc<dyn SessionStore>,
        secret: impl Into<String>,
        ttl_secs: u64,
        cookie_secure: bool,
    ) -> Self {
        Self {
            store,
            secret: secret.into(),
            ttl_secs,
            cookie_secure,
        }
    }

    /// Fresh 256-bit session id, URL-safe so it drops into a cookie as is.
    pub fn mint_session_id() -> String {
        let mut rng = rand::rng();
        let bytes: Vec<u8> = (0..32).map(|_| rng.random()).collect();
        URL_SAFE_NO_PAD.encode(bytes)
    }

    /// Session id from the request cookies, if present and correctly signed.
    pub fn session_id(&self, headers: &HeaderMap) -> Option<String> {
        let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
        for pair in cookies.split(';') {
            if let Some((name, value)) = pair.trim().split_once('=') {
                if name == SESSION_COOKIE_NAME {
                    return self.verify_cookie_value(value);
                }
            }
        }
        None
    }

    pub async fn load(&self, session_id: &str) -> Result<Option<SessionState>, SessionStoreError> {
        self.store.load(session_id).await
    }

    pub async fn save(
        &self,
        session_id: &str,
        state: &SessionState,
    ) -> Result<(), SessionStoreError> {
        self.store.save(session_id, state, self.ttl_secs).await
    }

    pub async fn destroy(&self, session_id: &str) -> Result<(), SessionStoreError> {
        self.store.destroy(session_id).await
    }

    /// User id and address for a fully authenticated session, if any.
    pub async fn authenticated(
        &self,
        headers: &HeaderMap,
    ) -> Result<Option<(i64, String)>, SessionStoreError> {
        let Some(session_id) = self.session_id(headers) else {
            return Ok(None);
        };

        match self.load(&session_id).await? {
            Some(SessionState::Authenticated { user_id, address }) => Ok(Some((user_id, address))),
            _ => Ok(None),
        }
    }

    pub fn issue_cookie(&self, session_id: &str) -> HeaderValue {
        let value = format!("{}.{}", session_id, self.sign(session_id));
        let mut cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            SESSION_COOKIE_NAME, value, self.ttl_secs
        );
        if self.cookie_secure {
            cookie.push_str("; Secure");
        }
        HeaderValue::from_str(&cookie).expect("cookie is ASCII")
    }

    pub fn clear_cookie(&self) -> HeaderValue {
        let mut cookie = format!(
            "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
            SESSION_COOKIE_NAME
        );
        if self.cookie_secure {
            cookie.push_str("; Secure");
        }
        HeaderValue::from_str(&cookie).expect("cookie is ASCII")
    }

    fn sign(&self, session_id: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(session_id.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    fn verify_cookie_value(&self, value: &str) -> Option<String> {
        let (session_id, mac) = value.rsplit_once('.')?;
        let expected = self.sign(session_id);
        constant_time_eq(mac.as_bytes(), expected.as_bytes()).then(|| session_id.to_string())
    }
}

/// Constant-time string comparison
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }

    result == 0
}
