use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::http::StatusCode;
use axum_test::{TestResponse, TestServer, TestServerConfig};
use chrono::{DateTime, Utc};
use serde_json::json;

use wallet_auth::config::AppConfig;
use wallet_auth::modules::auth::interface::{AuthFlowError, UserStore};
use wallet_auth::modules::auth::model::{AuthRecord, User};
use wallet_auth::modules::messages::interface::{MessageError, MessageStore};
use wallet_auth::modules::messages::model::{MessageRecord, NewMessage};
use wallet_auth::services::mfa::MfaService;
use wallet_auth::services::session::{
    MemorySessionStore, SessionState, SessionStore, SessionStoreError,
};

pub mod wallet;

pub use wallet::TestWallet;

// Allow dead_code for utilities shared across test targets
#[allow(dead_code)]
pub struct TestContext {
    pub server: TestServer,
    pub users: Arc<TestUserStore>,
    pub messages: Arc<TestMessageStore>,
    pub mfa: MfaService,
}

#[allow(dead_code)]
impl TestContext {
    pub async fn new() -> Self {
        Self::build(test_config(), Arc::new(MemorySessionStore::new())).await
    }

    pub async fn with_session_store(store: Arc<dyn SessionStore>) -> Self {
        Self::build(test_config(), store).await
    }

    async fn build(config: AppConfig, session_store: Arc<dyn SessionStore>) -> Self {
        let users = Arc::new(TestUserStore::default());
        let messages = Arc::new(TestMessageStore::default());
        let mfa = MfaService::new(
            config.mfa_salt.clone(),
            config.mfa_issuer.clone(),
            config.mfa_totp_skew,
        );

        let user_store: Arc<dyn UserStore> = users.clone();
        let message_store: Arc<dyn MessageStore> = messages.clone();
        let app = wallet_auth::create_app(user_store, message_store, session_store, config).await;

        let server = TestServer::new_with_config(
            app,
            TestServerConfig {
                save_cookies: true,
                ..TestServerConfig::default()
            },
        )
        .expect("Failed to create test server");

        Self {
            server,
            users,
            messages,
            mfa,
        }
    }

    /// POST /auth with a correctly signed login message.
    pub async fn login(&self, wallet: &TestWallet) -> TestResponse {
        self.server
            .post("/auth")
            .json(&json!({
                "message": "login",
                "signature": wallet.sign("login"),
                "address": wallet.address,
            }))
            .await
    }

    /// Run the full enrollment flow. Leaves the wallet logged in with MFA
    /// enabled and returns its user id.
    pub async fn enroll_mfa(&self, wallet: &TestWallet) -> i64 {
        let login = self.login(wallet).await;
        login.assert_status(StatusCode::OK);
        let body: serde_json::Value = login.json();
        let user_id = body["user"]["id"].as_i64().expect("login returns the user");

        self.server
            .post("/auth/mfa/initialize")
            .json(&json!({
                "message": "enableMFA",
                "signature": wallet.sign("enableMFA"),
            }))
            .await
            .assert_status(StatusCode::OK);

        self.server
            .post("/auth/mfa/verify")
            .json(&json!({ "mfa_code": self.mfa_code(wallet) }))
            .await
            .assert_status(StatusCode::OK);

        user_id
    }

    /// The TOTP code the wallet's authenticator app would show right now.
    pub fn mfa_code(&self, wallet: &TestWallet) -> String {
        self.mfa
            .current_code(&wallet.address)
            .expect("clock is past the epoch")
    }
}

/// Test-wide application settings. The burst is high enough that the rate
/// limiter never interferes with ordinary tests.
#[allow(dead_code)]
pub fn test_config() -> AppConfig {
    AppConfig {
        session_secret: "test-session-secret".to_string(),
        session_ttl_secs: 3600,
        session_cookie_secure: false,
        rate_limit_burst: 10_000,
        mfa_salt: "test-mfa-salt".to_string(),
        mfa_issuer: "WalletAuthTest".to_string(),
        mfa_totp_skew: 1,
        mfa_pending_window_secs: 300,
    }
}

/// In-memory UserStore with the same first-sight semantics as the MySQL
/// implementation.
#[derive(Default)]
pub struct TestUserStore {
    inner: Mutex<UserTable>,
}

#[derive(Default)]
struct UserTable {
    next_id: i64,
    users: Vec<User>,
    records: HashMap<i64, AuthRecord>,
}

#[allow(dead_code)]
impl TestUserStore {
    /// Flip MFA on directly, skipping the enrollment endpoints.
    pub fn set_mfa_enabled(&self, user_id: i64) {
        let mut table = self.inner.lock().unwrap();
        if let Some(record) = table.records.get_mut(&user_id) {
            record.mfa_enabled = true;
            record.awaiting_mfa_enrollment = false;
        }
    }

    /// Drop the user row out from under an existing session.
    pub fn remove_user(&self, user_id: i64) {
        let mut table = self.inner.lock().unwrap();
        table.users.retain(|u| u.id != user_id);
        table.records.remove(&user_id);
    }
}

#[async_trait::async_trait]
impl UserStore for TestUserStore {
    async fn find_or_create(
        &self,
        address: &str,
    ) -> Result<(User, AuthRecord), AuthFlowError> {
        let mut table = self.inner.lock().unwrap();
        if let Some(user) = table.users.iter().find(|u| u.address == address).cloned() {
            let record = table
                .records
                .get(&user.id)
                .cloned()
                .expect("every user has an auth record");
            return Ok((user, record));
        }

        table.next_id += 1;
        let now = Utc::now();
        let user = User {
            id: table.next_id,
            address: address.to_string(),
            role: "user".to_string(),
            created_at: now,
            updated_at: now,
        };
        let record = AuthRecord {
            user_id: user.id,
            mfa_enabled: false,
            awaiting_mfa_enrollment: false,
            mfa_timeout_at: None,
            created_at: now,
            updated_at: now,
        };
        table.users.push(user.clone());
        table.records.insert(user.id, record.clone());
        Ok((user, record))
    }

    async fn find_by_id(&self, user_id: i64) -> Result<Option<User>, AuthFlowError> {
        let table = self.inner.lock().unwrap();
        Ok(table.users.iter().find(|u| u.id == user_id).cloned())
    }

    async fn auth_record(&self, user_id: i64) -> Result<Option<AuthRecord>, AuthFlowError> {
        let table = self.inner.lock().unwrap();
        Ok(table.records.get(&user_id).cloned())
    }

    async fn set_mfa_timeout(
        &self,
        user_id: i64,
        deadline: Option<DateTime<Utc>>,
    ) -> Result<(), AuthFlowError> {
        let mut table = self.inner.lock().unwrap();
        if let Some(record) = table.records.get_mut(&user_id) {
            record.mfa_timeout_at = deadline;
        }
        Ok(())
    }

    async fn set_awaiting_enrollment(
        &self,
        user_id: i64,
        awaiting: bool,
    ) -> Result<(), AuthFlowError> {
        let mut table = self.inner.lock().unwrap();
        if let Some(record) = table.records.get_mut(&user_id) {
            record.awaiting_mfa_enrollment = awaiting;
        }
        Ok(())
    }

    async fn complete_enrollment(&self, user_id: i64) -> Result<(), AuthFlowError> {
        let mut table = self.inner.lock().unwrap();
        if let Some(record) = table.records.get_mut(&user_id) {
            record.mfa_enabled = true;
            record.awaiting_mfa_enrollment = false;
        }
        Ok(())
    }
}

/// In-memory MessageStore, newest first like the MySQL implementation.
#[derive(Default)]
pub struct TestMessageStore {
    inner: Mutex<MessageTable>,
}

#[derive(Default)]
struct MessageTable {
    next_id: i64,
    rows: Vec<MessageRecord>,
}

#[async_trait::async_trait]
impl MessageStore for TestMessageStore {
    async fn record(&self, message: &NewMessage) -> Result<MessageRecord, MessageError> {
        let mut table = self.inner.lock().unwrap();
        table.next_id += 1;
        let record = MessageRecord {
            id: table.next_id,
            user_id: message.user_id,
            message: message.message.clone(),
            signature: message.signature.clone(),
            signer: message.signer.clone(),
            valid: message.valid,
            created_at: Utc::now(),
        };
        table.rows.push(record.clone());
        Ok(record)
    }

    async fn recent_for_user(
        &self,
        user_id: i64,
        limit: u32,
    ) -> Result<Vec<MessageRecord>, MessageError> {
        let table = self.inner.lock().unwrap();
        Ok(table
            .rows
            .iter()
            .filter(|r| r.user_id == user_id)
            .rev()
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn page_for_user(
        &self,
        user_id: i64,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<MessageRecord>, MessageError> {
        let table = self.inner.lock().unwrap();
        let skip = page.saturating_sub(1) as usize * per_page as usize;
        Ok(table
            .rows
            .iter()
            .filter(|r| r.user_id == user_id)
            .rev()
            .skip(skip)
            .take(per_page as usize)
            .cloned()
            .collect())
    }

    async fn count_for_user(&self, user_id: i64) -> Result<i64, MessageError> {
        let table = self.inner.lock().unwrap();
        Ok(table.rows.iter().filter(|r| r.user_id == user_id).count() as i64)
    }
}

/// A store whose every call fails, for exercising the persist error paths.
#[allow(dead_code)]
pub struct FailingSessionStore;

#[async_trait::async_trait]
impl SessionStore for FailingSessionStore {
    async fn load(&self, _session_id: &str) -> Result<Option<SessionState>, SessionStoreError> {
        Err(store_down())
    }

    async fn save(
        &self,
        _session_id: &str,
        _state: &SessionState,
        _ttl_secs: u64,
    ) -> Result<(), SessionStoreError> {
        Err(store_down())
    }

    async fn destroy(&self, _session_id: &str) -> Result<(), SessionStoreError> {
        Err(store_down())
    }
}

fn store_down() -> SessionStoreError {
    SessionStoreError::Serialization(serde_json::from_str::<serde_json::Value>("").unwrap_err())
}
