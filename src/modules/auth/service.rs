use std::sync::Arc;

use chrono::{Duration, Utc};
use rand::Rng;

use super::interface::{AuthFlowError, Result, UserStore};
use super::model::User;
use super::schema::{
    CompleteEnrollmentRequest, CompleteMfaLoginRequest, InitializeMfaRequest, LoginRequest,
};
use crate::modules::messages::interface::MessageStore;
use crate::modules::messages::model::MessageRecord;
use crate::services::mfa::{MfaProvisioning, MfaService};
use crate::services::session::{SessionManager, SessionState};
use crate::services::signature::SignatureVerifier;

/// Exact strings a wallet must sign; anything else is rejected before any
/// signature work happens.
const LOGIN_MESSAGE: &str = "login";
const ENROLLMENT_MESSAGE: &str = "enableMFA";

/// How much history rides along with login and current-user responses.
const RECENT_MESSAGES_LIMIT: u32 = 10;

/// User plus the bits of state responses carry alongside it.
pub struct AuthenticatedPayload {
    pub user: User,
    pub mfa_enabled: bool,
    pub messages: Vec<MessageRecord>,
}

pub enum LoginOutcome {
    Authenticated(AuthenticatedPayload),
    /// Second factor still owed; the phrase binds the pending session to
    /// this login attempt.
    MfaChallenge { mfa_bonus_phrase: String },
}

/// The authentication state machine.
///
/// Session-scoped states run Anonymous -> PendingMfa -> Authenticated, and
/// account-scoped enrollment runs not-enrolled -> awaiting -> enrolled,
/// monotonic once enrolled. All state lives in the injected stores; the flow
/// itself holds no mutable state and each operation is one request-scoped
/// sequence with expiry checked lazily at the transition that cares.
pub struct AuthFlow {
    users: Arc<dyn UserStore>,
    messages: Arc<dyn MessageStore>,
    sessions: SessionManager,
    mfa: MfaService,
    pending_window: Duration,
}

impl AuthFlow {
    pub fn new(
        users: Arc<dyn UserStore>,
        messages: Arc<dyn MessageStore>,
        sessions: SessionManager,
        mfa: MfaService,
        pending_window_secs: i64,
    ) -> Self {
        Self {
            users,
            messages,
            sessions,
            mfa,
            pending_window: Duration::seconds(pending_window_secs),
        }
    }

    /// Signature login. The literal-message check runs first and the
    /// signature check runs before any user lookup, so neither a wrong
    /// message nor a bad signature reveals whether the address is known.
    pub async fn login(&self, session_id: &str, req: &LoginRequest) -> Result<LoginOutcome> {
        if req.message != LOGIN_MESSAGE {
            return Err(AuthFlowError::InvalidLoginMessage);
        }

        if !SignatureVerifier::verify(&req.message, &req.signature, &req.address) {
            return Err(AuthFlowError::InvalidSignature);
        }

        let address = req.address.to_lowercase();
        let (user, record) = self.users.find_or_create(&address).await?;

        if record.mfa_enabled {
            let mfa_bonus_phrase = generate_bonus_phrase();
            let deadline = Utc::now() + self.pending_window;
            self.users.set_mfa_timeout(user.id, Some(deadline)).await?;
            self.persist(
                session_id,
                &SessionState::PendingMfa {
                    pending_user_id: user.id,
                    mfa_bonus_phrase: mfa_bonus_phrase.clone(),
                },
            )
            .await?;

            tracing::info!(user_id = user.id, "Login pending MFA");
            return Ok(LoginOutcome::MfaChallenge { mfa_bonus_phrase });
        }

        self.persist(
            session_id,
            &SessionState::Authenticated {
                user_id: user.id,
                address: user.address.clone(),
            },
        )
        .await?;
        let messages = self.recent_messages(user.id).await?;

        tracing::info!(user_id = user.id, "Login successful");
        Ok(LoginOutcome::Authenticated(AuthenticatedPayload {
            user,
            mfa_enabled: record.mfa_enabled,
            messages,
        }))
    }

    pub async fn current_user(&self, session_id: &str) -> Result<AuthenticatedPayload> {
        let (user_id, _) = self.require_authenticated(session_id).await?;
        self.authenticated_payload(user_id).await
    }

    /// Destroys whatever the session id points at. Calling it again, or for
    /// a session that never existed, is still success.
    pub async fn logout(&self, session_id: &str) -> Result<()> {
        self.sessions.destroy(session_id).await?;
        Ok(())
    }

    pub async fn initialize_mfa_enrollment(
        &self,
        session_id: &str,
        req: &InitializeMfaRequest,
    ) -> Result<MfaProvisioning> {
        let (user_id, address) = self.require_authenticated(session_id).await?;

        if req.message != ENROLLMENT_MESSAGE {
            return Err(AuthFlowError::InvalidEnrollmentMessage);
        }

        if !SignatureVerifier::verify(&req.message, &req.signature, &address) {
            return Err(AuthFlowError::InvalidSignature);
        }

        let provisioning = self.mfa.provisioning(&address)?;

        // A failure here means a derivation or clock misconfiguration that
        // would lock the user out at the verify step. Surface it loudly but
        // let enrollment continue.
        match self.mfa.self_check(&address) {
            Ok(true) => {}
            Ok(false) => {
                tracing::error!(user_id, "TOTP self-check failed for freshly derived secret")
            }
            Err(e) => tracing::error!(user_id, error = %e, "TOTP self-check errored"),
        }

        self.users.set_awaiting_enrollment(user_id, true).await?;

        tracing::info!(user_id, "MFA enrollment initialized");
        Ok(provisioning)
    }

    pub async fn complete_mfa_enrollment(
        &self,
        session_id: &str,
        req: &CompleteEnrollmentRequest,
    ) -> Result<()> {
        let (user_id, address) = self.require_authenticated(session_id).await?;
        let record = self
            .users
            .auth_record(user_id)
            .await?
            .ok_or(AuthFlowError::UserNotFound)?;

        if !record.awaiting_mfa_enrollment {
            // Duplicate submit right after success lands here. Accept it as
            // long as the code still verifies against the enrolled secret.
            if record.mfa_enabled && self.mfa.verify_code(&address, &req.mfa_code)? {
                return Ok(());
            }
            return Err(AuthFlowError::EnrollmentNotStarted);
        }

        if !self.mfa.verify_code(&address, &req.mfa_code)? {
            return Err(AuthFlowError::InvalidMfaCode);
        }

        self.users.complete_enrollment(user_id).await?;

        tracing::info!(user_id, "MFA enrollment completed");
        Ok(())
    }

    pub async fn complete_mfa_login(
        &self,
        session_id: &str,
        req: &CompleteMfaLoginRequest,
    ) -> Result<AuthenticatedPayload> {
        let (pending_user_id, mfa_bonus_phrase) = match self.sessions.load(session_id).await? {
            Some(SessionState::PendingMfa {
                pending_user_id,
                mfa_bonus_phrase,
            }) => (pending_user_id, mfa_bonus_phrase),
            // Double submit after promotion: re-validate the code and answer
            // success again rather than failing the second request.
            Some(SessionState::Authenticated { user_id, address }) => {
                if self.mfa.verify_code(&address, &req.mfa_code)? {
                    return self.authenticated_payload(user_id).await;
                }
                return Err(AuthFlowError::NoPendingMfa);
            }
            _ => return Err(AuthFlowError::NoPendingMfa),
        };

        // Phrase mismatch keeps the pending state so the user can retry
        // within the window.
        if req.mfa_bonus_phrase != mfa_bonus_phrase {
            return Err(AuthFlowError::InvalidBonusPhrase);
        }

        let user = self
            .users
            .find_by_id(pending_user_id)
            .await?
            .ok_or(AuthFlowError::UserNotFound)?;
        let record = self
            .users
            .auth_record(pending_user_id)
            .await?
            .ok_or(AuthFlowError::UserNotFound)?;

        if let Some(deadline) = record.mfa_timeout_at {
            if Utc::now() > deadline {
                self.persist(session_id, &SessionState::Anonymous).await?;
                tracing::info!(user_id = user.id, "Pending MFA window expired");
                return Err(AuthFlowError::MfaWindowExpired);
            }
        }

        if !self.mfa.verify_code(&user.address, &req.mfa_code)? {
            return Err(AuthFlowError::InvalidMfaCode);
        }

        self.persist(
            session_id,
            &SessionState::Authenticated {
                user_id: user.id,
                address: user.address.clone(),
            },
        )
        .await?;
        self.users.set_mfa_timeout(user.id, None).await?;
        let messages = self.recent_messages(user.id).await?;

        tracing::info!(user_id = user.id, "MFA login completed");
        Ok(AuthenticatedPayload {
            user,
            mfa_enabled: record.mfa_enabled,
            messages,
        })
    }

    async fn require_authenticated(&self, session_id: &str) -> Result<(i64, String)> {
        match self.sessions.load(session_id).await? {
            Some(SessionState::Authenticated { user_id, address }) => Ok((user_id, address)),
            _ => Err(AuthFlowError::Unauthenticated),
        }
    }

    async fn authenticated_payload(&self, user_id: i64) -> Result<AuthenticatedPayload> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthFlowError::UserNotFound)?;
        let record = self
            .users
            .auth_record(user_id)
            .await?
            .ok_or(AuthFlowError::UserNotFound)?;
        let messages = self.recent_messages(user_id).await?;

        Ok(AuthenticatedPayload {
            user,
            mfa_enabled: record.mfa_enabled,
            messages,
        })
    }

    async fn recent_messages(&self, user_id: i64) -> Result<Vec<MessageRecord>> {
        self.messages
            .recent_for_user(user_id, RECENT_MESSAGES_LIMIT)
            .await
            .map_err(|e| AuthFlowError::Internal(format!("message history: {}", e)))
    }

    /// Session writes that gate a success response; a failure here is fatal
    /// for the request since the client would otherwise believe state the
    /// server never committed.
    async fn persist(&self, session_id: &str, state: &SessionState) -> Result<()> {
        self.sessions
            .save(session_id, state)
            .await
            .map_err(AuthFlowError::SessionPersist)
    }
}

/// 16 random bytes as 32 hex chars.
fn generate_bonus_phrase() -> String {
    let mut rng = rand::rng();
    let bytes: Vec<u8> = (0..16).map(|_| rng.random()).collect();
    hex::encode(bytes)
}
