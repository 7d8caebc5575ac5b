pub mod config;
pub mod modules;
pub mod services;

use axum::{middleware, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

use config::AppConfig;
use modules::auth::auth_routes;
use modules::auth::interface::UserStore;
use modules::auth::service::AuthFlow;
use modules::messages::interface::MessageStore;
use modules::messages::message_routes;
use services::mfa::MfaService;
use services::rate_limit::{create_rate_limiter, RateLimitLayer};
use services::security::security_headers;
use services::session::{SessionManager, SessionStore};

pub struct AppState {
    pub auth: AuthFlow,
    pub sessions: SessionManager,
    pub messages: Arc<dyn MessageStore>,
}

pub async fn create_app(
    users: Arc<dyn UserStore>,
    messages: Arc<dyn MessageStore>,
    session_store: Arc<dyn SessionStore>,
    config: AppConfig,
) -> Router {
    let sessions = SessionManager::new(
        session_store,
        config.session_secret.clone(),
        config.session_ttl_secs,
        config.session_cookie_secure,
    );
    let mfa = MfaService::new(
        config.mfa_salt.clone(),
        config.mfa_issuer.clone(),
        config.mfa_totp_skew,
    );
    let auth = AuthFlow::new(
        users,
        messages.clone(),
        sessions.clone(),
        mfa,
        config.mfa_pending_window_secs,
    );

    let state = Arc::new(AppState {
        auth,
        sessions,
        messages,
    });

    // Rate limit: burst of N, then 1 per minute
    let rate_limiter = create_rate_limiter(config.rate_limit_burst);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .merge(auth_routes())
        .merge(message_routes())
        .layer(middleware::from_fn(security_headers))
        .layer(RequestBodyLimitLayer::new(1024 * 100)) // 100KB max body
        .layer(RateLimitLayer::new(rate_limiter))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn root() -> &'static str {
    "Wallet Auth API"
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
