use axum::{routing::post, Router};
use std::sync::Arc;

use super::controller;
use crate::AppState;

pub fn auth_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth", post(controller::login).get(controller::current_user))
        .route("/auth/logout", post(controller::logout))
        .route("/auth/mfa", post(controller::complete_mfa_login))
        .route("/auth/mfa/initialize", post(controller::initialize_mfa))
        .route("/auth/mfa/verify", post(controller::verify_mfa_enrollment))
}
