use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::modules::messages::controller;
use crate::AppState;

pub fn message_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/messages", get(controller::list_messages))
        .route("/messages/verify", post(controller::verify_message))
        .route("/messages/verify-batch", post(controller::verify_batch))
}
