use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use std::sync::Arc;
use validator::Validate;

use crate::modules::auth::schema::ErrorResponse;
use crate::modules::messages::model::NewMessage;
use crate::modules::messages::schema::{
    BatchItemResult, ListMessagesQuery, ListMessagesResponse, VerifyBatchRequest,
    VerifyBatchResponse, VerifyMessageRequest, VerifyMessageResponse,
};
use crate::services::signature::SignatureVerifier;
use crate::AppState;

type ErrorReply = (StatusCode, Json<ErrorResponse>);

const DEFAULT_PER_PAGE: u32 = 10;
const MAX_PER_PAGE: u32 = 100;

fn bad_request(message: impl Into<String>) -> ErrorReply {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::new(message, StatusCode::BAD_REQUEST)),
    )
}

fn unauthenticated() -> ErrorReply {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse::new(
            "Not authenticated",
            StatusCode::UNAUTHORIZED,
        )),
    )
}

fn internal(e: impl std::fmt::Display) -> ErrorReply {
    tracing::error!(error = %e, "Message operation failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new(
            "Internal server error",
            StatusCode::INTERNAL_SERVER_ERROR,
        )),
    )
}

async fn require_user(state: &AppState, headers: &HeaderMap) -> Result<(i64, String), ErrorReply> {
    state
        .sessions
        .authenticated(headers)
        .await
        .map_err(internal)?
        .ok_or_else(unauthenticated)
}

/// Verify one signed message for the logged-in user and record the attempt.
/// A mismatched signer is still a recorded attempt (valid = false); only
/// malformed input is rejected outright.
pub async fn verify_message(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<VerifyMessageRequest>,
) -> Result<(StatusCode, Json<VerifyMessageResponse>), ErrorReply> {
    let (user_id, address) = require_user(&state, &headers).await?;

    if let Err(e) = req.validate() {
        return Err(bad_request(e.to_string()));
    }

    let signer = SignatureVerifier::recover(&req.message, &req.signature)
        .map_err(|e| bad_request(e.to_string()))?;
    let valid = signer.eq_ignore_ascii_case(&address);

    let record = state
        .messages
        .record(&NewMessage {
            user_id,
            message: req.message,
            signature: req.signature,
            signer: signer.clone(),
            valid,
        })
        .await
        .map_err(internal)?;

    Ok((
        StatusCode::OK,
        Json(VerifyMessageResponse {
            success: true,
            status: StatusCode::OK.as_u16(),
            valid,
            signer,
            record: record.into(),
        }),
    ))
}

/// Batch verify. The call succeeds as a whole; malformed items carry their
/// error inline and are skipped by the recorder.
pub async fn verify_batch(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<VerifyBatchRequest>,
) -> Result<(StatusCode, Json<VerifyBatchResponse>), ErrorReply> {
    let (user_id, address) = require_user(&state, &headers).await?;

    if let Err(e) = req.validate() {
        return Err(bad_request(e.to_string()));
    }

    let mut results = Vec::with_capacity(req.items.len());
    for item in &req.items {
        match SignatureVerifier::recover(&item.message, &item.signature) {
            Ok(signer) => {
                let valid = signer.eq_ignore_ascii_case(&address);
                state
                    .messages
                    .record(&NewMessage {
                        user_id,
                        message: item.message.clone(),
                        signature: item.signature.clone(),
                        signer: signer.clone(),
                        valid,
                    })
                    .await
                    .map_err(internal)?;
                results.push(BatchItemResult {
                    valid,
                    signer: Some(signer),
                    error: None,
                });
            }
            Err(e) => results.push(BatchItemResult {
                valid: false,
                signer: None,
                error: Some(e.to_string()),
            }),
        }
    }

    Ok((
        StatusCode::OK,
        Json(VerifyBatchResponse {
            success: true,
            status: StatusCode::OK.as_u16(),
            results,
        }),
    ))
}

pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<ListMessagesQuery>,
) -> Result<(StatusCode, Json<ListMessagesResponse>), ErrorReply> {
    let (user_id, _) = require_user(&state, &headers).await?;

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query
        .per_page
        .unwrap_or(DEFAULT_PER_PAGE)
        .clamp(1, MAX_PER_PAGE);

    let records = state
        .messages
        .page_for_user(user_id, page, per_page)
        .await
        .map_err(internal)?;
    let total = state
        .messages
        .count_for_user(user_id)
        .await
        .map_err(internal)?;

    Ok((
        StatusCode::OK,
        Json(ListMessagesResponse {
            success: true,
            status: StatusCode::OK.as_u16(),
            messages: records.into_iter().map(Into::into).collect(),
            page,
            per_page,
            total,
        }),
    ))
}
