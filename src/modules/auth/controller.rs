use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::sync::Arc;

use crate::modules::auth::interface::AuthFlowError;
use crate::modules::auth::schema::{
    CompleteEnrollmentRequest, CompleteEnrollmentResponse, CompleteMfaLoginRequest,
    CurrentUserResponse, ErrorResponse, InitializeMfaRequest, InitializeMfaResponse, LoginRequest,
    LoginSuccessResponse, LogoutResponse, MfaChallengeResponse,
};
use crate::modules::auth::service::LoginOutcome;
use crate::services::session::SessionManager;
use crate::AppState;

type ErrorReply = (StatusCode, Json<ErrorResponse>);

fn flow_error(e: AuthFlowError) -> ErrorReply {
    let status = e.status_code();
    if status.is_server_error() {
        tracing::error!(error = %e, "Auth operation failed");
    }
    (status, Json(ErrorResponse::new(e.public_message(), status)))
}

fn require_session(state: &AppState, headers: &HeaderMap) -> Result<String, ErrorReply> {
    state
        .sessions
        .session_id(headers)
        .ok_or_else(|| flow_error(AuthFlowError::Unauthenticated))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<LoginRequest>,
) -> Result<Response, ErrorReply> {
    // Reuse the caller's session id when the cookie is valid, mint otherwise.
    let session_id = state
        .sessions
        .session_id(&headers)
        .unwrap_or_else(SessionManager::mint_session_id);

    let outcome = state
        .auth
        .login(&session_id, &req)
        .await
        .map_err(flow_error)?;
    let cookie = state.sessions.issue_cookie(&session_id);

    match outcome {
        LoginOutcome::Authenticated(payload) => Ok((
            StatusCode::OK,
            [(header::SET_COOKIE, cookie)],
            Json(LoginSuccessResponse {
                success: true,
                status: StatusCode::OK.as_u16(),
                mfa: false,
                user: payload.user.into(),
                messages: payload.messages.into_iter().map(Into::into).collect(),
            }),
        )
            .into_response()),
        LoginOutcome::MfaChallenge { mfa_bonus_phrase } => Ok((
            StatusCode::OK,
            [(header::SET_COOKIE, cookie)],
            Json(MfaChallengeResponse {
                success: true,
                status: StatusCode::OK.as_u16(),
                mfa: true,
                mfa_bonus_phrase,
            }),
        )
            .into_response()),
    }
}

pub async fn current_user(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<CurrentUserResponse>), ErrorReply> {
    let session_id = require_session(&state, &headers)?;

    let payload = state
        .auth
        .current_user(&session_id)
        .await
        .map_err(flow_error)?;

    Ok((
        StatusCode::OK,
        Json(CurrentUserResponse {
            success: true,
            status: StatusCode::OK.as_u16(),
            user: payload.user.into(),
            mfa_enabled: payload.mfa_enabled,
            messages: payload.messages.into_iter().map(Into::into).collect(),
        }),
    ))
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, ErrorReply> {
    // Missing or unknown sessions still log out cleanly.
    if let Some(session_id) = state.sessions.session_id(&headers) {
        state.auth.logout(&session_id).await.map_err(flow_error)?;
    }

    let cookie = state.sessions.clear_cookie();
    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(LogoutResponse {
            success: true,
            status: StatusCode::OK.as_u16(),
            message: "Logged out",
        }),
    )
        .into_response())
}

pub async fn initialize_mfa(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<InitializeMfaRequest>,
) -> Result<(StatusCode, Json<InitializeMfaResponse>), ErrorReply> {
    let session_id = require_session(&state, &headers)?;

    let provisioning = state
        .auth
        .initialize_mfa_enrollment(&session_id, &req)
        .await
        .map_err(flow_error)?;

    Ok((
        StatusCode::OK,
        Json(InitializeMfaResponse {
            success: true,
            status: StatusCode::OK.as_u16(),
            qr_code: provisioning.qr_code,
            secret: provisioning.secret,
        }),
    ))
}

pub async fn verify_mfa_enrollment(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<CompleteEnrollmentRequest>,
) -> Result<(StatusCode, Json<CompleteEnrollmentResponse>), ErrorReply> {
    let session_id = require_session(&state, &headers)?;

    state
        .auth
        .complete_mfa_enrollment(&session_id, &req)
        .await
        .map_err(flow_error)?;

    Ok((
        StatusCode::OK,
        Json(CompleteEnrollmentResponse {
            success: true,
            status: StatusCode::OK.as_u16(),
            message: "MFA enabled",
        }),
    ))
}

pub async fn complete_mfa_login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<CompleteMfaLoginRequest>,
) -> Result<(StatusCode, Json<LoginSuccessResponse>), ErrorReply> {
    // No cookie reads the same as no pending login.
    let session_id = state
        .sessions
        .session_id(&headers)
        .ok_or_else(|| flow_error(AuthFlowError::NoPendingMfa))?;

    let payload = state
        .auth
        .complete_mfa_login(&session_id, &req)
        .await
        .map_err(flow_error)?;

    Ok((
        StatusCode::OK,
        Json(LoginSuccessResponse {
            success: true,
            status: StatusCode::OK.as_u16(),
            mfa: true,
            user: payload.user.into(),
            messages: payload.messages.into_iter().map(Into::into).collect(),
        }),
    ))
}
