//! Session endpoints for cookie and bearer auth.

use axum::{
    extract::Extension,
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tracing::{debug, error};

use super::types::UserResponse;
use crate::api::handlers::{error_response, ErrorResponse, INTERNAL_ERROR_MESSAGE};
use crate::auth::{
    cookie::{clear_session_cookie, extract_session_token},
    AuthState,
};

const UNAUTHORIZED_MESSAGE: &str = "Missing or invalid session";

#[utoipa::path(
    get,
    path = "/auth/session",
    responses(
        (status = 200, description = "Session is valid", body = UserResponse),
        (status = 401, description = "Missing or invalid session", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn session(headers: HeaderMap, state: Extension<Arc<AuthState>>) -> impl IntoResponse {
    let Some(token) = extract_session_token(&headers) else {
        return error_response(StatusCode::UNAUTHORIZED, UNAUTHORIZED_MESSAGE);
    };

    // Signature and time window only; no storage lookup is needed to trust the token.
    let user_id = match state.tokens().verify_token(&token) {
        Ok(user_id) => user_id,
        Err(err) => {
            debug!("Rejected session token: {err}");
            return error_response(StatusCode::UNAUTHORIZED, UNAUTHORIZED_MESSAGE);
        }
    };

    match state.store().find_account_by_id(user_id).await {
        Ok(Some(account)) => (StatusCode::OK, Json(UserResponse::from(account))).into_response(),
        Ok(None) => error_response(StatusCode::UNAUTHORIZED, UNAUTHORIZED_MESSAGE),
        Err(err) => {
            error!("Failed to get user: {err:#}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE)
        }
    }
}

#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 204, description = "Session cookie cleared")
    ),
    tag = "auth"
)]
pub async fn logout() -> impl IntoResponse {
    // Tokens stay valid until exp; only the browser copy is dropped.
    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, clear_session_cookie());
    (StatusCode::NO_CONTENT, headers)
}
