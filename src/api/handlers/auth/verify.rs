use axum::{
    extract::Extension,
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::{error, instrument};

use super::types::{UserResponse, VerifyRequest};
use crate::api::handlers::{error_response, ErrorResponse};
use crate::auth::{self, cookie::session_cookie, AuthError, AuthState, Redemption};

#[utoipa::path(
    post,
    path = "/auth/verify",
    request_body = VerifyRequest,
    responses(
        (status = 200, description = "Account verified; session cookie set", body = UserResponse),
        (status = 400, description = "Missing payload or invalid code", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "auth"
)]
#[instrument(skip(state, payload))]
pub async fn verify(
    state: Extension<Arc<AuthState>>,
    payload: Option<Json<VerifyRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return error_response(StatusCode::BAD_REQUEST, "Missing payload");
    };

    let now = OffsetDateTime::now_utc();
    let Redemption { account, token } =
        match auth::redeem(&state, request.user_id, &request.code, now).await {
            Ok(redemption) => redemption,
            Err(err) => return err.into_response(),
        };

    let cookie = match session_cookie(&token, now) {
        Ok(cookie) => cookie,
        Err(err) => {
            error!("Failed to build session cookie: {err:#}");
            return AuthError::Internal.into_response();
        }
    };

    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, cookie);

    (StatusCode::OK, headers, Json(UserResponse::from(account))).into_response()
}
