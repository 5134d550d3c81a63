use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::instrument;

use super::types::{RegisterRequest, RegisterResponse};
use crate::api::handlers::{error_response, ErrorResponse};
use crate::auth::{self, AuthState};

#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Code issued", body = RegisterResponse),
        (status = 400, description = "Missing payload or invalid email", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "auth"
)]
#[instrument(skip(state, payload))]
pub async fn register(
    state: Extension<Arc<AuthState>>,
    payload: Option<Json<RegisterRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return error_response(StatusCode::BAD_REQUEST, "Missing payload");
    };

    match auth::register(&state, &request.email, OffsetDateTime::now_utc()).await {
        Ok(registration) => (
            StatusCode::OK,
            Json(RegisterResponse {
                code: registration.code.code,
            }),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}
