//! Session cookie binding and token extraction.

use anyhow::{Context, Result};
use axum::http::{
    header::{AUTHORIZATION, COOKIE},
    HeaderMap, HeaderValue,
};
use time::{macros::format_description, OffsetDateTime, UtcOffset};

use super::token::IssuedToken;

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Build the `Set-Cookie` value carrying `token`.
///
/// `Expires` matches the token's `exp`; `Max-Age` is counted from `now`.
///
/// # Errors
///
/// Fails if the expiry cannot be formatted or the token contains bytes that
/// are not valid in a header.
pub fn session_cookie(token: &IssuedToken, now: OffsetDateTime) -> Result<HeaderValue> {
    let expires = http_date(token.expires_at)?;
    let max_age = (token.expires_at.unix_timestamp() - now.unix_timestamp()).max(0);
    let cookie = format!(
        "{ACCESS_TOKEN_COOKIE}={}; Path=/; Expires={expires}; Max-Age={max_age}; HttpOnly; Secure; SameSite=Strict",
        token.token
    );
    HeaderValue::from_str(&cookie).context("session cookie is not a valid header value")
}

/// Cookie that makes the client drop the session.
#[must_use]
pub fn clear_session_cookie() -> HeaderValue {
    HeaderValue::from_static(
        "access_token=; Path=/; Expires=Thu, 01 Jan 1970 00:00:00 GMT; Max-Age=0; HttpOnly; Secure; SameSite=Strict",
    )
}

/// Bearer token first, then the `access_token` cookie.
#[must_use]
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = extract_bearer_token(headers) {
        return Some(token);
    }
    for header in headers.get_all(COOKIE) {
        let Ok(value) = header.to_str() else {
            continue;
        };
        for pair in value.split(';') {
            let Some((key, val)) = pair.trim().split_once('=') else {
                continue;
            };
            let val = val.trim();
            if key.trim() == ACCESS_TOKEN_COOKIE && !val.is_empty() {
                return Some(val.to_string());
            }
        }
    }
    None
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

// IMF-fixdate, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`.
fn http_date(instant: OffsetDateTime) -> Result<String> {
    instant
        .to_offset(UtcOffset::UTC)
        .format(format_description!(
            "[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] GMT"
        ))
        .context("failed to format cookie expiry")
}
