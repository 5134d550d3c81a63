//! Code redemption: the only path that marks a code used and an account verified.
//!
//! Per-code states are `pending` (unused, before expiry), `expired` (unused,
//! at or past expiry) and `used` (terminal). Only `pending -> used` is allowed,
//! and it happens inside the store's transaction together with the
//! verified-flag flip. Unknown, used and expired codes all surface as
//! [`AuthError::InvalidCode`] so callers cannot tell which case applied.

use time::OffsetDateTime;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use super::{error::AuthError, state::AuthState, token::IssuedToken};
use crate::storage::{Account, ConsumeOutcome};

#[derive(Debug)]
pub struct Redemption {
    pub account: Account,
    pub token: IssuedToken,
}

/// Consume `code` for `user_id` and issue a session token.
///
/// Each call is a single bounded transaction with no internal retries. After
/// an [`AuthError::Internal`] the caller may retry the whole redemption.
///
/// # Errors
///
/// [`AuthError::Validation`] for an empty code, [`AuthError::InvalidCode`] when
/// the code is unknown, used, expired, or lost a concurrent race, and
/// [`AuthError::Internal`] on storage or signing failure. A signing failure
/// leaves the code unused.
#[instrument(skip(state, code))]
pub async fn redeem(
    state: &AuthState,
    user_id: Uuid,
    code: &str,
    now: OffsetDateTime,
) -> Result<Redemption, AuthError> {
    let code = code.trim();
    if code.is_empty() {
        return Err(AuthError::Validation("Missing code".to_string()));
    }

    let record = match state.store().fetch_code(user_id, code).await {
        Ok(Some(record)) => record,
        Ok(None) => {
            debug!("code not found");
            return Err(AuthError::InvalidCode);
        }
        Err(err) => {
            error!("Failed to get code: {err:#}");
            return Err(AuthError::Internal);
        }
    };

    if record.used {
        debug!(code_id = %record.id, "code already used");
        return Err(AuthError::InvalidCode);
    }
    if now >= record.expires_at {
        debug!(code_id = %record.id, "code expired");
        return Err(AuthError::InvalidCode);
    }

    // Signed before the commit so a signing failure leaves the code redeemable.
    let token = state
        .tokens()
        .create_token_at(user_id, state.config().token_ttl(), now.unix_timestamp())
        .map_err(|err| {
            error!("Failed to create user token: {err}");
            AuthError::Internal
        })?;

    let account = match state.store().consume_code(record.id, user_id, now).await {
        Ok(ConsumeOutcome::Consumed(account)) => account,
        Ok(ConsumeOutcome::Lost) => {
            debug!(code_id = %record.id, "code consumed concurrently");
            return Err(AuthError::InvalidCode);
        }
        Err(err) => {
            error!("Failed to redeem code: {err:#}");
            return Err(AuthError::Internal);
        }
    };

    info!(user_id = %account.id, "user verified");

    Ok(Redemption { account, token })
}
