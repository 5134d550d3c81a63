//! Registration / login start: resolve the account and mint a one-time code.

use time::OffsetDateTime;
use tracing::{debug, error, instrument};

use super::{account, code::generate_code, error::AuthError, state::AuthState};
use crate::storage::{Account, CreateCodeOutcome, OneTimeCode};

const MAX_CODE_ATTEMPTS: usize = 3;

#[derive(Debug)]
pub struct Registration {
    pub account: Account,
    pub code: OneTimeCode,
}

/// Resolve `email` to an account and persist a fresh code expiring
/// `code_ttl` after `now`.
///
/// # Errors
///
/// [`AuthError::Validation`] for a malformed email, [`AuthError::Internal`] if
/// entropy or storage fails.
#[instrument(skip(state))]
pub async fn register(
    state: &AuthState,
    email: &str,
    now: OffsetDateTime,
) -> Result<Registration, AuthError> {
    let account = account::find_or_create(state.store(), email).await?;
    let expires_at = now + state.config().code_ttl();

    for _ in 0..MAX_CODE_ATTEMPTS {
        let code = generate_code().map_err(|err| {
            error!("Failed to generate code: {err:#}");
            AuthError::Internal
        })?;

        match state.store().create_code(account.id, &code, expires_at).await {
            Ok(CreateCodeOutcome::Created(code)) => {
                debug!(user_id = %account.id, code = %code.code, "code generated");
                return Ok(Registration { account, code });
            }
            Ok(CreateCodeOutcome::Duplicate) => {}
            Err(err) => {
                error!("Failed to create code: {err:#}");
                return Err(AuthError::Internal);
            }
        }
    }

    error!("Failed to generate a unique code for user {}", account.id);
    Err(AuthError::Internal)
}
