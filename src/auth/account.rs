//! Find-or-create accounts keyed by email.

use tracing::{debug, error, instrument};

use super::email::{normalize_email, valid_email};
use super::error::AuthError;
use crate::storage::{Account, AuthStore, CreateAccountOutcome};

/// Return the account for `email`, creating an unverified one on first use.
///
/// Concurrent first-time calls for the same email converge on a single row:
/// the loser of the insert sees a unique violation and re-fetches.
///
/// # Errors
///
/// [`AuthError::Validation`] for a malformed email, [`AuthError::Internal`] on
/// storage failure.
#[instrument(skip(store))]
pub async fn find_or_create(store: &dyn AuthStore, email: &str) -> Result<Account, AuthError> {
    let email = normalize_email(email);
    if !valid_email(&email) {
        return Err(AuthError::Validation("Invalid email".to_string()));
    }

    match store.find_account_by_email(&email).await {
        Ok(Some(account)) => return Ok(account),
        Ok(None) => {}
        Err(err) => {
            error!("Failed to get user: {err:#}");
            return Err(AuthError::Internal);
        }
    }

    match store.create_account(&email).await {
        Ok(CreateAccountOutcome::Created(account)) => {
            debug!(user_id = %account.id, "created account");
            Ok(account)
        }
        Ok(CreateAccountOutcome::Conflict) => match store.find_account_by_email(&email).await {
            Ok(Some(account)) => Ok(account),
            Ok(None) => {
                error!("User vanished after unique violation");
                Err(AuthError::Internal)
            }
            Err(err) => {
                error!("Failed to get user after unique violation: {err:#}");
                Err(AuthError::Internal)
            }
        },
        Err(err) => {
            error!("Failed to create user: {err:#}");
            Err(AuthError::Internal)
        }
    }
}
