//! Error kinds surfaced by the authentication core.
//!
//! Storage and transaction failures never cross this boundary as-is: the
//! coordinator logs them and collapses them into [`AuthError::Internal`].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Malformed input payload (missing fields, bad email shape).
    #[error("validation error: {0}")]
    Validation(String),
    /// Unknown, already used, or expired code. The three cases are not
    /// distinguishable to callers.
    #[error("invalid code")]
    InvalidCode,
    /// Storage, commit, or signing failure. Details are logged server-side.
    #[error("internal error")]
    Internal,
}

#[derive(Debug, Error)]
pub enum TokenError {
    /// Configured signing key material is unusable.
    #[error("invalid signing key: {0}")]
    Key(String),
    #[error("invalid token")]
    InvalidToken,
    #[error("failed to sign token")]
    Signing,
    #[error("time format error")]
    TimeFormat,
}

impl From<TokenError> for AuthError {
    fn from(_: TokenError) -> Self {
        Self::Internal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_code_message_is_generic() {
        assert_eq!(AuthError::InvalidCode.to_string(), "invalid code");
        assert_eq!(AuthError::Internal.to_string(), "internal error");
    }

    #[test]
    fn token_errors_collapse_to_internal() {
        let err: AuthError = TokenError::Signing.into();
        assert!(matches!(err, AuthError::Internal));
    }
}
