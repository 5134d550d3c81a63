//! Session tokens: PASETO `v4.public` (Ed25519) signed with a keypair loaded at startup.
//!
//! Verification is purely cryptographic plus a `[nbf, exp)` time-window check;
//! nothing is looked up in storage, so tokens cannot be revoked before `exp`.

use ed25519_dalek::SigningKey;
use pasetors::keys::{AsymmetricPublicKey, AsymmetricSecretKey};
use pasetors::token::UntrustedToken;
use pasetors::version4::{PublicToken, V4};
use pasetors::Public;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::fmt;
use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use super::error::TokenError;

pub const DEFAULT_ISSUER: &str = "xpose";

/// Claims carried in the token payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionClaims {
    pub iss: String,
    pub iat: String,
    pub nbf: String,
    pub exp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// A freshly signed token and the instant it stops being valid.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: OffsetDateTime,
}

pub struct TokenMaker {
    secret_key: AsymmetricSecretKey<V4>,
    public_key: AsymmetricPublicKey<V4>,
    issuer: String,
}

impl fmt::Debug for TokenMaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenMaker")
            .field("issuer", &self.issuer)
            .finish_non_exhaustive()
    }
}

impl TokenMaker {
    /// Build from hex key material: either the 64-byte keypair (seed followed by
    /// public key) or the bare 32-byte seed.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Key`] if the hex is malformed, has the wrong length,
    /// or the embedded public key does not match the seed.
    pub fn from_hex(secret_hex: &SecretString, issuer: &str) -> Result<Self, TokenError> {
        let bytes = hex::decode(secret_hex.expose_secret().trim())
            .map_err(|err| TokenError::Key(format!("invalid hex: {err}")))?;

        let signing_key = match bytes.len() {
            32 => {
                let mut seed = [0u8; 32];
                seed.copy_from_slice(&bytes);
                SigningKey::from_bytes(&seed)
            }
            64 => {
                let mut keypair = [0u8; 64];
                keypair.copy_from_slice(&bytes);
                SigningKey::from_keypair_bytes(&keypair)
                    .map_err(|_| TokenError::Key("public key does not match seed".to_string()))?
            }
            len => {
                return Err(TokenError::Key(format!(
                    "expected 32 or 64 bytes, got {len}"
                )))
            }
        };

        Self::from_signing_key(&signing_key, issuer)
    }

    /// # Errors
    ///
    /// Returns [`TokenError::Key`] if the key cannot be converted for PASETO use.
    pub fn from_signing_key(signing_key: &SigningKey, issuer: &str) -> Result<Self, TokenError> {
        let secret_key = AsymmetricSecretKey::<V4>::from(&signing_key.to_keypair_bytes())
            .map_err(|_| TokenError::Key("unusable secret key".to_string()))?;
        let public_key = AsymmetricPublicKey::<V4>::from(&signing_key.verifying_key().to_bytes())
            .map_err(|_| TokenError::Key("unusable public key".to_string()))?;

        Ok(Self {
            secret_key,
            public_key,
            issuer: issuer.to_string(),
        })
    }

    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Sign a token for `user_id` valid for `duration` starting now.
    ///
    /// # Errors
    ///
    /// Returns an error if timestamps cannot be encoded or signing fails.
    pub fn create_token(&self, user_id: Uuid, duration: Duration) -> Result<IssuedToken, TokenError> {
        self.create_token_at(user_id, duration, OffsetDateTime::now_utc().unix_timestamp())
    }

    /// Sign a token as if issued at `now_unix_seconds`.
    ///
    /// A zero or negative `duration` yields a token that is already expired.
    ///
    /// # Errors
    ///
    /// Returns an error if timestamps cannot be encoded or signing fails.
    pub fn create_token_at(
        &self,
        user_id: Uuid,
        duration: Duration,
        now_unix_seconds: i64,
    ) -> Result<IssuedToken, TokenError> {
        let exp_unix = now_unix_seconds
            .checked_add(duration.whole_seconds())
            .ok_or(TokenError::TimeFormat)?;

        let claims = SessionClaims {
            iss: self.issuer.clone(),
            iat: rfc3339_from_unix(now_unix_seconds)?,
            nbf: rfc3339_from_unix(now_unix_seconds)?,
            exp: rfc3339_from_unix(exp_unix)?,
            user_id: Some(user_id.to_string()),
        };
        let payload = serde_json::to_vec(&claims).map_err(|_| TokenError::Signing)?;
        let token = PublicToken::sign(&self.secret_key, &payload, None, None)
            .map_err(|_| TokenError::Signing)?;

        Ok(IssuedToken {
            token,
            expires_at: OffsetDateTime::from_unix_timestamp(exp_unix)
                .map_err(|_| TokenError::TimeFormat)?,
        })
    }

    /// Verify a token and return the account it was issued for.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InvalidToken`] on any signature, claim, or time-window failure.
    pub fn verify_token(&self, token: &str) -> Result<Uuid, TokenError> {
        self.verify_token_at(token, OffsetDateTime::now_utc().unix_timestamp())
    }

    /// Verify a token against `now_unix_seconds`.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InvalidToken`] on any signature, claim, or time-window failure.
    pub fn verify_token_at(&self, token: &str, now_unix_seconds: i64) -> Result<Uuid, TokenError> {
        let untrusted = UntrustedToken::<Public, V4>::try_from(token)
            .map_err(|_| TokenError::InvalidToken)?;
        let trusted = PublicToken::verify(&self.public_key, &untrusted, None, None)
            .map_err(|_| TokenError::InvalidToken)?;
        let claims: SessionClaims =
            serde_json::from_str(trusted.payload()).map_err(|_| TokenError::InvalidToken)?;

        self.validate_claims(&claims, now_unix_seconds)?;

        let user_id = claims.user_id.ok_or(TokenError::InvalidToken)?;
        Uuid::parse_str(&user_id).map_err(|_| TokenError::InvalidToken)
    }

    fn validate_claims(&self, claims: &SessionClaims, now_unix_seconds: i64) -> Result<(), TokenError> {
        if claims.iss != self.issuer {
            return Err(TokenError::InvalidToken);
        }

        let nbf = unix_from_rfc3339(&claims.nbf).map_err(|_| TokenError::InvalidToken)?;
        let exp = unix_from_rfc3339(&claims.exp).map_err(|_| TokenError::InvalidToken)?;
        unix_from_rfc3339(&claims.iat).map_err(|_| TokenError::InvalidToken)?;

        if now_unix_seconds < nbf || now_unix_seconds >= exp {
            return Err(TokenError::InvalidToken);
        }

        Ok(())
    }
}

/// Convert a unix timestamp to RFC3339.
///
/// # Errors
///
/// Returns an error if the timestamp is out of range.
pub fn rfc3339_from_unix(unix_seconds: i64) -> Result<String, TokenError> {
    let dt =
        OffsetDateTime::from_unix_timestamp(unix_seconds).map_err(|_| TokenError::TimeFormat)?;
    dt.format(&Rfc3339).map_err(|_| TokenError::TimeFormat)
}

/// Parse an RFC3339 timestamp into unix seconds.
///
/// # Errors
///
/// Returns an error if parsing fails.
pub fn unix_from_rfc3339(value: &str) -> Result<i64, TokenError> {
    let dt = OffsetDateTime::parse(value, &Rfc3339).map_err(|_| TokenError::TimeFormat)?;
    Ok(dt.unix_timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    fn maker(seed: u8) -> Result<TokenMaker, TokenError> {
        TokenMaker::from_signing_key(&SigningKey::from_bytes(&[seed; 32]), DEFAULT_ISSUER)
    }

    fn sign_raw(claims: &SessionClaims, seed: u8) -> Result<String, TokenError> {
        let signing_key = SigningKey::from_bytes(&[seed; 32]);
        let secret_key = AsymmetricSecretKey::<V4>::from(&signing_key.to_keypair_bytes())
            .map_err(|_| TokenError::Signing)?;
        let payload = serde_json::to_vec(claims).map_err(|_| TokenError::Signing)?;
        PublicToken::sign(&secret_key, &payload, None, None).map_err(|_| TokenError::Signing)
    }

    #[test]
    fn sign_and_verify_round_trip() -> Result<(), TokenError> {
        let maker = maker(7)?;
        let user_id = Uuid::new_v4();

        let issued = maker.create_token_at(user_id, Duration::minutes(1), NOW)?;
        assert!(issued.token.starts_with("v4.public."));
        assert_eq!(issued.expires_at.unix_timestamp(), NOW + 60);

        let verified = maker.verify_token_at(&issued.token, NOW + 30)?;
        assert_eq!(verified, user_id);
        Ok(())
    }

    #[test]
    fn verify_with_current_clock() -> Result<(), TokenError> {
        let maker = maker(7)?;
        let user_id = Uuid::new_v4();
        let issued = maker.create_token(user_id, Duration::minutes(1))?;
        assert_eq!(maker.verify_token(&issued.token)?, user_id);
        Ok(())
    }

    #[test]
    fn negative_duration_is_already_expired() -> Result<(), TokenError> {
        let maker = maker(7)?;
        let issued = maker.create_token(Uuid::new_v4(), Duration::seconds(-60))?;
        assert!(matches!(
            maker.verify_token(&issued.token),
            Err(TokenError::InvalidToken)
        ));
        Ok(())
    }

    #[test]
    fn zero_duration_is_already_expired() -> Result<(), TokenError> {
        let maker = maker(7)?;
        let issued = maker.create_token_at(Uuid::new_v4(), Duration::ZERO, NOW)?;
        assert!(maker.verify_token_at(&issued.token, NOW).is_err());
        Ok(())
    }

    #[test]
    fn expiry_is_exclusive() -> Result<(), TokenError> {
        let maker = maker(7)?;
        let issued = maker.create_token_at(Uuid::new_v4(), Duration::minutes(1), NOW)?;
        assert!(maker.verify_token_at(&issued.token, NOW + 59).is_ok());
        assert!(maker.verify_token_at(&issued.token, NOW + 60).is_err());
        Ok(())
    }

    #[test]
    fn rejects_before_not_before() -> Result<(), TokenError> {
        let maker = maker(7)?;
        let issued = maker.create_token_at(Uuid::new_v4(), Duration::minutes(1), NOW)?;
        assert!(maker.verify_token_at(&issued.token, NOW - 1).is_err());
        Ok(())
    }

    #[test]
    fn rejects_token_from_other_keypair() -> Result<(), TokenError> {
        let verifier = maker(7)?;
        let other = maker(9)?;
        let issued = other.create_token_at(Uuid::new_v4(), Duration::minutes(1), NOW)?;
        assert!(matches!(
            verifier.verify_token_at(&issued.token, NOW),
            Err(TokenError::InvalidToken)
        ));
        Ok(())
    }

    #[test]
    fn unrepresentable_expiry_fails_to_sign() -> Result<(), TokenError> {
        let maker = maker(7)?;
        let result = maker.create_token_at(Uuid::new_v4(), Duration::minutes(10_000_000_000), NOW);
        assert!(matches!(result, Err(TokenError::TimeFormat)));
        Ok(())
    }

    #[test]
    fn rejects_tampered_token() -> Result<(), TokenError> {
        let maker = maker(7)?;
        let issued = maker.create_token_at(Uuid::new_v4(), Duration::minutes(1), NOW)?;
        let mut tampered = issued.token.clone();
        let last = tampered.pop().map_or('A', |c| if c == 'A' { 'B' } else { 'A' });
        tampered.push(last);
        assert!(maker.verify_token_at(&tampered, NOW).is_err());
        assert!(maker.verify_token_at("not-a-token", NOW).is_err());
        Ok(())
    }

    #[test]
    fn rejects_missing_user_id() -> Result<(), TokenError> {
        let maker = maker(7)?;
        let claims = SessionClaims {
            iss: DEFAULT_ISSUER.to_string(),
            iat: rfc3339_from_unix(NOW)?,
            nbf: rfc3339_from_unix(NOW)?,
            exp: rfc3339_from_unix(NOW + 60)?,
            user_id: None,
        };
        let token = sign_raw(&claims, 7)?;
        assert!(matches!(
            maker.verify_token_at(&token, NOW),
            Err(TokenError::InvalidToken)
        ));
        Ok(())
    }

    #[test]
    fn rejects_malformed_user_id() -> Result<(), TokenError> {
        let maker = maker(7)?;
        let claims = SessionClaims {
            iss: DEFAULT_ISSUER.to_string(),
            iat: rfc3339_from_unix(NOW)?,
            nbf: rfc3339_from_unix(NOW)?,
            exp: rfc3339_from_unix(NOW + 60)?,
            user_id: Some("not-a-uuid".to_string()),
        };
        let token = sign_raw(&claims, 7)?;
        assert!(maker.verify_token_at(&token, NOW).is_err());
        Ok(())
    }

    #[test]
    fn rejects_foreign_issuer() -> Result<(), TokenError> {
        let maker = maker(7)?;
        let claims = SessionClaims {
            iss: "someone-else".to_string(),
            iat: rfc3339_from_unix(NOW)?,
            nbf: rfc3339_from_unix(NOW)?,
            exp: rfc3339_from_unix(NOW + 60)?,
            user_id: Some(Uuid::new_v4().to_string()),
        };
        let token = sign_raw(&claims, 7)?;
        assert!(maker.verify_token_at(&token, NOW).is_err());
        Ok(())
    }

    #[test]
    fn from_hex_accepts_seed_and_keypair() -> Result<(), TokenError> {
        let signing_key = SigningKey::from_bytes(&[3u8; 32]);
        let seed_hex = SecretString::from(hex::encode(signing_key.to_bytes()));
        let keypair_hex = SecretString::from(hex::encode(signing_key.to_keypair_bytes()));

        let from_seed = TokenMaker::from_hex(&seed_hex, DEFAULT_ISSUER)?;
        let from_keypair = TokenMaker::from_hex(&keypair_hex, DEFAULT_ISSUER)?;

        let user_id = Uuid::new_v4();
        let issued = from_seed.create_token_at(user_id, Duration::minutes(5), NOW)?;
        assert_eq!(from_keypair.verify_token_at(&issued.token, NOW)?, user_id);
        Ok(())
    }

    #[test]
    fn from_hex_rejects_bad_material() {
        let wrong_length = "00".repeat(48);
        for bad in ["zz", "abcd", wrong_length.as_str()] {
            let result = TokenMaker::from_hex(&SecretString::from(bad.to_string()), DEFAULT_ISSUER);
            assert!(matches!(result, Err(TokenError::Key(_))), "accepted {bad}");
        }
    }

    #[test]
    fn from_hex_rejects_mismatched_keypair() {
        let signing_key = SigningKey::from_bytes(&[3u8; 32]);
        let other = SigningKey::from_bytes(&[4u8; 32]);
        let mut keypair = signing_key.to_keypair_bytes();
        keypair[32..].copy_from_slice(&other.verifying_key().to_bytes());
        let result = TokenMaker::from_hex(&SecretString::from(hex::encode(keypair)), DEFAULT_ISSUER);
        assert!(matches!(result, Err(TokenError::Key(_))));
    }
}
