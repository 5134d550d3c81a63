//! One-time code generation.

use anyhow::{Context, Result};
use base64ct::{Base64UrlUnpadded, Encoding};
use rand::{rngs::OsRng, RngCore};

/// Raw entropy per code, before encoding.
pub const CODE_BYTES: usize = 8;

/// Create a new one-time code for out-of-band delivery.
///
/// The value is URL-safe base64 without padding (11 characters for 8 bytes).
/// Uniqueness is probabilistic; redemption is what enforces validity.
///
/// # Errors
///
/// Returns an error if the operating system entropy source fails.
pub fn generate_code() -> Result<String> {
    let mut bytes = [0u8; CODE_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate one-time code")?;
    Ok(Base64UrlUnpadded::encode_string(&bytes))
}
