use anyhow::{Context, Result};
use ed25519_dalek::SigningKey;
use rand::{rngs::OsRng, RngCore};

/// Hex-encoded keypair (seed followed by public key) and public key.
#[derive(Debug)]
pub struct KeyMaterial {
    pub secret_hex: String,
    pub public_hex: String,
}

/// # Errors
/// Returns an error if the system RNG fails.
pub fn generate() -> Result<KeyMaterial> {
    let mut seed = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut seed)
        .context("failed to generate signing key")?;
    let signing_key = SigningKey::from_bytes(&seed);

    Ok(KeyMaterial {
        secret_hex: hex::encode(signing_key.to_keypair_bytes()),
        public_hex: hex::encode(signing_key.verifying_key().to_bytes()),
    })
}

/// Print fresh key material for `XPOSE_PASETO_SECRET_KEY`.
///
/// # Errors
/// Returns an error if key generation fails.
pub fn execute() -> Result<()> {
    let keys = generate()?;
    println!("XPOSE_PASETO_SECRET_KEY={}", keys.secret_hex);
    println!("public key: {}", keys.public_hex);
    Ok(())
}
