use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

use crate::auth::token::DEFAULT_ISSUER;

pub const ARG_PASETO_SECRET_KEY: &str = "paseto-secret-key";
pub const ARG_TOKEN_TTL_MINUTES: &str = "token-ttl-minutes";
pub const ARG_CODE_TTL_SECONDS: &str = "code-ttl-seconds";
pub const ARG_TOKEN_ISSUER: &str = "token-issuer";

/// One year.
const MAX_TOKEN_TTL_MINUTES: i64 = 365 * 24 * 60;

#[derive(Debug)]
pub struct Options {
    pub paseto_secret_key: SecretString,
    pub token_ttl_minutes: i64,
    pub code_ttl_seconds: i64,
    pub token_issuer: String,
}

impl Options {
    /// # Errors
    /// Returns an error if the signing key is missing.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let paseto_secret_key = matches
            .get_one::<String>(ARG_PASETO_SECRET_KEY)
            .cloned()
            .map(SecretString::from)
            .context("missing required argument: --paseto-secret-key")?;

        Ok(Self {
            paseto_secret_key,
            token_ttl_minutes: matches
                .get_one::<i64>(ARG_TOKEN_TTL_MINUTES)
                .copied()
                .unwrap_or(60),
            code_ttl_seconds: matches
                .get_one::<i64>(ARG_CODE_TTL_SECONDS)
                .copied()
                .unwrap_or(300),
            token_issuer: matches
                .get_one::<String>(ARG_TOKEN_ISSUER)
                .cloned()
                .unwrap_or_else(|| DEFAULT_ISSUER.to_string()),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_PASETO_SECRET_KEY)
                .long(ARG_PASETO_SECRET_KEY)
                .help("Hex-encoded Ed25519 secret key used to sign session tokens")
                .long_help(
                    "Hex-encoded Ed25519 secret key used to sign session tokens: the 64-byte keypair (seed followed by public key) or the 32-byte seed. Generate one with --keygen.",
                )
                .env("XPOSE_PASETO_SECRET_KEY")
                .hide_env_values(true)
                .required_unless_present("keygen"),
        )
        .arg(
            Arg::new(ARG_TOKEN_TTL_MINUTES)
                .long(ARG_TOKEN_TTL_MINUTES)
                .help("Session token TTL in minutes")
                .env("XPOSE_TOKEN_TTL_MINUTES")
                .default_value("60")
                .value_parser(clap::value_parser!(i64).range(1..=MAX_TOKEN_TTL_MINUTES)),
        )
        .arg(
            Arg::new(ARG_CODE_TTL_SECONDS)
                .long(ARG_CODE_TTL_SECONDS)
                .help("One-time code TTL in seconds")
                .env("XPOSE_CODE_TTL_SECONDS")
                .default_value("300")
                .value_parser(clap::value_parser!(i64).range(1..)),
        )
        .arg(
            Arg::new(ARG_TOKEN_ISSUER)
                .long(ARG_TOKEN_ISSUER)
                .help("Issuer claim embedded in session tokens")
                .env("XPOSE_TOKEN_ISSUER")
                .default_value(DEFAULT_ISSUER),
        )
}
