//! # xpose
//!
//! Passwordless authentication service. A caller registers an email address
//! and receives a short-lived one-time code; redeeming that code exactly once
//! verifies the account and yields a PASETO `v4.public` session token, bound
//! into an `HttpOnly`, `Secure`, `SameSite=Strict` cookie.
//!
//! ## Layout
//!
//! - [`auth`]: code generation, account resolution, redemption, token signing
//!   and cookie packaging.
//! - [`storage`]: the [`storage::AuthStore`] contract with PostgreSQL and
//!   in-memory backends.
//! - [`api`]: axum router and handlers.
//! - [`cli`]: argument parsing, telemetry and server startup.
//!
//! Session tokens are verified offline against the public key. There is no
//! revocation list, so logout only clears the cookie.

pub mod api;
pub mod auth;
pub mod cli;
pub mod storage;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
