//! Passwordless authentication core.
//!
//! Flow: [`register`] resolves an email to an account and issues a one-time
//! code; [`redeem`] consumes that code, marks the account verified and signs
//! a session token; [`cookie`] packages the token for the HTTP response.

pub mod account;
pub mod code;
pub mod cookie;
pub mod email;
pub mod error;
pub mod redeem;
pub mod register;
pub mod state;
pub mod token;

pub use error::{AuthError, TokenError};
pub use redeem::{redeem, Redemption};
pub use register::{register, Registration};
pub use state::{AuthConfig, AuthState};
pub use token::{IssuedToken, TokenMaker};
