//! Auth configuration and the shared state handed to every request.

use std::sync::Arc;
use time::Duration;

use super::token::TokenMaker;
use crate::storage::AuthStore;

const DEFAULT_CODE_TTL_SECONDS: i64 = 5 * 60;
const DEFAULT_TOKEN_TTL_SECONDS: i64 = 60 * 60;

#[derive(Clone, Debug)]
pub struct AuthConfig {
    code_ttl_seconds: i64,
    token_ttl_seconds: i64,
}

impl AuthConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            code_ttl_seconds: DEFAULT_CODE_TTL_SECONDS,
            token_ttl_seconds: DEFAULT_TOKEN_TTL_SECONDS,
        }
    }

    #[must_use]
    pub fn with_code_ttl_seconds(mut self, seconds: i64) -> Self {
        self.code_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.token_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn code_ttl(&self) -> Duration {
        Duration::seconds(self.code_ttl_seconds)
    }

    #[must_use]
    pub fn token_ttl(&self) -> Duration {
        Duration::seconds(self.token_ttl_seconds)
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-mostly dependencies shared across requests. The keypair never changes
/// after startup; the store is internally synchronized.
pub struct AuthState {
    config: AuthConfig,
    store: Arc<dyn AuthStore>,
    tokens: Arc<TokenMaker>,
}

impl AuthState {
    #[must_use]
    pub fn new(config: AuthConfig, store: Arc<dyn AuthStore>, tokens: Arc<TokenMaker>) -> Self {
        Self {
            config,
            store,
            tokens,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn store(&self) -> &dyn AuthStore {
        self.store.as_ref()
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenMaker {
        &self.tokens
    }
}
