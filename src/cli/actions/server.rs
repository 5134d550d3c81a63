use crate::{
    api,
    auth::{AuthConfig, AuthState, TokenMaker},
    storage::{AuthStore, MemoryStore, PgStore},
};
use anyhow::{anyhow, Context, Result};
use secrecy::SecretString;
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tracing::{info, warn};
use url::Url;
use uuid::Uuid;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub environment: String,
    pub paseto_secret_key: SecretString,
    pub token_ttl_minutes: i64,
    pub code_ttl_seconds: i64,
    pub token_issuer: String,
}

/// Execute the server action.
///
/// # Errors
/// Returns an error if the signing key or token TTL is unusable, storage cannot be reached
/// or migrated, or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    // Unusable key material must stop the process before it binds the socket.
    let tokens = TokenMaker::from_hex(&args.paseto_secret_key, &args.token_issuer)
        .context("Invalid PASETO secret key")?;

    let config = AuthConfig::new()
        .with_code_ttl_seconds(args.code_ttl_seconds)
        .with_token_ttl_seconds(args.token_ttl_minutes.saturating_mul(60));

    // Expiries past what the claims can encode would only fail at redemption.
    tokens
        .create_token(Uuid::nil(), config.token_ttl())
        .context("Invalid token TTL")?;

    let store = connect(&args.dsn).await?;

    info!(
        environment = %args.environment,
        storage = store.backend(),
        issuer = tokens.issuer(),
        "starting xpose"
    );

    let state = Arc::new(AuthState::new(config, store, Arc::new(tokens)));

    api::new(args.port, state).await
}

/// Open the store named by `dsn` and apply migrations.
///
/// # Errors
/// Returns an error for unsupported schemes or if the database is unreachable.
pub async fn connect(dsn: &str) -> Result<Arc<dyn AuthStore>> {
    let url = Url::parse(dsn).context("Invalid DSN")?;

    match url.scheme() {
        "memory" => {
            warn!("using the in-memory store; data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        "postgres" | "postgresql" => {
            let pool = PgPoolOptions::new()
                .min_connections(1)
                .max_connections(5)
                .max_lifetime(Duration::from_secs(60 * 2))
                .test_before_acquire(true)
                .connect(dsn)
                .await
                .context("Failed to connect to database")?;

            let store = PgStore::new(pool);
            store.migrate().await?;

            Ok(Arc::new(store))
        }
        scheme => Err(anyhow!("Unsupported DSN scheme: {scheme}")),
    }
}
