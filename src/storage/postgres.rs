//! PostgreSQL backend.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use sqlx::{postgres::PgRow, Connection, PgPool, Row};
use time::OffsetDateTime;
use tracing::Instrument;
use uuid::Uuid;

use super::{Account, AuthStore, ConsumeOutcome, CreateAccountOutcome, CreateCodeOutcome, OneTimeCode};

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the embedded schema migrations.
    ///
    /// # Errors
    /// Returns an error if any migration fails.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("failed to run database migrations")
    }
}

fn db_span(operation: &'static str, statement: &'static str) -> tracing::Span {
    tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = operation,
        db.statement = statement
    )
}

fn account_from_row(row: &PgRow) -> Account {
    Account {
        id: row.get("id"),
        email: row.get("email"),
        username: row.get("username"),
        profile_pic_url: row.get("profile_pic_url"),
        verified: row.get("verified"),
    }
}

fn code_from_row(row: &PgRow) -> OneTimeCode {
    OneTimeCode {
        id: row.get("id"),
        user_id: row.get("user_id"),
        code: row.get("code"),
        created_at: row.get("created_at"),
        expires_at: row.get("expires_at"),
        used: row.get("used"),
    }
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

#[async_trait]
impl AuthStore for PgStore {
    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>> {
        let query = r"
            SELECT id, email, username, profile_pic_url, verified
            FROM users
            WHERE email = $1
        ";
        let row = sqlx::query(query)
            .bind(email)
            .fetch_optional(&self.pool)
            .instrument(db_span("SELECT", query))
            .await
            .context("failed to lookup user by email")?;

        Ok(row.as_ref().map(account_from_row))
    }

    async fn find_account_by_id(&self, id: Uuid) -> Result<Option<Account>> {
        let query = r"
            SELECT id, email, username, profile_pic_url, verified
            FROM users
            WHERE id = $1
        ";
        let row = sqlx::query(query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(db_span("SELECT", query))
            .await
            .context("failed to lookup user by id")?;

        Ok(row.as_ref().map(account_from_row))
    }

    async fn create_account(&self, email: &str) -> Result<CreateAccountOutcome> {
        let query = r"
            INSERT INTO users (email)
            VALUES ($1)
            RETURNING id, email, username, profile_pic_url, verified
        ";
        let row = sqlx::query(query)
            .bind(email)
            .fetch_one(&self.pool)
            .instrument(db_span("INSERT", query))
            .await;

        match row {
            Ok(row) => Ok(CreateAccountOutcome::Created(account_from_row(&row))),
            Err(err) if is_unique_violation(&err) => Ok(CreateAccountOutcome::Conflict),
            Err(err) => Err(err).context("failed to insert user"),
        }
    }

    async fn create_code(
        &self,
        user_id: Uuid,
        code: &str,
        expires_at: OffsetDateTime,
    ) -> Result<CreateCodeOutcome> {
        let query = r"
            INSERT INTO user_codes (user_id, code, expires_at)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, code, created_at, expires_at, used
        ";
        let row = sqlx::query(query)
            .bind(user_id)
            .bind(code)
            .bind(expires_at)
            .fetch_one(&self.pool)
            .instrument(db_span("INSERT", query))
            .await;

        match row {
            Ok(row) => Ok(CreateCodeOutcome::Created(code_from_row(&row))),
            Err(err) if is_unique_violation(&err) => Ok(CreateCodeOutcome::Duplicate),
            Err(err) => Err(err).context("failed to insert user code"),
        }
    }

    async fn fetch_code(&self, user_id: Uuid, code: &str) -> Result<Option<OneTimeCode>> {
        let query = r"
            SELECT id, user_id, code, created_at, expires_at, used
            FROM user_codes
            WHERE user_id = $1
              AND code = $2
        ";
        let row = sqlx::query(query)
            .bind(user_id)
            .bind(code)
            .fetch_optional(&self.pool)
            .instrument(db_span("SELECT", query))
            .await
            .context("failed to lookup user code")?;

        Ok(row.as_ref().map(code_from_row))
    }

    async fn consume_code(
        &self,
        code_id: Uuid,
        user_id: Uuid,
        now: OffsetDateTime,
    ) -> Result<ConsumeOutcome> {
        // Dropping `tx` without commit rolls back both updates.
        let mut tx = self
            .pool
            .begin()
            .await
            .context("begin redemption transaction")?;

        // The row lock serializes concurrent redemptions; losers re-check the
        // predicate after the winner commits and match zero rows.
        let query = r"
            UPDATE user_codes
            SET used = TRUE
            WHERE id = $1
              AND user_id = $2
              AND used = FALSE
              AND expires_at > $3
            RETURNING id
        ";
        let marked = sqlx::query(query)
            .bind(code_id)
            .bind(user_id)
            .bind(now)
            .fetch_optional(&mut *tx)
            .instrument(db_span("UPDATE", query))
            .await
            .context("failed to mark code used")?;

        if marked.is_none() {
            tx.rollback().await.context("rollback redemption")?;
            return Ok(ConsumeOutcome::Lost);
        }

        let query = r"
            UPDATE users
            SET verified = TRUE,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, email, username, profile_pic_url, verified
        ";
        let row = sqlx::query(query)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .instrument(db_span("UPDATE", query))
            .await
            .context("failed to verify user")?;

        let Some(row) = row else {
            return Err(anyhow!("user {user_id} vanished during redemption"));
        };
        let account = account_from_row(&row);

        tx.commit().await.context("commit redemption transaction")?;

        Ok(ConsumeOutcome::Consumed(account))
    }

    async fn ping(&self) -> Result<()> {
        let acquire_span = tracing::info_span!(
            "db.acquire",
            db.system = "postgresql",
            db.operation = "ACQUIRE"
        );
        let mut conn = self
            .pool
            .acquire()
            .instrument(acquire_span)
            .await
            .context("failed to acquire database connection")?;
        let ping_span =
            tracing::info_span!("db.ping", db.system = "postgresql", db.operation = "PING");
        conn.ping()
            .instrument(ping_span)
            .await
            .context("failed to ping database")
    }

    fn backend(&self) -> &'static str {
        "postgresql"
    }
}
