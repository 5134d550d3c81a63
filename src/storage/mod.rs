//! Storage contract for accounts and one-time codes.
//!
//! The authentication core only talks to [`AuthStore`]. Two backends exist:
//! [`postgres::PgStore`] for deployments and [`memory::MemoryStore`] for local
//! development and tests. Both must make [`AuthStore::consume_code`] atomic:
//! the code flips to used and the account flips to verified together, or not
//! at all.

pub mod memory;
pub mod postgres;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub username: Option<String>,
    pub profile_pic_url: Option<String>,
    pub verified: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OneTimeCode {
    pub id: Uuid,
    pub user_id: Uuid,
    pub code: String,
    pub created_at: OffsetDateTime,
    pub expires_at: OffsetDateTime,
    pub used: bool,
}

/// Result of inserting a new account row.
#[derive(Debug)]
pub enum CreateAccountOutcome {
    Created(Account),
    /// The email is already taken (unique violation).
    Conflict,
}

/// Result of inserting a code row.
#[derive(Debug)]
pub enum CreateCodeOutcome {
    Created(OneTimeCode),
    /// The same code value already exists for this account.
    Duplicate,
}

/// Result of the atomic code consumption.
#[derive(Debug)]
pub enum ConsumeOutcome {
    /// Code marked used and account verified; carries the updated account.
    Consumed(Account),
    /// The code was already used or expired by the time the transaction ran.
    Lost,
}

#[async_trait]
pub trait AuthStore: Send + Sync {
    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>>;

    async fn find_account_by_id(&self, id: Uuid) -> Result<Option<Account>>;

    async fn create_account(&self, email: &str) -> Result<CreateAccountOutcome>;

    async fn create_code(
        &self,
        user_id: Uuid,
        code: &str,
        expires_at: OffsetDateTime,
    ) -> Result<CreateCodeOutcome>;

    async fn fetch_code(&self, user_id: Uuid, code: &str) -> Result<Option<OneTimeCode>>;

    /// Mark `code_id` used and verify `user_id` in one transaction, only if the
    /// code is still unused and `now` is strictly before its expiry.
    async fn consume_code(
        &self,
        code_id: Uuid,
        user_id: Uuid,
        now: OffsetDateTime,
    ) -> Result<ConsumeOutcome>;

    async fn ping(&self) -> Result<()>;

    /// Short backend name for health output.
    fn backend(&self) -> &'static str;
}
