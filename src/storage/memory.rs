//! Process-local backend for development (`--dsn memory://`) and tests.
//!
//! A single mutex guards all state, so every operation (including the
//! consume-and-verify pair) is atomic with respect to other callers.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
#[cfg(test)]
use std::sync::atomic::{AtomicBool, Ordering};
use time::OffsetDateTime;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{Account, AuthStore, ConsumeOutcome, CreateAccountOutcome, CreateCodeOutcome, OneTimeCode};

#[derive(Debug, Default)]
struct State {
    accounts: HashMap<Uuid, Account>,
    emails: HashMap<String, Uuid>,
    codes: HashMap<Uuid, OneTimeCode>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    #[cfg(test)]
    fail_commits: AtomicBool,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `consume_code` fail at commit time, leaving no
    /// partial state behind.
    #[cfg(test)]
    pub(crate) fn fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl AuthStore for MemoryStore {
    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>> {
        let state = self.state.lock().await;
        Ok(state
            .emails
            .get(email)
            .and_then(|id| state.accounts.get(id))
            .cloned())
    }

    async fn find_account_by_id(&self, id: Uuid) -> Result<Option<Account>> {
        Ok(self.state.lock().await.accounts.get(&id).cloned())
    }

    async fn create_account(&self, email: &str) -> Result<CreateAccountOutcome> {
        let mut state = self.state.lock().await;
        if state.emails.contains_key(email) {
            return Ok(CreateAccountOutcome::Conflict);
        }

        let account = Account {
            id: Uuid::now_v7(),
            email: email.to_string(),
            username: None,
            profile_pic_url: None,
            verified: false,
        };
        state.emails.insert(email.to_string(), account.id);
        state.accounts.insert(account.id, account.clone());

        Ok(CreateAccountOutcome::Created(account))
    }

    async fn create_code(
        &self,
        user_id: Uuid,
        code: &str,
        expires_at: OffsetDateTime,
    ) -> Result<CreateCodeOutcome> {
        let mut state = self.state.lock().await;
        if !state.accounts.contains_key(&user_id) {
            return Err(anyhow!("foreign key violation: user {user_id} does not exist"));
        }
        if state
            .codes
            .values()
            .any(|existing| existing.user_id == user_id && existing.code == code)
        {
            return Ok(CreateCodeOutcome::Duplicate);
        }

        let record = OneTimeCode {
            id: Uuid::now_v7(),
            user_id,
            code: code.to_string(),
            created_at: OffsetDateTime::now_utc(),
            expires_at,
            used: false,
        };
        state.codes.insert(record.id, record.clone());

        Ok(CreateCodeOutcome::Created(record))
    }

    async fn fetch_code(&self, user_id: Uuid, code: &str) -> Result<Option<OneTimeCode>> {
        let state = self.state.lock().await;
        Ok(state
            .codes
            .values()
            .find(|record| record.user_id == user_id && record.code == code)
            .cloned())
    }

    async fn consume_code(
        &self,
        code_id: Uuid,
        user_id: Uuid,
        now: OffsetDateTime,
    ) -> Result<ConsumeOutcome> {
        let mut state = self.state.lock().await;

        let redeemable = state.codes.get(&code_id).is_some_and(|record| {
            record.user_id == user_id && !record.used && now < record.expires_at
        });
        if !redeemable {
            return Ok(ConsumeOutcome::Lost);
        }
        if !state.accounts.contains_key(&user_id) {
            return Err(anyhow!("user {user_id} vanished during redemption"));
        }
        // Nothing has been written yet, so failing here leaves both rows untouched.
        #[cfg(test)]
        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(anyhow!("commit redemption transaction: simulated failure"));
        }

        if let Some(record) = state.codes.get_mut(&code_id) {
            record.used = true;
        }
        let account = state
            .accounts
            .get_mut(&user_id)
            .map(|account| {
                account.verified = true;
                account.clone()
            })
            .ok_or_else(|| anyhow!("user {user_id} vanished during redemption"))?;

        Ok(ConsumeOutcome::Consumed(account))
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
