//! Request and response payloads for the auth endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::storage::Account;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RegisterRequest {
    pub email: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RegisterResponse {
    pub code: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct VerifyRequest {
    #[serde(alias = "id")]
    pub user_id: Uuid,
    pub code: String,
}

/// Public account fields returned after verification and by `/auth/session`.
#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: Option<String>,
    pub email: String,
    pub profile_pic_url: Option<String>,
    pub verified: bool,
}

impl From<Account> for UserResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            username: account.username,
            email: account.email,
            profile_pic_url: account.profile_pic_url,
            verified: account.verified,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn verify_request_accepts_id_alias() -> Result<()> {
        let id = Uuid::new_v4();
        let request: VerifyRequest =
            serde_json::from_str(&format!(r#"{{"id":"{id}","code":"C1"}}"#))?;
        assert_eq!(request.user_id, id);
        assert_eq!(request.code, "C1");
        Ok(())
    }

    #[test]
    fn user_response_serializes_nulls() -> Result<()> {
        let response = UserResponse {
            id: Uuid::nil(),
            username: None,
            email: "a@example.com".to_string(),
            profile_pic_url: None,
            verified: true,
        };
        let value = serde_json::to_value(&response)?;
        assert!(value["username"].is_null());
        assert!(value["profile_pic_url"].is_null());
        assert_eq!(value["verified"], true);
        Ok(())
    }
}
