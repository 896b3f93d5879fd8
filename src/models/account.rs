use crate::entities::{Role, account_entity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "frontdesk")]
    pub username: String,
    #[schema(example = "frontdesk1")]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AccountResponse {
    pub id: i32,
    pub username: String,
    pub role: Role,
    pub member_id: Option<i32>,
    pub trainer_id: Option<i32>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub account: AccountResponse,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateAccountRequest {
    #[schema(example = "coach.mia")]
    pub username: String,
    pub password: String,
    pub role: Role,
    /// Required for the `member` role.
    pub member_id: Option<i32>,
    /// Required for the `trainer` role.
    pub trainer_id: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SetAccountActiveRequest {
    pub is_active: bool,
}

#[derive(Debug, Serialize, Deserialize, IntoParams, ToSchema)]
pub struct AccountQuery {
    pub role: Option<Role>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

impl From<account_entity::Model> for AccountResponse {
    fn from(m: account_entity::Model) -> Self {
        Self {
            id: m.id,
            username: m.username,
            role: m.role,
            member_id: m.member_id,
            trainer_id: m.trainer_id,
            is_active: m.is_active,
            created_at: m.created_at,
        }
    }
}

/// Authenticated caller, placed in request extensions by the auth middleware.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AuthUser {
    pub account_id: i32,
    pub username: String,
    pub role: Role,
    pub member_id: Option<i32>,
    pub trainer_id: Option<i32>,
}

impl AuthUser {
    pub fn require_any(&self, roles: &[Role]) -> crate::error::AppResult<()> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            Err(crate::error::AppError::Forbidden)
        }
    }

    pub fn require_staff(&self) -> crate::error::AppResult<()> {
        self.require_any(&[Role::Admin, Role::Cashier])
    }

    pub fn require_admin(&self) -> crate::error::AppResult<()> {
        self.require_any(&[Role::Admin])
    }

    /// Member id of a member-role caller.
    pub fn own_member_id(&self) -> crate::error::AppResult<i32> {
        match (self.role, self.member_id) {
            (Role::Member, Some(id)) => Ok(id),
            _ => Err(crate::error::AppError::Forbidden),
        }
    }

    pub fn from_account(m: &account_entity::Model) -> Self {
        Self {
            account_id: m.id,
            username: m.username.clone(),
            role: m.role,
            member_id: m.member_id,
            trainer_id: m.trainer_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller(role: Role) -> AuthUser {
        AuthUser {
            account_id: 1,
            username: "someone".into(),
            role,
            member_id: (role == Role::Member).then_some(5),
            trainer_id: None,
        }
    }

    #[test]
    fn test_role_guards() {
        assert!(caller(Role::Cashier).require_staff().is_ok());
        assert!(caller(Role::Trainer).require_staff().is_err());
        assert!(caller(Role::Cashier).require_admin().is_err());
        assert_eq!(caller(Role::Member).own_member_id().unwrap(), 5);
        assert!(caller(Role::Admin).own_member_id().is_err());
    }
}
