use crate::entities::{
    Role, account_entity as accounts, member_entity as members, trainer_entity as trainers,
};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::AuditService;
use crate::utils::*;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

#[derive(Clone)]
pub struct AccountService {
    pool: DatabaseConnection,
}

impl AccountService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    fn validate_username(username: &str) -> AppResult<String> {
        let username = username.trim().to_lowercase();
        if username.len() < 3 || username.len() > 255 {
            return Err(AppError::ValidationError(
                "Username must be between 3 and 255 characters".to_string(),
            ));
        }
        Ok(username)
    }

    /// Inserts an account on `conn`; shared by the admin endpoint and member enrolment.
    pub(crate) async fn insert_account<C: ConnectionTrait>(
        conn: &C,
        username: &str,
        password: &str,
        role: Role,
        member_id: Option<i32>,
        trainer_id: Option<i32>,
    ) -> AppResult<accounts::Model> {
        let username = Self::validate_username(username)?;
        validate_password(password)?;

        let taken = accounts::Entity::find()
            .filter(accounts::Column::Username.eq(username.as_str()))
            .count(conn)
            .await?;
        if taken > 0 {
            return Err(AppError::Conflict(format!(
                "Username {username} is already taken"
            )));
        }

        let now = Utc::now();
        let model = accounts::ActiveModel {
            username: Set(username),
            password_hash: Set(hash_password(password)?),
            role: Set(role),
            member_id: Set(member_id),
            trainer_id: Set(trainer_id),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(conn)
        .await?;
        Ok(model)
    }

    pub async fn create_account(
        &self,
        actor: &AuthUser,
        request: CreateAccountRequest,
    ) -> AppResult<AccountResponse> {
        actor.require_admin()?;

        let (member_id, trainer_id) = match request.role {
            Role::Member => {
                let id = request.member_id.ok_or_else(|| {
                    AppError::ValidationError("member_id is required for member accounts".into())
                })?;
                members::Entity::find_by_id(id)
                    .one(&self.pool)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("Member {id} not found")))?;
                (Some(id), None)
            }
            Role::Trainer => {
                let id = request.trainer_id.ok_or_else(|| {
                    AppError::ValidationError("trainer_id is required for trainer accounts".into())
                })?;
                trainers::Entity::find_by_id(id)
                    .one(&self.pool)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("Trainer {id} not found")))?;
                (None, Some(id))
            }
            Role::Admin | Role::Cashier => (None, None),
        };

        let account = Self::insert_account(
            &self.pool,
            &request.username,
            &request.password,
            request.role,
            member_id,
            trainer_id,
        )
        .await?;

        AuditService::record(
            &self.pool,
            actor,
            "account.create",
            Some(format!("{} ({})", account.username, account.role)),
        )
        .await?;
        Ok(account.into())
    }

    pub async fn list_accounts(
        &self,
        query: &AccountQuery,
    ) -> AppResult<PaginatedResponse<AccountResponse>> {
        let params = PaginationParams::new(query.page, query.page_size);
        let mut select = accounts::Entity::find();
        if let Some(role) = query.role {
            select = select.filter(accounts::Column::Role.eq(role));
        }
        let total = select.clone().count(&self.pool).await?;
        let items = select
            .order_by_asc(accounts::Column::Username)
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(&self.pool)
            .await?;
        Ok(PaginatedResponse::new(
            items.into_iter().map(Into::into).collect(),
            &params,
            total,
        ))
    }

    pub async fn set_active(
        &self,
        actor: &AuthUser,
        account_id: i32,
        request: SetAccountActiveRequest,
    ) -> AppResult<AccountResponse> {
        actor.require_admin()?;
        if actor.account_id == account_id && !request.is_active {
            return Err(AppError::ValidationError(
                "You cannot disable your own account".to_string(),
            ));
        }

        let mut model = accounts::Entity::find_by_id(account_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Account not found".to_string()))?
            .into_active_model();
        model.is_active = Set(request.is_active);
        model.updated_at = Set(Utc::now());
        let updated = model.update(&self.pool).await?;

        AuditService::record(
            &self.pool,
            actor,
            if request.is_active {
                "account.enable"
            } else {
                "account.disable"
            },
            Some(updated.username.clone()),
        )
        .await?;
        Ok(updated.into())
    }

    /// Creates the configured admin when the database has no admin yet.
    pub async fn ensure_bootstrap_admin(&self, username: &str, password: &str) -> AppResult<bool> {
        let admins = accounts::Entity::find()
            .filter(accounts::Column::Role.eq(Role::Admin))
            .count(&self.pool)
            .await?;
        if admins > 0 {
            return Ok(false);
        }

        let account =
            Self::insert_account(&self.pool, username, password, Role::Admin, None, None).await?;
        AuditService::record_system(
            &self.pool,
            "account.bootstrap_admin",
            Some(account.username.clone()),
        )
        .await?;
        log::info!("Created bootstrap admin account {}", account.username);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_utils::setup_test_db;

    fn admin() -> AuthUser {
        AuthUser {
            account_id: 1,
            username: "admin".into(),
            role: Role::Admin,
            member_id: None,
            trainer_id: None,
        }
    }

    #[tokio::test]
    async fn test_bootstrap_admin_runs_once() {
        let db = setup_test_db().await;
        let svc = AccountService::new(db);
        assert!(svc.ensure_bootstrap_admin("admin", "admin1234").await.unwrap());
        assert!(!svc.ensure_bootstrap_admin("other", "admin1234").await.unwrap());
    }

    #[tokio::test]
    async fn test_trainer_account_requires_existing_trainer() {
        let db = setup_test_db().await;
        let svc = AccountService::new(db);
        svc.ensure_bootstrap_admin("admin", "admin1234").await.unwrap();

        let err = svc
            .create_account(
                &admin(),
                CreateAccountRequest {
                    username: "coach".into(),
                    password: "coach1234".into(),
                    role: Role::Trainer,
                    member_id: None,
                    trainer_id: Some(99),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts_case_insensitively() {
        let db = setup_test_db().await;
        let svc = AccountService::new(db);
        svc.ensure_bootstrap_admin("admin", "admin1234").await.unwrap();

        let request = |name: &str| CreateAccountRequest {
            username: name.into(),
            password: "frontdesk1".into(),
            role: Role::Cashier,
            member_id: None,
            trainer_id: None,
        };
        svc.create_account(&admin(), request("FrontDesk")).await.unwrap();
        let err = svc
            .create_account(&admin(), request("frontdesk"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_cashier_cannot_create_accounts() {
        let db = setup_test_db().await;
        let svc = AccountService::new(db);
        let cashier = AuthUser {
            role: Role::Cashier,
            ..admin()
        };
        let err = svc
            .create_account(
                &cashier,
                CreateAccountRequest {
                    username: "sneaky".into(),
                    password: "sneaky123".into(),
                    role: Role::Admin,
                    member_id: None,
                    trainer_id: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden));
    }
}
