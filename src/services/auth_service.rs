use crate::entities::account_entity as accounts;
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::AuditService;
use crate::utils::*;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

const BAD_CREDENTIALS: &str = "Invalid username or password";

#[derive(Clone)]
pub struct AuthService {
    pool: DatabaseConnection,
    jwt_service: JwtService,
}

impl AuthService {
    pub fn new(pool: DatabaseConnection, jwt_service: JwtService) -> Self {
        Self { pool, jwt_service }
    }

    pub async fn login(&self, request: LoginRequest) -> AppResult<AuthResponse> {
        let username = request.username.trim().to_lowercase();

        let account = accounts::Entity::find()
            .filter(accounts::Column::Username.eq(username.as_str()))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::AuthError(BAD_CREDENTIALS.to_string()))?;

        // same message for unknown user, wrong password and disabled account
        if !verify_password(&request.password, &account.password_hash)? || !account.is_active {
            log::warn!("Rejected login for {username}");
            return Err(AppError::AuthError(BAD_CREDENTIALS.to_string()));
        }

        let user = AuthUser::from_account(&account);
        AuditService::record(&self.pool, &user, "auth.login", None).await?;
        self.issue_tokens(&user, account)
    }

    pub async fn refresh(&self, request: RefreshTokenRequest) -> AppResult<AuthResponse> {
        let claims = self.jwt_service.verify_refresh_token(&request.refresh_token)?;
        let account = accounts::Entity::find_by_id(claims.account_id()?)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::AuthError("Account no longer exists".to_string()))?;
        if !account.is_active {
            return Err(AppError::AuthError("Account is disabled".to_string()));
        }

        // re-read role and links so a changed account takes effect on refresh
        let user = AuthUser::from_account(&account);
        self.issue_tokens(&user, account)
    }

    pub async fn me(&self, user: &AuthUser) -> AppResult<AccountResponse> {
        let account = accounts::Entity::find_by_id(user.account_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Account not found".to_string()))?;
        Ok(account.into())
    }

    fn issue_tokens(&self, user: &AuthUser, account: accounts::Model) -> AppResult<AuthResponse> {
        let access_token = self.jwt_service.generate_access_token(user)?;
        let refresh_token = self.jwt_service.generate_refresh_token(user)?;
        Ok(AuthResponse {
            account: account.into(),
            access_token,
            refresh_token,
            expires_in: self.jwt_service.get_access_token_expires_in(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_utils::setup_test_db;
    use crate::entities::Role;
    use crate::services::AccountService;

    async fn setup() -> (AuthService, AccountService) {
        let db = setup_test_db().await;
        let jwt = JwtService::new("test-secret", 60, 120);
        let accounts = AccountService::new(db.clone());
        accounts
            .ensure_bootstrap_admin("Admin", "admin1234")
            .await
            .unwrap();
        (AuthService::new(db, jwt), accounts)
    }

    #[tokio::test]
    async fn test_login_and_refresh() {
        let (auth, _) = setup().await;
        let resp = auth
            .login(LoginRequest {
                username: "admin".into(),
                password: "admin1234".into(),
            })
            .await
            .unwrap();
        assert_eq!(resp.account.role, Role::Admin);

        let refreshed = auth
            .refresh(RefreshTokenRequest {
                refresh_token: resp.refresh_token.clone(),
            })
            .await
            .unwrap();
        assert_eq!(refreshed.account.id, resp.account.id);

        // an access token cannot be used to refresh
        assert!(
            auth.refresh(RefreshTokenRequest {
                refresh_token: resp.access_token,
            })
            .await
            .is_err()
        );
    }

    #[tokio::test]
    async fn test_wrong_password_and_disabled_account_look_the_same() {
        let (auth, accounts) = setup().await;
        let wrong = auth
            .login(LoginRequest {
                username: "admin".into(),
                password: "nope12345".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(wrong.to_string(), format!("Auth error: {BAD_CREDENTIALS}"));

        let admin = auth
            .login(LoginRequest {
                username: "admin".into(),
                password: "admin1234".into(),
            })
            .await
            .unwrap();
        let actor = AuthUser {
            account_id: admin.account.id,
            username: "admin".into(),
            role: Role::Admin,
            member_id: None,
            trainer_id: None,
        };
        let cashier = accounts
            .create_account(
                &actor,
                CreateAccountRequest {
                    username: "frontdesk".into(),
                    password: "frontdesk1".into(),
                    role: Role::Cashier,
                    member_id: None,
                    trainer_id: None,
                },
            )
            .await
            .unwrap();
        accounts
            .set_active(&actor, cashier.id, SetAccountActiveRequest { is_active: false })
            .await
            .unwrap();

        let disabled = auth
            .login(LoginRequest {
                username: "frontdesk".into(),
                password: "frontdesk1".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(disabled.to_string(), wrong.to_string());
    }
}
