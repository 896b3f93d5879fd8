use crate::entities::Role;
use crate::error::{AppError, AppResult};
use crate::models::AuthUser;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // account id
    pub username: String,
    pub role: Role,
    pub member_id: Option<i32>,
    pub trainer_id: Option<i32>,
    pub jti: String,
    pub exp: i64,
    pub iat: i64,
    pub token_type: String, // "access" or "refresh"
}

impl Claims {
    pub fn account_id(&self) -> AppResult<i32> {
        self.sub
            .parse::<i32>()
            .map_err(|_| AppError::AuthError("Malformed token subject".to_string()))
    }

    pub fn to_auth_user(&self) -> AppResult<AuthUser> {
        Ok(AuthUser {
            account_id: self.account_id()?,
            username: self.username.clone(),
            role: self.role,
            member_id: self.member_id,
            trainer_id: self.trainer_id,
        })
    }
}

#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_expires_in: i64,
    refresh_token_expires_in: i64,
}

impl JwtService {
    pub fn new(secret: &str, access_expires_in: i64, refresh_expires_in: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_token_expires_in: access_expires_in,
            refresh_token_expires_in: refresh_expires_in,
        }
    }

    fn generate(&self, user: &AuthUser, token_type: &str, expires_in: i64) -> AppResult<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(expires_in);

        let claims = Claims {
            sub: user.account_id.to_string(),
            username: user.username.clone(),
            role: user.role,
            member_id: user.member_id,
            trainer_id: user.trainer_id,
            jti: uuid::Uuid::new_v4().to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            token_type: token_type.to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(AppError::JwtError)
    }

    pub fn generate_access_token(&self, user: &AuthUser) -> AppResult<String> {
        self.generate(user, "access", self.access_token_expires_in)
    }

    pub fn generate_refresh_token(&self, user: &AuthUser) -> AppResult<String> {
        self.generate(user, "refresh", self.refresh_token_expires_in)
    }

    pub fn verify_token(&self, token: &str) -> AppResult<Claims> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(AppError::JwtError)
    }

    pub fn verify_access_token(&self, token: &str) -> AppResult<Claims> {
        let claims = self.verify_token(token)?;

        if claims.token_type != "access" {
            return Err(AppError::AuthError("Invalid access token type".to_string()));
        }

        Ok(claims)
    }

    pub fn verify_refresh_token(&self, token: &str) -> AppResult<Claims> {
        let claims = self.verify_token(token)?;

        if claims.token_type != "refresh" {
            return Err(AppError::AuthError("Invalid refresh token type".to_string()));
        }

        Ok(claims)
    }

    pub fn get_access_token_expires_in(&self) -> i64 {
        self.access_token_expires_in
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i32, username: &str, role: Role) -> AuthUser {
        AuthUser {
            account_id: id,
            username: username.to_string(),
            role,
            member_id: None,
            trainer_id: None,
        }
    }

    #[test]
    fn test_access_token_carries_role() {
        let jwt = JwtService::new("test-secret", 60, 120);
        let token = jwt.generate_access_token(&user(7, "cashier1", Role::Cashier)).unwrap();
        let claims = jwt.verify_access_token(&token).unwrap();
        assert_eq!(claims.account_id().unwrap(), 7);
        assert_eq!(claims.role, Role::Cashier);
        assert_eq!(claims.username, "cashier1");
    }

    #[test]
    fn test_member_link_survives_round_trip() {
        let jwt = JwtService::new("test-secret", 60, 120);
        let mut member = user(3, "ana@example.com", Role::Member);
        member.member_id = Some(11);
        let token = jwt.generate_access_token(&member).unwrap();
        let auth = jwt.verify_access_token(&token).unwrap().to_auth_user().unwrap();
        assert_eq!(auth.member_id, Some(11));
        assert_eq!(auth.role, Role::Member);
    }

    #[test]
    fn test_refresh_token_is_not_an_access_token() {
        let jwt = JwtService::new("test-secret", 60, 120);
        let refresh = jwt.generate_refresh_token(&user(1, "admin", Role::Admin)).unwrap();
        assert!(jwt.verify_access_token(&refresh).is_err());
        assert!(jwt.verify_refresh_token(&refresh).is_ok());
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let a = JwtService::new("secret-a", 60, 120);
        let b = JwtService::new("secret-b", 60, 120);
        let token = a.generate_access_token(&user(1, "admin", Role::Admin)).unwrap();
        assert!(b.verify_access_token(&token).is_err());
    }
}
