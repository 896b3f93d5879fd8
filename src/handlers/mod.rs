pub mod account;
pub mod attendance;
pub mod audit;
pub mod auth;
pub mod dashboard;
pub mod health;
pub mod me;
pub mod member;
pub mod session;
pub mod trainer;
pub mod transaction;

pub use account::account_config;
pub use attendance::attendance_config;
pub use audit::audit_config;
pub use auth::auth_config;
pub use dashboard::dashboard_config;
pub use health::health_config;
pub use me::me_config;
pub use member::member_config;
pub use session::session_config;
pub use trainer::trainer_config;
pub use transaction::transaction_config;

use crate::error::AppError;
use crate::models::AuthUser;
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload};
use std::future::{Ready, ready};

/// Handlers take the caller as an argument; the auth middleware has already
/// verified the token and stored it in the request.
impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<AuthUser>()
                .cloned()
                .ok_or_else(|| AppError::AuthError("Missing access token".to_string())),
        )
    }
}
