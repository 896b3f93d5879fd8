use actix_web::{web, HttpResponse, Result, ResponseError};
use serde_json::json;
use crate::models::*;
use crate::services::AccountService;

#[utoipa::path(
    post,
    path = "/accounts",
    tag = "accounts",
    request_body = CreateAccountRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Account created", body = AccountResponse),
        (status = 403, description = "Admin only", body = ApiError),
        (status = 409, description = "Username taken", body = ApiError)
    )
)]
pub async fn create_account(
    account_service: web::Data<AccountService>,
    user: AuthUser,
    request: web::Json<CreateAccountRequest>,
) -> Result<HttpResponse> {
    match account_service.create_account(&user, request.into_inner()).await {
        Ok(account) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": account
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/accounts",
    tag = "accounts",
    params(AccountQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Accounts, paginated"),
        (status = 403, description = "Admin only", body = ApiError)
    )
)]
pub async fn list_accounts(
    account_service: web::Data<AccountService>,
    user: AuthUser,
    query: web::Query<AccountQuery>,
) -> Result<HttpResponse> {
    if let Err(e) = user.require_admin() {
        return Ok(e.error_response());
    }
    match account_service.list_accounts(&query.into_inner()).await {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": page
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/accounts/{id}/active",
    tag = "accounts",
    params(
        ("id" = i32, Path, description = "Account id")
    ),
    request_body = SetAccountActiveRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Account updated", body = AccountResponse),
        (status = 404, description = "Account not found", body = ApiError)
    )
)]
pub async fn set_account_active(
    account_service: web::Data<AccountService>,
    user: AuthUser,
    path: web::Path<i32>,
    request: web::Json<SetAccountActiveRequest>,
) -> Result<HttpResponse> {
    match account_service
        .set_active(&user, path.into_inner(), request.into_inner())
        .await
    {
        Ok(account) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": account
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn account_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/accounts")
            .route("", web::post().to(create_account))
            .route("", web::get().to(list_accounts))
            .route("/{id}/active", web::put().to(set_account_active))
    );
}
