use actix_web::{web, HttpResponse, Result, ResponseError};
use serde_json::json;
use crate::models::*;
use crate::services::TransactionService;

#[utoipa::path(
    post,
    path = "/transactions",
    tag = "transactions",
    request_body = CreateTransactionRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Sale recorded with its OR number", body = TransactionResponse),
        (status = 400, description = "Invalid sale", body = ApiError)
    )
)]
pub async fn create_transaction(
    transaction_service: web::Data<TransactionService>,
    user: AuthUser,
    request: web::Json<CreateTransactionRequest>,
) -> Result<HttpResponse> {
    match transaction_service.create_sale(&user, request.into_inner()).await {
        Ok(receipt) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": receipt
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/transactions",
    tag = "transactions",
    params(TransactionQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Transactions, newest first, paginated")
    )
)]
pub async fn list_transactions(
    transaction_service: web::Data<TransactionService>,
    user: AuthUser,
    query: web::Query<TransactionQuery>,
) -> Result<HttpResponse> {
    if let Err(e) = user.require_staff() {
        return Ok(e.error_response());
    }
    match transaction_service.list(&query.into_inner()).await {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": page
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/transactions/summary",
    tag = "transactions",
    params(SalesSummaryQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Sales totals for one day", body = SalesSummary)
    )
)]
pub async fn sales_summary(
    transaction_service: web::Data<TransactionService>,
    user: AuthUser,
    query: web::Query<SalesSummaryQuery>,
) -> Result<HttpResponse> {
    if let Err(e) = user.require_staff() {
        return Ok(e.error_response());
    }
    let date = query.date.unwrap_or_else(local_today);
    match transaction_service.daily_summary(date).await {
        Ok(summary) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": summary
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/transactions/{or_number}",
    tag = "transactions",
    params(
        ("or_number" = String, Path, description = "Official receipt number, e.g. OR-20250901-00001")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Receipt", body = TransactionResponse),
        (status = 404, description = "Receipt not found", body = ApiError)
    )
)]
pub async fn get_transaction(
    transaction_service: web::Data<TransactionService>,
    user: AuthUser,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    if let Err(e) = user.require_staff() {
        return Ok(e.error_response());
    }
    match transaction_service.get_by_or_number(&path.into_inner()).await {
        Ok(receipt) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": receipt
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn transaction_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/transactions")
            .route("", web::post().to(create_transaction))
            .route("", web::get().to(list_transactions))
            .route("/summary", web::get().to(sales_summary))
            .route("/{or_number}", web::get().to(get_transaction))
    );
}
