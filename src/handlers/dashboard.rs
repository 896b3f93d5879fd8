use actix_web::{web, HttpResponse, Result, ResponseError};
use serde_json::json;
use crate::models::*;
use crate::services::DashboardService;

#[utoipa::path(
    get,
    path = "/dashboard/summary",
    tag = "dashboard",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Front desk overview for today", body = DashboardSummary),
        (status = 403, description = "Staff only", body = ApiError)
    )
)]
pub async fn summary(
    dashboard_service: web::Data<DashboardService>,
    user: AuthUser,
) -> Result<HttpResponse> {
    match dashboard_service.summary(&user).await {
        Ok(summary) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": summary
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn dashboard_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/dashboard").route("/summary", web::get().to(summary)));
}
