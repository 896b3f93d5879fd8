use actix_web::{web, HttpResponse, Result, ResponseError};
use serde_json::json;
use crate::models::*;
use crate::services::{DashboardService, SessionService};

#[utoipa::path(
    get,
    path = "/me/profile",
    tag = "member portal",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Membership, booking allowance and gym occupancy", body = MemberPortalProfile),
        (status = 403, description = "Member accounts only", body = ApiError)
    )
)]
pub async fn profile(
    dashboard_service: web::Data<DashboardService>,
    user: AuthUser,
) -> Result<HttpResponse> {
    match dashboard_service.member_profile(&user).await {
        Ok(profile) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": profile
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/me/attendance",
    tag = "member portal",
    params(PaginationParams),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Own attendance history, paginated")
    )
)]
pub async fn attendance(
    dashboard_service: web::Data<DashboardService>,
    user: AuthUser,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    match dashboard_service
        .member_attendance(&user, query.page, query.page_size)
        .await
    {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": page
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/me/sessions",
    tag = "member portal",
    params(SessionQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Own bookings, paginated")
    )
)]
pub async fn sessions(
    session_service: web::Data<SessionService>,
    user: AuthUser,
    query: web::Query<SessionQuery>,
) -> Result<HttpResponse> {
    if let Err(e) = user.own_member_id() {
        return Ok(e.error_response());
    }
    match session_service.list(&user, &query.into_inner()).await {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": page
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn me_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/me")
            .route("/profile", web::get().to(profile))
            .route("/attendance", web::get().to(attendance))
            .route("/sessions", web::get().to(sessions))
    );
}
