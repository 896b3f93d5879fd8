use actix_web::{web, HttpResponse, Result, ResponseError};
use serde_json::json;
use crate::models::*;
use crate::services::AuditService;

#[utoipa::path(
    post,
    path = "/audit-trail",
    tag = "audit",
    request_body = CreateAuditEntryRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Entry appended", body = AuditEntryResponse)
    )
)]
pub async fn record_action(
    audit_service: web::Data<AuditService>,
    user: AuthUser,
    request: web::Json<CreateAuditEntryRequest>,
) -> Result<HttpResponse> {
    match audit_service
        .record_client_action(&user, request.into_inner())
        .await
    {
        Ok(entry) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": entry
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/audit-trail",
    tag = "audit",
    params(AuditQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Audit entries, newest first, paginated"),
        (status = 403, description = "Admin only", body = ApiError)
    )
)]
pub async fn list_entries(
    audit_service: web::Data<AuditService>,
    user: AuthUser,
    query: web::Query<AuditQuery>,
) -> Result<HttpResponse> {
    if let Err(e) = user.require_admin() {
        return Ok(e.error_response());
    }
    match audit_service.list(&query.into_inner()).await {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": page
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn audit_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/audit-trail")
            .route("", web::post().to(record_action))
            .route("", web::get().to(list_entries))
    );
}
