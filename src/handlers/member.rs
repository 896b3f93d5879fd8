use actix_web::{web, HttpResponse, Result, ResponseError};
use serde_json::json;
use crate::entities::Role;
use crate::models::*;
use crate::services::MemberService;

#[utoipa::path(
    get,
    path = "/members",
    tag = "members",
    params(MemberQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Members with derived membership status, paginated"),
        (status = 403, description = "Staff only", body = ApiError)
    )
)]
pub async fn list_members(
    member_service: web::Data<MemberService>,
    user: AuthUser,
    query: web::Query<MemberQuery>,
) -> Result<HttpResponse> {
    if let Err(e) = user.require_staff() {
        return Ok(e.error_response());
    }
    match member_service.list_members(&query.into_inner()).await {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": page
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/members/status-summary",
    tag = "members",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Member counts per status", body = MemberStatusSummary)
    )
)]
pub async fn status_summary(
    member_service: web::Data<MemberService>,
    user: AuthUser,
) -> Result<HttpResponse> {
    if let Err(e) = user.require_staff() {
        return Ok(e.error_response());
    }
    match member_service.status_summary().await {
        Ok(summary) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": summary
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/members/{id}",
    tag = "members",
    params(
        ("id" = i32, Path, description = "Member id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Member", body = MemberResponse),
        (status = 404, description = "Member not found", body = ApiError)
    )
)]
pub async fn get_member(
    member_service: web::Data<MemberService>,
    user: AuthUser,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    // trainers look members up when reviewing bookings
    if let Err(e) = user.require_any(&[Role::Admin, Role::Cashier, Role::Trainer]) {
        return Ok(e.error_response());
    }
    match member_service.get_member(path.into_inner()).await {
        Ok(member) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": member
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/members",
    tag = "members",
    request_body = CreateMemberRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Member enrolled and membership sale recorded", body = MembershipSaleResponse),
        (status = 400, description = "Invalid member data", body = ApiError),
        (status = 409, description = "Email or RFID already registered", body = ApiError)
    )
)]
pub async fn create_member(
    member_service: web::Data<MemberService>,
    user: AuthUser,
    request: web::Json<CreateMemberRequest>,
) -> Result<HttpResponse> {
    match member_service.create_member(&user, request.into_inner()).await {
        Ok(sale) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": sale
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/members/{id}",
    tag = "members",
    params(
        ("id" = i32, Path, description = "Member id")
    ),
    request_body = UpdateMemberRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Member updated", body = MemberResponse),
        (status = 404, description = "Member not found", body = ApiError)
    )
)]
pub async fn update_member(
    member_service: web::Data<MemberService>,
    user: AuthUser,
    path: web::Path<i32>,
    request: web::Json<UpdateMemberRequest>,
) -> Result<HttpResponse> {
    match member_service
        .update_member(&user, path.into_inner(), request.into_inner())
        .await
    {
        Ok(member) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": member
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/members/{id}/renew",
    tag = "members",
    params(
        ("id" = i32, Path, description = "Member id")
    ),
    request_body = RenewMembershipRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Membership renewed and sale recorded", body = MembershipSaleResponse),
        (status = 404, description = "Member not found", body = ApiError)
    )
)]
pub async fn renew_membership(
    member_service: web::Data<MemberService>,
    user: AuthUser,
    path: web::Path<i32>,
    request: web::Json<RenewMembershipRequest>,
) -> Result<HttpResponse> {
    match member_service
        .renew_membership(&user, path.into_inner(), request.into_inner())
        .await
    {
        Ok(sale) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": sale
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/members/{id}/cancel",
    tag = "members",
    params(
        ("id" = i32, Path, description = "Member id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Membership cancelled", body = MemberResponse),
        (status = 409, description = "Already cancelled", body = ApiError)
    )
)]
pub async fn cancel_membership(
    member_service: web::Data<MemberService>,
    user: AuthUser,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    match member_service.cancel_membership(&user, path.into_inner()).await {
        Ok(member) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": member
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/members/{id}",
    tag = "members",
    params(
        ("id" = i32, Path, description = "Member id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Member deleted"),
        (status = 403, description = "Admin only", body = ApiError),
        (status = 409, description = "Member has history", body = ApiError)
    )
)]
pub async fn delete_member(
    member_service: web::Data<MemberService>,
    user: AuthUser,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    match member_service.delete_member(&user, path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Member deleted"
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn member_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/members")
            .route("", web::get().to(list_members))
            .route("", web::post().to(create_member))
            .route("/status-summary", web::get().to(status_summary))
            .route("/{id}", web::get().to(get_member))
            .route("/{id}", web::put().to(update_member))
            .route("/{id}", web::delete().to(delete_member))
            .route("/{id}/renew", web::post().to(renew_membership))
            .route("/{id}/cancel", web::post().to(cancel_membership))
    );
}
