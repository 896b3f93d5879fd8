use actix_web::{web, HttpResponse, Result, ResponseError};
use serde_json::json;
use crate::models::*;
use crate::services::AttendanceService;

#[utoipa::path(
    get,
    path = "/attendance/capacity",
    tag = "attendance",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Current occupancy", body = CapacityResponse)
    )
)]
pub async fn capacity(
    attendance_service: web::Data<AttendanceService>,
    _user: AuthUser,
) -> Result<HttpResponse> {
    match attendance_service.capacity().await {
        Ok(capacity) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": capacity
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/attendance/check-in",
    tag = "attendance",
    request_body = RfidRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Checked in", body = AttendanceResponse),
        (status = 400, description = "Membership does not allow entry", body = ApiError),
        (status = 404, description = "Unknown RFID", body = ApiError),
        (status = 409, description = "Already inside or gym at capacity", body = ApiError)
    )
)]
pub async fn check_in(
    attendance_service: web::Data<AttendanceService>,
    user: AuthUser,
    request: web::Json<RfidRequest>,
) -> Result<HttpResponse> {
    match attendance_service.check_in(&user, &request.rfid).await {
        Ok(record) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": record
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/attendance/check-out",
    tag = "attendance",
    request_body = RfidRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Checked out", body = AttendanceResponse),
        (status = 404, description = "Unknown RFID or not checked in", body = ApiError)
    )
)]
pub async fn check_out(
    attendance_service: web::Data<AttendanceService>,
    user: AuthUser,
    request: web::Json<RfidRequest>,
) -> Result<HttpResponse> {
    match attendance_service.check_out(&user, &request.rfid).await {
        Ok(record) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": record
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/attendance/tap",
    tag = "attendance",
    request_body = RfidRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Checked in or out, depending on whether the member is inside", body = TapResponse),
        (status = 404, description = "Unknown RFID", body = ApiError),
        (status = 409, description = "Gym at capacity", body = ApiError)
    )
)]
pub async fn tap(
    attendance_service: web::Data<AttendanceService>,
    user: AuthUser,
    request: web::Json<RfidRequest>,
) -> Result<HttpResponse> {
    match attendance_service.tap(&user, &request.rfid).await {
        Ok(response) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": response
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/attendance/today",
    tag = "attendance",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Today's attendance, newest first", body = [AttendanceResponse])
    )
)]
pub async fn today(
    attendance_service: web::Data<AttendanceService>,
    user: AuthUser,
) -> Result<HttpResponse> {
    if let Err(e) = user.require_staff() {
        return Ok(e.error_response());
    }
    match attendance_service.today().await {
        Ok(records) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": records
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/attendance",
    tag = "attendance",
    params(AttendanceQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Attendance history, paginated")
    )
)]
pub async fn history(
    attendance_service: web::Data<AttendanceService>,
    user: AuthUser,
    query: web::Query<AttendanceQuery>,
) -> Result<HttpResponse> {
    if let Err(e) = user.require_staff() {
        return Ok(e.error_response());
    }
    match attendance_service.history(&query.into_inner()).await {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": page
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn attendance_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/attendance")
            .route("", web::get().to(history))
            .route("/capacity", web::get().to(capacity))
            .route("/today", web::get().to(today))
            .route("/check-in", web::post().to(check_in))
            .route("/check-out", web::post().to(check_out))
            .route("/tap", web::post().to(tap))
    );
}
