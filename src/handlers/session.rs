use actix_web::{web, HttpResponse, Result, ResponseError};
use serde_json::json;
use crate::models::*;
use crate::services::SessionService;

#[utoipa::path(
    post,
    path = "/sessions",
    tag = "sessions",
    request_body = CreateSessionRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Session booked as pending", body = SessionResponse),
        (status = 400, description = "Booking rules violated", body = ApiError),
        (status = 409, description = "Booking limit reached or time clash", body = ApiError)
    )
)]
pub async fn book_session(
    session_service: web::Data<SessionService>,
    user: AuthUser,
    request: web::Json<CreateSessionRequest>,
) -> Result<HttpResponse> {
    match session_service.book(&user, request.into_inner()).await {
        Ok(session) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": session
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/sessions",
    tag = "sessions",
    params(SessionQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Sessions visible to the caller, paginated")
    )
)]
pub async fn list_sessions(
    session_service: web::Data<SessionService>,
    user: AuthUser,
    query: web::Query<SessionQuery>,
) -> Result<HttpResponse> {
    match session_service.list(&user, &query.into_inner()).await {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": page
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/sessions/{id}/status",
    tag = "sessions",
    params(
        ("id" = i32, Path, description = "Session id")
    ),
    request_body = DecideSessionRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Session approved or disapproved", body = SessionResponse),
        (status = 403, description = "Not the session's trainer", body = ApiError),
        (status = 409, description = "Session already decided", body = ApiError)
    )
)]
pub async fn decide_session(
    session_service: web::Data<SessionService>,
    user: AuthUser,
    path: web::Path<i32>,
    request: web::Json<DecideSessionRequest>,
) -> Result<HttpResponse> {
    match session_service
        .decide(&user, path.into_inner(), request.into_inner())
        .await
    {
        Ok(session) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": session
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/sessions/{id}",
    tag = "sessions",
    params(
        ("id" = i32, Path, description = "Session id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Session cancelled", body = SessionResponse),
        (status = 409, description = "Session can no longer be cancelled", body = ApiError)
    )
)]
pub async fn cancel_session(
    session_service: web::Data<SessionService>,
    user: AuthUser,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    match session_service.cancel(&user, path.into_inner()).await {
        Ok(session) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": session
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn session_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/sessions")
            .route("", web::post().to(book_session))
            .route("", web::get().to(list_sessions))
            .route("/{id}", web::delete().to(cancel_session))
            .route("/{id}/status", web::put().to(decide_session))
    );
}
