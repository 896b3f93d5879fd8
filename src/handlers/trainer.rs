use actix_web::{web, HttpResponse, Result, ResponseError};
use serde_json::json;
use crate::models::*;
use crate::services::TrainerService;

#[utoipa::path(
    get,
    path = "/trainers",
    tag = "trainers",
    params(TrainerQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Trainers by name", body = [TrainerResponse])
    )
)]
pub async fn list_trainers(
    trainer_service: web::Data<TrainerService>,
    _user: AuthUser,
    query: web::Query<TrainerQuery>,
) -> Result<HttpResponse> {
    match trainer_service.list_trainers(&query.into_inner()).await {
        Ok(trainers) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": trainers
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/trainers/{id}",
    tag = "trainers",
    params(
        ("id" = i32, Path, description = "Trainer id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Trainer", body = TrainerResponse),
        (status = 404, description = "Trainer not found", body = ApiError)
    )
)]
pub async fn get_trainer(
    trainer_service: web::Data<TrainerService>,
    _user: AuthUser,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    match trainer_service.get_trainer(path.into_inner()).await {
        Ok(trainer) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": trainer
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/trainers",
    tag = "trainers",
    request_body = CreateTrainerRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Trainer created", body = TrainerResponse),
        (status = 403, description = "Admin only", body = ApiError)
    )
)]
pub async fn create_trainer(
    trainer_service: web::Data<TrainerService>,
    user: AuthUser,
    request: web::Json<CreateTrainerRequest>,
) -> Result<HttpResponse> {
    match trainer_service.create_trainer(&user, request.into_inner()).await {
        Ok(trainer) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": trainer
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/trainers/{id}",
    tag = "trainers",
    params(
        ("id" = i32, Path, description = "Trainer id")
    ),
    request_body = UpdateTrainerRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Trainer updated", body = TrainerResponse),
        (status = 404, description = "Trainer not found", body = ApiError)
    )
)]
pub async fn update_trainer(
    trainer_service: web::Data<TrainerService>,
    user: AuthUser,
    path: web::Path<i32>,
    request: web::Json<UpdateTrainerRequest>,
) -> Result<HttpResponse> {
    match trainer_service
        .update_trainer(&user, path.into_inner(), request.into_inner())
        .await
    {
        Ok(trainer) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": trainer
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/trainers/{id}/schedule",
    tag = "trainers",
    params(
        ("id" = i32, Path, description = "Trainer id"),
        ScheduleQuery
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Approved sessions on the day", body = [SessionResponse])
    )
)]
pub async fn schedule(
    trainer_service: web::Data<TrainerService>,
    _user: AuthUser,
    path: web::Path<i32>,
    query: web::Query<ScheduleQuery>,
) -> Result<HttpResponse> {
    let date = query.date.unwrap_or_else(local_today);
    match trainer_service.schedule(path.into_inner(), date).await {
        Ok(sessions) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": sessions
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn trainer_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/trainers")
            .route("", web::get().to(list_trainers))
            .route("", web::post().to(create_trainer))
            .route("/{id}", web::get().to(get_trainer))
            .route("/{id}", web::put().to(update_trainer))
            .route("/{id}/schedule", web::get().to(schedule))
    );
}
