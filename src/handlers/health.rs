use actix_web::{web, HttpResponse, Result};
use sea_orm::DatabaseConnection;
use serde_json::json;

/// Liveness plus a database ping; served outside `/api` and without auth.
pub async fn health(pool: web::Data<DatabaseConnection>) -> Result<HttpResponse> {
    match pool.ping().await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({
            "status": "ok",
            "database": "ok"
        }))),
        Err(e) => {
            log::error!("Health check database ping failed: {e}");
            Ok(HttpResponse::ServiceUnavailable().json(json!({
                "status": "degraded",
                "database": "unreachable"
            })))
        }
    }
}

pub fn health_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health));
}
