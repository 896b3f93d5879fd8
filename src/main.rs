use actix_web::{App, HttpServer, middleware::Logger, web};
use anyhow::Context;
use chrono::Local; // timestamp in log lines
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter

use gym_backend::{
    config::Config,
    database::{create_pool, run_migrations},
    handlers,
    middlewares::{AuthMiddleware, create_cors},
    services::*,
    swagger::swagger_config,
    tasks,
    utils::JwtService,
};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    let config = Config::from_toml().context("Failed to load configuration")?;

    let pool = create_pool(&config.database)
        .await
        .context("Failed to create database connection pool")?;

    run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    let jwt_service = JwtService::new(
        &config.jwt.secret,
        config.jwt.access_token_expires_in,
        config.jwt.refresh_token_expires_in,
    );

    let gym = config.gym.clone();
    let auth_service = AuthService::new(pool.clone(), jwt_service.clone());
    let account_service = AccountService::new(pool.clone());
    let audit_service = AuditService::new(pool.clone());
    let transaction_service = TransactionService::new(pool.clone());
    let member_service =
        MemberService::new(pool.clone(), gym.clone(), transaction_service.clone());
    let trainer_service = TrainerService::new(pool.clone());
    let attendance_service = AttendanceService::new(pool.clone(), gym.clone());
    let session_service = SessionService::new(pool.clone(), gym.clone());
    let dashboard_service = DashboardService::new(
        pool.clone(),
        member_service.clone(),
        attendance_service.clone(),
        transaction_service.clone(),
        session_service.clone(),
    );

    if let (Some(username), Some(password)) = (
        config.bootstrap.admin_username.as_deref(),
        config.bootstrap.admin_password.as_deref(),
    ) && account_service
        .ensure_bootstrap_admin(username, password)
        .await
        .context("Failed to create bootstrap admin")?
    {
        log::info!("Created bootstrap admin account {username}");
    }

    tasks::spawn_all(attendance_service.clone(), gym.auto_close_interval_secs);

    log::info!(
        "Starting HTTP server at {}:{} (capacity {})",
        config.server.host,
        config.server.port,
        gym.max_capacity
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(AuthMiddleware::new(jwt_service.clone()))
            .wrap(create_cors())
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(account_service.clone()))
            .app_data(web::Data::new(audit_service.clone()))
            .app_data(web::Data::new(transaction_service.clone()))
            .app_data(web::Data::new(member_service.clone()))
            .app_data(web::Data::new(trainer_service.clone()))
            .app_data(web::Data::new(attendance_service.clone()))
            .app_data(web::Data::new(session_service.clone()))
            .app_data(web::Data::new(dashboard_service.clone()))
            .configure(swagger_config)
            .configure(handlers::health_config)
            .service(
                web::scope("/api")
                    .configure(handlers::auth_config)
                    .configure(handlers::account_config)
                    .configure(handlers::member_config)
                    .configure(handlers::attendance_config)
                    .configure(handlers::transaction_config)
                    .configure(handlers::trainer_config)
                    .configure(handlers::session_config)
                    .configure(handlers::audit_config)
                    .configure(handlers::dashboard_config)
                    .configure(handlers::me_config),
            )
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await?;

    Ok(())
}
