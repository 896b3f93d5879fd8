use crate::config::GymConfig;
use crate::database::DbPool;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database};

pub(crate) fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Fresh in-memory SQLite database with every migration applied.
///
/// A single pooled connection keeps the in-memory database alive for the test.
pub(crate) async fn setup_test_db() -> DbPool {
    init_test_logging();
    let mut options = ConnectOptions::new("sqlite::memory:".to_string());
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options)
        .await
        .expect("open in-memory sqlite");
    Migrator::up(&db, None).await.expect("run migrations");
    db
}

pub(crate) fn test_gym_config() -> GymConfig {
    GymConfig {
        max_capacity: 2,
        ..GymConfig::default()
    }
}
