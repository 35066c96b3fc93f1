use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, Connection, PgConnection, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::config::AppConfig;

/// Owns the Postgres connection pool. Cheap to clone.
#[derive(Clone, Debug)]
pub struct ModelManager {
    db: PgPool,
}

impl ModelManager {
    pub async fn init(config: &AppConfig) -> Result<Self> {
        info!(
            "{:<20} - Initializing the DB pool ({}:{}/{})",
            "init_db", config.db_config.host, config.db_config.port, config.db_config.db_name
        );
        let db_pool = init_db(config).await?;

        Ok(Self { db: db_pool })
    }

    /// Builds a pool that only connects once a query needs a connection.
    pub fn init_lazy(config: &AppConfig) -> Self {
        let db_pool = pool_options().connect_lazy_with(config.db_config.connection_options());

        Self { db: db_pool }
    }

    /// Creates a fresh, randomly named database, migrates it and connects to it.
    pub async fn test_init(config: &AppConfig) -> Result<Self> {
        let mut config = config.clone();
        config.db_config.db_name = Uuid::new_v4().to_string();

        configure_test_db(&config).await?;

        Self::init(&config).await
    }

    pub fn db(&self) -> &PgPool {
        &self.db
    }
}

fn pool_options() -> PgPoolOptions {
    // NOTE: Tests sometimes fail if there is more than 1 max connection. This fixes it.
    let max_cons = if cfg!(test) { 1 } else { 5 };

    PgPoolOptions::new()
        .max_connections(max_cons)
        .acquire_timeout(Duration::from_millis(500))
}

async fn init_db(config: &AppConfig) -> Result<PgPool> {
    let con_opts = config.db_config.connection_options();

    let db_pool = pool_options()
        .connect_with(con_opts)
        .await
        .map_err(|ex| Error::FailToCreatePool(format!("Standard DB Pool: {ex}")))?;

    Ok(db_pool)
}

async fn configure_test_db(config: &AppConfig) -> Result<()> {
    let db_config = &config.db_config;
    let mut connection =
        PgConnection::connect_with(&db_config.connection_options_without_db()).await?;

    let sql = format!(r#"CREATE DATABASE "{}";"#, db_config.db_name);
    sqlx::query(&sql).execute(&mut connection).await?;

    // Create pool only used to migrate the DB
    let db_pool = PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_millis(1000))
        .connect_with(db_config.connection_options())
        .await
        .map_err(|ex| Error::FailToCreatePool(format!("Test Config: {ex}")))?;
    // Migrate DB
    sqlx::migrate!("./migrations").run(&db_pool).await?;

    Ok(())
}

// ###################################
// ->   ERROR
// ###################################
pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to create db pool: {0}")]
    FailToCreatePool(String),
    #[error("sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("sqlx migration error: {0}")]
    SqlxMigrate(#[from] sqlx::migrate::MigrateError),
}
