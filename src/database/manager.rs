use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::DatabaseConfig;

/// Errors surfaced by the data-access layer. Not-found and conflict are
/// distinguished from other failures so handlers can map them to 404/409;
/// everything else stays opaque to clients.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Translate a raw sqlx error for one entity kind. Unique-constraint
    /// violations become conflicts, row-not-found becomes not-found.
    pub fn for_entity(entity: &str, err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DatabaseError::NotFound(format!("{} not found", entity)),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                DatabaseError::Conflict(format!("{} already exists", entity))
            }
            other => DatabaseError::Sqlx(other),
        }
    }

    pub fn not_found(entity: &str) -> Self {
        DatabaseError::NotFound(format!("{} not found", entity))
    }
}

/// Create the connection pool. The pool connects lazily so the server boots
/// even while the store is unreachable; health reports degraded until then.
pub fn create_pool(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
    if config.url.is_empty() {
        return Err(DatabaseError::ConfigMissing("DATABASE_URL"));
    }

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .connect_lazy(&config.url)?;

    Ok(pool)
}

/// Apply pending migrations. Called at startup; failure is logged and the
/// server continues in degraded mode rather than refusing to boot.
pub async fn run_migrations(pool: &PgPool) {
    match sqlx::migrate!("./migrations").run(pool).await {
        Ok(()) => info!("Database migrations applied"),
        Err(e) => warn!("Skipping migrations, database unavailable: {}", e),
    }
}

/// Pings the pool to ensure connectivity.
pub async fn health_check(pool: &PgPool) -> Result<(), DatabaseError> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_url_is_a_config_error() {
        let config = DatabaseConfig {
            url: String::new(),
            max_connections: 5,
            connect_timeout_secs: 5,
        };
        assert!(matches!(
            create_pool(&config),
            Err(DatabaseError::ConfigMissing("DATABASE_URL"))
        ));
    }

    #[test]
    fn row_not_found_maps_to_not_found() {
        let err = DatabaseError::for_entity("Forum", sqlx::Error::RowNotFound);
        assert!(matches!(err, DatabaseError::NotFound(msg) if msg.contains("Forum")));
    }
}
