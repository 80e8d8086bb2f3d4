use std::sync::Arc;

use sqlx::PgPool;

use crate::config::AppConfig;
use crate::storage::StorageBackend;

/// Everything a request handler needs, built once at startup and shared via
/// axum state. There is deliberately no global singleton; services receive
/// their dependencies from here.
pub struct AppContext {
    pub config: AppConfig,
    pub db: PgPool,
    pub storage: Arc<dyn StorageBackend>,
}

pub type SharedContext = Arc<AppContext>;
