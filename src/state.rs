use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::config::Config;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: Arc<DatabaseConnection>,
    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Create new application state
    pub fn new(db: DatabaseConnection, config: Config) -> Self {
        Self::with_shared(Arc::new(db), config)
    }

    /// Create state around a connection the caller keeps a handle to
    pub fn with_shared(db: Arc<DatabaseConnection>, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }
}
