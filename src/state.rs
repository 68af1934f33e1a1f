use crate::config::Config;
use crate::cors::OriginPolicy;
use crate::db::DocumentStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// Wrapped in `Arc` and handed to handlers through Axum's State extraction.
/// Everything in it is read-only after startup except the store, which does
/// its own synchronization.
#[derive(Clone)]
pub struct AppState {
    /// Storage behind the CRUD handler groups
    pub store: Arc<dyn DocumentStore>,

    /// Origin admission policy built from `FRONTEND_URL` and `NODE_ENV`
    pub policy: Arc<OriginPolicy>,

    /// When the process started serving, for uptime reporting
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: &Config, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            policy: Arc::new(OriginPolicy::new(&config.cors, config.environment.clone())),
            started_at: Utc::now(),
        }
    }
}
