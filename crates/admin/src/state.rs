//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::AdminConfig;
use crate::resource::Panel;
use crate::services::Storage;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    pool: PgPool,
    panel: Panel,
    storage: Storage,
}

impl AppState {
    #[must_use]
    pub fn new(config: AdminConfig, pool: PgPool, panel: Panel) -> Self {
        let storage = Storage::new(config.storage_dir.clone());
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                panel,
                storage,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Registered resources and widgets.
    #[must_use]
    pub fn panel(&self) -> &Panel {
        &self.inner.panel
    }

    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.inner.storage
    }
}
