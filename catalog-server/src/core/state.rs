//! Server State
//!
//! Cloned into every handler. All fields are cheap handles.

use std::sync::Arc;

use crate::auth::JwtService;
use crate::core::Config;
use crate::db::CatalogStore;
use crate::services::{CatalogService, ImageStore, LocalImageStore};
use crate::utils::AppResult;

#[derive(Clone, Debug)]
pub struct ServerState {
    pub config: Arc<Config>,
    pub store: CatalogStore,
    pub catalog: CatalogService,
    pub jwt_service: Arc<JwtService>,
}

impl ServerState {
    /// Open the store, seed defaults and wire the services
    pub async fn initialize(config: &Config) -> AppResult<Self> {
        if config.ephemeral_secret {
            tracing::warn!(
                "JWT_SECRET not set, using a per-process secret; tokens will not survive a restart"
            );
        }
        let store = CatalogStore::open(&config.database_path).await?;
        store.seed_defaults(&config.admin).await?;

        let images = Arc::new(LocalImageStore::new(&config.uploads_dir));
        Ok(Self::new(config.clone(), store, images))
    }

    /// Wire the services around an already opened store
    pub fn new(config: Config, store: CatalogStore, images: Arc<dyn ImageStore>) -> Self {
        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));
        let catalog = CatalogService::new(store.clone(), images);
        Self {
            config: Arc::new(config),
            store,
            catalog,
            jwt_service,
        }
    }
}
