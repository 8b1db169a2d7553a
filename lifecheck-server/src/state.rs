//! Application state module
//!
//! Defines shared state accessible across all request handlers.

use std::sync::Arc;

use lifecheck_core::{
    GatewayFactory, InMemoryUserDirectory, PhotoStore, Result, TemporaryMediaStore,
    UserDirectory, VerificationOrchestrator,
};

use crate::config::Config;
use crate::db::PostgresUserDirectory;

/// Application state containing shared resources.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Verification flow, including the user directory and photo store
    pub orchestrator: Arc<VerificationOrchestrator>,
}

impl AppState {
    pub fn new(orchestrator: VerificationOrchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
        }
    }

    /// Build every component from configuration.
    ///
    /// Creates the upload and staging directories, connects to Postgres when
    /// `database_url` is set (falling back to an in-memory directory
    /// otherwise), and instantiates the configured liveness backend.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let directory: Arc<dyn UserDirectory> = match &config.database_url {
            Some(url) => {
                let directory = PostgresUserDirectory::connect(
                    url,
                    config.database_max_connections,
                    config.database_min_connections,
                )
                .await?;
                tracing::info!("User directory: PostgreSQL");
                Arc::new(directory)
            }
            None => {
                tracing::warn!("DATABASE_URL not set, users are kept in memory only");
                Arc::new(InMemoryUserDirectory::new())
            }
        };

        let photos = PhotoStore::new(&config.upload_dir)?;
        let staging = TemporaryMediaStore::new(&config.temp_dir)?;
        let gateway = GatewayFactory::create(config.gateway.clone())?;

        tracing::info!(
            backend = %gateway.backend(),
            upload_dir = %config.upload_dir.display(),
            temp_dir = %config.temp_dir.display(),
            "Liveness components ready"
        );

        Ok(Self::new(VerificationOrchestrator::new(
            directory, photos, staging, gateway,
        )))
    }

    pub fn directory(&self) -> &Arc<dyn UserDirectory> {
        self.orchestrator.directory()
    }

    pub fn photos(&self) -> &PhotoStore {
        self.orchestrator.photos()
    }
}
