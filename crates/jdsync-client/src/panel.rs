//! The remote panel seam.
//!
//! The sync engine talks to the panel only through [`PanelApi`], so tests
//! and alternative transports can stand in for [`PanelClient`].

use std::sync::Arc;

use async_trait::async_trait;
use jdsync_config::SyncConfig;

use crate::client::PanelClient;
use crate::error::Result;
use crate::types::{CreateOutcome, NewRecord, RecordId, RemoteRecord};

/// Operations the sync engine needs from a panel.
#[async_trait]
pub trait PanelApi: Send + Sync {
    /// Obtain a bearer token.
    async fn authenticate(&self, config: &SyncConfig) -> Result<String>;

    /// List records matching a server-side search filter.
    async fn list_records(
        &self,
        config: &SyncConfig,
        token: &str,
        filter: &str,
    ) -> Result<Vec<RemoteRecord>>;

    /// Create one record.
    async fn create_record(
        &self,
        config: &SyncConfig,
        token: &str,
        record: &NewRecord,
    ) -> Result<CreateOutcome>;

    /// Delete one record.
    async fn delete_record(&self, config: &SyncConfig, token: &str, id: RecordId) -> Result<()>;

    /// Verify the panel accepts the configured credentials.
    async fn check_connection(&self, config: &SyncConfig) -> Result<()> {
        self.authenticate(config).await.map(|_| ())
    }
}

/// Shared panel handle.
pub type SharedPanel = Arc<dyn PanelApi>;

#[async_trait]
impl PanelApi for PanelClient {
    async fn authenticate(&self, config: &SyncConfig) -> Result<String> {
        self.auth().token(config).await
    }

    async fn list_records(
        &self,
        config: &SyncConfig,
        token: &str,
        filter: &str,
    ) -> Result<Vec<RemoteRecord>> {
        self.envs().list(config, token, filter).await
    }

    async fn create_record(
        &self,
        config: &SyncConfig,
        token: &str,
        record: &NewRecord,
    ) -> Result<CreateOutcome> {
        self.envs().create(config, token, record).await
    }

    async fn delete_record(&self, config: &SyncConfig, token: &str, id: RecordId) -> Result<()> {
        self.envs().delete(config, token, id).await
    }
}
