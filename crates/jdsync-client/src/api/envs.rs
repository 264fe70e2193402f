//! Envs API.
//!
//! The panel has no upsert: records are only ever created or deleted here.

use jdsync_config::SyncConfig;
use tracing::{debug, info, warn};

use crate::client::PanelClient;
use crate::error::{Error, Result};
use crate::types::{CreateOutcome, ListRecordsQuery, NewRecord, RecordId, RemoteRecord};

/// Envs API client.
pub struct EnvsApi {
    client: PanelClient,
}

impl EnvsApi {
    pub(crate) fn new(client: PanelClient) -> Self {
        Self { client }
    }

    /// List records matching a server-side search filter.
    pub async fn list(
        &self,
        config: &SyncConfig,
        token: &str,
        search_value: &str,
    ) -> Result<Vec<RemoteRecord>> {
        let url = self.client.url(config, "open/envs")?;
        let query = ListRecordsQuery { search_value };

        let body = self
            .client
            .get::<Vec<RemoteRecord>, _>(url, Some(token), &query)
            .await
            .map_err(|e| e.into_operation(Error::QueryFailed))?;

        if body.is_ok()
            && let Some(records) = body.data
        {
            info!(count = records.len(), "Listed panel records");
            return Ok(records);
        }

        let message = body.message_or("Failed to get env list");
        warn!(code = body.code, message = %message, "Listing panel records failed");
        Err(Error::QueryFailed(message))
    }

    /// Create a single record.
    ///
    /// A rejection caused by a uniqueness violation on `value` is reported as
    /// success with [`CreateOutcome::duplicate_detected`] set.
    pub async fn create(
        &self,
        config: &SyncConfig,
        token: &str,
        record: &NewRecord,
    ) -> Result<CreateOutcome> {
        let url = self.client.url(config, "open/envs")?;
        debug!(name = %record.name, remarks = %record.remarks, "Creating panel record");

        let body = self
            .client
            .post::<serde_json::Value, _>(url, Some(token), std::slice::from_ref(record))
            .await
            .map_err(|e| e.into_operation(Error::CreateFailed))?;

        if body.is_ok() {
            info!(name = %record.name, "Panel record created");
            return Ok(CreateOutcome::default());
        }

        if body.is_duplicate_value() {
            info!(name = %record.name, "Record value already present on panel");
            return Ok(CreateOutcome {
                duplicate_detected: true,
            });
        }

        let message = body.message_or("Failed to add env");
        warn!(code = body.code, message = %message, "Creating panel record failed");
        Err(Error::CreateFailed(message))
    }

    /// Delete a single record by id.
    pub async fn delete(&self, config: &SyncConfig, token: &str, id: RecordId) -> Result<()> {
        let url = self.client.url(config, "open/envs")?;
        debug!(record_id = id.0, "Deleting panel record");

        let body = self
            .client
            .delete::<serde_json::Value, _>(url, Some(token), &[id])
            .await
            .map_err(|e| e.into_operation(Error::DeleteFailed))?;

        if body.is_ok() {
            info!(record_id = id.0, "Panel record deleted");
            return Ok(());
        }

        let message = body.message_or("Failed to delete env");
        warn!(record_id = id.0, code = body.code, message = %message, "Deleting panel record failed");
        Err(Error::DeleteFailed(message))
    }
}
