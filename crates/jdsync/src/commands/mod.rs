//! CLI command handlers.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, Result};
use jdsync_client::PanelClient;
use jdsync_config::{FileStore, SyncStore};

pub mod check;
pub mod config;
pub mod status;
pub mod sync;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Store file backing settings and sync state.
    pub store_path: PathBuf,
    /// Deadline for each panel request.
    pub timeout: Duration,
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
}

impl Context {
    /// Open the store at the configured path.
    pub fn sync_store(&self) -> SyncStore {
        SyncStore::new(Arc::new(FileStore::new(self.store_path.clone())))
    }

    /// Build a panel client honouring the configured timeout.
    pub fn panel_client(&self) -> Result<PanelClient> {
        PanelClient::builder()
            .timeout(self.timeout)
            .build()
            .context("failed to build panel client")
    }
}
