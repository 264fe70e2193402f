//! Typed client for the Qinglong panel open API.
//!
//! Only the endpoints jdsync needs are covered:
//!
//! - **Auth**: exchange client id/secret for a bearer token
//! - **Envs**: list, create and delete environment records
//!
//! # Example
//!
//! ```no_run
//! use jdsync_client::{PanelApi, PanelClient, RECORD_NAME, Result};
//! use jdsync_config::SyncConfig;
//!
//! # async fn example(config: SyncConfig) -> Result<()> {
//! let client = PanelClient::builder().build()?;
//!
//! let token = client.authenticate(&config).await?;
//! let records = client.list_records(&config, &token, RECORD_NAME).await?;
//! println!("{} records", records.len());
//! # Ok(())
//! # }
//! ```
//!
//! Every request runs under a hard deadline (15s by default). A request that
//! misses it fails with [`Error::Timeout`]; the in-flight future is dropped
//! and its eventual result, if any, is never observed.

pub mod api;
pub mod client;
pub mod error;
pub mod panel;
pub mod types;

pub use client::{ClientBuilder, DEFAULT_TIMEOUT, PanelClient, with_deadline};
pub use error::{Error, Result};
pub use panel::{PanelApi, SharedPanel};
pub use types::*;
