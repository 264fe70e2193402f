//! Persisted settings and sync state for jdsync.
//!
//! Everything jdsync remembers between invocations lives in a flat
//! string key/value store:
//!
//! - Panel connection settings (`ql_url`, `ql_client_id`, `ql_client_secret`)
//! - The throttle interval (`ql_update_interval`, seconds)
//! - The one-shot bypass flag (`jd_bypass_interval_check`)
//! - Per-account cache entries (`jd_cookie_cache_{account}`,
//!   `jd_cookie_last_update_{account}`)
//!
//! The store itself is abstracted behind [`KvStore`] so the host can supply
//! whatever persistence it has. [`SyncStore`] layers the typed operations
//! (config loading, validation, throttle decisions, cache writes) on top.

pub mod error;
pub mod keys;
pub mod secrets;
pub mod store;
pub mod sync_store;

pub use error::{ConfigError, Result};
pub use secrets::mask_secret;
pub use store::{FileStore, KvStore, MemoryStore, SharedStore, default_store_path};
pub use sync_store::{
    CacheEntry, PanelSettings, SyncConfig, SyncStore, ThrottleDecision, ThrottleReason,
};
