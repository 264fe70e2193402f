//! Store key names.
//!
//! These names are shared with other tools writing the same store, so they
//! must not change.

/// Panel base url.
pub const PANEL_URL: &str = "ql_url";

/// Open API client id.
pub const CLIENT_ID: &str = "ql_client_id";

/// Open API client secret.
pub const CLIENT_SECRET: &str = "ql_client_secret";

/// Minimum seconds between two syncs of an unchanged cookie.
pub const UPDATE_INTERVAL: &str = "ql_update_interval";

/// One-shot flag forcing the next sync past the throttle.
pub const BYPASS_CHECK: &str = "jd_bypass_interval_check";

/// Interval used when `ql_update_interval` is unset (30 minutes).
pub const DEFAULT_UPDATE_INTERVAL_SECS: u64 = 1800;

/// Cache key holding the last cookie synced for an account.
pub fn cookie_cache_key(account: &str) -> String {
    format!("jd_cookie_cache_{}", account)
}

/// Cache key holding the epoch-millis timestamp of the last sync for an account.
pub fn last_update_key(account: &str) -> String {
    format!("jd_cookie_last_update_{}", account)
}
