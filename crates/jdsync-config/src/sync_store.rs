//! Typed access to panel settings, the per-account cache and the throttle.
//!
//! The throttle works on two cached values per account: the last cookie
//! pushed and when it was pushed. A sync proceeds when:
//!
//! 1. the bypass flag is set, or
//! 2. the cached cookie differs from the candidate, or
//! 3. the configured interval has elapsed since the last push.
//!
//! The cache is written *before* any remote call is made so that a second
//! near-simultaneous invocation sees the fresh timestamp and backs off.

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::error::{ConfigError, Result};
use crate::keys;
use crate::store::SharedStore;

/// Raw panel settings as found in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelSettings {
    pub panel_url: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub update_interval_secs: u64,
}

impl Default for PanelSettings {
    fn default() -> Self {
        Self {
            panel_url: None,
            client_id: None,
            client_secret: None,
            update_interval_secs: keys::DEFAULT_UPDATE_INTERVAL_SECS,
        }
    }
}

impl PanelSettings {
    /// Check the settings and produce a normalized [`SyncConfig`].
    ///
    /// Empty strings count as missing. One or more trailing slashes are
    /// stripped from the url.
    pub fn validate(&self) -> Result<SyncConfig> {
        let present = |v: &Option<String>| v.as_deref().filter(|s| !s.is_empty()).map(str::to_string);

        let panel_url = present(&self.panel_url);
        let client_id = present(&self.client_id);
        let client_secret = present(&self.client_secret);

        let mut missing = Vec::new();
        if panel_url.is_none() {
            missing.push(keys::PANEL_URL);
        }
        if client_id.is_none() {
            missing.push(keys::CLIENT_ID);
        }
        if client_secret.is_none() {
            missing.push(keys::CLIENT_SECRET);
        }

        let (Some(panel_url), Some(client_id), Some(client_secret)) =
            (panel_url, client_id, client_secret)
        else {
            return Err(ConfigError::Incomplete { missing });
        };

        if !panel_url.starts_with("http://") && !panel_url.starts_with("https://") {
            return Err(ConfigError::BadUrlScheme(panel_url));
        }

        Ok(SyncConfig {
            panel_url: panel_url.trim_end_matches('/').to_string(),
            client_id,
            client_secret,
            update_interval_secs: self.update_interval_secs,
        })
    }
}

/// Validated panel connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Panel base url, scheme-prefixed, without trailing slash.
    pub panel_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub update_interval_secs: u64,
}

/// Cached state of the last sync for one account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub last_cookie_value: Option<String>,
    pub last_update_epoch_ms: i64,
}

/// Why the throttle decided the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleReason {
    /// The bypass flag was set.
    Bypass,
    /// The cached cookie differs from the candidate.
    CookieChanged,
    /// The interval has passed since the last sync.
    IntervalElapsed,
    /// The cookie is unchanged and the interval has not passed.
    IntervalNotElapsed,
}

impl std::fmt::Display for ThrottleReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ThrottleReason::Bypass => write!(f, "bypass"),
            ThrottleReason::CookieChanged => write!(f, "cookie_changed"),
            ThrottleReason::IntervalElapsed => write!(f, "interval_expired"),
            ThrottleReason::IntervalNotElapsed => write!(f, "interval"),
        }
    }
}

/// Outcome of a throttle check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleDecision {
    pub proceed: bool,
    pub reason: ThrottleReason,
}

impl ThrottleDecision {
    fn proceed(reason: ThrottleReason) -> Self {
        Self {
            proceed: true,
            reason,
        }
    }

    fn hold(reason: ThrottleReason) -> Self {
        Self {
            proceed: false,
            reason,
        }
    }
}

/// Config and throttle store.
///
/// All persisted state jdsync touches goes through this type.
#[derive(Debug, Clone)]
pub struct SyncStore {
    store: SharedStore,
}

impl SyncStore {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// The underlying key/value store.
    pub fn inner(&self) -> &SharedStore {
        &self.store
    }

    /// Load panel settings, applying the default interval when absent.
    pub fn load_config(&self) -> Result<PanelSettings> {
        let update_interval_secs = match self.store.read(keys::UPDATE_INTERVAL)? {
            None => keys::DEFAULT_UPDATE_INTERVAL_SECS,
            Some(raw) if raw.trim().is_empty() => keys::DEFAULT_UPDATE_INTERVAL_SECS,
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                warn!(
                    value = %raw,
                    default = keys::DEFAULT_UPDATE_INTERVAL_SECS,
                    "Unparsable update interval, using default"
                );
                keys::DEFAULT_UPDATE_INTERVAL_SECS
            }),
        };

        Ok(PanelSettings {
            panel_url: self.store.read(keys::PANEL_URL)?,
            client_id: self.store.read(keys::CLIENT_ID)?,
            client_secret: self.store.read(keys::CLIENT_SECRET)?,
            update_interval_secs,
        })
    }

    /// Read the cache entry for an account.
    pub fn cache_entry(&self, account: &str) -> Result<CacheEntry> {
        let last_cookie_value = self
            .store
            .read(&keys::cookie_cache_key(account))?
            .filter(|v| !v.is_empty());
        let last_update_epoch_ms = self
            .store
            .read(&keys::last_update_key(account))?
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0);

        Ok(CacheEntry {
            last_cookie_value,
            last_update_epoch_ms,
        })
    }

    /// Decide whether a sync should happen now.
    pub fn should_sync(
        &self,
        account: &str,
        candidate_cookie: &str,
        settings: &PanelSettings,
    ) -> Result<ThrottleDecision> {
        self.should_sync_at(
            account,
            candidate_cookie,
            settings,
            Utc::now().timestamp_millis(),
        )
    }

    /// Decide whether a sync should happen at `now_ms` (epoch millis).
    pub fn should_sync_at(
        &self,
        account: &str,
        candidate_cookie: &str,
        settings: &PanelSettings,
        now_ms: i64,
    ) -> Result<ThrottleDecision> {
        if self.bypass_enabled()? {
            info!(account, "Bypass flag set, skipping interval check");
            return Ok(ThrottleDecision::proceed(ThrottleReason::Bypass));
        }

        let entry = self.cache_entry(account)?;

        if let Some(cached) = &entry.last_cookie_value
            && cached != candidate_cookie
        {
            info!(account, "Cookie changed since last sync");
            return Ok(ThrottleDecision::proceed(ThrottleReason::CookieChanged));
        }

        let interval_ms = i64::try_from(settings.update_interval_secs)
            .unwrap_or(i64::MAX / 1000)
            .saturating_mul(1000);
        let elapsed_ms = now_ms.saturating_sub(entry.last_update_epoch_ms);

        if elapsed_ms < interval_ms {
            debug!(
                account,
                interval_secs = settings.update_interval_secs,
                elapsed_ms,
                "Cookie unchanged and interval not elapsed"
            );
            return Ok(ThrottleDecision::hold(ThrottleReason::IntervalNotElapsed));
        }

        Ok(ThrottleDecision::proceed(ThrottleReason::IntervalElapsed))
    }

    /// Record a sync attempt for an account at the current time.
    pub fn record_sync(&self, account: &str, cookie: &str) -> Result<()> {
        self.record_sync_at(account, cookie, Utc::now().timestamp_millis())
    }

    /// Record a sync attempt for an account at `now_ms` (epoch millis).
    pub fn record_sync_at(&self, account: &str, cookie: &str, now_ms: i64) -> Result<()> {
        self.store.write(&keys::cookie_cache_key(account), cookie)?;
        self.store
            .write(&keys::last_update_key(account), &now_ms.to_string())?;
        debug!(account, now_ms, "Sync cache updated");
        Ok(())
    }

    /// Whether the one-shot bypass flag is set.
    pub fn bypass_enabled(&self) -> Result<bool> {
        Ok(self.store.read(keys::BYPASS_CHECK)?.as_deref() == Some("true"))
    }

    /// Arm the bypass flag so the next sync skips the interval check.
    pub fn set_bypass(&self) -> Result<()> {
        self.store.write(keys::BYPASS_CHECK, "true")?;
        info!("Bypass flag set");
        Ok(())
    }

    /// Reset the bypass flag if it is set.
    ///
    /// Returns whether the flag was set. Calling this when the flag is not
    /// set writes nothing.
    pub fn clear_bypass(&self) -> Result<bool> {
        if !self.bypass_enabled()? {
            return Ok(false);
        }
        self.store.write(keys::BYPASS_CHECK, "false")?;
        info!("Bypass flag cleared, interval checks restored");
        Ok(true)
    }
}
