//! Per-request sync orchestration.
//!
//! One call to [`SyncService::handle_request`] walks a fixed sequence of
//! stages and always returns a [`SyncOutcome`]; failures are logged, reported
//! to the user where they matter and never escape to the caller.
//!
//! ```text
//! Extracting → Throttling → Authenticating → Listing → Reconciling → Executing → Reporting
//! ```

use std::collections::HashMap;

use jdsync_client::{Error as RemoteError, RECORD_NAME, SharedPanel};
use jdsync_config::{ConfigError, SyncStore, ThrottleReason};
use tracing::{debug, error, info, warn};

use crate::credential::{Captured, CookieFields, CredentialExtractor};
use crate::error::ExtractionError;
use crate::notify::{NOTIFICATION_TITLE, SharedNotifier};
use crate::reconcile::{PlanKind, reconcile};
use crate::services::executor::{ExecutionReport, execute_plan};

// ─────────────────────────────────────────────────────────────────────────────
// Outcome types
// ─────────────────────────────────────────────────────────────────────────────

/// Stages of one sync attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStage {
    Extracting,
    Throttling,
    Authenticating,
    Listing,
    Reconciling,
    Executing,
    Reporting,
}

impl std::fmt::Display for SyncStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SyncStage::Extracting => "extracting",
            SyncStage::Throttling => "throttling",
            SyncStage::Authenticating => "authenticating",
            SyncStage::Listing => "listing",
            SyncStage::Reconciling => "reconciling",
            SyncStage::Executing => "executing",
            SyncStage::Reporting => "reporting",
        };
        f.write_str(name)
    }
}

/// Why a sync attempt stopped early.
#[derive(Debug)]
pub enum AbortReason {
    /// The request carried no usable credential.
    Extraction(ExtractionError),
    /// The throttle held the attempt back.
    Throttled(ThrottleReason),
    /// Settings were incomplete or the store failed.
    Config(ConfigError),
    /// A remote call failed and the end state could not be confirmed.
    Remote {
        stage: SyncStage,
        error: RemoteError,
    },
}

impl AbortReason {
    /// Whether this abort is routine and nobody was told about it.
    pub fn is_silent(&self) -> bool {
        matches!(self, AbortReason::Extraction(_) | AbortReason::Throttled(_))
    }
}

impl std::fmt::Display for AbortReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AbortReason::Extraction(e) => write!(f, "no credential: {}", e),
            AbortReason::Throttled(reason) => write!(f, "throttled ({})", reason),
            AbortReason::Config(e) => write!(f, "{}", e),
            AbortReason::Remote { stage, error } => write!(f, "{} failed: {}", stage, error),
        }
    }
}

/// A completed sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub account_id: String,
    /// Why the throttle let this attempt through.
    pub throttle: ThrottleReason,
    pub execution: ExecutionReport,
    /// A success notification was sent.
    pub notified: bool,
    /// The bypass flag was set and has been reset.
    pub bypass_cleared: bool,
}

impl SyncReport {
    pub fn plan(&self) -> PlanKind {
        self.execution.plan
    }
}

/// Terminal state of one sync attempt.
#[derive(Debug)]
pub enum SyncOutcome {
    Done(SyncReport),
    Aborted(AbortReason),
}

impl SyncOutcome {
    pub fn is_done(&self) -> bool {
        matches!(self, SyncOutcome::Done(_))
    }

    pub fn report(&self) -> Option<&SyncReport> {
        match self {
            SyncOutcome::Done(report) => Some(report),
            SyncOutcome::Aborted(_) => None,
        }
    }

    pub fn abort_reason(&self) -> Option<&AbortReason> {
        match self {
            SyncOutcome::Done(_) => None,
            SyncOutcome::Aborted(reason) => Some(reason),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Service
// ─────────────────────────────────────────────────────────────────────────────

mod subtitle {
    pub const CONFIG_ERROR: &str = "Configuration error";
    pub const STORE_ERROR: &str = "Unexpected error";
    pub const TOKEN_FAILED: &str = "Failed to get token";
    pub const LIST_FAILED: &str = "Failed to query envs";
    pub const SYNC_SUCCEEDED: &str = "Sync succeeded";
    pub const SYNC_FAILED: &str = "Sync failed";
}

/// Syncs captured cookies to the panel.
///
/// Cheap to clone; every collaborator is shared.
#[derive(Clone)]
pub struct SyncService {
    store: SyncStore,
    panel: SharedPanel,
    notifier: SharedNotifier,
    extractor: CredentialExtractor,
}

impl std::fmt::Debug for SyncService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncService")
            .field("store", &self.store)
            .field("extractor", &self.extractor)
            .finish_non_exhaustive()
    }
}

impl SyncService {
    pub fn new(store: SyncStore, panel: SharedPanel, notifier: SharedNotifier) -> Self {
        Self {
            store,
            panel,
            notifier,
            extractor: CredentialExtractor::default(),
        }
    }

    /// Read credentials from non-default cookie fields.
    pub fn with_fields(mut self, fields: CookieFields) -> Self {
        self.extractor = CredentialExtractor::new(fields);
        self
    }

    pub fn store(&self) -> &SyncStore {
        &self.store
    }

    /// Run one sync attempt for an intercepted request.
    pub async fn handle_request(&self, headers: &HashMap<String, String>) -> SyncOutcome {
        debug!(stage = %SyncStage::Extracting, "Sync attempt started");
        match self.extractor.extract(headers) {
            Ok(captured) => self.sync(&captured).await,
            Err(e) => {
                debug!(reason = %e, "Request skipped");
                SyncOutcome::Aborted(AbortReason::Extraction(e))
            }
        }
    }

    /// Run the stages after extraction for an already captured credential.
    pub async fn sync(&self, captured: &Captured) -> SyncOutcome {
        let account = captured.credential.account_id.as_str();
        info!(account, "Credential captured");

        // Throttling
        let settings = match self.store.load_config() {
            Ok(settings) => settings,
            Err(e) => return self.abort_config(e),
        };
        let decision = match self.store.should_sync(account, &captured.cookie, &settings) {
            Ok(decision) => decision,
            Err(e) => return self.abort_config(e),
        };
        if !decision.proceed {
            info!(account, reason = %decision.reason, "Sync skipped");
            return SyncOutcome::Aborted(AbortReason::Throttled(decision.reason));
        }

        let config = match settings.validate() {
            Ok(config) => config,
            Err(e) => return self.abort_config(e),
        };

        // Claim this attempt before any remote call so an overlapping
        // request for the same cookie is throttled.
        if let Err(e) = self.store.record_sync(account, &captured.cookie) {
            warn!(account, error = %e, "Failed to update sync cache, continuing");
        }

        // Authenticating
        let token = match self.panel.authenticate(&config).await {
            Ok(token) => token,
            Err(e) => return self.abort_remote(SyncStage::Authenticating, subtitle::TOKEN_FAILED, e),
        };

        // Listing
        let records = match self.panel.list_records(&config, &token, RECORD_NAME).await {
            Ok(records) => records,
            Err(e) => return self.abort_remote(SyncStage::Listing, subtitle::LIST_FAILED, e),
        };
        debug!(account, count = records.len(), "Panel records listed");

        // Reconciling
        let plan = reconcile(&records, account, &captured.cookie, &self.extractor);
        info!(account, plan = %plan.kind(), "Reconciled");

        // Executing
        let execution = match execute_plan(self.panel.as_ref(), &config, &token, &plan).await {
            Ok(execution) => execution,
            Err(e) => return self.abort_remote(SyncStage::Executing, subtitle::SYNC_FAILED, e),
        };

        // Reporting
        let bypass_cleared = self.store.clear_bypass().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to reset bypass flag");
            false
        });

        let notified = if execution.is_silent() {
            debug!(account, plan = %execution.plan, "Value unchanged, not notifying");
            false
        } else {
            let body = format!("Account: {}\nSynced to Qinglong panel", account);
            self.notifier
                .notify(NOTIFICATION_TITLE, subtitle::SYNC_SUCCEEDED, &body);
            true
        };

        info!(
            account,
            plan = %execution.plan,
            duplicate = execution.duplicate_detected,
            "Sync finished"
        );

        SyncOutcome::Done(SyncReport {
            account_id: account.to_string(),
            throttle: decision.reason,
            execution,
            notified,
            bypass_cleared,
        })
    }

    fn abort_config(&self, e: ConfigError) -> SyncOutcome {
        let subtitle = if e.is_settings_error() {
            warn!(error = %e, "Sync configuration invalid");
            subtitle::CONFIG_ERROR
        } else {
            error!(error = %e, "Store access failed");
            subtitle::STORE_ERROR
        };
        self.notifier
            .notify(NOTIFICATION_TITLE, subtitle, &e.to_string());
        SyncOutcome::Aborted(AbortReason::Config(e))
    }

    fn abort_remote(&self, stage: SyncStage, subtitle: &str, e: RemoteError) -> SyncOutcome {
        error!(stage = %stage, error = %e, "Sync aborted");
        self.notifier
            .notify(NOTIFICATION_TITLE, subtitle, &e.to_string());
        SyncOutcome::Aborted(AbortReason::Remote { stage, error: e })
    }
}
