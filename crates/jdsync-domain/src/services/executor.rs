//! Plan execution.
//!
//! The panel offers no atomic upsert, so a plan is a sequence of independent
//! calls. Deletes are best effort: a failed delete is logged and the plan
//! carries on. What decides success is the end state. If the final create
//! reports the value as already present, the panel holds the right record
//! even when every delete failed.

use jdsync_client::{PanelApi, RecordId, Result};
use jdsync_config::SyncConfig;
use tracing::{info, warn};

use crate::reconcile::{Plan, PlanKind};

/// What happened while executing a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionReport {
    pub plan: PlanKind,
    /// Records deleted successfully.
    pub deleted: Vec<RecordId>,
    /// Records whose delete failed.
    pub failed_deletes: Vec<RecordId>,
    /// A new record was written.
    pub created: bool,
    /// The create was rejected because the value already exists.
    pub duplicate_detected: bool,
}

impl ExecutionReport {
    fn new(plan: PlanKind) -> Self {
        Self {
            plan,
            deleted: Vec::new(),
            failed_deletes: Vec::new(),
            created: false,
            duplicate_detected: false,
        }
    }

    /// Whether the user should not hear about this execution.
    ///
    /// Nothing user-visible changed when the value was already on the panel.
    pub fn is_silent(&self) -> bool {
        matches!(self.plan, PlanKind::NoOp | PlanKind::PruneDuplicates) || self.duplicate_detected
    }
}

/// Execute `plan` against the panel.
///
/// Only a failed create is an error. Delete failures are recorded in the
/// report.
pub async fn execute_plan(
    panel: &dyn PanelApi,
    config: &SyncConfig,
    token: &str,
    plan: &Plan,
) -> Result<ExecutionReport> {
    let mut report = ExecutionReport::new(plan.kind());

    match plan {
        Plan::NoOp => {
            info!("Cookie unchanged and no duplicates, nothing to do");
        }
        Plan::PruneDuplicates { keep, remove } => {
            info!(keep = ?keep, count = remove.len(), "Pruning duplicate records");
            delete_all(panel, config, token, remove, &mut report).await;
        }
        Plan::ReplaceAll { remove, create } => {
            info!(count = remove.len(), "Cookie rotated, replacing records");
            delete_all(panel, config, token, remove, &mut report).await;

            let outcome = panel.create_record(config, token, create).await?;
            report.created = !outcome.duplicate_detected;
            report.duplicate_detected = outcome.duplicate_detected;

            if !report.failed_deletes.is_empty() && outcome.duplicate_detected {
                info!(
                    failed = report.failed_deletes.len(),
                    "Deletes failed but the panel already holds the cookie, treating as synced"
                );
            }
        }
        Plan::Create(create) => {
            info!("No record for account yet, creating");
            let outcome = panel.create_record(config, token, create).await?;
            report.created = !outcome.duplicate_detected;
            report.duplicate_detected = outcome.duplicate_detected;
        }
    }

    Ok(report)
}

async fn delete_all(
    panel: &dyn PanelApi,
    config: &SyncConfig,
    token: &str,
    ids: &[RecordId],
    report: &mut ExecutionReport,
) {
    for &id in ids {
        match panel.delete_record(config, token, id).await {
            Ok(()) => report.deleted.push(id),
            Err(e) if e.is_delete_failure() => {
                warn!(record_id = id.0, error = %e, "Panel refused to delete record, continuing");
                report.failed_deletes.push(id);
            }
            Err(e) => {
                warn!(record_id = id.0, error = %e, "Delete request did not complete, continuing");
                report.failed_deletes.push(id);
            }
        }
    }
}
