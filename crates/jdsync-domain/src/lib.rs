//! Sync engine for jdsync.
//!
//! This crate holds the decision logic that sits between an intercepted
//! request and the remote panel:
//!
//! - **Credential extraction**: pull and validate the token/account pair
//!   from a `Cookie` header
//! - **Reconciliation**: compare the panel's records with the captured
//!   cookie and plan the create/delete calls that converge them
//! - **Orchestration**: throttle, authenticate, list, execute the plan,
//!   update the cache and tell the user what happened
//!
//! # Example
//!
//! ```ignore
//! use jdsync_domain::{LogNotifier, SyncService};
//!
//! let service = SyncService::new(sync_store, panel, Arc::new(LogNotifier));
//! let outcome = service.handle_request(&headers).await;
//! ```

pub mod credential;
mod error;
pub mod notify;
pub mod reconcile;
pub mod services;

pub use credential::{Captured, CookieFields, Credential, CredentialExtractor, header_value};
pub use error::ExtractionError;
pub use notify::{LogNotifier, MemoryNotifier, Notification, Notifier, SharedNotifier};
pub use reconcile::{Plan, PlanKind, reconcile};
pub use services::executor::{ExecutionReport, execute_plan};
pub use services::sync::{AbortReason, SyncOutcome, SyncReport, SyncService, SyncStage};
