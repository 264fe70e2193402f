//! Domain services.
//!
//! - [`executor`]: runs a reconciliation plan against the panel
//! - [`sync`]: the per-request orchestrator

pub mod executor;
pub mod sync;

#[cfg(test)]
pub(crate) mod testing;
