//! # driftlog-engine
//!
//! Snapshot diffing and change-log reconciliation.
//!
//! Construct a [`Reconciler`] over a [`SnapshotBuilder`], a
//! [`ValidityOracle`], and a [`ChangeLogStore`], then call
//! [`Reconciler::update_changes`] whenever the host observes a possible
//! structural edit and [`Reconciler::filter_outdated_changes`] before showing
//! the recorded changes to anyone.

pub mod diff;
pub mod error;
pub mod log_store;
pub mod oracle;
pub mod reconcile;
pub mod staleness;

pub use error::EngineError;
pub use log_store::{ChangeLog, ChangeLogFile, ChangeLogStore, ChangeRecord, JsonFileStore};
pub use oracle::{DescriptorEnvironment, SnapshotBuilder, ValidityOracle};
pub use reconcile::Reconciler;
