//! Reconciliation cycle driver.
//!
//! The [`Reconciler`] owns the baseline snapshot and the in-memory change
//! log. One `update_changes` call is one cycle: observe → diff → merge →
//! staleness-filter → persist → advance baseline. `&mut self` keeps cycles
//! serialized per instance; hosts coalesce triggers and add a mutex for
//! cross-thread use.

use chrono::{DateTime, Utc};

use driftlog_model::ProjectSnapshot;

use crate::diff;
use crate::error::EngineError;
use crate::log_store::{ChangeLog, ChangeLogStore};
use crate::oracle::{SnapshotBuilder, ValidityOracle};
use crate::staleness;

/// Detects and records user-made structural edits to the build model.
pub struct Reconciler<B, O, S> {
    builder: B,
    oracle: O,
    store: S,
    baseline: Option<ProjectSnapshot>,
    log: ChangeLog,
}

impl<B, O, S> Reconciler<B, O, S>
where
    B: SnapshotBuilder,
    O: ValidityOracle,
    S: ChangeLogStore,
{
    /// Load the persisted change log and start with no baseline; the first
    /// `update_changes` call establishes one without diffing.
    pub fn new(builder: B, oracle: O, store: S) -> Result<Self, EngineError> {
        let log = store.load()?;
        Ok(Self {
            builder,
            oracle,
            store,
            baseline: None,
            log,
        })
    }

    /// The recorded user changes.
    pub fn changes(&self) -> &ChangeLog {
        &self.log
    }

    /// The last observed snapshot, if any cycle has completed.
    pub fn baseline(&self) -> Option<&ProjectSnapshot> {
        self.baseline.as_ref()
    }

    /// Run one reconciliation cycle.
    ///
    /// Every delta between the baseline and the freshly built snapshot is
    /// considered user-made and merged into the log (colliding identities get
    /// their timestamps refreshed, never duplicated). The merged log is then
    /// staleness-filtered and persisted, and the baseline advances to the new
    /// snapshot whether or not any change was found.
    ///
    /// An unavailable environment skips the cycle entirely; a failed snapshot
    /// build aborts it before any state is touched.
    pub fn update_changes(&mut self) -> Result<&ChangeLog, EngineError> {
        let Some(current) = self.builder.build_current_snapshot()? else {
            tracing::debug!("live environment unavailable; skipping reconciliation cycle");
            return Ok(&self.log);
        };

        let Some(previous) = self.baseline.replace(current.clone()) else {
            // First observation: nothing to diff against. Treating it as "all
            // modules added" would be wrong, so only filter and persist.
            self.run_filter(Utc::now());
            self.persist();
            return Ok(&self.log);
        };

        let detected = diff::diff(&previous, &current);
        let now = Utc::now();
        if !detected.is_empty() {
            tracing::info!("detected {} user change(s) to the build model", detected.len());
        }
        for change in detected {
            self.log.insert(change, now);
        }

        self.run_filter(now);
        self.persist();
        Ok(&self.log)
    }

    /// Prune entries that no longer hold against the live environment, without
    /// running a diff. Safe to call at any time (e.g. before displaying the
    /// log, or on a periodic timer).
    pub fn filter_outdated_changes(&mut self) -> &ChangeLog {
        self.run_filter(Utc::now());
        self.persist();
        &self.log
    }

    /// Adopt the current live state as the new baseline WITHOUT diffing.
    ///
    /// Call this right after a fresh build-tool import: the import's own
    /// effects must not be recorded as user edits. Recorded changes the
    /// import made obsolete are pruned by the staleness filter.
    pub fn reset_baseline(&mut self) -> Result<Option<&ProjectSnapshot>, EngineError> {
        self.baseline = self.builder.build_current_snapshot()?;
        self.run_filter(Utc::now());
        self.persist();
        Ok(self.baseline.as_ref())
    }

    fn run_filter(&mut self, now: DateTime<Utc>) {
        let dropped = staleness::filter_outdated(&mut self.log, &self.oracle, now);
        if !dropped.is_empty() {
            tracing::info!("pruned {} outdated change(s)", dropped.len());
        }
    }

    /// Best-effort save: a failed write degrades to a warning and the
    /// in-memory log stays authoritative until the next successful save.
    fn persist(&self) {
        if let Err(err) = self.store.save(&self.log) {
            tracing::warn!("failed to persist change log, keeping in-memory state: {err}");
        }
    }
}
