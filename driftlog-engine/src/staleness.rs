//! Staleness filtering over the persisted change log.
//!
//! Validity rules, per change kind:
//! - `ModuleAdded` — module still exists live
//! - `ModuleRemoved` — module still absent live
//! - `*DependencyAdded` — dependency still exists live
//! - `*DependencyRemoved` — dependency still absent live
//!
//! Valid entries get their last-seen timestamp refreshed; invalid entries are
//! dropped. An oracle query error is fail-open: the entry is kept, its
//! timestamp is NOT refreshed (it was not actually verified), and a warning is
//! logged. The pass is idempotent and safe to run outside a diff cycle.

use chrono::{DateTime, Utc};

use driftlog_model::StructureChange;

use crate::error::EngineError;
use crate::log_store::ChangeLog;
use crate::oracle::ValidityOracle;

/// Answer whether a recorded change still reflects the live environment.
pub fn is_up_to_date<O: ValidityOracle + ?Sized>(
    change: &StructureChange,
    oracle: &O,
) -> Result<bool, EngineError> {
    match change {
        StructureChange::ModuleAdded { module } => oracle.module_exists(module),
        StructureChange::ModuleRemoved { module } => Ok(!oracle.module_exists(module)?),
        StructureChange::ModuleDependencyAdded { module, target } => {
            oracle.module_dependency_exists(module, target)
        }
        StructureChange::ModuleDependencyRemoved { module, target } => {
            Ok(!oracle.module_dependency_exists(module, target)?)
        }
        StructureChange::LibraryDependencyAdded { module, library } => {
            oracle.library_dependency_exists(module, library)
        }
        StructureChange::LibraryDependencyRemoved { module, library } => {
            Ok(!oracle.library_dependency_exists(module, library)?)
        }
    }
}

/// Drop outdated entries from `log` and refresh timestamps of valid ones.
///
/// Returns the dropped changes so callers can report them.
pub fn filter_outdated<O: ValidityOracle + ?Sized>(
    log: &mut ChangeLog,
    oracle: &O,
    now: DateTime<Utc>,
) -> Vec<StructureChange> {
    let mut dropped = Vec::new();
    let entries: Vec<StructureChange> = log.keys().cloned().collect();
    for change in entries {
        match is_up_to_date(&change, oracle) {
            Ok(true) => {
                log.insert(change, now);
            }
            Ok(false) => {
                tracing::debug!("dropping outdated change: {change}");
                log.remove(&change);
                dropped.push(change);
            }
            Err(err) => {
                tracing::warn!("validity check failed for '{change}', keeping it: {err}");
            }
        }
    }
    dropped
}

#[cfg(test)]
mod tests {
    use driftlog_model::types::{LibraryName, ModuleName, ModuleSnapshot, ProjectSnapshot};
    use rstest::rstest;

    use super::*;

    /// Oracle whose every query fails, for the fail-open path.
    struct BrokenOracle;

    impl ValidityOracle for BrokenOracle {
        fn module_exists(&self, _: &ModuleName) -> Result<bool, EngineError> {
            Err(EngineError::Environment {
                message: "transient lookup failure".into(),
            })
        }
        fn module_dependency_exists(
            &self,
            _: &ModuleName,
            _: &ModuleName,
        ) -> Result<bool, EngineError> {
            Err(EngineError::Environment {
                message: "transient lookup failure".into(),
            })
        }
        fn library_dependency_exists(
            &self,
            _: &ModuleName,
            _: &LibraryName,
        ) -> Result<bool, EngineError> {
            Err(EngineError::Environment {
                message: "transient lookup failure".into(),
            })
        }
    }

    fn live() -> ProjectSnapshot {
        ProjectSnapshot::from_modules(vec![
            ModuleSnapshot::new("app", "/app")
                .with_module_dependency("core")
                .with_library_dependency("guava"),
            ModuleSnapshot::new("core", "/core"),
        ])
    }

    #[rstest]
    #[case::module_added_still_present(
        StructureChange::ModuleAdded { module: "app".into() }, true)]
    #[case::module_added_now_gone(
        StructureChange::ModuleAdded { module: "ghost".into() }, false)]
    #[case::module_removed_still_absent(
        StructureChange::ModuleRemoved { module: "ghost".into() }, true)]
    #[case::module_removed_but_reappeared(
        StructureChange::ModuleRemoved { module: "app".into() }, false)]
    #[case::module_dep_added_still_present(
        StructureChange::ModuleDependencyAdded { module: "app".into(), target: "core".into() }, true)]
    #[case::module_dep_added_now_gone(
        StructureChange::ModuleDependencyAdded { module: "core".into(), target: "app".into() }, false)]
    #[case::module_dep_removed_still_absent(
        StructureChange::ModuleDependencyRemoved { module: "core".into(), target: "app".into() }, true)]
    #[case::module_dep_removed_but_restored(
        StructureChange::ModuleDependencyRemoved { module: "app".into(), target: "core".into() }, false)]
    #[case::library_dep_added_still_present(
        StructureChange::LibraryDependencyAdded { module: "app".into(), library: "guava".into() }, true)]
    #[case::library_dep_removed_but_restored(
        StructureChange::LibraryDependencyRemoved { module: "app".into(), library: "guava".into() }, false)]
    fn validity_table(#[case] change: StructureChange, #[case] expected: bool) {
        assert_eq!(is_up_to_date(&change, &live()).unwrap(), expected);
    }

    #[test]
    fn valid_entries_get_timestamps_refreshed() {
        let old = Utc::now() - chrono::Duration::hours(6);
        let mut log = ChangeLog::new();
        let change = StructureChange::ModuleAdded {
            module: "app".into(),
        };
        log.insert(change.clone(), old);

        let now = Utc::now();
        let dropped = filter_outdated(&mut log, &live(), now);

        assert!(dropped.is_empty());
        assert_eq!(log[&change], now, "valid entry must be re-stamped");
    }

    #[test]
    fn invalid_entries_are_dropped_and_reported() {
        let mut log = ChangeLog::new();
        let stale = StructureChange::ModuleRemoved {
            module: "app".into(),
        };
        let fresh = StructureChange::ModuleAdded {
            module: "app".into(),
        };
        log.insert(stale.clone(), Utc::now());
        log.insert(fresh.clone(), Utc::now());

        let dropped = filter_outdated(&mut log, &live(), Utc::now());

        assert_eq!(dropped, vec![stale]);
        assert_eq!(log.len(), 1);
        assert!(log.contains_key(&fresh));
    }

    #[test]
    fn filtering_twice_is_idempotent() {
        let mut log = ChangeLog::new();
        log.insert(
            StructureChange::ModuleAdded {
                module: "app".into(),
            },
            Utc::now(),
        );
        log.insert(
            StructureChange::ModuleRemoved {
                module: "app".into(),
            },
            Utc::now(),
        );

        filter_outdated(&mut log, &live(), Utc::now());
        let after_first: Vec<_> = log.keys().cloned().collect();
        let dropped = filter_outdated(&mut log, &live(), Utc::now());
        let after_second: Vec<_> = log.keys().cloned().collect();

        assert!(dropped.is_empty());
        assert_eq!(after_first, after_second);
    }

    #[test]
    fn oracle_failure_is_fail_open_without_refresh() {
        let old = Utc::now() - chrono::Duration::hours(6);
        let mut log = ChangeLog::new();
        let change = StructureChange::ModuleAdded {
            module: "app".into(),
        };
        log.insert(change.clone(), old);

        let dropped = filter_outdated(&mut log, &BrokenOracle, Utc::now());

        assert!(dropped.is_empty(), "errors must never drop a change");
        assert_eq!(log[&change], old, "unverified entry keeps its old stamp");
    }
}
