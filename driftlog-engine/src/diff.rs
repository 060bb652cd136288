//! Structural diff between two project snapshots.
//!
//! Two passes:
//! 1. module presence — symmetric difference of the module-name key sets
//! 2. dependency presence — per module in the intersection, symmetric
//!    difference of the target-name sets, computed independently for module
//!    and library dependencies
//!
//! A module outside the intersection is reported only as added/removed; its
//! dependency edges produce no separate changes.

use std::collections::BTreeSet;

use driftlog_model::types::{Dependency, LibraryName, ModuleName, ModuleSnapshot, ProjectSnapshot};
use driftlog_model::StructureChange;

/// Compute the set of structural changes between `previous` and `current`.
///
/// Empty snapshots are legal input ("no modules"); the result is a set, so
/// emitted order carries no meaning.
pub fn diff(previous: &ProjectSnapshot, current: &ProjectSnapshot) -> BTreeSet<StructureChange> {
    let mut changes = BTreeSet::new();

    let old_names = previous.module_names();
    let new_names = current.module_names();

    build_changes(
        &old_names,
        &new_names,
        &mut changes,
        |name| StructureChange::ModuleAdded {
            module: name.clone(),
        },
        |name| StructureChange::ModuleRemoved {
            module: name.clone(),
        },
    );

    for name in old_names.intersection(&new_names) {
        let (old_modules, old_libraries) = partition_dependencies(previous.module(name));
        let (new_modules, new_libraries) = partition_dependencies(current.module(name));

        build_changes(
            &old_modules,
            &new_modules,
            &mut changes,
            |target| StructureChange::ModuleDependencyAdded {
                module: name.clone(),
                target: target.clone(),
            },
            |target| StructureChange::ModuleDependencyRemoved {
                module: name.clone(),
                target: target.clone(),
            },
        );
        build_changes(
            &old_libraries,
            &new_libraries,
            &mut changes,
            |library| StructureChange::LibraryDependencyAdded {
                module: name.clone(),
                library: library.clone(),
            },
            |library| StructureChange::LibraryDependencyRemoved {
                module: name.clone(),
                library: library.clone(),
            },
        );
    }

    changes
}

/// Symmetric difference of `old` and `new`, mapped through the change builders.
fn build_changes<T: Ord>(
    old: &BTreeSet<T>,
    new: &BTreeSet<T>,
    out: &mut BTreeSet<StructureChange>,
    added: impl Fn(&T) -> StructureChange,
    removed: impl Fn(&T) -> StructureChange,
) {
    for gone in old.difference(new) {
        out.insert(removed(gone));
    }
    for fresh in new.difference(old) {
        out.insert(added(fresh));
    }
}

/// Split a module's dependency set into module targets and library targets.
fn partition_dependencies(
    module: Option<&ModuleSnapshot>,
) -> (BTreeSet<ModuleName>, BTreeSet<LibraryName>) {
    let mut modules = BTreeSet::new();
    let mut libraries = BTreeSet::new();
    if let Some(module) = module {
        for dependency in &module.dependencies {
            match dependency {
                Dependency::Module { target } => {
                    modules.insert(target.clone());
                }
                Dependency::Library { target } => {
                    libraries.insert(target.clone());
                }
            }
        }
    }
    (modules, libraries)
}
