//! User-made structural changes to the build model.
//!
//! One variant per change kind; the fields are exactly the identity of the
//! change. The last-seen-valid timestamp is NOT part of the value — the change
//! log keeps it as the map value keyed by `StructureChange`, so re-detecting
//! an already-recorded change refreshes its timestamp instead of duplicating
//! the entry.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{LibraryName, ModuleName};

/// One structural delta between two project snapshots, attributed to the user.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum StructureChange {
    ModuleAdded {
        module: ModuleName,
    },
    ModuleRemoved {
        module: ModuleName,
    },
    ModuleDependencyAdded {
        module: ModuleName,
        target: ModuleName,
    },
    ModuleDependencyRemoved {
        module: ModuleName,
        target: ModuleName,
    },
    LibraryDependencyAdded {
        module: ModuleName,
        library: LibraryName,
    },
    LibraryDependencyRemoved {
        module: ModuleName,
        library: LibraryName,
    },
}

impl StructureChange {
    /// The module whose configuration the change belongs to.
    pub fn module(&self) -> &ModuleName {
        match self {
            StructureChange::ModuleAdded { module }
            | StructureChange::ModuleRemoved { module }
            | StructureChange::ModuleDependencyAdded { module, .. }
            | StructureChange::ModuleDependencyRemoved { module, .. }
            | StructureChange::LibraryDependencyAdded { module, .. }
            | StructureChange::LibraryDependencyRemoved { module, .. } => module,
        }
    }
}

impl fmt::Display for StructureChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructureChange::ModuleAdded { module } => {
                write!(f, "module '{module}' is added")
            }
            StructureChange::ModuleRemoved { module } => {
                write!(f, "module '{module}' is removed")
            }
            StructureChange::ModuleDependencyAdded { module, target } => {
                write!(
                    f,
                    "dependency to module '{target}' is added to module '{module}' config"
                )
            }
            StructureChange::ModuleDependencyRemoved { module, target } => {
                write!(
                    f,
                    "dependency to module '{target}' is removed from module '{module}' config"
                )
            }
            StructureChange::LibraryDependencyAdded { module, library } => {
                write!(
                    f,
                    "dependency to library '{library}' is added to module '{module}' config"
                )
            }
            StructureChange::LibraryDependencyRemoved { module, library } => {
                write!(
                    f,
                    "dependency to library '{library}' is removed from module '{module}' config"
                )
            }
        }
    }
}
