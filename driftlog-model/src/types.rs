//! Domain types for the driftlog build model.
//!
//! Snapshots are immutable values: build one, hand it to the engine, replace
//! it wholesale next cycle. All collections are ordered (`BTreeMap`/`BTreeSet`)
//! so serialized output and diff walks are deterministic.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed name for a tracked project.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProjectName(pub String);

impl fmt::Display for ProjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ProjectName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ProjectName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A strongly-typed name for a module in the build model.
///
/// Module names are the snapshot identity: two snapshots are compared by
/// their module-name key sets before anything else.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ModuleName(pub String);

impl fmt::Display for ModuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ModuleName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ModuleName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A strongly-typed name for a library a module may depend on.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LibraryName(pub String);

impl fmt::Display for LibraryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for LibraryName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for LibraryName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Dependencies
// ---------------------------------------------------------------------------

/// One dependency edge owned by a module.
///
/// The owning module is implied by the [`ModuleSnapshot`] holding the set, so
/// the full identity of an edge is (owner, target, kind). Duplicates collapse
/// under set semantics.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Dependency {
    /// Dependency on another module of the same project.
    Module { target: ModuleName },
    /// Dependency on a named library.
    Library { target: LibraryName },
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

/// One module of the build model at a single point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleSnapshot {
    pub name: ModuleName,
    /// Where the module lives on disk. Opaque to the engine: never compared.
    pub path: PathBuf,
    #[serde(default)]
    pub dependencies: BTreeSet<Dependency>,
}

impl ModuleSnapshot {
    pub fn new(name: impl Into<ModuleName>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            dependencies: BTreeSet::new(),
        }
    }

    /// Builder-style helper: add a dependency on another module.
    pub fn with_module_dependency(mut self, target: impl Into<ModuleName>) -> Self {
        self.dependencies.insert(Dependency::Module {
            target: target.into(),
        });
        self
    }

    /// Builder-style helper: add a dependency on a library.
    pub fn with_library_dependency(mut self, target: impl Into<LibraryName>) -> Self {
        self.dependencies.insert(Dependency::Library {
            target: target.into(),
        });
        self
    }

    pub fn depends_on_module(&self, target: &ModuleName) -> bool {
        self.dependencies.contains(&Dependency::Module {
            target: target.clone(),
        })
    }

    pub fn depends_on_library(&self, target: &LibraryName) -> bool {
        self.dependencies.contains(&Dependency::Library {
            target: target.clone(),
        })
    }
}

/// The whole build model at one instant: module name → module snapshot.
///
/// Keys are unique by construction. Snapshots are compared only by their
/// module-name sets and, for modules present on both sides, by dependency
/// sets — never by `path` or other incidental fields.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProjectSnapshot {
    #[serde(default)]
    pub modules: BTreeMap<ModuleName, ModuleSnapshot>,
}

impl ProjectSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot from an iterator of modules. Duplicate names collapse;
    /// the last entry wins.
    pub fn from_modules(modules: impl IntoIterator<Item = ModuleSnapshot>) -> Self {
        let mut snapshot = Self::new();
        for module in modules {
            snapshot.insert_module(module);
        }
        snapshot
    }

    /// Insert a module, replacing any previous entry with the same name.
    pub fn insert_module(&mut self, module: ModuleSnapshot) -> Option<ModuleSnapshot> {
        self.modules.insert(module.name.clone(), module)
    }

    pub fn module(&self, name: &ModuleName) -> Option<&ModuleSnapshot> {
        self.modules.get(name)
    }

    pub fn module_names(&self) -> BTreeSet<ModuleName> {
        self.modules.keys().cloned().collect()
    }

    pub fn contains_module(&self, name: &ModuleName) -> bool {
        self.modules.contains_key(name)
    }

    pub fn has_module_dependency(&self, owner: &ModuleName, target: &ModuleName) -> bool {
        self.modules
            .get(owner)
            .map(|m| m.depends_on_module(target))
            .unwrap_or(false)
    }

    pub fn has_library_dependency(&self, owner: &ModuleName, target: &LibraryName) -> bool {
        self.modules
            .get(owner)
            .map(|m| m.depends_on_library(target))
            .unwrap_or(false)
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newtype_display() {
        assert_eq!(ProjectName::from("shop").to_string(), "shop");
        assert_eq!(ModuleName::from("shop-api").to_string(), "shop-api");
        assert_eq!(LibraryName::from("junit-4.11").to_string(), "junit-4.11");
    }

    #[test]
    fn newtype_equality() {
        let a = ModuleName::from("x");
        let b = ModuleName::from(String::from("x"));
        assert_eq!(a, b);
    }

    #[test]
    fn duplicate_dependencies_collapse() {
        let module = ModuleSnapshot::new("api", "/code/api")
            .with_module_dependency("core")
            .with_module_dependency("core")
            .with_library_dependency("slf4j");
        assert_eq!(module.dependencies.len(), 2);
    }

    #[test]
    fn module_and_library_targets_with_same_name_are_distinct() {
        let module = ModuleSnapshot::new("api", "/code/api")
            .with_module_dependency("util")
            .with_library_dependency("util");
        assert_eq!(module.dependencies.len(), 2);
        assert!(module.depends_on_module(&ModuleName::from("util")));
        assert!(module.depends_on_library(&LibraryName::from("util")));
    }

    #[test]
    fn insert_module_replaces_by_name() {
        let mut snapshot = ProjectSnapshot::new();
        snapshot.insert_module(ModuleSnapshot::new("api", "/old"));
        let previous = snapshot.insert_module(ModuleSnapshot::new("api", "/new"));
        assert!(previous.is_some());
        assert_eq!(snapshot.modules.len(), 1);
        assert_eq!(
            snapshot.module(&ModuleName::from("api")).unwrap().path,
            PathBuf::from("/new")
        );
    }

    #[test]
    fn dependency_lookups_on_missing_module_are_false() {
        let snapshot = ProjectSnapshot::new();
        assert!(!snapshot.has_module_dependency(&ModuleName::from("a"), &ModuleName::from("b")));
        assert!(!snapshot.has_library_dependency(&ModuleName::from("a"), &LibraryName::from("l")));
    }

    #[test]
    fn from_modules_last_duplicate_wins() {
        let snapshot = ProjectSnapshot::from_modules(vec![
            ModuleSnapshot::new("api", "/first"),
            ModuleSnapshot::new("api", "/second"),
        ]);
        assert_eq!(snapshot.modules.len(), 1);
        assert_eq!(
            snapshot.module(&ModuleName::from("api")).unwrap().path,
            PathBuf::from("/second")
        );
    }
}
