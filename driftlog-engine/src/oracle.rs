//! Collaborator boundaries to the live environment.
//!
//! The engine never inspects the host environment directly; it goes through
//! [`SnapshotBuilder`] (whole-model observation) and [`ValidityOracle`]
//! (point existence queries). Both may block on live-environment I/O and are
//! treated as potentially slow, synchronous calls.

use std::path::PathBuf;

use driftlog_model::{
    descriptor, LibraryName, ModelError, ModuleName, ProjectName, ProjectSnapshot,
};

use crate::error::EngineError;

/// Builds a snapshot of the current live build model.
///
/// `Ok(None)` means the environment is not configured (e.g. no build-tool
/// link yet) — callers must treat that as "skip the cycle", never as "every
/// module was removed".
pub trait SnapshotBuilder {
    fn build_current_snapshot(&self) -> Result<Option<ProjectSnapshot>, EngineError>;
}

/// Answers whether a module or dependency currently exists live.
///
/// Queries return `Result` because live lookups can fail transiently; the
/// staleness filter handles an `Err` fail-open (the change is kept).
pub trait ValidityOracle {
    fn module_exists(&self, module: &ModuleName) -> Result<bool, EngineError>;
    fn module_dependency_exists(
        &self,
        owner: &ModuleName,
        target: &ModuleName,
    ) -> Result<bool, EngineError>;
    fn library_dependency_exists(
        &self,
        owner: &ModuleName,
        library: &LibraryName,
    ) -> Result<bool, EngineError>;
}

/// A snapshot can serve as its own oracle: existence queries answer from the
/// captured state. Useful for tests and for hosts that already hold a fresh
/// snapshot of the live model.
impl ValidityOracle for ProjectSnapshot {
    fn module_exists(&self, module: &ModuleName) -> Result<bool, EngineError> {
        Ok(self.contains_module(module))
    }

    fn module_dependency_exists(
        &self,
        owner: &ModuleName,
        target: &ModuleName,
    ) -> Result<bool, EngineError> {
        Ok(self.has_module_dependency(owner, target))
    }

    fn library_dependency_exists(
        &self,
        owner: &ModuleName,
        library: &LibraryName,
    ) -> Result<bool, EngineError> {
        Ok(self.has_library_dependency(owner, library))
    }
}

// ---------------------------------------------------------------------------
// Descriptor-backed environment
// ---------------------------------------------------------------------------

/// File-backed live environment: reads the model descriptor the host publishes
/// under `<home>/.driftlog/projects/` on every query.
///
/// As a [`SnapshotBuilder`] an unpublished descriptor is `Ok(None)`
/// (unavailable); as a [`ValidityOracle`] it is an error, which the staleness
/// filter degrades to fail-open.
#[derive(Debug, Clone)]
pub struct DescriptorEnvironment {
    home: PathBuf,
    project: ProjectName,
}

impl DescriptorEnvironment {
    /// Environment rooted at the user's home directory.
    pub fn new(project: impl Into<ProjectName>) -> Result<Self, EngineError> {
        let home = dirs::home_dir().ok_or(ModelError::HomeNotFound)?;
        Ok(Self::at(home, project))
    }

    /// Environment rooted at an explicit `home`; used in tests with `TempDir`.
    pub fn at(home: impl Into<PathBuf>, project: impl Into<ProjectName>) -> Self {
        Self {
            home: home.into(),
            project: project.into(),
        }
    }

    fn load_snapshot(&self) -> Result<Option<ProjectSnapshot>, EngineError> {
        let descriptor = descriptor::load_descriptor_at(&self.home, &self.project)?;
        Ok(descriptor.map(|d| d.snapshot()))
    }

    fn require_snapshot(&self) -> Result<ProjectSnapshot, EngineError> {
        self.load_snapshot()?.ok_or_else(|| EngineError::Environment {
            message: format!("no model descriptor published for '{}'", self.project),
        })
    }
}

impl SnapshotBuilder for DescriptorEnvironment {
    fn build_current_snapshot(&self) -> Result<Option<ProjectSnapshot>, EngineError> {
        self.load_snapshot()
    }
}

impl ValidityOracle for DescriptorEnvironment {
    fn module_exists(&self, module: &ModuleName) -> Result<bool, EngineError> {
        self.require_snapshot()?.module_exists(module)
    }

    fn module_dependency_exists(
        &self,
        owner: &ModuleName,
        target: &ModuleName,
    ) -> Result<bool, EngineError> {
        self.require_snapshot()?.module_dependency_exists(owner, target)
    }

    fn library_dependency_exists(
        &self,
        owner: &ModuleName,
        library: &LibraryName,
    ) -> Result<bool, EngineError> {
        self.require_snapshot()?
            .library_dependency_exists(owner, library)
    }
}
