//! Per-project YAML model descriptors.
//!
//! The descriptor is the publication point for the externally maintained
//! build model: after every import the host writes the model it observed, and
//! the engine's default snapshot builder and validity oracle read it back as
//! "the live environment".
//!
//! # Storage layout
//!
//! ```text
//! ~/.driftlog/
//!   projects/
//!     <project_name>.yaml   (one file per project — mode 0600)
//! ```
//!
//! # API pattern
//!
//! Every function has two forms:
//! - `fn_at(home: &Path, …)` — explicit home; used in tests with `TempDir`
//! - `fn(…)` — derives home from `dirs::home_dir()`, delegates to `_at`
//!
//! Tests must NEVER call the no-arg wrappers; always use `_at`.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::types::{ModuleSnapshot, ProjectName, ProjectSnapshot};

// ---------------------------------------------------------------------------
// Descriptor payload
// ---------------------------------------------------------------------------

/// On-disk description of a project's build model, as last published by the
/// host's build-tool import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDescriptor {
    pub project: ProjectName,
    pub published_at: DateTime<Utc>,
    /// Build file the model was imported from, if the host knows it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_path: Option<PathBuf>,
    #[serde(default)]
    pub modules: Vec<ModuleSnapshot>,
}

impl ProjectDescriptor {
    pub fn new(project: impl Into<ProjectName>, modules: Vec<ModuleSnapshot>) -> Self {
        Self {
            project: project.into(),
            published_at: Utc::now(),
            source_path: None,
            modules,
        }
    }

    /// Collapse the module list into an immutable snapshot. Duplicate module
    /// names collapse; the last entry wins.
    pub fn snapshot(&self) -> ProjectSnapshot {
        ProjectSnapshot::from_modules(self.modules.iter().cloned())
    }
}

// ---------------------------------------------------------------------------
// 1. Path helpers
// ---------------------------------------------------------------------------

/// `<home>/.driftlog/projects/` — pure, no I/O.
pub fn projects_dir_at(home: &Path) -> PathBuf {
    home.join(".driftlog").join("projects")
}

/// `<home>/.driftlog/projects/<project>.yaml` — pure, no I/O.
pub fn descriptor_path_at(home: &Path, project: &ProjectName) -> PathBuf {
    projects_dir_at(home).join(format!("{}.yaml", project.0))
}

/// Lists the names of all projects with a published descriptor, sorted.
pub fn list_projects_at(home: &Path) -> Result<Vec<ProjectName>, ModelError> {
    let dir = projects_dir_at(home);
    if !dir.exists() {
        return Ok(vec![]);
    }
    let mut names: Vec<ProjectName> = std::fs::read_dir(&dir)?
        .filter_map(|e| e.ok())
        .filter_map(|e| {
            let fname = e.file_name();
            let name = fname.to_string_lossy();
            name.strip_suffix(".yaml")
                .map(|stem| ProjectName::from(stem.to_owned()))
        })
        .collect();
    names.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(names)
}

/// `list_projects_at` convenience wrapper.
pub fn list_projects() -> Result<Vec<ProjectName>, ModelError> {
    list_projects_at(&home()?)
}

// ---------------------------------------------------------------------------
// 2. Load
// ---------------------------------------------------------------------------

/// Load the descriptor for `project`, if one has been published.
///
/// Returns `Ok(None)` when no descriptor exists — the environment is simply
/// not configured yet, which callers must treat as "unavailable" rather than
/// "empty model". Malformed YAML is `ModelError::Parse` with path context.
pub fn load_descriptor_at(
    home: &Path,
    project: &ProjectName,
) -> Result<Option<ProjectDescriptor>, ModelError> {
    let path = descriptor_path_at(home, project);
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(&path)?;
    let descriptor =
        serde_yaml::from_str(&contents).map_err(|e| ModelError::Parse { path, source: e })?;
    Ok(Some(descriptor))
}

/// `load_descriptor_at` convenience wrapper.
pub fn load_descriptor(project: &ProjectName) -> Result<Option<ProjectDescriptor>, ModelError> {
    load_descriptor_at(&home()?, project)
}

// ---------------------------------------------------------------------------
// 3. Save (atomic)
// ---------------------------------------------------------------------------

/// Atomically publish a descriptor to `<home>/.driftlog/projects/<project>.yaml`.
///
/// Write flow: serialize → `.yaml.tmp` sibling → `chmod 0600` → `rename`.
/// `.tmp` is always in the same directory as the target (same filesystem — no
/// EXDEV on macOS).
pub fn save_descriptor_at(home: &Path, descriptor: &ProjectDescriptor) -> Result<(), ModelError> {
    let dir = projects_dir_at(home);
    if !dir.exists() {
        std::fs::create_dir_all(&dir)?;
        set_dir_permissions(&dir)?;
    }

    let path = descriptor_path_at(home, &descriptor.project);
    let tmp_path = path.with_file_name(format!("{}.yaml.tmp", descriptor.project.0));

    let yaml = serde_yaml::to_string(descriptor)?;
    std::fs::write(&tmp_path, yaml)?;
    set_file_permissions(&tmp_path)?;
    std::fs::rename(&tmp_path, &path)?;
    Ok(())
}

/// `save_descriptor_at` convenience wrapper.
pub fn save_descriptor(descriptor: &ProjectDescriptor) -> Result<(), ModelError> {
    save_descriptor_at(&home()?, descriptor)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn home() -> Result<PathBuf, ModelError> {
    dirs::home_dir().ok_or(ModelError::HomeNotFound)
}

#[cfg(unix)]
fn set_dir_permissions(path: &Path) -> Result<(), ModelError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))?;
    Ok(())
}
#[cfg(not(unix))]
fn set_dir_permissions(_path: &Path) -> Result<(), ModelError> {
    Ok(())
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), ModelError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    Ok(())
}
#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), ModelError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
