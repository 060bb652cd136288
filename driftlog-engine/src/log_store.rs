//! Change log store — durable persistence of recorded user changes.
//!
//! Persists a `ChangeLogFile` JSON document at
//! `<home>/.driftlog/changes/<project>.json`.
//! Writes use the same atomic `.tmp` + rename pattern as the model descriptor.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use driftlog_model::{ModelError, ProjectName, StructureChange};

use crate::error::{io_err, EngineError};

/// In-memory change log: change identity → last time the change was seen
/// valid against the live environment.
pub type ChangeLog = BTreeMap<StructureChange, DateTime<Utc>>;

/// One persisted change entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChangeRecord {
    #[serde(flatten)]
    pub change: StructureChange,
    pub last_seen: DateTime<Utc>,
}

/// On-disk change log payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChangeLogFile {
    pub saved_at: DateTime<Utc>,
    pub changes: Vec<ChangeRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ChangeLogCompat {
    Structured(ChangeLogStructuredCompat),
    Legacy(Vec<ChangeRecord>),
}

#[derive(Debug, Deserialize)]
struct ChangeLogStructuredCompat {
    pub saved_at: Option<DateTime<Utc>>,
    pub changes: Vec<ChangeRecord>,
}

impl ChangeLogFile {
    /// Collapse records into the in-memory map. Records colliding by change
    /// identity collapse; the later record wins.
    pub fn to_log(&self) -> ChangeLog {
        self.changes
            .iter()
            .map(|record| (record.change.clone(), record.last_seen))
            .collect()
    }

    pub fn from_log(log: &ChangeLog, saved_at: DateTime<Utc>) -> Self {
        Self {
            saved_at,
            changes: log
                .iter()
                .map(|(change, last_seen)| ChangeRecord {
                    change: change.clone(),
                    last_seen: *last_seen,
                })
                .collect(),
        }
    }
}

/// Path to the change log JSON for a given project, rooted at `home`.
///
/// `~/.driftlog/changes/<project>.json`
pub fn store_path_at(home: &Path, project: &ProjectName) -> PathBuf {
    home.join(".driftlog")
        .join("changes")
        .join(format!("{}.json", project.0))
}

/// Load the change log for `project`.
///
/// Returns an empty log if the file does not yet exist.
pub fn load_at(home: &Path, project: &ProjectName) -> Result<ChangeLogFile, EngineError> {
    let path = store_path_at(home, project);
    if !path.exists() {
        return Ok(ChangeLogFile {
            saved_at: Utc::now(),
            changes: vec![],
        });
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    match serde_json::from_str::<ChangeLogCompat>(&contents)? {
        ChangeLogCompat::Structured(file) => Ok(ChangeLogFile {
            saved_at: file.saved_at.unwrap_or_else(Utc::now),
            changes: file.changes,
        }),
        ChangeLogCompat::Legacy(changes) => Ok(ChangeLogFile {
            saved_at: Utc::now(),
            changes,
        }),
    }
}

/// Save the change log for `project` atomically.
///
/// Writes to `<path>.tmp` then renames to `<path>`.
pub fn save_at(
    home: &Path,
    project: &ProjectName,
    file: &ChangeLogFile,
) -> Result<(), EngineError> {
    let path = store_path_at(home, project);
    let Some(dir) = path.parent() else {
        return Err(io_err(
            path,
            std::io::Error::other("invalid change log path"),
        ));
    };

    // Ensure the changes directory exists.
    std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;

    let json = serde_json::to_string_pretty(file)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, &json).map_err(|e| io_err(&tmp, e))?;
    std::fs::rename(&tmp, &path).map_err(|e| io_err(&path, e))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Store trait
// ---------------------------------------------------------------------------

/// Durable persistence boundary for the change log.
///
/// The engine treats the payload as opaque; the only contract is that the
/// change set round-trips between cycles.
pub trait ChangeLogStore {
    fn load(&self) -> Result<ChangeLog, EngineError>;
    fn save(&self, log: &ChangeLog) -> Result<(), EngineError>;
}

/// Default [`ChangeLogStore`] over the JSON file layout above.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    home: PathBuf,
    project: ProjectName,
}

impl JsonFileStore {
    /// Store rooted at the user's home directory.
    pub fn new(project: impl Into<ProjectName>) -> Result<Self, EngineError> {
        let home = dirs::home_dir().ok_or(ModelError::HomeNotFound)?;
        Ok(Self::at(home, project))
    }

    /// Store rooted at an explicit `home`; used in tests with `TempDir`.
    pub fn at(home: impl Into<PathBuf>, project: impl Into<ProjectName>) -> Self {
        Self {
            home: home.into(),
            project: project.into(),
        }
    }

    pub fn path(&self) -> PathBuf {
        store_path_at(&self.home, &self.project)
    }
}

impl ChangeLogStore for JsonFileStore {
    fn load(&self) -> Result<ChangeLog, EngineError> {
        Ok(load_at(&self.home, &self.project)?.to_log())
    }

    fn save(&self, log: &ChangeLog) -> Result<(), EngineError> {
        save_at(
            &self.home,
            &self.project,
            &ChangeLogFile::from_log(log, Utc::now()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn proj() -> ProjectName {
        ProjectName::from("shop")
    }

    fn sample_records() -> Vec<ChangeRecord> {
        let now = Utc::now();
        vec![
            ChangeRecord {
                change: StructureChange::ModuleAdded {
                    module: "app".into(),
                },
                last_seen: now,
            },
            ChangeRecord {
                change: StructureChange::LibraryDependencyRemoved {
                    module: "app".into(),
                    library: "guava".into(),
                },
                last_seen: now,
            },
        ]
    }

    #[test]
    fn empty_log_when_file_missing() {
        let tmp = TempDir::new().unwrap();
        let file = load_at(tmp.path(), &proj()).unwrap();
        assert!(file.changes.is_empty());
    }

    #[test]
    fn roundtrip_save_load() {
        let tmp = TempDir::new().unwrap();
        let file = ChangeLogFile {
            saved_at: Utc::now(),
            changes: sample_records(),
        };

        save_at(tmp.path(), &proj(), &file).unwrap();
        let loaded = load_at(tmp.path(), &proj()).unwrap();
        assert_eq!(loaded.changes, file.changes);
    }

    #[test]
    fn tmp_file_cleaned_up_after_save() {
        let tmp = TempDir::new().unwrap();
        let file = ChangeLogFile {
            saved_at: Utc::now(),
            changes: vec![],
        };
        save_at(tmp.path(), &proj(), &file).unwrap();
        let tmp_path = store_path_at(tmp.path(), &proj()).with_extension("json.tmp");
        assert!(
            !tmp_path.exists(),
            "tmp file should be removed after atomic rename"
        );
    }

    #[test]
    fn load_legacy_bare_array_migrates_to_structured_log() {
        let tmp = TempDir::new().unwrap();
        let path = store_path_at(tmp.path(), &proj());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(
            &path,
            r#"[{"change":"module_added","module":"app","last_seen":"2026-01-05T10:00:00Z"}]"#,
        )
        .unwrap();

        let before = Utc::now();
        let loaded = load_at(tmp.path(), &proj()).unwrap();
        let after = Utc::now();

        assert_eq!(loaded.changes.len(), 1);
        assert_eq!(
            loaded.changes[0].change,
            StructureChange::ModuleAdded {
                module: "app".into()
            }
        );
        assert!(loaded.saved_at >= before && loaded.saved_at <= after);
    }

    #[test]
    fn load_structured_without_saved_at_sets_timestamp() {
        let tmp = TempDir::new().unwrap();
        let path = store_path_at(tmp.path(), &proj());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(
            &path,
            r#"{"changes":[{"change":"module_removed","module":"gone","last_seen":"2026-01-05T10:00:00Z"}]}"#,
        )
        .unwrap();

        let before = Utc::now();
        let loaded = load_at(tmp.path(), &proj()).unwrap();
        let after = Utc::now();

        assert_eq!(loaded.changes.len(), 1);
        assert!(loaded.saved_at >= before && loaded.saved_at <= after);
    }

    #[test]
    fn record_json_shape_is_flat() {
        let record = ChangeRecord {
            change: StructureChange::ModuleDependencyAdded {
                module: "app".into(),
                target: "core".into(),
            },
            last_seen: Utc::now(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["change"], "module_dependency_added");
        assert_eq!(json["module"], "app");
        assert_eq!(json["target"], "core");
        assert!(json.get("last_seen").is_some());
    }

    #[test]
    fn json_store_trait_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let store = JsonFileStore::at(tmp.path(), proj());

        let mut log = ChangeLog::new();
        log.insert(
            StructureChange::ModuleRemoved {
                module: "legacy".into(),
            },
            Utc::now(),
        );
        store.save(&log).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded, log);
    }

    #[test]
    fn to_log_collapses_duplicate_identities_later_wins() {
        let early = Utc::now();
        let late = early + chrono::Duration::hours(1);
        let change = StructureChange::ModuleAdded {
            module: "app".into(),
        };
        let file = ChangeLogFile {
            saved_at: late,
            changes: vec![
                ChangeRecord {
                    change: change.clone(),
                    last_seen: early,
                },
                ChangeRecord {
                    change: change.clone(),
                    last_seen: late,
                },
            ],
        };
        let log = file.to_log();
        assert_eq!(log.len(), 1);
        assert_eq!(log[&change], late);
    }
}
