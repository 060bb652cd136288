//! driftlog model library — build-model types, change variants, descriptor
//! persistence, errors.
//!
//! Public API surface:
//! - [`types`] — newtypes and snapshot structs
//! - [`change`] — [`StructureChange`]
//! - [`descriptor`] — publish / load the per-project model descriptor
//! - [`error`] — [`ModelError`]

pub mod change;
pub mod descriptor;
pub mod error;
pub mod types;

pub use change::StructureChange;
pub use descriptor::ProjectDescriptor;
pub use error::ModelError;
pub use types::{
    Dependency, LibraryName, ModuleName, ModuleSnapshot, ProjectName, ProjectSnapshot,
};
