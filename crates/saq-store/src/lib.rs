//! Storage collaborators for SAQ ingestion and export.
//!
//! - [`SqliteStore`]: the production backend.
//! - [`MemoryStore`]: an in-process backend that records every mutation.
//! - [`seed`]: loads [`ReferenceData`] vocabularies into either backend.

pub mod error;
pub mod memory;
pub mod reference;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::{MemoryStore, StoreCall, StoreOp, blank_requirement};
pub use reference::{
    CategorySeed, LicenseTypeSeed, ReferenceData, SeedSummary, VerticalSeed, seed,
};
pub use sqlite::SqliteStore;
pub use traits::{ExportSource, ReferenceCatalog, ReferenceWriter, RequirementStore};
