//! @ai:module:intent Exercise catalog definitions and loading
//! @ai:module:layer domain
//! @ai:module:public_api Exercise, ReferenceSolution, ExerciseCatalog, InMemoryCatalog, CatalogLoader

pub mod exercise;
pub mod loader;
pub mod store;

pub use exercise::{Exercise, ReferenceSolution};
pub use loader::CatalogLoader;
pub use store::{CatalogIssue, ExerciseCatalog, InMemoryCatalog};
