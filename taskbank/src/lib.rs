//! @ai:module:intent Taskbank submission evaluation library
//! @ai:module:layer application
//! @ai:module:public_api attempts, catalog, config, evaluator, runner, toolchain

pub mod attempts;
pub mod catalog;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod runner;
pub mod toolchain;

pub use attempts::{AttemptKey, AttemptRecord, AttemptStatus, AttemptStore, FileStore, MemoryStore, SystemClock};
pub use catalog::{CatalogLoader, ExerciseCatalog, InMemoryCatalog};
pub use config::TaskbankConfig;
pub use error::{Error, Result};
pub use evaluator::{Evaluator, SubmissionResponse, Verdict};
pub use runner::{CodeExecutor, ExecutionResult, Language, Sandbox};
pub use toolchain::{ToolchainStatus, ToolchainValidator};
