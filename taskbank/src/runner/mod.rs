//! @ai:module:intent Language registry and isolated execution engine
//! @ai:module:layer infrastructure
//! @ai:module:public_api Language, LanguageDescriptor, describe, Sandbox, CodeExecutor, ExecutionResult, ExecutionLimits

pub mod language;
pub mod process;
pub mod sandbox;

pub use language::{
    describe, Arg, CommandContext, CommandTemplate, Language, LanguageDescriptor, PreparedSource,
    ResolvedCommand, Tool, WrapRule, ALL_LANGUAGES,
};
pub use sandbox::{CodeExecutor, ExecutionLimits, ExecutionResult, Sandbox, TIMEOUT_DIAGNOSTIC};
