//! @ai:module:intent Compile and run untrusted submissions in a disposable working directory
//! @ai:module:layer infrastructure
//! @ai:module:public_api Sandbox, CodeExecutor, ExecutionResult, ExecutionLimits, TIMEOUT_DIAGNOSTIC
//! @ai:module:stateless true

use crate::config::{TaskbankConfig, ToolchainConfig};
use crate::error::Result;
use crate::runner::language::{CommandContext, CommandTemplate, Language, LanguageDescriptor};
use crate::runner::process::{run_with_timeout, ProcessOutcome, ProcessOutput};
use serde::Serialize;
use std::path::Path;
use std::time::Duration;

pub const TIMEOUT_DIAGNOSTIC: &str = "Execution timed out";

const TRUNCATION_MARKER: &str = "... [truncated]";

/// @ai:intent Whether a submission built and ran without error
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionResult {
    pub succeeded: bool,
    pub diagnostic: Option<String>,
}

impl ExecutionResult {
    pub fn success() -> Self {
        Self {
            succeeded: true,
            diagnostic: None,
        }
    }

    pub fn failure(diagnostic: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            diagnostic: Some(diagnostic.into()),
        }
    }

    pub fn timed_out() -> Self {
        Self::failure(TIMEOUT_DIAGNOSTIC)
    }
}

/// @ai:intent Independent wall-clock budgets for the compile and run steps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionLimits {
    pub compile_timeout: Duration,
    pub run_timeout: Duration,
}

impl ExecutionLimits {
    /// @ai:intent Use the same budget for both steps
    /// @ai:effects pure
    pub fn uniform(timeout: Duration) -> Self {
        Self {
            compile_timeout: timeout,
            run_timeout: timeout,
        }
    }
}

impl Default for ExecutionLimits {
    fn default() -> Self {
        Self::uniform(Duration::from_secs(5))
    }
}

/// @ai:intent Trait for running submitted code
#[allow(async_fn_in_trait)]
pub trait CodeExecutor: Send + Sync {
    /// @ai:intent Build and run source, reporting only success or a diagnostic
    /// @ai:post never returns an error: every failure is folded into the result
    async fn execute(&self, language: Language, source: &str, limits: ExecutionLimits) -> ExecutionResult;
}

/// @ai:intent Executes submissions on the host toolchain inside a temporary directory
#[derive(Debug, Clone)]
pub struct Sandbox {
    toolchain: ToolchainConfig,
    max_diagnostic_bytes: usize,
}

enum Step {
    Passed,
    Failed(ExecutionResult),
}

impl Sandbox {
    /// @ai:intent Create a sandbox using the given toolchain program names
    /// @ai:effects pure
    pub fn new(toolchain: ToolchainConfig) -> Self {
        Self {
            toolchain,
            max_diagnostic_bytes: 4096,
        }
    }

    /// @ai:intent Create a sandbox from the application configuration
    /// @ai:effects pure
    pub fn from_config(config: &TaskbankConfig) -> Self {
        Self::new(config.toolchain.clone())
            .with_max_diagnostic_bytes(config.evaluation.max_diagnostic_bytes)
    }

    pub fn with_max_diagnostic_bytes(mut self, max_bytes: usize) -> Self {
        self.max_diagnostic_bytes = max_bytes;
        self
    }

    /// @ai:intent Execute by language identifier, reporting unknown identifiers as a failed run
    /// @ai:effects fs:write, process
    pub async fn execute_by_id(
        &self,
        language_id: &str,
        source: &str,
        limits: ExecutionLimits,
    ) -> ExecutionResult {
        match Language::from_id(language_id) {
            Some(language) => self.execute(language, source, limits).await,
            None => ExecutionResult::failure(format!("Unsupported language: {language_id}")),
        }
    }

    /// @ai:intent Run one compile or run step and classify its outcome
    /// @ai:effects process
    async fn run_step(
        &self,
        template: CommandTemplate,
        ctx: &CommandContext<'_>,
        limit: Duration,
    ) -> Result<Step> {
        let command = template.resolve(ctx);

        match run_with_timeout(&command, ctx.work_dir, limit).await? {
            ProcessOutcome::TimedOut => Ok(Step::Failed(ExecutionResult::timed_out())),
            ProcessOutcome::Completed(output) if output.status.success() => Ok(Step::Passed),
            ProcessOutcome::Completed(output) => Ok(Step::Failed(ExecutionResult::failure(
                self.diagnostic(&output),
            ))),
        }
    }

    /// @ai:intent Build the learner-facing diagnostic from a failed step
    /// @ai:effects pure
    fn diagnostic(&self, output: &ProcessOutput) -> String {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim_end();

        let text = if stderr.is_empty() {
            format!("Process exited with {}", output.status)
        } else {
            stderr.to_string()
        };

        truncate_diagnostic(text, self.max_diagnostic_bytes)
    }

    /// @ai:intent Materialize, compile and run a submission in a fresh directory
    /// @ai:post the directory is removed on every return path
    /// @ai:effects fs:write, process
    async fn try_execute(
        &self,
        descriptor: &LanguageDescriptor,
        source: &str,
        limits: ExecutionLimits,
    ) -> Result<ExecutionResult> {
        let prepared = descriptor.prepare_source(source)?;

        let work_dir = tempfile::Builder::new().prefix("taskbank-").tempdir()?;
        let source_path = descriptor.source_path(work_dir.path(), &prepared);
        let artifact_path = descriptor.artifact_path(work_dir.path());
        tokio::fs::write(&source_path, prepared.text.as_bytes()).await?;

        let ctx = CommandContext {
            toolchain: &self.toolchain,
            work_dir: work_dir.path(),
            source: &source_path,
            artifact: &artifact_path,
            entry_point: &prepared.entry_point,
        };

        if let Some(compile) = descriptor.compile {
            if let Step::Failed(result) = self.run_step(compile, &ctx, limits.compile_timeout).await? {
                return Ok(result);
            }
        }

        let result = match self.run_step(descriptor.run, &ctx, limits.run_timeout).await? {
            Step::Passed => ExecutionResult::success(),
            Step::Failed(result) => result,
        };

        close_work_dir(work_dir);
        Ok(result)
    }
}

/// @ai:intent Remove the working directory, logging rather than failing on errors
/// @ai:effects fs:write
fn close_work_dir(dir: tempfile::TempDir) {
    let path = dir.path().to_path_buf();
    if let Err(e) = dir.close() {
        tracing::warn!("Failed to remove work dir {}: {}", path.display(), e);
    }
}

/// @ai:intent Cap a diagnostic at max_bytes without splitting a UTF-8 character
/// @ai:effects pure
fn truncate_diagnostic(mut text: String, max_bytes: usize) -> String {
    if text.len() <= max_bytes {
        return text;
    }

    let mut cut = max_bytes;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }

    text.truncate(cut);
    text.push_str(TRUNCATION_MARKER);
    text
}

impl CodeExecutor for Sandbox {
    /// @ai:intent Build and run source, folding every failure into the result
    /// @ai:effects fs:write, process
    async fn execute(&self, language: Language, source: &str, limits: ExecutionLimits) -> ExecutionResult {
        let descriptor = language.descriptor();

        match self.try_execute(&descriptor, source, limits).await {
            Ok(result) => {
                tracing::debug!(
                    "{} submission {}",
                    descriptor.display_name,
                    if result.succeeded { "ran cleanly" } else { "failed" }
                );
                result
            }
            Err(e) => {
                tracing::warn!("{} submission could not be executed: {}", descriptor.display_name, e);
                ExecutionResult::failure(e.to_string())
            }
        }
    }
}

/// Used by tests elsewhere in the crate to skip when a toolchain is missing.
#[cfg(test)]
pub(crate) fn host_has(program: &str, version_flag: &str) -> bool {
    crate::toolchain::ToolchainValidator::is_tool_available(program, &[version_flag])
}
