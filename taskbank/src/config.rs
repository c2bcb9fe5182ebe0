//! @ai:module:intent Configuration structs for the evaluation pipeline
//! @ai:module:layer infrastructure
//! @ai:module:public_api TaskbankConfig, EvaluationConfig, LockoutConfig, ToolchainConfig, PathConfig
//! @ai:module:stateless true

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// @ai:intent Main configuration for taskbank
/// @ai:effects pure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskbankConfig {
    #[serde(default)]
    pub evaluation: EvaluationConfig,
    #[serde(default)]
    pub lockout: LockoutConfig,
    #[serde(default)]
    pub toolchain: ToolchainConfig,
    #[serde(default)]
    pub paths: PathConfig,
}

/// @ai:intent Limits applied to every submission
/// @ai:effects pure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationConfig {
    #[serde(default = "default_timeout_secs")]
    pub compile_timeout_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pub run_timeout_secs: u64,
    #[serde(default = "default_min_code_length")]
    pub min_code_length: usize,
    #[serde(default = "default_max_diagnostic_bytes")]
    pub max_diagnostic_bytes: usize,
}

/// @ai:intent Attempt budget and lockout duration
/// @ai:effects pure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockoutConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_block_seconds")]
    pub block_seconds: u64,
}

/// @ai:intent Program names of the host toolchain, looked up on PATH
/// @ai:effects pure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolchainConfig {
    #[serde(default = "default_python")]
    pub python: String,
    #[serde(default = "default_cxx")]
    pub cxx: String,
    #[serde(default = "default_javac")]
    pub javac: String,
    #[serde(default = "default_java")]
    pub java: String,
}

/// @ai:intent Path configuration for exercise catalog and attempt state
/// @ai:effects pure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathConfig {
    #[serde(default = "default_catalog_dir")]
    pub catalog_dir: PathBuf,
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            compile_timeout_secs: default_timeout_secs(),
            run_timeout_secs: default_timeout_secs(),
            min_code_length: default_min_code_length(),
            max_diagnostic_bytes: default_max_diagnostic_bytes(),
        }
    }
}

impl Default for LockoutConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            block_seconds: default_block_seconds(),
        }
    }
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            python: default_python(),
            cxx: default_cxx(),
            javac: default_javac(),
            java: default_java(),
        }
    }
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            catalog_dir: default_catalog_dir(),
            state_file: default_state_file(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    5
}

fn default_min_code_length() -> usize {
    5
}

fn default_max_diagnostic_bytes() -> usize {
    4096
}

fn default_max_attempts() -> u32 {
    3
}

fn default_block_seconds() -> u64 {
    10
}

fn default_python() -> String {
    if cfg!(windows) {
        "python".to_string()
    } else {
        "python3".to_string()
    }
}

fn default_cxx() -> String {
    "g++".to_string()
}

fn default_javac() -> String {
    "javac".to_string()
}

fn default_java() -> String {
    "java".to_string()
}

fn default_catalog_dir() -> PathBuf {
    PathBuf::from("exercises")
}

fn default_state_file() -> PathBuf {
    PathBuf::from(".taskbank/attempts.json")
}

impl EvaluationConfig {
    pub fn compile_timeout(&self) -> Duration {
        Duration::from_secs(self.compile_timeout_secs)
    }

    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout_secs)
    }
}

impl TaskbankConfig {
    /// @ai:intent Load configuration from a TOML file
    /// @ai:pre path exists and is readable
    /// @ai:effects fs:read
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// @ai:intent Save configuration to a TOML file
    /// @ai:effects fs:write
    pub fn save(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
