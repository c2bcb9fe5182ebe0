//! @ai:module:intent Validate the host toolchain each supported language needs
//! @ai:module:layer infrastructure
//! @ai:module:public_api ToolchainValidator, ToolchainStatus, MissingTool
//! @ai:module:stateless true

use crate::config::ToolchainConfig;
use crate::runner::{Language, ALL_LANGUAGES};
use std::collections::HashSet;
use std::process::Command;

/// @ai:intent A program a language needs, with the flag used to probe it
#[derive(Debug, Clone)]
struct RequiredTool {
    program: String,
    probe_args: &'static [&'static str],
}

/// @ai:intent Status of toolchain validation
#[derive(Debug)]
pub struct ToolchainStatus {
    pub available_languages: HashSet<Language>,
    pub missing_tools: Vec<MissingTool>,
}

/// @ai:intent Information about a missing tool
#[derive(Debug)]
pub struct MissingTool {
    pub language: Language,
    pub tool_name: String,
    pub install_hint: &'static str,
}

/// @ai:intent Validates that required tools are installed
pub struct ToolchainValidator;

impl ToolchainValidator {
    /// @ai:intent Get the programs a language needs to build and run
    /// @ai:effects pure
    fn required_tools(language: Language, toolchain: &ToolchainConfig) -> Vec<RequiredTool> {
        match language {
            Language::Python => vec![RequiredTool {
                program: toolchain.python.clone(),
                probe_args: &["--version"],
            }],
            Language::Cpp => vec![RequiredTool {
                program: toolchain.cxx.clone(),
                probe_args: &["--version"],
            }],
            // `-version` works on every JDK; `--version` only on 9+.
            Language::Java => vec![
                RequiredTool {
                    program: toolchain.javac.clone(),
                    probe_args: &["-version"],
                },
                RequiredTool {
                    program: toolchain.java.clone(),
                    probe_args: &["-version"],
                },
            ],
        }
    }

    /// @ai:intent Get install hint for a language
    /// @ai:effects pure
    fn install_hint(language: Language) -> &'static str {
        match language {
            Language::Python => "Install Python: https://www.python.org/downloads/",
            Language::Cpp => "Install a C++ compiler (g++ from GCC, or set toolchain.cxx)",
            Language::Java => "Install a JDK: https://adoptium.net/",
        }
    }

    /// @ai:intent Check if a command is available on the system
    /// @ai:effects io
    pub(crate) fn is_tool_available(tool: &str, args: &[&str]) -> bool {
        Command::new(tool)
            .args(args)
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    /// @ai:intent Validate all required tools and return status
    /// @ai:effects io
    pub fn validate(toolchain: &ToolchainConfig) -> ToolchainStatus {
        let mut available_languages = HashSet::new();
        let mut missing_tools = Vec::new();

        for language in ALL_LANGUAGES {
            let mut complete = true;

            for tool in Self::required_tools(language, toolchain) {
                if !Self::is_tool_available(&tool.program, tool.probe_args) {
                    complete = false;
                    missing_tools.push(MissingTool {
                        language,
                        tool_name: tool.program,
                        install_hint: Self::install_hint(language),
                    });
                }
            }

            if complete {
                available_languages.insert(language);
            }
        }

        ToolchainStatus {
            available_languages,
            missing_tools,
        }
    }

    /// @ai:intent Log warnings for missing tools
    /// @ai:effects io
    pub fn log_warnings(status: &ToolchainStatus) {
        for missing in &status.missing_tools {
            tracing::warn!(
                "Tool '{}' not found - {} submissions will fail to run. {}",
                missing.tool_name,
                missing.language,
                missing.install_hint
            );
        }
    }
}
