//! @ai:module:intent Registry of supported languages and their build/run protocols
//! @ai:module:layer domain
//! @ai:module:public_api Language, LanguageDescriptor, CommandTemplate, Arg, Tool, WrapRule, PreparedSource, describe
//! @ai:module:stateless true

use crate::config::ToolchainConfig;
use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// @ai:intent A language the pipeline can build and run
/// @ai:effects pure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    Cpp,
    Java,
}

pub const ALL_LANGUAGES: [Language; 3] = [Language::Python, Language::Cpp, Language::Java];

impl Language {
    /// @ai:intent Convert language to its canonical identifier
    /// @ai:effects pure
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::Cpp => "cpp",
            Language::Java => "java",
        }
    }

    /// @ai:intent Resolve a language identifier, including the legacy numeric ids
    /// @ai:example ("python") -> Some(Python)
    /// @ai:example ("2") -> Some(Java)
    /// @ai:example ("cobol") -> None
    /// @ai:effects pure
    pub fn from_id(id: &str) -> Option<Language> {
        match id.trim().to_ascii_lowercase().as_str() {
            "python" | "py" | "1" => Some(Language::Python),
            "java" | "2" => Some(Language::Java),
            "cpp" | "c++" | "3" => Some(Language::Cpp),
            _ => None,
        }
    }

    /// @ai:intent Get the comment syntax the normalizer should use for this language
    /// @ai:effects pure
    pub fn normalizer_language(&self) -> taskbank_normalize::Language {
        match self {
            Language::Python => taskbank_normalize::Language::Python,
            Language::Cpp => taskbank_normalize::Language::Cpp,
            Language::Java => taskbank_normalize::Language::Java,
        }
    }

    /// @ai:intent Build the immutable descriptor for this language
    /// @ai:effects pure
    pub fn descriptor(&self) -> LanguageDescriptor {
        match self {
            Language::Python => LanguageDescriptor {
                language: *self,
                display_name: "Python",
                extension: "py",
                source_file: "solution.py",
                compile: None,
                run: CommandTemplate(&[Arg::Tool(Tool::Python), Arg::Source]),
                wrapping: WrapRule::Verbatim,
            },
            Language::Cpp => LanguageDescriptor {
                language: *self,
                display_name: "C++",
                extension: "cpp",
                source_file: "solution.cpp",
                compile: Some(CommandTemplate(&[
                    Arg::Tool(Tool::Cxx),
                    Arg::Source,
                    Arg::Lit("-o"),
                    Arg::Artifact,
                ])),
                run: CommandTemplate(&[Arg::Artifact]),
                wrapping: WrapRule::Verbatim,
            },
            Language::Java => LanguageDescriptor {
                language: *self,
                display_name: "Java",
                extension: "java",
                source_file: "Solution.java",
                compile: Some(CommandTemplate(&[Arg::Tool(Tool::Javac), Arg::Source])),
                run: CommandTemplate(&[
                    Arg::Tool(Tool::Java),
                    Arg::Lit("-cp"),
                    Arg::WorkDir,
                    Arg::EntryPoint,
                ]),
                wrapping: WrapRule::WrapInType {
                    container: "Solution",
                },
            },
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// @ai:intent Look up the descriptor for a language identifier
/// @ai:post Err(LanguageNotFound) if the identifier is unknown
/// @ai:effects pure
pub fn describe(language_id: &str) -> Result<LanguageDescriptor> {
    Language::from_id(language_id)
        .map(|language| language.descriptor())
        .ok_or_else(|| Error::LanguageNotFound(language_id.to_string()))
}

/// @ai:intent A host program resolved through the toolchain configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Python,
    Cxx,
    Javac,
    Java,
}

impl Tool {
    pub fn program<'a>(&self, toolchain: &'a ToolchainConfig) -> &'a str {
        match self {
            Tool::Python => &toolchain.python,
            Tool::Cxx => &toolchain.cxx,
            Tool::Javac => &toolchain.javac,
            Tool::Java => &toolchain.java,
        }
    }
}

/// @ai:intent One argv slot in a command template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arg {
    Lit(&'static str),
    Tool(Tool),
    Source,
    Artifact,
    WorkDir,
    EntryPoint,
}

/// @ai:intent An argv template; the first slot is the program
#[derive(Debug, Clone, Copy)]
pub struct CommandTemplate(pub &'static [Arg]);

/// @ai:intent Values substituted into a command template
#[derive(Debug, Clone)]
pub struct CommandContext<'a> {
    pub toolchain: &'a ToolchainConfig,
    pub work_dir: &'a Path,
    pub source: &'a Path,
    pub artifact: &'a Path,
    pub entry_point: &'a str,
}

/// @ai:intent A fully resolved argv, ready to spawn without a shell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCommand {
    pub program: OsString,
    pub args: Vec<OsString>,
}

impl std::fmt::Display for ResolvedCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program.to_string_lossy())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

impl CommandTemplate {
    /// @ai:intent Substitute every slot, producing an argv
    /// @ai:pre template is non-empty
    /// @ai:effects pure
    pub fn resolve(&self, ctx: &CommandContext<'_>) -> ResolvedCommand {
        let mut argv = self.0.iter().map(|arg| match arg {
            Arg::Lit(value) => OsString::from(*value),
            Arg::Tool(tool) => OsString::from(tool.program(ctx.toolchain)),
            Arg::Source => ctx.source.as_os_str().to_owned(),
            Arg::Artifact => ctx.artifact.as_os_str().to_owned(),
            Arg::WorkDir => ctx.work_dir.as_os_str().to_owned(),
            Arg::EntryPoint => OsString::from(ctx.entry_point),
        });

        let program = argv.next().unwrap_or_default();
        ResolvedCommand {
            program,
            args: argv.collect(),
        }
    }
}

/// @ai:intent How submitted text is turned into the file written to disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapRule {
    Verbatim,
    /// Wrap bare members in a synthetic type unless the source declares its own.
    WrapInType { container: &'static str },
}

/// @ai:intent Source text ready to be written, plus the entry point to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedSource {
    pub text: String,
    pub entry_point: String,
    /// Java requires a public type to live in a file of the same name.
    pub file_name: String,
}

/// @ai:intent Build and run protocol for one language
#[derive(Debug, Clone)]
pub struct LanguageDescriptor {
    pub language: Language,
    pub display_name: &'static str,
    pub extension: &'static str,
    pub source_file: &'static str,
    pub compile: Option<CommandTemplate>,
    pub run: CommandTemplate,
    pub wrapping: WrapRule,
}

const DEFAULT_ENTRY_POINT: &str = "Solution";

fn type_declaration_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?m)(?:^|[^.\w$])(?:(?:class|interface|enum)\b|record\s+[A-Za-z_$][A-Za-z0-9_$]*\s*[(<])",
        )
        .expect("Invalid regex")
    })
}

fn literal_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#""""[\s\S]*?(?:"""|\z)|"(?:\\.|[^"\\\n])*"?|'(?:\\.|[^'\\\n])*'?"#)
            .expect("Invalid regex")
    })
}

fn public_type_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?m)(?:^|[^.\w$])public\s+(?:(?:final|abstract|static|sealed|strictfp)\s+)*(?:class|interface|enum|record)\s+([A-Za-z_$][A-Za-z0-9_$]*)",
        )
        .expect("Invalid regex")
    })
}

fn type_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)(?:^|[^.\w$])(?:class|interface|enum|record)\s+([A-Za-z_$][A-Za-z0-9_$]*)")
            .expect("Invalid regex")
    })
}

impl LanguageDescriptor {
    /// @ai:intent Name of the produced executable, following the host convention
    /// @ai:effects pure
    pub fn artifact_name(&self) -> String {
        format!("solution{}", std::env::consts::EXE_SUFFIX)
    }

    pub fn source_path(&self, work_dir: &Path, prepared: &PreparedSource) -> PathBuf {
        work_dir.join(&prepared.file_name)
    }

    pub fn artifact_path(&self, work_dir: &Path) -> PathBuf {
        work_dir.join(self.artifact_name())
    }

    /// @ai:intent Apply the wrapping rule and resolve the entry point name
    /// @ai:pre source is the trimmed submission
    /// @ai:post Err(EntryPointUnresolved) when a declaration exists but no name can be read from it
    /// @ai:example ("void main(String[] a) {}") -> wrapped in "public class Solution", entry "Solution"
    /// @ai:example ("public class Main { ... }") -> verbatim, entry "Main"
    /// @ai:effects pure
    pub fn prepare_source(&self, source: &str) -> Result<PreparedSource> {
        let container = match self.wrapping {
            WrapRule::Verbatim => {
                return Ok(PreparedSource {
                    text: source.to_string(),
                    entry_point: DEFAULT_ENTRY_POINT.to_string(),
                    file_name: self.source_file.to_string(),
                })
            }
            WrapRule::WrapInType { container } => container,
        };

        // Declarations are searched for with comments removed and literals
        // emptied, so neither "// this class adds" nor "my class Foo" counts.
        let code = taskbank_normalize::normalize(
            source,
            Some(self.language.normalizer_language()),
        );
        let code = literal_regex().replace_all(&code, "\"\"");

        if !type_declaration_regex().is_match(&code) {
            return Ok(PreparedSource {
                text: format!("public class {container} {{\n{source}\n}}\n"),
                entry_point: container.to_string(),
                file_name: format!("{container}.{}", self.extension),
            });
        }

        let entry_point = public_type_name_regex()
            .captures(&code)
            .or_else(|| type_name_regex().captures(&code))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| {
                Error::EntryPointUnresolved(
                    "a type declaration was found but its name could not be read".to_string(),
                )
            })?;

        Ok(PreparedSource {
            text: source.to_string(),
            file_name: format!("{entry_point}.{}", self.extension),
            entry_point,
        })
    }
}
