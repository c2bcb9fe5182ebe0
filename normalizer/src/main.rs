//! @ai:module:intent CLI entry point for the source normalizer
//! @ai:module:layer presentation
//! @ai:module:public_api main
//! @ai:module:depends_on normalize, diff, output

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use taskbank_normalize::{
    compare_files, detect_language, normalize_file, output, Error, Language, OutputFormat,
};

#[derive(Parser)]
#[command(name = "taskbank-normalize")]
#[command(author, version, about = "Canonicalize source code for coarse equivalence checks")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the canonical form of a source file
    Normalize {
        /// Path to the source file
        path: PathBuf,

        /// Language override (defaults to detection from the extension)
        #[arg(long, short)]
        language: Option<String>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: Format,
    },

    /// Check whether two files are equivalent after normalization
    Compare {
        /// Path to the first file (usually the reference)
        left: PathBuf,

        /// Path to the second file (usually the submission)
        right: PathBuf,

        /// Language override (defaults to detection from the extensions)
        #[arg(long, short)]
        language: Option<String>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: Format,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
    JsonPretty,
}

impl From<Format> for OutputFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Text => OutputFormat::Text,
            Format::Json => OutputFormat::Json,
            Format::JsonPretty => OutputFormat::JsonPretty,
        }
    }
}

/// @ai:intent Resolve an explicit language name, or detect one from the path
/// @ai:effects pure
fn resolve_language(name: Option<&str>, path: &Path) -> Result<Option<Language>, Error> {
    match name {
        Some(name) => Language::from_name(name)
            .map(Some)
            .ok_or_else(|| Error::UnsupportedLanguage(name.to_string())),
        None => Ok(detect_language(path)),
    }
}

fn run_normalize(path: &Path, language: Option<&str>, format: Format) -> Result<(), Error> {
    let language = resolve_language(language, path)?;
    let normalized = normalize_file(path, language)?;
    println!(
        "{}",
        output::format_normalized(&normalized, language.map(|l| l.name()), format.into())
    );
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Normalize {
            path,
            language,
            format,
        } => match run_normalize(&path, language.as_deref(), format) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Error: {}", e);
                ExitCode::from(2)
            }
        },

        Commands::Compare {
            left,
            right,
            language,
            format,
        } => {
            let result = resolve_language(language.as_deref(), &left)
                .and_then(|language| compare_files(&left, &right, language));

            match result {
                Ok(comparison) => {
                    println!("{}", output::format_comparison(&comparison, format.into()));

                    if comparison.equivalent {
                        ExitCode::SUCCESS
                    } else {
                        ExitCode::from(1)
                    }
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    ExitCode::from(2)
                }
            }
        }
    }
}
