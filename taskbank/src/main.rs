//! @ai:module:intent CLI for submitting solutions and managing the exercise catalog
//! @ai:module:layer presentation

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use taskbank::{
    catalog::{CatalogLoader, ExerciseCatalog},
    evaluator::{Evaluator, ResponseStatus, SubmissionResponse},
    runner::{ExecutionLimits, Sandbox, ALL_LANGUAGES},
    toolchain::ToolchainValidator,
    FileStore, SystemClock, TaskbankConfig,
};

const DEFAULT_CONFIG_FILE: &str = "taskbank.toml";
const EXIT_REJECTED: u8 = 2;

#[derive(Parser)]
#[command(name = "taskbank")]
#[command(about = "Evaluate code submissions against reference solutions")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a solution and print the JSON verdict
    Submit {
        /// Exercise ID
        #[arg(short, long)]
        exercise: String,

        /// Language (python, cpp, java, or 1/2/3)
        #[arg(short, long)]
        language: String,

        /// Client identity the lockout is tracked under
        #[arg(long, default_value = "local")]
        client: String,

        /// Source file to submit (reads stdin when omitted)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Show remaining attempts or lockout time
    Status {
        #[arg(short, long)]
        exercise: String,

        #[arg(short, long)]
        language: String,

        #[arg(long, default_value = "local")]
        client: String,
    },

    /// List exercises and their languages
    List,

    /// Check that every reference solution can be submitted
    Validate,

    /// Check the host toolchain
    Doctor,

    /// Build and run a source file without comparing it to anything
    Run {
        #[arg(short, long)]
        language: String,

        file: PathBuf,
    },

    /// Initialize default configuration
    Init {
        /// Output path for config file
        #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("taskbank=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = load_or_default_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Submit {
            exercise,
            language,
            client,
            file,
        } => {
            let response = submit(&config, &exercise, &language, &client, file.as_deref()).await?;
            return Ok(ExitCode::from(exit_status(&response)));
        }
        Commands::Status {
            exercise,
            language,
            client,
        } => status(&config, &exercise, &language, &client).await?,
        Commands::List => list_exercises(&config)?,
        Commands::Validate => validate(&config)?,
        Commands::Doctor => doctor(&config)?,
        Commands::Run { language, file } => run_file(&config, &language, &file).await?,
        Commands::Init { output } => init_config(output)?,
    }

    Ok(ExitCode::SUCCESS)
}

/// @ai:intent Process exit status for a printed submission response; rejected requests exit 2
/// @ai:effects pure
fn exit_status(response: &SubmissionResponse) -> u8 {
    if response.status == ResponseStatus::Error {
        EXIT_REJECTED
    } else {
        0
    }
}

/// @ai:intent Read submitted source from a file or stdin
/// @ai:effects fs:read, io
fn read_source(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read source file: {}", path.display())),
        None => {
            let mut source = String::new();
            std::io::stdin()
                .read_to_string(&mut source)
                .context("Failed to read source from stdin")?;
            Ok(source)
        }
    }
}

/// @ai:intent Wire the evaluator to the on-disk catalog and attempt state
/// @ai:effects fs:read
fn build_evaluator(
    config: &TaskbankConfig,
) -> Result<Evaluator<taskbank::InMemoryCatalog, FileStore, Sandbox, SystemClock>> {
    let catalog = CatalogLoader::load(&config.paths.catalog_dir)?;

    Ok(Evaluator::from_config(
        config,
        catalog,
        FileStore::new(&config.paths.state_file),
        Sandbox::from_config(config),
        SystemClock::new(),
    ))
}

/// @ai:intent Evaluate one submission and print the response as JSON
/// @ai:effects fs:read, fs:write, process, io
async fn submit(
    config: &TaskbankConfig,
    exercise: &str,
    language: &str,
    client: &str,
    file: Option<&Path>,
) -> Result<SubmissionResponse> {
    let evaluator = build_evaluator(config)?;
    let code = read_source(file)?;

    let response = match evaluator.submit(exercise, language, client, &code).await {
        Ok(verdict) => SubmissionResponse::from(verdict),
        Err(e) => {
            tracing::debug!("Submission rejected with status {}", e.status_code());
            SubmissionResponse::from(&e)
        }
    };

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(response)
}

/// @ai:intent Print the client's attempt state
/// @ai:effects fs:read, io
async fn status(config: &TaskbankConfig, exercise: &str, language: &str, client: &str) -> Result<()> {
    let evaluator = build_evaluator(config)?;
    let status = evaluator.status(exercise, language, client).await?;
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}

/// @ai:intent List available exercises
/// @ai:effects fs:read
fn list_exercises(config: &TaskbankConfig) -> Result<()> {
    let catalog = CatalogLoader::load(&config.paths.catalog_dir)?;
    let exercises = catalog.exercises();

    println!("Available exercises ({}):", exercises.len());
    println!();
    println!("{:<24} {:<32} {:<20}", "ID", "Title", "Languages");
    println!("{}", "-".repeat(76));

    for exercise in exercises {
        let languages: Vec<&str> = catalog
            .languages_for(&exercise.id)
            .iter()
            .map(|l| l.as_str())
            .collect();
        println!(
            "{:<24} {:<32} {:<20}",
            exercise.id,
            exercise.title,
            languages.join(", ")
        );
    }

    Ok(())
}

/// @ai:intent Validate the catalog loads and every reference solution is usable
/// @ai:effects fs:read
fn validate(config: &TaskbankConfig) -> Result<()> {
    let catalog = CatalogLoader::load(&config.paths.catalog_dir)?;
    let issues = catalog.validate(config.evaluation.min_code_length);

    if issues.is_empty() {
        println!("Catalog validation passed!");
        println!("Total exercises: {}", catalog.len());
        return Ok(());
    }

    for issue in &issues {
        println!("  - {}", issue);
    }
    anyhow::bail!("Catalog validation found {} problem(s)", issues.len())
}

/// @ai:intent Report which languages the host can build and run
/// @ai:effects process
fn doctor(config: &TaskbankConfig) -> Result<()> {
    let status = ToolchainValidator::validate(&config.toolchain);

    for language in ALL_LANGUAGES {
        let mark = if status.available_languages.contains(&language) {
            "ok"
        } else {
            "missing"
        };
        println!("{:<8} {}", language.as_str(), mark);
    }

    ToolchainValidator::log_warnings(&status);
    Ok(())
}

/// @ai:intent Build and run a file, printing the execution result
/// @ai:effects fs:read, fs:write, process
async fn run_file(config: &TaskbankConfig, language: &str, file: &Path) -> Result<()> {
    let source = read_source(Some(file))?;
    let limits = ExecutionLimits {
        compile_timeout: config.evaluation.compile_timeout(),
        run_timeout: config.evaluation.run_timeout(),
    };

    let result = Sandbox::from_config(config)
        .execute_by_id(language, &source, limits)
        .await;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// @ai:intent Initialize default configuration file
/// @ai:effects fs:write
fn init_config(output: PathBuf) -> Result<()> {
    let config = TaskbankConfig::default();
    config.save(&output)?;
    println!("Configuration saved to {}", output.display());
    Ok(())
}

/// @ai:intent Load configuration or use defaults
/// @ai:effects fs:read
fn load_or_default_config(path: Option<&Path>) -> Result<TaskbankConfig> {
    match path {
        Some(p) => TaskbankConfig::load(p),
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_FILE);

            if default_path.exists() {
                TaskbankConfig::load(default_path)
            } else {
                Ok(TaskbankConfig::default())
            }
        }
    }
}
