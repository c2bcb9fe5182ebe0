//! @ai:module:intent TOML loader for the exercise catalog
//! @ai:module:layer infrastructure
//! @ai:module:public_api CatalogLoader
//! @ai:module:stateless true

use crate::catalog::exercise::ExerciseFile;
use crate::catalog::store::InMemoryCatalog;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// @ai:intent Loads exercise definitions from TOML files
pub struct CatalogLoader;

impl CatalogLoader {
    /// @ai:intent Parse a single exercise file
    /// @ai:effects fs:read
    fn parse_exercise_file(path: &Path) -> Result<ExerciseFile> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read exercise file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse exercise file: {}", path.display()))
    }

    /// @ai:intent Find all TOML files in directory, in a stable order
    /// @ai:effects fs:read
    fn find_exercise_files(catalog_dir: &Path) -> Vec<PathBuf> {
        WalkDir::new(catalog_dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "toml")
                    .unwrap_or(false)
            })
            .map(|e| e.path().to_path_buf())
            .collect()
    }

    /// @ai:intent Load every exercise under catalog_dir
    /// @ai:post unparseable files are skipped with a warning; duplicates are an error
    /// @ai:effects fs:read
    pub fn load(catalog_dir: &Path) -> Result<InMemoryCatalog> {
        if !catalog_dir.is_dir() {
            anyhow::bail!("Catalog directory not found: {}", catalog_dir.display());
        }

        let mut catalog = InMemoryCatalog::new();

        for path in Self::find_exercise_files(catalog_dir) {
            let file = match Self::parse_exercise_file(&path) {
                Ok(file) => file,
                Err(e) => {
                    tracing::warn!("Skipping invalid exercise file {}: {:#}", path.display(), e);
                    continue;
                }
            };

            let (exercise, solutions) = file.into_parts();
            catalog
                .add_exercise(exercise)
                .with_context(|| format!("In {}", path.display()))?;
            for solution in solutions {
                catalog
                    .add_solution(solution)
                    .with_context(|| format!("In {}", path.display()))?;
            }
        }

        tracing::debug!(
            "Loaded {} exercises from {}",
            catalog.len(),
            catalog_dir.display()
        );
        Ok(catalog)
    }
}
