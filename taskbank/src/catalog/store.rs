//! @ai:module:intent Lookup of exercises and reference solutions
//! @ai:module:layer domain
//! @ai:module:public_api ExerciseCatalog, InMemoryCatalog, CatalogIssue
//! @ai:module:stateless false

use crate::catalog::exercise::{Exercise, ReferenceSolution};
use crate::error::{Error, Result};
use crate::runner::Language;
use std::collections::{BTreeMap, HashMap};

/// @ai:intent Read access to exercises and their reference solutions
pub trait ExerciseCatalog: Send + Sync {
    fn exercise(&self, id: &str) -> Option<&Exercise>;

    fn reference_solution(&self, exercise_id: &str, language: Language) -> Option<&ReferenceSolution>;

    /// @ai:intent All exercises, ordered by id
    fn exercises(&self) -> Vec<&Exercise>;
}

/// @ai:intent Catalog held entirely in memory
#[derive(Debug, Default, Clone)]
pub struct InMemoryCatalog {
    exercises: BTreeMap<String, Exercise>,
    solutions: HashMap<(String, Language), ReferenceSolution>,
}

/// @ai:intent A problem found while checking a catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogIssue {
    pub exercise_id: String,
    pub language: Option<Language>,
    pub problem: String,
}

impl std::fmt::Display for CatalogIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.language {
            Some(language) => write!(f, "{} ({}): {}", self.exercise_id, language, self.problem),
            None => write!(f, "{}: {}", self.exercise_id, self.problem),
        }
    }
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// @ai:intent Builder-style insert; replaces an existing exercise with the same id
    pub fn with_exercise(mut self, exercise: Exercise) -> Self {
        self.exercises.insert(exercise.id.clone(), exercise);
        self
    }

    /// @ai:intent Builder-style insert; replaces an existing solution for the same pair
    pub fn with_solution(mut self, solution: ReferenceSolution) -> Self {
        self.solutions
            .insert((solution.exercise_id.clone(), solution.language), solution);
        self
    }

    /// @ai:intent Add an exercise, refusing duplicate ids
    /// @ai:effects state:write
    pub fn add_exercise(&mut self, exercise: Exercise) -> Result<()> {
        if self.exercises.contains_key(&exercise.id) {
            return Err(Error::Catalog(format!(
                "Duplicate exercise id: {}",
                exercise.id
            )));
        }
        self.exercises.insert(exercise.id.clone(), exercise);
        Ok(())
    }

    /// @ai:intent Add a solution, refusing a second one for the same exercise and language
    /// @ai:effects state:write
    pub fn add_solution(&mut self, solution: ReferenceSolution) -> Result<()> {
        let key = (solution.exercise_id.clone(), solution.language);
        if self.solutions.contains_key(&key) {
            return Err(Error::Catalog(format!(
                "Duplicate reference solution for {} in {}",
                solution.exercise_id, solution.language
            )));
        }
        self.solutions.insert(key, solution);
        Ok(())
    }

    /// @ai:intent Languages that have a reference solution for an exercise
    /// @ai:effects pure
    pub fn languages_for(&self, exercise_id: &str) -> Vec<Language> {
        let mut languages: Vec<Language> = self
            .solutions
            .keys()
            .filter(|(id, _)| id == exercise_id)
            .map(|(_, language)| *language)
            .collect();
        languages.sort_by_key(|language| language.as_str());
        languages
    }

    pub fn len(&self) -> usize {
        self.exercises.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exercises.is_empty()
    }

    /// @ai:intent Check that every reference solution could actually be matched by a submission
    /// @ai:effects pure
    pub fn validate(&self, min_code_length: usize) -> Vec<CatalogIssue> {
        let mut issues = Vec::new();

        for exercise in self.exercises.values() {
            if self.languages_for(&exercise.id).is_empty() {
                issues.push(CatalogIssue {
                    exercise_id: exercise.id.clone(),
                    language: None,
                    problem: "no reference solutions".to_string(),
                });
            }
        }

        let mut solutions: Vec<&ReferenceSolution> = self.solutions.values().collect();
        solutions.sort_by(|a, b| {
            (a.exercise_id.as_str(), a.language.as_str())
                .cmp(&(b.exercise_id.as_str(), b.language.as_str()))
        });

        for solution in solutions {
            let issue = |problem: String| CatalogIssue {
                exercise_id: solution.exercise_id.clone(),
                language: Some(solution.language),
                problem,
            };

            if !self.exercises.contains_key(&solution.exercise_id) {
                issues.push(issue("solution for unknown exercise".to_string()));
            }

            let code = solution.code.trim();
            if code.chars().count() < min_code_length {
                issues.push(issue(format!(
                    "reference code shorter than {} characters",
                    min_code_length
                )));
            }

            if let Err(e) = solution.language.descriptor().prepare_source(code) {
                issues.push(issue(e.to_string()));
            }
        }

        issues
    }
}

impl ExerciseCatalog for InMemoryCatalog {
    fn exercise(&self, id: &str) -> Option<&Exercise> {
        self.exercises.get(id)
    }

    fn reference_solution(&self, exercise_id: &str, language: Language) -> Option<&ReferenceSolution> {
        self.solutions.get(&(exercise_id.to_string(), language))
    }

    fn exercises(&self) -> Vec<&Exercise> {
        self.exercises.values().collect()
    }
}
