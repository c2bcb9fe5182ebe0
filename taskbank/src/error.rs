//! @ai:module:intent Define error types surfaced by the evaluation pipeline
//! @ai:module:layer domain
//! @ai:module:public_api Error, Result
//! @ai:module:stateless true

use thiserror::Error;

/// @ai:intent Hard failures reported to the caller without consuming an attempt
///
/// Failed compiles, failed runs, timeouts and mismatches are not errors: they are
/// absorbed into the attempt state machine and reported as a normal verdict.
#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Exercise not found: {0}")]
    ExerciseNotFound(String),

    #[error("Language not found: {0}")]
    LanguageNotFound(String),

    #[error("No reference solution for exercise {exercise_id} in {language}")]
    SolutionNotFound {
        exercise_id: String,
        language: String,
    },

    #[error("Could not resolve entry point: {0}")]
    EntryPointUnresolved(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Attempt store error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// @ai:intent Map the error onto an HTTP-style status code for a boundary layer
    /// @ai:effects pure
    pub fn status_code(&self) -> u16 {
        match self {
            Error::InvalidInput(_) | Error::EntryPointUnresolved(_) => 400,
            Error::ExerciseNotFound(_)
            | Error::LanguageNotFound(_)
            | Error::SolutionNotFound { .. } => 404,
            Error::Catalog(_) | Error::Store(_) | Error::Io(_) | Error::Json(_) => 500,
        }
    }

    /// @ai:intent Whether the error is a Not-Found condition
    /// @ai:effects pure
    pub fn is_not_found(&self) -> bool {
        self.status_code() == 404
    }
}

pub type Result<T> = std::result::Result<T, Error>;
