//! @ai:module:intent Exercise and reference solution definitions
//! @ai:module:layer domain
//! @ai:module:public_api Exercise, ReferenceSolution, ExerciseFile
//! @ai:module:stateless true

use crate::runner::Language;
use serde::{Deserialize, Serialize};

/// @ai:intent A programming exercise shown to users
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exercise {
    pub id: String,
    pub title: String,
    pub description: String,
}

/// @ai:intent The canonical answer for one exercise in one language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceSolution {
    pub exercise_id: String,
    pub language: Language,
    pub code: String,
    /// Revealed when a client gets locked out.
    pub hint: String,
}

/// @ai:intent Raw exercise structure from TOML file
#[derive(Debug, Deserialize)]
pub struct ExerciseFile {
    pub exercise: ExerciseMetadata,
    #[serde(default)]
    pub solutions: Vec<SolutionEntry>,
}

/// @ai:intent Exercise metadata from TOML file
#[derive(Debug, Deserialize)]
pub struct ExerciseMetadata {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// @ai:intent One `[[solutions]]` table from TOML file
#[derive(Debug, Deserialize)]
pub struct SolutionEntry {
    pub language: Language,
    pub code: String,
    #[serde(default)]
    pub hint: String,
}

impl ExerciseFile {
    /// @ai:intent Split the file into the exercise and its solutions
    /// @ai:effects pure
    pub fn into_parts(self) -> (Exercise, Vec<ReferenceSolution>) {
        let id = self.exercise.id;
        let solutions = self
            .solutions
            .into_iter()
            .map(|entry| ReferenceSolution {
                exercise_id: id.clone(),
                language: entry.language,
                code: entry.code,
                hint: entry.hint,
            })
            .collect();

        let exercise = Exercise {
            id,
            title: self.exercise.title,
            description: self.exercise.description,
        };

        (exercise, solutions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_exercise_file() {
        let content = r#"
[exercise]
id = "add"
title = "Add two numbers"

[[solutions]]
language = "python"
code = "print(1 + 2)"
hint = "Use the + operator"

[[solutions]]
language = "cpp"
code = "int main() { return 0; }"
"#;
        let file: ExerciseFile = toml::from_str(content).unwrap();
        let (exercise, solutions) = file.into_parts();

        assert_eq!(exercise.id, "add");
        assert_eq!(exercise.description, "");
        assert_eq!(solutions.len(), 2);
        assert_eq!(solutions[0].exercise_id, "add");
        assert_eq!(solutions[0].hint, "Use the + operator");
        assert_eq!(solutions[1].language, Language::Cpp);
        assert_eq!(solutions[1].hint, "");
    }

    #[test]
    fn test_unknown_language_is_rejected() {
        let content = r#"
[exercise]
id = "add"
title = "Add"

[[solutions]]
language = "cobol"
code = "DISPLAY 3"
"#;
        assert!(toml::from_str::<ExerciseFile>(content).is_err());
    }
}
