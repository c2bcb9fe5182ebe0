//! @ai:module:intent Compare two sources after normalization and locate the first divergence
//! @ai:module:layer application
//! @ai:module:public_api compare, compare_files, Comparison, LineDifference
//! @ai:module:depends_on normalize, language
//! @ai:module:stateless true

use crate::error::{Error, Result};
use crate::language::{detect_language, Language};
use crate::normalize::normalize;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// @ai:intent First line at which two normalized sources differ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineDifference {
    /// 1-based line number in the normalized text
    pub line: usize,
    pub left: Option<String>,
    pub right: Option<String>,
}

/// @ai:intent Result of comparing two normalized sources
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comparison {
    pub language: Option<String>,
    pub equivalent: bool,
    pub left_lines: usize,
    pub right_lines: usize,
    pub first_difference: Option<LineDifference>,
}

/// @ai:intent Compare two sources in their canonical forms
/// @ai:effects pure
pub fn compare(left: &str, right: &str, language: Option<Language>) -> Comparison {
    let left = normalize(left, language);
    let right = normalize(right, language);

    let left_lines: Vec<&str> = left.lines().collect();
    let right_lines: Vec<&str> = right.lines().collect();

    let first_difference = (0..left_lines.len().max(right_lines.len()))
        .find(|&i| left_lines.get(i) != right_lines.get(i))
        .map(|i| LineDifference {
            line: i + 1,
            left: left_lines.get(i).map(|l| l.to_string()),
            right: right_lines.get(i).map(|l| l.to_string()),
        });

    Comparison {
        language: language.map(|l| l.name().to_string()),
        equivalent: first_difference.is_none(),
        left_lines: left_lines.len(),
        right_lines: right_lines.len(),
        first_difference,
    }
}

/// @ai:intent Compare two files, using the language detected from either path
/// @ai:effects fs:read
pub fn compare_files(left: &Path, right: &Path, language: Option<Language>) -> Result<Comparison> {
    let read = |path: &Path| {
        std::fs::read_to_string(path).map_err(|source| Error::FileRead {
            path: path.to_path_buf(),
            source,
        })
    };

    let left_source = read(left)?;
    let right_source = read(right)?;
    let language = language
        .or_else(|| detect_language(left))
        .or_else(|| detect_language(right));

    Ok(compare(&left_source, &right_source, language))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equivalent_sources_have_no_difference() {
        let result = compare(
            "int x = 1; // one\n",
            "int   x = 1;",
            Some(Language::Cpp),
        );

        assert!(result.equivalent);
        assert_eq!(result.first_difference, None);
        assert_eq!(result.left_lines, 1);
    }

    #[test]
    fn test_reports_first_differing_line() {
        let result = compare(
            "a = 1\nb = 2\nc = 3",
            "a = 1\nb = 20\nc = 3",
            Some(Language::Python),
        );

        assert!(!result.equivalent);
        assert_eq!(
            result.first_difference,
            Some(LineDifference {
                line: 2,
                left: Some("b = 2".to_string()),
                right: Some("b = 20".to_string()),
            })
        );
    }

    #[test]
    fn test_trailing_extra_line_is_a_difference() {
        let result = compare("a = 1", "a = 1\nb = 2", Some(Language::Python));

        let difference = result.first_difference.unwrap();
        assert_eq!(difference.line, 2);
        assert_eq!(difference.left, None);
        assert_eq!(difference.right.as_deref(), Some("b = 2"));
    }

    #[test]
    fn test_compare_files_detects_language() {
        let dir = tempfile::tempdir().unwrap();
        let left = dir.path().join("a.java");
        let right = dir.path().join("b.java");
        std::fs::write(&left, "class A {} /* doc */").unwrap();
        std::fs::write(&right, "class A {}").unwrap();

        let result = compare_files(&left, &right, None).unwrap();
        assert!(result.equivalent);
        assert_eq!(result.language.as_deref(), Some("java"));
    }
}
