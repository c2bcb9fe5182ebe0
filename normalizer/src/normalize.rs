//! @ai:module:intent Canonicalize source text so that formatting and comments do not affect comparison
//! @ai:module:layer domain
//! @ai:module:public_api normalize, equivalent, normalize_file
//! @ai:module:stateless true
//!
//! Equivalence here is textual: two sources are equivalent when they match after
//! comments are removed and whitespace is canonicalized. Renamed variables,
//! reordered statements or different but behaviourally identical code are NOT
//! recognised. This is a known limitation of the approach.

use crate::error::{Error, Result};
use crate::language::{detect_language, CommentStyle, Language, ALL_LANGUAGES};
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

const TRIPLE_DOUBLE: &str = r#""""[\s\S]*?(?:"""|\z)"#;
const TRIPLE_SINGLE: &str = r"'''[\s\S]*?(?:'''|\z)";
const DOUBLE_QUOTED: &str = r#""(?:\\.|[^"\\\n])*"?"#;
const SINGLE_QUOTED: &str = r"'(?:\\.|[^'\\\n])*'?";
// One character or one escape; a stray quote (C++ digit separator) matches nothing.
const CHAR_LITERAL: &str = r"'(?:\\.[^'\\\n]{0,8}|[^'\\\n])'";

/// @ai:intent Build the literal-or-comment pattern for one comment style
/// @ai:post literal alternatives precede comment markers, so markers inside literals survive
/// @ai:effects pure
fn comment_pattern(style: &CommentStyle) -> String {
    let mut alternatives: Vec<String> = Vec::new();

    if style.triple_quoted_strings {
        alternatives.push(TRIPLE_DOUBLE.to_string());
        if !style.char_literals {
            alternatives.push(TRIPLE_SINGLE.to_string());
        }
    }

    alternatives.push(DOUBLE_QUOTED.to_string());
    alternatives.push(if style.char_literals {
        CHAR_LITERAL.to_string()
    } else {
        SINGLE_QUOTED.to_string()
    });

    alternatives.push(format!(r"{}[^\n]*", regex::escape(style.single_line)));

    if let Some((open, close)) = style.block {
        alternatives.push(format!(
            r"{}[\s\S]*?(?:{}|\z)",
            regex::escape(open),
            regex::escape(close)
        ));
    }

    alternatives.join("|")
}

fn comment_regex(language: Language) -> &'static Regex {
    static PATTERNS: OnceLock<HashMap<Language, Regex>> = OnceLock::new();

    let patterns = PATTERNS.get_or_init(|| {
        ALL_LANGUAGES
            .into_iter()
            .map(|lang| {
                let pattern = comment_pattern(&lang.comment_style());
                (lang, Regex::new(&pattern).expect("Invalid regex"))
            })
            .collect()
    });

    &patterns[&language]
}

/// @ai:intent Replace every comment with a single space, leaving string and char literals intact
/// @ai:effects pure
fn strip_comments(source: &str, language: Language) -> String {
    comment_regex(language)
        .replace_all(source, |caps: &Captures| {
            let matched = &caps[0];

            if matched.starts_with('"') || matched.starts_with('\'') {
                matched.to_string()
            } else {
                " ".to_string()
            }
        })
        .into_owned()
}

/// @ai:intent Trim each line, collapse whitespace runs and drop blank lines
/// @ai:effects pure
fn canonicalize_whitespace(source: &str) -> String {
    source
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// @ai:intent Produce the canonical form of a source text
/// @ai:post normalize(normalize(x, l), l) == normalize(x, l)
/// @ai:example ("x = 1  # set\n\n", Some(Python)) -> "x = 1"
/// @ai:effects pure
pub fn normalize(source: &str, language: Option<Language>) -> String {
    match language {
        Some(language) => canonicalize_whitespace(&strip_comments(source, language)),
        None => canonicalize_whitespace(source),
    }
}

/// @ai:intent Check whether two sources are equal after normalization
/// @ai:effects pure
pub fn equivalent(a: &str, b: &str, language: Option<Language>) -> bool {
    normalize(a, language) == normalize(b, language)
}

/// @ai:intent Read a file and normalize it, detecting the language from the extension unless one is given
/// @ai:effects fs:read
pub fn normalize_file(path: &Path, language: Option<Language>) -> Result<String> {
    let source = std::fs::read_to_string(path).map_err(|source| Error::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(normalize(&source, language.or_else(|| detect_language(path))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_strips_python_comments_and_blank_lines() {
        let source = "# greet\nprint('hi')   # inline\n\n\n    x  =   1\n";
        assert_eq!(normalize(source, Some(Language::Python)), "print('hi')\nx = 1");
    }

    #[test]
    fn test_keeps_hash_inside_python_strings() {
        let source = "print(\"# not a comment\")  # a comment";
        assert_eq!(
            normalize(source, Some(Language::Python)),
            "print(\"# not a comment\")"
        );
    }

    #[test]
    fn test_python_docstring_is_not_stripped() {
        let source = "def f():\n    \"\"\"Doc # with hash\n    more\"\"\"\n    return 1";
        assert_eq!(
            normalize(source, Some(Language::Python)),
            "def f():\n\"\"\"Doc # with hash\nmore\"\"\"\nreturn 1"
        );
    }

    #[test]
    fn test_strips_c_family_comments() {
        let source = "int main() { /* block\n spanning */ return 0; // done\n}";
        assert_eq!(
            normalize(source, Some(Language::Cpp)),
            "int main() { return 0;\n}"
        );
    }

    #[test]
    fn test_comment_markers_inside_java_strings_survive() {
        let source = "String s = \"http://example.com /* x */\"; // url";
        assert_eq!(
            normalize(source, Some(Language::Java)),
            "String s = \"http://example.com /* x */\";"
        );
    }

    #[test]
    fn test_java_text_block_keeps_comment_markers() {
        let source = "String s = \"\"\"\n    // kept\n    \"\"\"; // dropped";
        assert_eq!(
            normalize(source, Some(Language::Java)),
            "String s = \"\"\"\n// kept\n\"\"\";"
        );
    }

    #[test]
    fn test_quote_char_literal_does_not_open_a_string() {
        let source = "char q = '\"'; // quote\nchar e = '\\''; // escaped";
        assert_eq!(
            normalize(source, Some(Language::Java)),
            "char q = '\"';\nchar e = '\\'';"
        );
    }

    #[test]
    fn test_cpp_digit_separator_is_not_a_char_literal() {
        assert_eq!(
            normalize("int n = 1'000'000; // a million", Some(Language::Cpp)),
            "int n = 1'000'000;"
        );
    }

    #[test]
    fn test_removed_comment_does_not_fuse_tokens() {
        assert_eq!(normalize("a/*x*/b", Some(Language::C)), "a b");
    }

    #[test]
    fn test_unterminated_block_comment_runs_to_end() {
        assert_eq!(normalize("x = 1; /* open", Some(Language::Java)), "x = 1;");
    }

    #[test]
    fn test_unknown_language_only_touches_whitespace() {
        let source = "  a   b // kept  \n\n  c ";
        assert_eq!(normalize(source, None), "a b // kept\nc");
    }

    #[test]
    fn test_crlf_line_endings_match_lf() {
        assert!(equivalent(
            "x = 1\r\ny = 2\r\n",
            "x = 1\ny = 2",
            Some(Language::Python)
        ));
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let samples = [
            ("int a = 1; // c\n/* multi\nline */ int b;\n  'x' \"s // t\"", Language::Cpp),
            ("x = '''a # b\n\n c'''  # d\n  y = \"\\\"#\"", Language::Python),
            ("public class A { /* x */ }\n\"unterminated // here\nnext", Language::Java),
            ("a \\\n b '/*' /* c", Language::C),
        ];

        for (source, language) in samples {
            let once = normalize(source, Some(language));
            let twice = normalize(&once, Some(language));
            assert_eq!(once, twice, "not idempotent for {:?}", source);
        }
    }

    #[test]
    fn test_equivalent_ignores_formatting() {
        let reference = "def add(a, b):\n    return a + b\n";
        let submitted = "def add(a,  b):   # adds\n\n        return a + b";
        assert!(equivalent(reference, submitted, Some(Language::Python)));
        assert!(!equivalent(
            reference,
            "def add(a, b):\n    return b + a",
            Some(Language::Python)
        ));
    }

    #[test]
    fn test_normalize_file_detects_language() {
        let mut file = tempfile::Builder::new().suffix(".py").tempfile().unwrap();
        writeln!(file, "x = 1  # one").unwrap();

        assert_eq!(normalize_file(file.path(), None).unwrap(), "x = 1");
    }

    #[test]
    fn test_normalize_file_language_override() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        writeln!(file, "int x = 1; // one").unwrap();

        assert_eq!(normalize_file(file.path(), None).unwrap(), "int x = 1; // one");
        assert_eq!(
            normalize_file(file.path(), Some(Language::Cpp)).unwrap(),
            "int x = 1;"
        );
    }

    #[test]
    fn test_normalize_file_missing() {
        let result = normalize_file(Path::new("/nonexistent/solution.py"), None);
        assert!(matches!(result, Err(Error::FileRead { .. })));
    }
}
