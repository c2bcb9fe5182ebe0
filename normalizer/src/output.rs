//! @ai:module:intent Format normalizer results for different formats (JSON, text)
//! @ai:module:layer infrastructure
//! @ai:module:public_api OutputFormat, format_comparison, format_normalized
//! @ai:module:depends_on diff
//! @ai:module:stateless true

use crate::diff::Comparison;
use colored::Colorize;
use serde::Serialize;

/// @ai:intent Output format options
#[derive(Debug, Clone, Copy, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    JsonPretty,
}

#[derive(Serialize)]
struct NormalizedOutput<'a> {
    language: Option<&'a str>,
    normalized: &'a str,
}

/// @ai:intent Format a normalized source
/// @ai:effects pure
pub fn format_normalized(normalized: &str, language: Option<&str>, format: OutputFormat) -> String {
    let output = NormalizedOutput {
        language,
        normalized,
    };

    match format {
        OutputFormat::Json => serde_json::to_string(&output).unwrap_or_default(),
        OutputFormat::JsonPretty => serde_json::to_string_pretty(&output).unwrap_or_default(),
        OutputFormat::Text => normalized.to_string(),
    }
}

/// @ai:intent Format a comparison result as a string
/// @ai:effects pure
pub fn format_comparison(result: &Comparison, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => serde_json::to_string(result).unwrap_or_default(),
        OutputFormat::JsonPretty => serde_json::to_string_pretty(result).unwrap_or_default(),
        OutputFormat::Text => format_comparison_text(result),
    }
}

/// @ai:intent Format a comparison result as human-readable text
/// @ai:effects pure
fn format_comparison_text(result: &Comparison) -> String {
    let mut output = String::new();

    let language = result.language.as_deref().unwrap_or("whitespace only");
    output.push_str(&format!(
        "Compared {} vs {} normalized lines ({})\n",
        result.left_lines,
        result.right_lines,
        language.dimmed()
    ));

    match &result.first_difference {
        None => {
            output.push_str(&format!("{} Sources are equivalent\n", "OK".green().bold()));
        }
        Some(difference) => {
            output.push_str(&format!(
                "{} First difference at line {}\n",
                "DIFF".red().bold(),
                difference.line
            ));
            output.push_str(&format!(
                "  {} {}\n",
                "-".red(),
                difference.left.as_deref().unwrap_or("<end of input>")
            ));
            output.push_str(&format!(
                "  {} {}\n",
                "+".green(),
                difference.right.as_deref().unwrap_or("<end of input>")
            ));
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::compare;
    use crate::language::Language;

    #[test]
    fn test_json_comparison_round_trips_fields() {
        let result = compare("a = 1", "a = 2", Some(Language::Python));
        let json = format_comparison(&result, OutputFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["equivalent"], false);
        assert_eq!(value["first_difference"]["line"], 1);
        assert_eq!(value["language"], "python");
    }

    #[test]
    fn test_text_comparison_mentions_difference() {
        colored::control::set_override(false);
        let result = compare("a = 1", "a = 2", Some(Language::Python));
        let text = format_comparison(&result, OutputFormat::Text);

        assert!(text.contains("First difference at line 1"));
        assert!(text.contains("- a = 1"));
        assert!(text.contains("+ a = 2"));
    }

    #[test]
    fn test_text_normalized_is_raw_text() {
        assert_eq!(format_normalized("x = 1", Some("python"), OutputFormat::Text), "x = 1");
    }
}
