//! @ai:module:intent Define language-specific comment syntax used when canonicalizing source
//! @ai:module:layer domain
//! @ai:module:public_api Language, CommentStyle, detect_language
//! @ai:module:stateless true

use std::path::Path;

/// @ai:intent A programming language whose comment syntax the normalizer understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Python,
    Java,
    C,
    Cpp,
}

/// @ai:intent Comment delimiters and the literal forms that can hide them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentStyle {
    pub single_line: &'static str,
    pub block: Option<(&'static str, &'static str)>,
    /// `"""` opens a literal that may span lines (Python strings, Java text blocks)
    pub triple_quoted_strings: bool,
    /// `'` delimits exactly one (possibly escaped) character rather than a string
    pub char_literals: bool,
}

pub(crate) const ALL_LANGUAGES: [Language; 4] =
    [Language::Python, Language::Java, Language::C, Language::Cpp];

impl Language {
    /// @ai:intent Get the comment style for this language
    /// @ai:effects pure
    pub fn comment_style(&self) -> CommentStyle {
        match self {
            // Triple-quoted strings are literals, so Python has no block comments.
            Language::Python => CommentStyle {
                single_line: "#",
                block: None,
                triple_quoted_strings: true,
                char_literals: false,
            },
            Language::Java => CommentStyle {
                single_line: "//",
                block: Some(("/*", "*/")),
                triple_quoted_strings: true,
                char_literals: true,
            },
            Language::C | Language::Cpp => CommentStyle {
                single_line: "//",
                block: Some(("/*", "*/")),
                triple_quoted_strings: false,
                char_literals: true,
            },
        }
    }

    /// @ai:intent Get file extensions for this language
    /// @ai:effects pure
    pub fn extensions(&self) -> &[&str] {
        match self {
            Language::Python => &["py", "pyi"],
            Language::Java => &["java"],
            Language::C => &["c", "h"],
            Language::Cpp => &["cpp", "cc", "cxx", "hpp", "hh", "hxx"],
        }
    }

    /// @ai:intent Get language name as string
    /// @ai:effects pure
    pub fn name(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::Java => "java",
            Language::C => "c",
            Language::Cpp => "cpp",
        }
    }

    /// @ai:intent Look up a language by its name or one of its extensions
    /// @ai:example ("python") -> Some(Python)
    /// @ai:example ("c++") -> Some(Cpp)
    /// @ai:effects pure
    pub fn from_name(name: &str) -> Option<Language> {
        let name = name.trim().to_ascii_lowercase();

        if name == "c++" {
            return Some(Language::Cpp);
        }

        ALL_LANGUAGES
            .into_iter()
            .find(|lang| lang.name() == name || lang.extensions().contains(&name.as_str()))
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// @ai:intent Detect the programming language from a file path
/// @ai:pre path is a valid file path
/// @ai:post result is Some if extension is recognized
/// @ai:example ("Solution.java") -> Some(Java)
/// @ai:example ("main.py") -> Some(Python)
/// @ai:example ("notes.txt") -> None
/// @ai:effects pure
pub fn detect_language(path: &Path) -> Option<Language> {
    let ext = path.extension()?.to_str()?;

    ALL_LANGUAGES
        .into_iter()
        .find(|lang| lang.extensions().contains(&ext))
}
