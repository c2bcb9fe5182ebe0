//! @ai:module:intent Source canonicalization library for coarse solution equivalence
//! @ai:module:layer domain
//! @ai:module:public_api normalize, diff, language, output, error
//! @ai:module:stateless true
//!
//! # Taskbank Normalize
//!
//! Strips comments (respecting each language's comment syntax) and canonicalizes
//! whitespace so a learner's submission can be compared against a reference
//! solution without formatting noise.
//!
//! ## Example
//!
//! ```rust
//! use taskbank_normalize::{equivalent, normalize, Language};
//!
//! let reference = "print(sum([1, 2]))";
//! let submitted = "print(sum([1, 2]))   # done\n\n";
//!
//! assert_eq!(normalize(submitted, Some(Language::Python)), reference);
//! assert!(equivalent(reference, submitted, Some(Language::Python)));
//! ```

pub mod diff;
pub mod error;
pub mod language;
pub mod normalize;
pub mod output;

pub use diff::{compare, compare_files, Comparison, LineDifference};
pub use error::{Error, Result};
pub use language::{detect_language, CommentStyle, Language};
pub use normalize::{equivalent, normalize, normalize_file};
pub use output::{format_comparison, format_normalized, OutputFormat};
