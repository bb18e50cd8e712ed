//! Comment stripping with preservation: removes `/* */` and `//` comments
//! from a line or block while keeping their text for reporting.

use regex::Regex;
use std::sync::OnceLock;

fn block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)/\*.*?\*/").unwrap())
}

fn line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"//[^\n]*").unwrap())
}

/// Result of stripping comments from a piece of text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Stripped {
    /// Input with all comments replaced by a single space.
    pub text: String,
    pub block_comments: Vec<String>,
    pub line_comments: Vec<String>,
}

/// Strip comments from `text`, preserving the removed spans in source order.
///
/// Block comments are removed first, then line comments, so a `//` inside a
/// `/* */` span is never mistaken for a line comment. Pure function; comments
/// are replaced with a space so adjacent tokens stay separated.
pub fn strip(text: &str) -> Stripped {
    let block_comments: Vec<String> =
        block_re().find_iter(text).map(|m| m.as_str().to_string()).collect();
    let without_blocks = block_re().replace_all(text, " ");

    let line_comments: Vec<String> =
        line_re().find_iter(&without_blocks).map(|m| m.as_str().to_string()).collect();
    let cleaned = line_re().replace_all(&without_blocks, " ");

    Stripped {
        text: cleaned.into_owned(),
        block_comments,
        line_comments,
    }
}
