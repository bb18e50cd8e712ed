//! Balanced-delimiter block location via explicit depth counting.
//!
//! Nested same-kind delimiters are legal and resolved purely by the depth
//! counter; a naive "first closing delimiter" scan would mis-span any
//! struct-in-struct or nested argument list.

/// Byte offsets of one located block within its file content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSpan {
    /// Offset of the opening delimiter.
    pub open: usize,
    /// Offset of the matching closing delimiter.
    pub close: usize,
    /// Offset of the first `;` after the closing delimiter, if any. Text
    /// between `close` and here is the block's trailing identifier text.
    pub terminator: Option<usize>,
}

impl BlockSpan {
    /// The interior text between (exclusive of) the delimiters.
    pub fn interior<'a>(&self, content: &'a str) -> &'a str {
        &content[self.open + 1..self.close]
    }

    /// Trailing text between the closing delimiter and the terminator.
    pub fn trailing<'a>(&self, content: &'a str) -> &'a str {
        match self.terminator {
            Some(t) => &content[self.close + 1..t],
            None => "",
        }
    }
}

/// Find the span of the first `open`..`close` balanced block at or after
/// `from`. Returns `None` when no opening delimiter exists or the depth never
/// returns to zero before end-of-input (an incomplete block; callers skip it
/// and keep scanning rather than failing).
pub fn locate(content: &str, from: usize, open: char, close: char) -> Option<BlockSpan> {
    let open_idx = from + content.get(from..)?.find(open)?;

    let mut depth = 0usize;
    for (i, ch) in content[open_idx..].char_indices() {
        if ch == open {
            depth += 1;
        } else if ch == close {
            depth -= 1;
            if depth == 0 {
                let close_idx = open_idx + i;
                let terminator = content[close_idx..].find(';').map(|r| close_idx + r);
                return Some(BlockSpan { open: open_idx, close: close_idx, terminator });
            }
        }
    }
    None
}
