//! Declaration tokenizer: splits a block's interior into member statements
//! and classifies each as a declaration, a multi-variable declaration, or a
//! nested include reference.
//!
//! Parsing never fails the whole file. A unit that cannot be classified is
//! still emitted with best-effort or empty fields so downstream consumers can
//! flag it for manual review.

use crate::comments;
use crate::types::{Member, MemberPayload};
use regex::Regex;
use std::sync::OnceLock;

fn include_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"#\s*include\s*(?:"([^"\n]+)"|<([^>\n]+)>)"#).unwrap())
}

/// Permissive declaration pattern: a type run (word tokens and pointer
/// markers, one or more), a trailing identifier, an optional bracketed
/// array-size expression.
fn decl_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^((?:[A-Za-z_][A-Za-z0-9_]*[\s*]+)+)([A-Za-z_][A-Za-z0-9_]*)\s*(?:\[\s*([^\]]*?)\s*\])?\s*$",
        )
        .unwrap()
    })
}

// ---------------------------------------------------------------------------
// Single-declaration parsing
// ---------------------------------------------------------------------------

/// Parse one comment-free declaration. Falls back to "all tokens but the last
/// form the type"; a lone token becomes a type with an empty name.
fn parse_single(text: &str) -> MemberPayload {
    let t = text.trim();

    if let Some(cap) = decl_re().captures(t) {
        return MemberPayload::Declaration {
            ty: cap[1].trim().to_string(),
            name: cap[2].to_string(),
            array_size: cap.get(3).map(|m| m.as_str().to_string()).unwrap_or_default(),
        };
    }

    let tokens: Vec<&str> = t.split_whitespace().collect();
    match tokens.len() {
        0 => MemberPayload::Declaration {
            ty: String::new(),
            name: String::new(),
            array_size: String::new(),
        },
        1 => MemberPayload::Declaration {
            ty: tokens[0].to_string(),
            name: String::new(),
            array_size: String::new(),
        },
        n => MemberPayload::Declaration {
            ty: tokens[..n - 1].join(" "),
            name: tokens[n - 1].to_string(),
            array_size: String::new(),
        },
    }
}

/// Split on `sep`, ignoring separators nested inside brackets, parens or
/// braces (array sizes and argument lists may carry commas of their own).
fn split_top_level(text: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, ch) in text.char_indices() {
        match ch {
            '[' | '(' | '{' => depth += 1,
            ']' | ')' | '}' => depth -= 1,
            c if c == sep && depth <= 0 => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

// ---------------------------------------------------------------------------
// Interior tokenization
// ---------------------------------------------------------------------------

/// Comments carried over from a leading comment-only unit, waiting for the
/// first real member to attach to.
#[derive(Default)]
struct Carried {
    raw: String,
    block_comments: Vec<String>,
    line_comments: Vec<String>,
}

impl Carried {
    fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    fn apply(&mut self, member: &mut Member) {
        if self.is_empty() {
            return;
        }
        member.raw = format!("{} {}", self.raw, member.raw);
        let mut blocks = std::mem::take(&mut self.block_comments);
        blocks.append(&mut member.block_comments);
        member.block_comments = blocks;
        let mut lines = std::mem::take(&mut self.line_comments);
        lines.append(&mut member.line_comments);
        member.line_comments = lines;
        self.raw.clear();
    }
}

/// Tokenize a block interior into members, preserving source order.
pub fn tokenize(interior: &str) -> Vec<Member> {
    let mut members: Vec<Member> = Vec::new();
    let mut carried = Carried::default();

    for unit in interior.split(';') {
        let trimmed = unit.trim();
        // Drop pure-whitespace units and delimiter artifacts left over from
        // upstream line-based collection.
        if trimmed.is_empty() || matches!(trimmed, "{" | "}" | "(" | ")") {
            continue;
        }

        let stripped = comments::strip(trimmed);
        let clean = stripped.text.trim().to_string();

        if clean.is_empty() {
            // Comment-only unit: its text belongs to the neighboring member.
            match members.last_mut() {
                Some(prev) => {
                    prev.raw.push(' ');
                    prev.raw.push_str(trimmed);
                    prev.block_comments.extend(stripped.block_comments);
                    prev.line_comments.extend(stripped.line_comments);
                }
                None => {
                    if carried.is_empty() {
                        carried.raw = format!("{trimmed};");
                    } else {
                        carried.raw.push_str(&format!(" {trimmed};"));
                    }
                    carried.block_comments.extend(stripped.block_comments);
                    carried.line_comments.extend(stripped.line_comments);
                }
            }
            continue;
        }

        let unit_members = tokenize_unit(trimmed, &clean, stripped);
        for (i, mut member) in unit_members.into_iter().enumerate() {
            if i == 0 {
                carried.apply(&mut member);
            }
            members.push(member);
        }
    }

    members
}

/// Expand one non-empty unit into members: include references first, then the
/// declaration remainder (split on top-level commas when several names share
/// one type prefix).
fn tokenize_unit(raw_unit: &str, clean: &str, stripped: comments::Stripped) -> Vec<Member> {
    let mut out = Vec::new();

    let mut comments_pending = true;
    let mut take_comments = |member: &mut Member| {
        if comments_pending {
            member.block_comments = stripped.block_comments.clone();
            member.line_comments = stripped.line_comments.clone();
            comments_pending = false;
        }
    };

    // Nested include references. The directive is not ';'-terminated, so the
    // remainder of the unit (if any) is still a declaration of its own.
    let include_paths: Vec<String> = include_re()
        .captures_iter(clean)
        .map(|cap| {
            cap.get(1)
                .or_else(|| cap.get(2))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default()
        })
        .collect();
    let directives: Vec<String> =
        include_re().find_iter(clean).map(|m| m.as_str().to_string()).collect();

    let clean_rest = include_re().replace_all(clean, " ").trim().to_string();
    let raw_rest = include_re().replace_all(raw_unit, " ").trim().to_string();

    for (path, directive) in include_paths.into_iter().zip(directives) {
        // A unit that is nothing but the directive had its terminator split
        // away, so it gets one back like any other unit.
        let raw = if clean_rest.is_empty() { format!("{directive};") } else { directive };
        let mut member = Member {
            raw,
            payload: MemberPayload::Include { path },
            block_comments: Vec::new(),
            line_comments: Vec::new(),
        };
        take_comments(&mut member);
        out.push(member);
    }

    if clean_rest.is_empty() {
        return out;
    }

    let segments = split_top_level(&clean_rest, ',');
    if segments.len() == 1 {
        let mut member = Member {
            raw: format!("{raw_rest};"),
            payload: parse_single(&clean_rest),
            block_comments: Vec::new(),
            line_comments: Vec::new(),
        };
        take_comments(&mut member);
        out.push(member);
        return out;
    }

    // Multi-variable declaration: the first segment yields the shared type
    // prefix; every later segment is its own declaration appended to it.
    let first = parse_single(segments[0]);
    let shared_ty = match &first {
        MemberPayload::Declaration { ty, .. } => ty.clone(),
        MemberPayload::Include { .. } => String::new(),
    };

    let raw_segments = split_top_level(&raw_rest, ',');
    let seg_raw = |i: usize, seg: &str| -> String {
        let text =
            if raw_segments.len() == segments.len() { raw_segments[i].trim() } else { seg.trim() };
        if i + 1 == segments.len() {
            format!("{text};")
        } else {
            format!("{text},")
        }
    };

    for (i, seg) in segments.iter().copied().enumerate() {
        let payload = if i == 0 {
            first.clone()
        } else if shared_ty.is_empty() {
            parse_single(seg)
        } else {
            parse_single(&format!("{shared_ty} {}", seg.trim()))
        };
        let mut member = Member {
            raw: seg_raw(i, seg),
            payload,
            block_comments: Vec::new(),
            line_comments: Vec::new(),
        };
        take_comments(&mut member);
        out.push(member);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decl(m: &Member) -> (&str, &str, &str) {
        (m.ty(), m.name(), m.array_size())
    }

    #[test]
    fn test_plain_declarations() {
        let members = tokenize(" int a; char b[10]; ");
        assert_eq!(members.len(), 2);
        assert_eq!(decl(&members[0]), ("int", "a", ""));
        assert_eq!(decl(&members[1]), ("char", "b", "10"));
        assert_eq!(members[0].raw, "int a;");
        assert_eq!(members[1].raw, "char b[10];");
    }

    #[test]
    fn test_multi_token_type_and_pointer() {
        let members = tokenize("unsigned long count; char *name;");
        assert_eq!(decl(&members[0]), ("unsigned long", "count", ""));
        assert_eq!(decl(&members[1]), ("char *", "name", ""));
    }

    #[test]
    fn test_multi_variable_shared_type() {
        let members = tokenize(" int a, b[4]; ");
        assert_eq!(members.len(), 2);
        assert_eq!(decl(&members[0]), ("int", "a", ""));
        assert_eq!(decl(&members[1]), ("int", "b", "4"));
        assert_eq!(members[0].raw, "int a,");
        assert_eq!(members[1].raw, "b[4];");
    }

    #[test]
    fn test_multi_variable_pointer_member() {
        let members = tokenize("int a, *c;");
        assert_eq!(decl(&members[0]), ("int", "a", ""));
        assert_eq!(decl(&members[1]), ("int *", "c", ""));
    }

    #[test]
    fn test_nested_include_then_declaration() {
        let members = tokenize(r#" #include "foo.h" int x; "#);
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].include_ref(), "foo.h");
        assert_eq!(members[0].raw, "#include \"foo.h\"");
        assert_eq!(decl(&members[1]), ("int", "x", ""));
        assert_eq!(members[1].raw, "int x;");
    }

    #[test]
    fn test_angle_bracket_include() {
        let members = tokenize("#include <sys/types.h>");
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].include_ref(), "sys/types.h");
        assert_eq!(members[0].raw, "#include <sys/types.h>;");
    }

    #[test]
    fn test_comments_attach_to_member() {
        let members = tokenize("/* comment */ int y; // trailing");
        assert_eq!(members.len(), 1);
        assert_eq!(decl(&members[0]), ("int", "y", ""));
        assert_eq!(members[0].block_comments, vec!["/* comment */"]);
        assert_eq!(members[0].line_comments, vec!["// trailing"]);
        assert_eq!(members[0].raw, "/* comment */ int y; // trailing");
    }

    #[test]
    fn test_leading_comment_only_unit_carries_forward() {
        let members = tokenize("/* header */; int a;");
        assert_eq!(members.len(), 1);
        assert_eq!(decl(&members[0]), ("int", "a", ""));
        assert_eq!(members[0].block_comments, vec!["/* header */"]);
        assert!(members[0].raw.starts_with("/* header */;"));
    }

    #[test]
    fn test_artifact_units_are_dropped() {
        let members = tokenize(" { ; } ; ( ; ) ; int a; ");
        assert_eq!(members.len(), 1);
        assert_eq!(decl(&members[0]), ("int", "a", ""));
    }

    #[test]
    fn test_single_token_is_type_with_empty_name() {
        let members = tokenize("SOMETHING;");
        assert_eq!(members.len(), 1);
        assert_eq!(decl(&members[0]), ("SOMETHING", "", ""));
    }

    #[test]
    fn test_unparsable_unit_best_effort() {
        // Falls back to "all tokens but the last form the type".
        let members = tokenize("} inner;");
        assert_eq!(members.len(), 1);
        assert_eq!(decl(&members[0]), ("}", "inner", ""));
        assert_eq!(members[0].raw, "} inner;");
    }

    #[test]
    fn test_named_array_size_expression() {
        let members = tokenize("char buf[MAX_LEN * 2];");
        assert_eq!(decl(&members[0]), ("char", "buf", "MAX_LEN * 2"));
    }

    #[test]
    fn test_comma_inside_brackets_not_split() {
        let members = tokenize("int m[2,3];");
        assert_eq!(members.len(), 1);
        assert_eq!(decl(&members[0]), ("int", "m", "2,3"));
    }

    #[test]
    fn test_raw_join_round_trip() {
        let interior = " int a; char b[10]; /* c */ int y, z; ";
        let joined: String =
            tokenize(interior).iter().map(|m| m.raw.as_str()).collect::<Vec<_>>().join("");
        let strip_ws = |s: &str| s.chars().filter(|c| !c.is_whitespace()).collect::<String>();
        assert_eq!(strip_ws(&joined), strip_ws(interior));
    }

    #[test]
    fn test_empty_interior() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("  \n\t ").is_empty());
        assert!(tokenize(";;;").is_empty());
    }
}
