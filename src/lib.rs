//! declscan — batch scanner for C-like header trees.
//!
//! Scans header text for two kinds of delimiter-balanced blocks — `typedef
//! struct { ... } Name;` and call-style `long _firstcall Name( ... );` —
//! using explicit brace/paren depth counting, then parses each block interior
//! into individual member declarations (type, name, array size, comments,
//! nested includes). Deliberately a lightweight lexical scanner, not a
//! compiler front end: malformed blocks are skipped, never fatal.
//!
//! # Modules
//!
//! - [`comments`] — comment stripping with preservation
//! - [`locate`] — balanced-delimiter block location via depth counting
//! - [`tokenize`] — declaration tokenization
//! - [`scan`] — scanner driver, byte decoding, parallel multi-file scan
//! - [`types`] — record shapes, configuration, error taxonomy
//!
//! File discovery and row serialization stay outside this crate: the input is
//! an ordered supply of `(path, bytes)` pairs and the output is a flat
//! sequence of [`Row`]s.

pub mod comments;
pub mod locate;
pub mod scan;
pub mod tokenize;
pub mod types;

use tracing::{debug, warn};

pub use scan::{decode, flatten_rows, scan_content, scan_sources};
pub use types::{
    Block, BlockKind, Encoding, Member, MemberPayload, Row, ScanConfig, ScanError, ScanOutcome,
};

// ---------------------------------------------------------------------------
// .declscan.toml config loading
// ---------------------------------------------------------------------------

/// Known keys in `.declscan.toml` for config validation.
const KNOWN_CONFIG_KEYS: &[&str] =
    &["type_marker", "call_marker", "primary_encoding", "fallback_encoding"];

/// Simple Levenshtein edit distance for typo suggestions.
fn edit_distance(a: &str, b: &str) -> usize {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, &ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Load scan configuration from `.declscan.toml` in the given project root.
///
/// Returns a [`ScanConfig`] with defaults merged with any overrides from the
/// config file. If the file doesn't exist or can't be parsed, returns
/// defaults with a warning. Unknown keys trigger a warning with a typo
/// suggestion.
pub fn load_config(project_root: &std::path::Path) -> ScanConfig {
    let mut config = ScanConfig::default();
    let config_path = project_root.join(".declscan.toml");

    if config_path.exists() {
        debug!("Loading .declscan.toml");
        if let Ok(content) = std::fs::read_to_string(&config_path) {
            if let Ok(table) = content.parse::<toml::Table>() {
                // Validate keys — warn on unknown
                for key in table.keys() {
                    if !KNOWN_CONFIG_KEYS.contains(&key.as_str()) {
                        let suggestion =
                            KNOWN_CONFIG_KEYS.iter().min_by_key(|k| edit_distance(key, k)).unwrap();
                        let dist = edit_distance(key, suggestion);
                        if dist <= 3 {
                            warn!(
                                key = key.as_str(),
                                suggestion = *suggestion,
                                "Unknown key in .declscan.toml — did you mean '{suggestion}'?"
                            );
                        } else {
                            warn!(
                                key = key.as_str(),
                                "Unknown key in .declscan.toml (known keys: {})",
                                KNOWN_CONFIG_KEYS.join(", ")
                            );
                        }
                    }
                }

                if let Some(marker) = table.get("type_marker").and_then(|v| v.as_str()) {
                    config.type_marker = marker.to_string();
                }

                if let Some(marker) = table.get("call_marker").and_then(|v| v.as_str()) {
                    config.call_marker = marker.to_string();
                }

                if let Some(name) = table.get("primary_encoding").and_then(|v| v.as_str()) {
                    match Encoding::parse(name) {
                        Some(enc) => config.primary_encoding = enc,
                        None => warn!(name, "Unknown primary_encoding in .declscan.toml"),
                    }
                }

                if let Some(name) = table.get("fallback_encoding").and_then(|v| v.as_str()) {
                    match Encoding::parse(name) {
                        Some(enc) => config.fallback_encoding = enc,
                        None => warn!(name, "Unknown fallback_encoding in .declscan.toml"),
                    }
                }
            } else {
                warn!("Failed to parse .declscan.toml");
            }
        }
    }

    config
}
