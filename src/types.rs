//! Core types shared across declscan: scan configuration, extracted block and
//! member records, flattened output rows, and the per-file error taxonomy.

use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Scan configuration — replaces hardcoded constants
// ---------------------------------------------------------------------------

/// Default literal substring that opens a type block.
pub const DEFAULT_TYPE_MARKER: &str = "typedef struct";

/// Default call-declaration marker. Group 1 captures the call name; the
/// pattern must end at the opening parenthesis.
pub const DEFAULT_CALL_MARKER: &str = r"long\s+_firstcall\s+([A-Za-z_][A-Za-z0-9_]*)\s*\(";

/// Runtime configuration for scanning. Loaded from .declscan.toml or defaults.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Literal substring that opens a `typedef struct { ... } Name;` block.
    pub type_marker: String,
    /// Regex that opens a call block; group 1 must capture the call name.
    pub call_marker: String,
    /// Encoding attempted first when decoding raw file bytes.
    pub primary_encoding: Encoding,
    /// Encoding retried when the primary fails.
    pub fallback_encoding: Encoding,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            type_marker: DEFAULT_TYPE_MARKER.to_string(),
            call_marker: DEFAULT_CALL_MARKER.to_string(),
            primary_encoding: Encoding::Utf8,
            fallback_encoding: Encoding::Latin1,
        }
    }
}

/// Supported source encodings. `Latin1` and `Utf8Lossy` never fail, so either
/// makes a total fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Encoding {
    /// Strict UTF-8; decode fails on any invalid sequence.
    Utf8,
    /// ISO-8859-1: every byte maps 1:1 to the same scalar value.
    Latin1,
    /// UTF-8 with invalid sequences replaced, matching "ignore errors" readers.
    Utf8Lossy,
}

impl Encoding {
    /// Parse a config-file encoding name.
    pub fn parse(name: &str) -> Option<Encoding> {
        match name.to_ascii_lowercase().as_str() {
            "utf8" | "utf-8" => Some(Encoding::Utf8),
            "latin1" | "latin-1" | "iso-8859-1" => Some(Encoding::Latin1),
            "utf8-lossy" | "utf-8-lossy" => Some(Encoding::Utf8Lossy),
            _ => None,
        }
    }

    /// Decode bytes with this encoding. `None` means the bytes are not valid
    /// in this encoding (only possible for `Utf8`).
    pub fn decode(&self, bytes: &[u8]) -> Option<String> {
        match self {
            Encoding::Utf8 => std::str::from_utf8(bytes).ok().map(str::to_string),
            Encoding::Latin1 => Some(bytes.iter().map(|&b| b as char).collect()),
            Encoding::Utf8Lossy => Some(String::from_utf8_lossy(bytes).into_owned()),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Encoding::Utf8 => "utf-8",
            Encoding::Latin1 => "latin-1",
            Encoding::Utf8Lossy => "utf-8-lossy",
        }
    }
}

// ---------------------------------------------------------------------------
// Extracted records
// ---------------------------------------------------------------------------

/// The kind of an extracted block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BlockKind {
    /// `typedef struct { ... } Name;`
    TypeBlock,
    /// `long _firstcall Name( ... );`
    CallBlock,
}

impl BlockKind {
    pub fn label(&self) -> &'static str {
        match self {
            BlockKind::TypeBlock => "typedef",
            BlockKind::CallBlock => "call",
        }
    }
}

/// One delimiter-balanced declaration group extracted from a file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    /// Path of origin, as supplied by the caller.
    pub file: String,
    pub kind: BlockKind,
    /// Typedef name for type blocks, call name for call blocks. Empty when no
    /// trailing terminator was found after the closing delimiter.
    pub name: String,
    /// Optional struct tag between the marker and the opening brace.
    pub tag: String,
    /// Raw text between the opening and closing delimiter, comments intact.
    pub interior: String,
    pub members: Vec<Member>,
}

/// One parsed declaration inside a block's interior.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Member {
    /// Original declaration text with its terminator re-appended.
    pub raw: String,
    pub payload: MemberPayload,
    /// Block comments removed from `raw`, in source order.
    pub block_comments: Vec<String>,
    /// Line comments removed from `raw`, in source order.
    pub line_comments: Vec<String>,
}

/// Exactly one of "declaration" or "include reference" holds per member.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum MemberPayload {
    Declaration {
        /// Token run preceding the declared name, pointer markers included.
        /// Empty when the unit could not be classified at all.
        ty: String,
        /// Declared identifier; empty when unparsable.
        name: String,
        /// Raw text inside `[...]`; empty for non-arrays.
        array_size: String,
    },
    Include {
        /// Quoted or angle-bracketed filename of a nested `#include`.
        path: String,
    },
}

impl Member {
    pub fn ty(&self) -> &str {
        match &self.payload {
            MemberPayload::Declaration { ty, .. } => ty,
            MemberPayload::Include { .. } => "",
        }
    }

    pub fn name(&self) -> &str {
        match &self.payload {
            MemberPayload::Declaration { name, .. } => name,
            MemberPayload::Include { .. } => "",
        }
    }

    pub fn array_size(&self) -> &str {
        match &self.payload {
            MemberPayload::Declaration { array_size, .. } => array_size,
            MemberPayload::Include { .. } => "",
        }
    }

    pub fn include_ref(&self) -> &str {
        match &self.payload {
            MemberPayload::Declaration { .. } => "",
            MemberPayload::Include { path } => path,
        }
    }
}

// ---------------------------------------------------------------------------
// Flattened output rows — the external sink contract
// ---------------------------------------------------------------------------

/// One flattened output row per member. Serialization to a concrete format
/// (spreadsheet, CSV, JSON) is the caller's concern.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    pub file: String,
    pub kind: &'static str,
    pub block: String,
    pub tag: String,
    /// 1-based member sequence number within its block.
    pub seq: usize,
    pub raw: String,
    #[serde(rename = "type")]
    pub ty: String,
    pub name: String,
    pub array_size: String,
    /// Newline-joined block comments.
    pub block_comments: String,
    /// Newline-joined line comments.
    pub line_comments: String,
    /// Empty unless the member is a nested include.
    pub include_ref: String,
}

// ---------------------------------------------------------------------------
// Error taxonomy
// ---------------------------------------------------------------------------

/// Per-file failure that causes the file to be skipped. Incomplete blocks are
/// discarded inline and unparsable declarations are emitted best-effort, so
/// neither surfaces here; nothing in the scan is fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    #[error("{path}: undecodable with primary or fallback encoding")]
    Decode { path: String },
}

/// Aggregated result of scanning a batch of sources. Files are keyed by path,
/// so iteration order is deterministic regardless of worker completion order.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub files: BTreeMap<String, Vec<Block>>,
    pub errors: Vec<ScanError>,
}
