//! Block classifier / scanner driver: walks file content left to right,
//! recognizes block-start markers, delegates to the locator and tokenizer,
//! and assembles tagged records.
//!
//! Each file is processed independently and statelessly, so the multi-file
//! scan is embarrassingly parallel; per-file results are merged into a
//! path-keyed map for deterministic ordering regardless of completion order.

use rayon::prelude::*;
use regex::Regex;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::locate::locate;
use crate::tokenize::tokenize;
use crate::types::{
    Block, BlockKind, Row, ScanConfig, ScanError, ScanOutcome, DEFAULT_CALL_MARKER,
};

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decode raw bytes with the configured primary encoding, retrying with the
/// fallback before giving up. A failure skips the file, never the scan.
pub fn decode(path: &str, bytes: &[u8], config: &ScanConfig) -> Result<String, ScanError> {
    if let Some(text) = config.primary_encoding.decode(bytes) {
        return Ok(text);
    }
    debug!(
        path,
        primary = config.primary_encoding.label(),
        fallback = config.fallback_encoding.label(),
        "primary decode failed, retrying with fallback"
    );
    config
        .fallback_encoding
        .decode(bytes)
        .ok_or_else(|| ScanError::Decode { path: path.to_string() })
}

// ---------------------------------------------------------------------------
// Single-file driver
// ---------------------------------------------------------------------------

/// Driver state. A block's span is resolved immediately inside the marker
/// transition, so braces in comments elsewhere in the file never accumulate
/// into a half-open block.
enum ScanState {
    Idle,
    InTypeBlock { marker: usize },
    InCallBlock { marker: usize, marker_end: usize, name: String },
}

fn compile_call_marker(config: &ScanConfig) -> Regex {
    match Regex::new(&config.call_marker) {
        Ok(re) => re,
        Err(err) => {
            warn!(
                pattern = config.call_marker.as_str(),
                %err,
                "invalid call marker pattern, using default"
            );
            Regex::new(DEFAULT_CALL_MARKER).unwrap()
        }
    }
}

/// Scan one file's decoded content and return its blocks in source order.
pub fn scan_content(path: &str, content: &str, config: &ScanConfig) -> Vec<Block> {
    let call_re = compile_call_marker(config);
    scan_with(path, content, &config.type_marker, &call_re)
}

fn scan_with(path: &str, content: &str, type_marker: &str, call_re: &Regex) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut cursor = 0usize;
    let mut state = ScanState::Idle;

    loop {
        state = match state {
            ScanState::Idle => {
                if cursor >= content.len() {
                    break;
                }
                let next_type = content[cursor..].find(type_marker).map(|i| cursor + i);
                let next_call = call_re.captures(&content[cursor..]).map(|cap| {
                    let m = cap.get(0).unwrap();
                    let name =
                        cap.get(1).map(|g| g.as_str().to_string()).unwrap_or_default();
                    (cursor + m.start(), cursor + m.end(), name)
                });

                match (next_type, next_call) {
                    (None, None) => break,
                    (Some(t), None) => ScanState::InTypeBlock { marker: t },
                    (None, Some((s, e, name))) => {
                        ScanState::InCallBlock { marker: s, marker_end: e, name }
                    }
                    (Some(t), Some((s, e, name))) => {
                        if t <= s {
                            ScanState::InTypeBlock { marker: t }
                        } else {
                            ScanState::InCallBlock { marker: s, marker_end: e, name }
                        }
                    }
                }
            }

            ScanState::InTypeBlock { marker } => {
                let marker_end = marker + type_marker.len();
                match locate(content, marker_end, '{', '}') {
                    Some(span) => {
                        let tag = content[marker_end..span.open].trim().to_string();
                        let name = span
                            .trailing(content)
                            .split_whitespace()
                            .last()
                            .unwrap_or("")
                            .to_string();
                        let interior = span.interior(content).to_string();
                        let members = tokenize(&interior);
                        blocks.push(Block {
                            file: path.to_string(),
                            kind: BlockKind::TypeBlock,
                            name,
                            tag,
                            interior,
                            members,
                        });
                        cursor = span.terminator.map_or(span.close + 1, |t| t + 1);
                    }
                    None => {
                        // Incomplete block: skip it, keep scanning. The cursor
                        // moves strictly past the marker so the file tail is
                        // never reprocessed in a loop.
                        debug!(path, offset = marker, "incomplete type block discarded");
                        cursor = marker_end;
                    }
                }
                ScanState::Idle
            }

            ScanState::InCallBlock { marker, marker_end, name } => {
                match locate(content, marker, '(', ')') {
                    Some(span) => {
                        let interior = span.interior(content).to_string();
                        let members = tokenize(&interior);
                        blocks.push(Block {
                            file: path.to_string(),
                            kind: BlockKind::CallBlock,
                            name,
                            tag: String::new(),
                            interior,
                            members,
                        });
                        cursor = span.terminator.map_or(span.close + 1, |t| t + 1);
                    }
                    None => {
                        debug!(path, offset = marker, "incomplete call block discarded");
                        cursor = marker_end;
                    }
                }
                ScanState::Idle
            }
        };
    }

    blocks
}

// ---------------------------------------------------------------------------
// Parallel multi-file scan
// ---------------------------------------------------------------------------

/// Scan a batch of `(path, bytes)` sources in parallel. File discovery is the
/// caller's concern; this consumes whatever supply it is handed.
pub fn scan_sources(sources: &[(String, Vec<u8>)], config: &ScanConfig) -> ScanOutcome {
    let start = Instant::now();
    let call_re = compile_call_marker(config);
    let type_marker = config.type_marker.as_str();

    let results: Vec<Result<(String, Vec<Block>), ScanError>> = sources
        .par_iter()
        .map(|(path, bytes)| {
            let content = decode(path, bytes, config)?;
            let blocks = scan_with(path, &content, type_marker, &call_re);
            debug!(path = path.as_str(), blocks = blocks.len(), "file scanned");
            Ok((path.clone(), blocks))
        })
        .collect();

    let mut outcome = ScanOutcome::default();
    for result in results {
        match result {
            Ok((path, blocks)) => {
                outcome.files.insert(path, blocks);
            }
            Err(err) => {
                warn!(%err, "file skipped");
                outcome.errors.push(err);
            }
        }
    }

    let block_count: usize = outcome.files.values().map(|b| b.len()).sum();
    info!(
        files = outcome.files.len(),
        blocks = block_count,
        skipped = outcome.errors.len(),
        time_ms = start.elapsed().as_millis() as u64,
        "Scan complete"
    );

    outcome
}

/// Flatten an outcome into one row per member: path-sorted across files,
/// source order within a file, member sequence numbers 1-based per block.
pub fn flatten_rows(outcome: &ScanOutcome) -> Vec<Row> {
    let mut rows = Vec::new();
    for (file, blocks) in &outcome.files {
        for block in blocks {
            for (i, member) in block.members.iter().enumerate() {
                rows.push(Row {
                    file: file.clone(),
                    kind: block.kind.label(),
                    block: block.name.clone(),
                    tag: block.tag.clone(),
                    seq: i + 1,
                    raw: member.raw.clone(),
                    ty: member.ty().to_string(),
                    name: member.name().to_string(),
                    array_size: member.array_size().to_string(),
                    block_comments: member.block_comments.join("\n"),
                    line_comments: member.line_comments.join("\n"),
                    include_ref: member.include_ref().to_string(),
                });
            }
        }
    }
    rows
}
