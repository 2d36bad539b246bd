//! Balanced-Delimiter Extractor
//!
//! Pulls one structured value out of noisy generator output. Generators wrap JSON in
//! prose, numbering and code fences; this module finds the first balanced `{...}` or
//! `[...]` without ever returning a truncated fragment.

use serde_json::Value;
use thiserror::Error;

/// Reasons a structured value could not be extracted.
///
/// These are always candidates for repair, never hard faults.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("no '{{' or '[' found in generator output")]
    NoOpener,

    #[error("unbalanced delimiters: value opened at byte {opened_at} never closes")]
    Unbalanced { opened_at: usize },

    #[error("extracted text is not valid JSON: {0}")]
    Parse(String),
}

const FENCE: &str = "```";

/// Return the body of the first fenced block, without its language tag.
///
/// An unterminated fence yields everything after the opening line.
fn fenced_body(raw: &str) -> Option<&str> {
    let open = raw.find(FENCE)?;
    let after_fence = &raw[open + FENCE.len()..];
    // Language tag runs to the end of the opening line
    let body_start = after_fence.find('\n').map(|n| n + 1).unwrap_or(after_fence.len());
    let body = &after_fence[body_start..];
    Some(match body.find(FENCE) {
        Some(close) => &body[..close],
        None => body,
    })
}

/// Scan `text` from `start` for one balanced value.
///
/// Returns the byte range of the value, or an error when there is no opener or the
/// opener is never closed.
fn scan_balanced(text: &str, start: usize) -> Result<(usize, usize), ExtractionError> {
    let opened_at = text[start..]
        .find(['{', '['])
        .map(|offset| start + offset)
        .ok_or(ExtractionError::NoOpener)?;

    let bytes = text.as_bytes();
    let mut depth: usize = 0;
    let mut in_string = false;
    let mut i = opened_at;

    while i < bytes.len() {
        let b = bytes[i];
        if in_string {
            match b {
                // Escape lookahead: skip the escaped byte
                b'\\' => i += 1,
                b'"' => in_string = false,
                _ => {}
            }
        } else {
            match b {
                b'"' => in_string = true,
                b'{' | b'[' => depth += 1,
                b'}' | b']' => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return Ok((opened_at, i + 1));
                    }
                }
                _ => {}
            }
        }
        i += 1;
    }

    Err(ExtractionError::Unbalanced { opened_at })
}

/// Extract the raw text of the single embedded structured value.
///
/// Code fences and their language tags are stripped first; if the fenced body holds
/// no opener the whole output is scanned.
pub fn extract_block(raw: &str) -> Result<&str, ExtractionError> {
    if let Some(body) = fenced_body(raw) {
        match scan_balanced(body, 0) {
            Ok((start, end)) => return Ok(&body[start..end]),
            Err(ExtractionError::NoOpener) => {}
            Err(e) => return Err(e),
        }
    }
    let (start, end) = scan_balanced(raw, 0)?;
    Ok(&raw[start..end])
}

/// Extract and parse the embedded structured value.
///
/// A balanced candidate that is not valid JSON (a bracketed aside such as `[Note]`) is
/// skipped and scanning resumes after it. An unbalanced candidate fails immediately so
/// a nested fragment of a truncated value is never returned.
pub fn extract_value(raw: &str) -> Result<Value, ExtractionError> {
    let text = match fenced_body(raw) {
        Some(body) if body.contains(['{', '[']) => body,
        _ => raw,
    };

    let mut cursor = 0;
    let mut last_parse_error = None;

    loop {
        let (start, end) = match scan_balanced(text, cursor) {
            Ok(range) => range,
            Err(ExtractionError::NoOpener) => {
                return Err(match last_parse_error {
                    Some(msg) => ExtractionError::Parse(msg),
                    None => ExtractionError::NoOpener,
                })
            }
            Err(e) => return Err(e),
        };

        match serde_json::from_str::<Value>(&text[start..end]) {
            Ok(value) => return Ok(value),
            Err(e) => {
                last_parse_error = Some(e.to_string());
                cursor = end;
            }
        }
    }
}
