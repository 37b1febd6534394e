//! Score extraction from model responses.
//!
//! The remote model is instructed to answer with JSON, but responses arrive
//! in several shapes: clean JSON, JSON wrapped in markdown code fences, JSON
//! missing keys, or plain prose containing a number.  Parsing runs a strict
//! fallback chain:
//!
//! 1. empty response → no score
//! 2. fence-stripped JSON object with a `score` key → that score, clamped
//! 3. left-to-right scan for the first bounded numeral (0–20, optional
//!    single fractional digit, not adjacent to another digit)
//! 4. no match → no score, raw text preserved as the explanation
//!
//! A score extracted from structured JSON is clamped into range; a prose
//! numeral outside the interval never matches the scan pattern, so an
//! out-of-range prose value is a parse failure rather than a clamp.  The
//! caller decides what an absent score degrades to.

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::categories::clamp_score;

// ─── Parsed response ──────────────────────────────────────────────────────────

/// Outcome of parsing one model response.
///
/// `score: None` means the response contained no extractable score — the
/// caller must decide whether to degrade to the interval minimum, and must
/// not silently treat absence as a genuine zero evaluation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedResponse {
    pub score: Option<f64>,
    pub explanation: Option<String>,
}

// ─── Fence stripping ──────────────────────────────────────────────────────────

/// Strip leading/trailing markdown code-fence markers (```json / ```), if any.
pub fn strip_code_fences(raw: &str) -> &str {
    let mut s = raw.trim();
    if let Some(rest) = s.strip_prefix("```json") {
        s = rest;
    } else if let Some(rest) = s.strip_prefix("```") {
        s = rest;
    }
    if let Some(rest) = s.strip_suffix("```") {
        s = rest;
    }
    s.trim()
}

// ─── Single-score parsing ─────────────────────────────────────────────────────

/// Parse one model response into an optional score and optional explanation.
pub fn parse_response(raw: &str) -> ParsedResponse {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return ParsedResponse::default();
    }

    // Structured JSON wins outright.  A parseable object with a `score` key
    // ends the chain even when the value itself is unusable — falling through
    // to the prose scan would pick numbers out of the JSON text.
    if let Ok(Value::Object(obj)) = serde_json::from_str::<Value>(strip_code_fences(trimmed)) {
        if obj.contains_key("score") {
            let score = obj.get("score").and_then(coerce_number).map(clamp_score);
            let explanation = obj.get("explanation").and_then(|v| match v {
                Value::String(s) => non_empty(s),
                Value::Null => None,
                other => Some(other.to_string()),
            });
            return ParsedResponse { score, explanation };
        }
    }

    // Prose fallback: first bounded numeral wins.  Known limitation: stray
    // numbers in prose (page counts, ages) match just as well as scores.
    match find_score(trimmed) {
        Some((score, range)) => {
            let matched = &trimmed[range];
            let explanation = non_empty(trimmed.replacen(matched, "", 1).trim());
            ParsedResponse {
                score: Some(score),
                explanation,
            }
        }
        None => ParsedResponse {
            score: None,
            explanation: Some(trimmed.to_string()),
        },
    }
}

/// Parse the batched-evaluation response into its `scores` object.
///
/// Returns `None` when the response is not a JSON object carrying a `scores`
/// map — the caller falls back to one call per category.
pub fn parse_batch_scores(raw: &str) -> Option<serde_json::Map<String, Value>> {
    match serde_json::from_str::<Value>(strip_code_fences(raw)) {
        Ok(Value::Object(mut obj)) => match obj.remove("scores") {
            Some(Value::Object(scores)) => Some(scores),
            _ => None,
        },
        _ => None,
    }
}

/// Coerce a JSON value to a float: numbers directly, numeric strings parsed.
pub(crate) fn coerce_number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn non_empty(s: &str) -> Option<String> {
    let t = s.trim();
    (!t.is_empty()).then(|| t.to_string())
}

// ─── Bounded numeral scan ─────────────────────────────────────────────────────

/// Digit-run tokens; candidate positions for the bounded match live inside
/// these.  The `regex` crate has no look-around, so the digit-boundary guards
/// of the score pattern are applied manually per candidate.
static NUMBER_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[0-9]+(?:\.[0-9]+)?").expect("number token pattern must compile")
});

/// Find the first substring that reads as a valid score: integer part 0–9,
/// 10–19, or 20, optional `.d` fraction, with no digit immediately before or
/// after.  Returns the value and the matched byte range.
pub fn find_score(text: &str) -> Option<(f64, Range<usize>)> {
    let bytes = text.as_bytes();
    for token in NUMBER_TOKEN.find_iter(text) {
        // Candidate starts: any digit in the token not preceded by a digit —
        // the token start, and the first fraction digit after a '.'.
        for start in token.range() {
            if !bytes[start].is_ascii_digit() {
                continue;
            }
            if start > 0 && bytes[start - 1].is_ascii_digit() {
                continue;
            }
            if let Some(range) = match_bounded_at(bytes, start) {
                let value = text[range.clone()]
                    .parse()
                    .expect("matched range is a well-formed float");
                return Some((value, range));
            }
        }
    }
    None
}

/// Try the score alternatives at `start`, longest first, dropping the
/// optional fraction before abandoning an alternative — mirroring the
/// backtracking order of `20(\.\d)? | 1[0-9](\.\d)? | [0-9](\.\d)?` between
/// digit boundaries.
fn match_bounded_at(bytes: &[u8], start: usize) -> Option<Range<usize>> {
    let d0 = bytes[start];

    let two_digit_ok = bytes
        .get(start + 1)
        .filter(|b| b.is_ascii_digit())
        .map(|b1| (d0 - b'0') * 10 + (b1 - b'0'))
        .is_some_and(|v| (10..=20).contains(&v));

    let attempts: &[(usize, bool)] = if two_digit_ok {
        &[(2, true), (2, false), (1, true), (1, false)]
    } else {
        &[(1, true), (1, false)]
    };

    for &(int_len, with_frac) in attempts {
        let mut end = start + int_len;
        if with_frac {
            let has_frac = bytes.get(end) == Some(&b'.')
                && bytes.get(end + 1).is_some_and(|b| b.is_ascii_digit());
            if !has_frac {
                continue;
            }
            end += 2;
        }
        if bytes.get(end).is_some_and(|b| b.is_ascii_digit()) {
            continue;
        }
        return Some(start..end);
    }
    None
}

// ─── Tests ────────────────────────────────────────────────────────────────────
