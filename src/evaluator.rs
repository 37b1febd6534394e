//! Category evaluation and creativity comparison.
//!
//! `StoryEvaluator` drives the transport client through the fixed category
//! list.  The primary path is one combined call covering every category; a
//! malformed combined response falls back to one call per category.  Either
//! way a final holistic call produces the contextual `"Creativity"` entry.
//!
//! Failure policy: a parse failure degrades that category to the interval
//! minimum and continues; a `TransportError` is never caught here — it
//! propagates and aborts the whole evaluation.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::categories::{self, clamp_score, CREATIVITY, SCORE_MIN};
use crate::client::{ChatClient, TransportError};
use crate::parser::{self, ParsedResponse};
use crate::prompts;

// ─── Result types ─────────────────────────────────────────────────────────────

/// Evaluation outcome for a single category.  Created once per transport
/// round-trip; never mutated afterwards.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EvaluationResult {
    pub category: String,
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// Category name (plus the synthetic `"Creativity"`) → result.
pub type EvaluationResultSet = BTreeMap<String, EvaluationResult>;

/// Outcome of comparing standalone vs. contextual creativity.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DifferenceAnalysis {
    pub standalone_creativity_score: f64,
    pub contextual_creativity_score: f64,
    /// Absolute difference, rounded to one decimal place.
    pub difference: f64,
    /// Category names judged responsible, restricted to the known vocabulary.
    pub influential_categories: Vec<String>,
    /// Attribution text: the model's own analysis when it provided one, or
    /// the raw response when the attribution JSON was malformed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<String>,
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

// ─── StoryEvaluator ───────────────────────────────────────────────────────────

/// Evaluates stories across the fixed literary category list.
pub struct StoryEvaluator {
    client: Arc<dyn ChatClient>,
}

impl StoryEvaluator {
    pub fn new(client: Arc<dyn ChatClient>) -> Self {
        Self { client }
    }

    /// Score the story on every category, then add the contextual
    /// `"Creativity"` entry derived from the full result set.
    pub async fn evaluate_all(&self, story: &str) -> Result<EvaluationResultSet, TransportError> {
        let response = self
            .client
            .chat(prompts::BATCH_SYSTEM_PROMPT, &prompts::batch(story))
            .await?;

        let mut results = EvaluationResultSet::new();
        match parser::parse_batch_scores(&response) {
            Some(scores) => {
                for name in categories::names() {
                    let score = match match_category_score(&scores, name) {
                        Some(s) => clamp_score(s),
                        None => {
                            warn!(category = name, "combined response has no usable score — defaulting to interval minimum");
                            SCORE_MIN
                        }
                    };
                    results.insert(
                        name.to_string(),
                        EvaluationResult {
                            category: name.to_string(),
                            score,
                            explanation: None,
                        },
                    );
                }
            }
            None => {
                warn!("combined evaluation unparseable — falling back to one call per category");
                for name in categories::names() {
                    let raw = self
                        .client
                        .chat(
                            prompts::EVALUATION_SYSTEM_PROMPT,
                            &prompts::single_category(story, name),
                        )
                        .await?;
                    results.insert(name.to_string(), result_from_parse(name, parser::parse_response(&raw)));
                    info!(category = name, "category evaluated");
                }
            }
        }

        // Holistic creativity, given the completed per-category results.
        let summary = category_summary(&results);
        let raw = self
            .client
            .chat(
                prompts::EVALUATION_SYSTEM_PROMPT,
                &prompts::contextual_creativity(story, &summary),
            )
            .await?;
        results.insert(
            CREATIVITY.to_string(),
            result_from_parse(CREATIVITY, parser::parse_response(&raw)),
        );

        Ok(results)
    }

    /// Score creativity directly, with no category context.
    pub async fn evaluate_creativity(&self, story: &str) -> Result<EvaluationResult, TransportError> {
        let raw = self
            .client
            .chat(
                prompts::EVALUATION_SYSTEM_PROMPT,
                &prompts::standalone_creativity(story),
            )
            .await?;
        Ok(result_from_parse(CREATIVITY, parser::parse_response(&raw)))
    }

    /// Attribute the difference between the standalone creativity score and
    /// the contextual one to specific categories.
    ///
    /// Scores within 0.1 of each other short-circuit: zero difference, empty
    /// influential list, and no transport call.
    pub async fn analyze_difference(
        &self,
        story: &str,
        standalone: &EvaluationResult,
        contextual_results: &EvaluationResultSet,
    ) -> Result<DifferenceAnalysis, TransportError> {
        let standalone_score = standalone.score;
        let contextual_score = contextual_results
            .get(CREATIVITY)
            .map(|r| r.score)
            .unwrap_or(standalone_score);

        if (standalone_score - contextual_score).abs() < 0.1 {
            return Ok(DifferenceAnalysis {
                standalone_creativity_score: standalone_score,
                contextual_creativity_score: contextual_score,
                difference: 0.0,
                influential_categories: Vec::new(),
                analysis: None,
            });
        }

        let summary = category_summary(contextual_results);
        let raw = self
            .client
            .chat(
                prompts::ANALYSIS_SYSTEM_PROMPT,
                &prompts::difference_attribution(story, standalone_score, contextual_score, &summary),
            )
            .await?;

        let (influential_categories, analysis) = match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(obj)) => {
                // Hallucinated category names are dropped, not surfaced.
                let valid: Vec<String> = obj
                    .get("influential_categories")
                    .and_then(Value::as_array)
                    .map(|list| {
                        list.iter()
                            .filter_map(Value::as_str)
                            .filter(|name| categories::is_known(name))
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default();
                let analysis = obj
                    .get("analysis")
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string);
                (valid, analysis)
            }
            _ => {
                warn!("attribution response is not valid JSON — keeping raw text only");
                (Vec::new(), Some(raw))
            }
        };

        Ok(DifferenceAnalysis {
            standalone_creativity_score: standalone_score,
            contextual_creativity_score: contextual_score,
            difference: round1((standalone_score - contextual_score).abs()),
            influential_categories,
            analysis,
        })
    }
}

// ─── Helpers ──────────────────────────────────────────────────────────────────

/// Build an `EvaluationResult`, degrading an absent score to the interval
/// minimum.  The degradation is diagnostic-visible but does not change the
/// result shape.
fn result_from_parse(category: &str, parsed: ParsedResponse) -> EvaluationResult {
    let score = match parsed.score {
        Some(s) => s,
        None => {
            warn!(category, "no score parsed from response — defaulting to interval minimum");
            SCORE_MIN
        }
    };
    EvaluationResult {
        category: category.to_string(),
        score,
        explanation: parsed.explanation,
    }
}

/// `- {category}: {score}/20` lines in fixed category order, excluding the
/// synthetic creativity entry.
fn category_summary(results: &EvaluationResultSet) -> String {
    categories::names()
        .iter()
        .filter_map(|name| {
            results
                .get(*name)
                .map(|r| format!("- {}: {}/20", name, r.score))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Resolve a category's score in the combined response: exact key first,
/// then fuzzy — strip the polarity suffixes the model tends to echo back,
/// compare case-insensitively, and accept substring containment in either
/// direction.
fn match_category_score(scores: &serde_json::Map<String, Value>, category: &str) -> Option<f64> {
    if let Some(v) = scores.get(category) {
        return parser::coerce_number(v);
    }

    let wanted = category.to_lowercase();
    for (key, value) in scores {
        let cleaned = key
            .replace(" (POSITIVE)", "")
            .replace(" (NEGATIVE/PENALTY)", "")
            .trim()
            .to_lowercase();
        if cleaned == wanted || wanted.contains(&cleaned) || cleaned.contains(&wanted) {
            return parser::coerce_number(value);
        }
    }
    None
}

// ─── Tests ────────────────────────────────────────────────────────────────────
