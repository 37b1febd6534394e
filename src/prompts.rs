//! Prompt templates sent to the completion endpoint.
//!
//! Every prompt instructs the model to answer in JSON; the parser still
//! tolerates prose because models do not reliably comply.

use crate::categories;

/// System prompt for single-category and creativity scoring.
pub const EVALUATION_SYSTEM_PROMPT: &str = "You are a literary critic. Always respond with JSON \
     containing the key \"score\" (a number from 0.0 to 20.0, can include one decimal place like \
     15.5) and optionally \"explanation\" (a short justification).";

/// System prompt for the combined all-category call.
pub const BATCH_SYSTEM_PROMPT: &str = "You are a literary critic. Always respond with valid JSON \
     containing a 'scores' object with category names as keys and numeric scores (0.0-20.0) as \
     values. Remember: positive metrics should have higher scores, negative/penalty metrics \
     should have lower scores.";

/// System prompt for the creativity-difference attribution call.
pub const ANALYSIS_SYSTEM_PROMPT: &str =
    "You are a literary analysis expert. Always respond with valid JSON.";

/// User prompt scoring one category in isolation.
pub fn single_category(story: &str, category: &str) -> String {
    format!(
        "Evaluate the following story focusing strictly on the category: {category}.\n\nStory:\n{story}"
    )
}

/// User prompt scoring every category in a single call.
pub fn batch(story: &str) -> String {
    let positive_list = categories::positive_names()
        .iter()
        .map(|c| format!("  - {c} (POSITIVE: higher is better)"))
        .collect::<Vec<_>>()
        .join("\n");
    let negative_list = categories::negative_names()
        .iter()
        .map(|c| format!("  - {c} (NEGATIVE/PENALTY: lower is better)"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Evaluate the following story across all these categories. For each category, provide a \
         score from 0.0 to 20.0 (can include one decimal place like 15.5).\n\n\
         POSITIVE METRICS (Higher scores are better):\n{positive_list}\n\n\
         NEGATIVE/PENALTY METRICS (Lower scores are better - score how much this problem exists):\n{negative_list}\n\n\
         For positive metrics: higher scores indicate better quality.\n\
         For negative metrics: lower scores indicate less of the problem (i.e., better quality).\n\n\
         Respond with JSON containing a 'scores' object where each key is the category name and \
         the value is the score (number 0.0-20.0).\n\
         Example format: {{\"scores\": {{\"Adherence to Instructions\": 16.5, \"Meandering\": 4.0, ...}}}}\n\n\
         Story:\n{story}"
    )
}

/// User prompt for the standalone creativity score (no category context).
pub fn standalone_creativity(story: &str) -> String {
    format!(
        "Evaluate the creativity of the following story. Consider originality, innovation, \
         unique perspectives, and imaginative elements.\n\nStory:\n{story}"
    )
}

/// User prompt for the holistic creativity score given all category results.
pub fn contextual_creativity(story: &str, category_summary: &str) -> String {
    format!(
        "Based on the following evaluation scores across all categories, what creativity score \
         (0.0-20.0, can include one decimal place) would you give this story? Consider how the \
         story demonstrates originality, innovation, unique perspectives, and imaginative \
         elements.\n\n\
         Evaluation Scores:\n{category_summary}\n\n\
         Original Story:\n{story}\n\n\
         Respond with JSON: {{\"score\": <number>}}"
    )
}

/// User prompt asking which categories explain a creativity-score divergence.
pub fn difference_attribution(
    story: &str,
    standalone_score: f64,
    contextual_score: f64,
    category_summary: &str,
) -> String {
    let positive_ref = categories::positive_names()
        .iter()
        .map(|c| format!("- {c} (POSITIVE)"))
        .collect::<Vec<_>>()
        .join("\n");
    let negative_ref = categories::negative_names()
        .iter()
        .map(|c| format!("- {c} (NEGATIVE)"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Two different creativity scores were given for the same story:\n\
         - Standalone creativity score (evaluated without category context): {standalone_score}/20\n\
         - Contextual creativity score (evaluated after seeing all category results): {contextual_score}/20\n\
         - Difference: {:.1} points\n\n\
         All category evaluation results:\n{category_summary}\n\n\
         Original Story:\n{story}\n\n\
         Available categories:\nPositive Metrics:\n{positive_ref}\n\nNegative Metrics:\n{negative_ref}\n\n\
         Please identify which specific categories influenced the change in creativity score. \
         You MUST only select from the categories listed above. Do not create new category names. \
         Respond with JSON containing: \"influential_categories\" (list of category names from \
         the available categories that most influenced the difference), and optionally \
         \"analysis\" (a short explanation).",
        (standalone_score - contextual_score).abs()
    )
}
