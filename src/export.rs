//! Full-dataset evaluation and CSV result export.
//!
//! Each dataset row runs the complete pipeline — standalone creativity,
//! all-category evaluation, difference attribution — strictly sequentially,
//! and produces one flat CSV record.  Transport failures abort the export;
//! per-category parse failures degrade inside the evaluator and the export
//! continues.

use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use chrono::Local;
use tracing::info;

use crate::categories;
use crate::dataset::Dataset;
use crate::evaluator::StoryEvaluator;

// ─── Summary ──────────────────────────────────────────────────────────────────

/// What `evaluate_full_dataset` hands back to the tool caller.
#[derive(Debug)]
pub struct ExportSummary {
    pub output_file_path: PathBuf,
    pub entries_evaluated: usize,
    pub total_entries: usize,
    pub csv_content: String,
}

// ─── Export pipeline ──────────────────────────────────────────────────────────

/// Evaluate every dataset row and write the results CSV.
///
/// Costs on the order of `3N` transport calls on the batched path, up to
/// `2N + N·C` when per-row evaluations fall back to one call per category —
/// all strictly sequential.
pub async fn evaluate_full_dataset(
    evaluator: &StoryEvaluator,
    dataset: &Dataset,
    results_dir: &Path,
    output_filename: Option<String>,
) -> Result<ExportSummary> {
    ensure!(!dataset.is_empty(), "dataset is not loaded or is empty");

    let total_entries = dataset.len();
    let mut rows: Vec<Vec<String>> = Vec::with_capacity(total_entries);

    for (index, entry) in dataset.rows().iter().enumerate() {
        info!(entry = index + 1, total = total_entries, "evaluating dataset entry");

        let standalone = evaluator.evaluate_creativity(&entry.response).await?;
        let results = evaluator.evaluate_all(&entry.response).await?;
        let analysis = evaluator
            .analyze_difference(&entry.response, &standalone, &results)
            .await?;

        let mut fields = vec![index.to_string(), entry.model.clone()];
        for name in categories::names() {
            let score = results.get(name).map(|r| r.score).unwrap_or_default();
            fields.push(format!("{score:.1}"));
        }
        fields.push(format!("{:.1}", analysis.standalone_creativity_score));
        fields.push(format!("{:.1}", analysis.contextual_creativity_score));
        fields.push(format!("{:.1}", analysis.difference));
        fields.push(analysis.influential_categories.join(", "));
        rows.push(fields);
    }

    let csv_content = render_csv(&rows);

    let output_filename = output_filename.unwrap_or_else(|| {
        format!(
            "evaluation_results_full_{}_{}.csv",
            total_entries,
            Local::now().format("%Y%m%d_%H%M%S")
        )
    });
    std::fs::create_dir_all(results_dir)
        .with_context(|| format!("creating results directory {}", results_dir.display()))?;
    let output_file_path = results_dir.join(output_filename);
    std::fs::write(&output_file_path, &csv_content)
        .with_context(|| format!("writing results to {}", output_file_path.display()))?;

    info!(path = %output_file_path.display(), entries = rows.len(), "dataset evaluation exported");

    Ok(ExportSummary {
        output_file_path,
        entries_evaluated: rows.len(),
        total_entries,
        csv_content,
    })
}

// ─── CSV writer ───────────────────────────────────────────────────────────────

/// Result-file header: `index`, `model`, one `{category}_score` column per
/// category in fixed order, both creativity scores, their difference, and
/// the comma-joined influential category list.
pub fn header_fields() -> Vec<String> {
    let mut header = vec!["index".to_string(), "model".to_string()];
    header.extend(
        categories::names()
            .iter()
            .map(|name| format!("{name}_score")),
    );
    header.push("creativity_standalone_score".to_string());
    header.push("creativity_contextual_score".to_string());
    header.push("creativity_difference".to_string());
    header.push("influential_categories".to_string());
    header
}

/// Serialize header + records as CSV.
pub fn render_csv(rows: &[Vec<String>]) -> String {
    let mut out = String::new();
    let header = header_fields();
    out.push_str(
        &header
            .iter()
            .map(|f| csv_escape(f))
            .collect::<Vec<_>>()
            .join(","),
    );
    out.push('\n');
    for row in rows {
        out.push_str(&row.iter().map(|f| csv_escape(f)).collect::<Vec<_>>().join(","));
        out.push('\n');
    }
    out
}

fn csv_escape(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
