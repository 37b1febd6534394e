//! MCP `tools/call` dispatcher — routes tool invocations to the evaluator,
//! dataset, and exporter.
//!
//! Caller mistakes (unknown tool, missing params) are errors whose message
//! encodes a MCP error code prefix (e.g. `"MCP_INVALID_PARAMS: ..."`) so the
//! server loop can map them; domain conditions (empty dataset, index out of
//! range) are structured `{"error": ...}` values in the tool result.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::info;

use crate::categories;
use crate::export;
use crate::AppContext;

use super::tools as tool_list;

pub struct McpDispatcher {
    ctx: Arc<AppContext>,
}

impl McpDispatcher {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        Self { ctx }
    }

    /// Dispatch a `tools/call` invocation.
    ///
    /// Returns `Ok(Value)` with the tool result, or `Err(anyhow::Error)`
    /// whose message may carry a `"MCP_INVALID_PARAMS: ..."` prefix for
    /// caller mistakes; anything else maps to an internal error (this is
    /// where a fatal `TransportError` surfaces).
    pub async fn dispatch(&self, tool_name: &str, arguments: Value) -> anyhow::Result<Value> {
        let known = tool_list::storyd_tools()
            .into_iter()
            .any(|t| t.name == tool_name);
        if !known {
            return Err(anyhow::anyhow!("MCP_INVALID_PARAMS: unknown tool: {tool_name}"));
        }

        info!(tool = tool_name, "tool called");

        let result = match tool_name {
            "list_categories" => json!(categories::names()),
            "evaluate" => {
                let story = required_str(&arguments, "story")?;
                let results = self.ctx.evaluator.evaluate_all(story).await?;
                serde_json::to_value(&results)?
            }
            "evaluate_creativity" => {
                let story = required_str(&arguments, "story")?;
                let result = self.ctx.evaluator.evaluate_creativity(story).await?;
                serde_json::to_value(&result)?
            }
            "compare_creativity" => {
                let story = required_str(&arguments, "story")?;
                let standalone = self.ctx.evaluator.evaluate_creativity(story).await?;
                let all_categories = self.ctx.evaluator.evaluate_all(story).await?;
                let analysis = self
                    .ctx
                    .evaluator
                    .analyze_difference(story, &standalone, &all_categories)
                    .await?;
                let contextual = all_categories
                    .get(categories::CREATIVITY)
                    .cloned()
                    .unwrap_or_else(|| standalone.clone());
                json!({
                    "standalone_creativity": standalone,
                    "contextual_creativity": contextual,
                    "all_categories": all_categories,
                    "difference_analysis": analysis,
                })
            }
            "read_dataset_row" => self.read_dataset_row(&arguments)?,
            "evaluate_full_dataset" => {
                let output_filename = arguments
                    .get("output_filename")
                    .and_then(Value::as_str)
                    .map(str::to_string);
                if self.ctx.dataset.is_empty() {
                    json!({ "error": "Dataset is not loaded or is empty" })
                } else {
                    let summary = export::evaluate_full_dataset(
                        &self.ctx.evaluator,
                        &self.ctx.dataset,
                        &self.ctx.config.results_dir,
                        output_filename,
                    )
                    .await?;
                    json!({
                        "output_file_path": summary.output_file_path.display().to_string(),
                        "entries_evaluated": summary.entries_evaluated,
                        "total_entries": summary.total_entries,
                        "csv_content": summary.csv_content,
                    })
                }
            }
            other => {
                // Should not reach here — already checked above.
                return Err(anyhow::anyhow!("MCP_INVALID_PARAMS: unknown tool: {other}"));
            }
        };

        Ok(result)
    }

    fn read_dataset_row(&self, arguments: &Value) -> anyhow::Result<Value> {
        let index = arguments
            .get("index")
            .and_then(Value::as_u64)
            .ok_or_else(|| {
                anyhow::anyhow!("MCP_INVALID_PARAMS: missing or non-integer field 'index'")
            })? as usize;

        let dataset = &self.ctx.dataset;
        if dataset.is_empty() {
            return Ok(json!({ "error": "Dataset is not loaded or is empty" }));
        }
        match dataset.row(index) {
            Some(row) => Ok(json!({
                "index": index,
                "model": row.model,
                "response": row.response,
                "total_entries": dataset.len(),
            })),
            None => Ok(json!({
                "error": format!(
                    "Index {index} out of range. Dataset has {} entries (valid range: 0-{}).",
                    dataset.len(),
                    dataset.len() - 1
                )
            })),
        }
    }
}

fn required_str<'a>(arguments: &'a Value, field: &str) -> anyhow::Result<&'a str> {
    arguments
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow::anyhow!("MCP_INVALID_PARAMS: missing required field '{field}'"))
}
