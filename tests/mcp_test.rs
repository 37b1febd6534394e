//! Protocol-level tests for the MCP stdio server.
//!
//! Tests cover:
//! 1. initialize handshake and capability advertisement
//! 2. tools/list catalogue
//! 3. tools/call routing to each tool
//! 4. JSON-RPC error code mapping
//! 5. structured error values for dataset conditions

mod common;

use std::path::PathBuf;
use std::sync::Arc;

use common::MockChatClient;
use serde_json::{json, Value};
use storyd::config::EvalConfig;
use storyd::dataset::Dataset;
use storyd::mcp::{
    handle_message, MCP_INVALID_PARAMS, MCP_METHOD_NOT_FOUND, MCP_PARSE_ERROR, PROTOCOL_VERSION,
};
use storyd::AppContext;

// ─── Helpers ──────────────────────────────────────────────────────────────────

fn test_config(results_dir: PathBuf) -> EvalConfig {
    EvalConfig {
        base_url: "http://localhost:8000/v1".to_string(),
        api_key: "EMPTY".to_string(),
        model: "test-model".to_string(),
        temperature: 0.0,
        request_timeout_secs: 5,
        dataset_path: PathBuf::from("unused.csv"),
        results_dir,
        log: "info".to_string(),
        log_format: "pretty".to_string(),
    }
}

fn make_ctx(mock: Arc<MockChatClient>, dataset: Dataset, results_dir: PathBuf) -> Arc<AppContext> {
    Arc::new(AppContext::new(test_config(results_dir), mock, dataset))
}

fn sample_dataset() -> Dataset {
    Dataset::from_csv("model,response\nalpha,first story\nbeta,second story\n").unwrap()
}

async fn call_tool(ctx: &Arc<AppContext>, name: &str, arguments: Value) -> Value {
    let frame = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "tools/call",
        "params": { "name": name, "arguments": arguments }
    })
    .to_string();
    let response = handle_message(ctx, &frame).await.expect("a response");
    assert!(response.error.is_none(), "unexpected error: {:?}", response.error);
    let text = response.result.unwrap()["content"][0]["text"]
        .as_str()
        .expect("text content block")
        .to_string();
    serde_json::from_str(&text).expect("tool result must be JSON")
}

// ─── Lifecycle ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn initialize_negotiates_tools_capability() {
    let ctx = make_ctx(
        Arc::new(MockChatClient::scripted(vec![])),
        Dataset::default(),
        PathBuf::from("."),
    );
    let frame = r#"{"jsonrpc":"2.0","id":0,"method":"initialize","params":{}}"#;
    let response = handle_message(&ctx, frame).await.unwrap();
    let result = response.result.unwrap();
    assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
    assert!(result["capabilities"]["tools"].is_object());
    assert_eq!(result["serverInfo"]["name"], "storyd");
}

#[tokio::test]
async fn initialized_notification_gets_no_response() {
    let ctx = make_ctx(
        Arc::new(MockChatClient::scripted(vec![])),
        Dataset::default(),
        PathBuf::from("."),
    );
    let frame = r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#;
    assert!(handle_message(&ctx, frame).await.is_none());
}

#[tokio::test]
async fn ping_returns_empty_object() {
    let ctx = make_ctx(
        Arc::new(MockChatClient::scripted(vec![])),
        Dataset::default(),
        PathBuf::from("."),
    );
    let frame = r#"{"jsonrpc":"2.0","id":7,"method":"ping"}"#;
    let response = handle_message(&ctx, frame).await.unwrap();
    assert_eq!(response.result.unwrap(), json!({}));
}

// ─── tools/list ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn tools_list_exposes_the_six_tools() {
    let ctx = make_ctx(
        Arc::new(MockChatClient::scripted(vec![])),
        Dataset::default(),
        PathBuf::from("."),
    );
    let frame = r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#;
    let response = handle_message(&ctx, frame).await.unwrap();
    let tools = response.result.unwrap()["tools"].as_array().unwrap().len();
    assert_eq!(tools, 6);
}

// ─── tools/call ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn list_categories_returns_the_fixed_vocabulary() {
    let ctx = make_ctx(
        Arc::new(MockChatClient::scripted(vec![])),
        Dataset::default(),
        PathBuf::from("."),
    );
    let result = call_tool(&ctx, "list_categories", json!({})).await;
    let names = result.as_array().unwrap();
    assert_eq!(names.len(), storyd::categories::names().len());
    assert_eq!(names[0], "Adherence to Instructions");
}

#[tokio::test]
async fn evaluate_returns_one_entry_per_category_plus_creativity() {
    let mock = Arc::new(
        MockChatClient::scripted(vec![r#"{"scores": {"Coherent": 14.0}}"#])
            .with_fallback(r#"{"score": 9.5}"#),
    );
    let ctx = make_ctx(mock, Dataset::default(), PathBuf::from("."));
    let result = call_tool(&ctx, "evaluate", json!({"story": "once upon a time"})).await;

    let map = result.as_object().unwrap();
    assert_eq!(map.len(), storyd::categories::names().len() + 1);
    assert_eq!(map["Coherent"]["score"], 14.0);
    assert_eq!(map["Creativity"]["score"], 9.5);
    assert_eq!(map["Coherent"]["category"], "Coherent");
}

#[tokio::test]
async fn evaluate_creativity_returns_a_single_result() {
    let mock = Arc::new(MockChatClient::scripted(vec![
        r#"{"score": 17.5, "explanation": "inventive"}"#,
    ]));
    let ctx = make_ctx(mock, Dataset::default(), PathBuf::from("."));
    let result = call_tool(&ctx, "evaluate_creativity", json!({"story": "s"})).await;
    assert_eq!(result["category"], "Creativity");
    assert_eq!(result["score"], 17.5);
    assert_eq!(result["explanation"], "inventive");
}

#[tokio::test]
async fn compare_creativity_bundles_both_scores_and_the_analysis() {
    // standalone, batch, contextual creativity, attribution.
    let mock = Arc::new(MockChatClient::scripted(vec![
        r#"{"score": 10.0}"#,
        r#"{"scores": {"Coherent": 12.0}}"#,
        r#"{"score": 16.0}"#,
        r#"{"influential_categories": ["Coherent"]}"#,
    ]));
    let ctx = make_ctx(mock.clone(), Dataset::default(), PathBuf::from("."));
    let result = call_tool(&ctx, "compare_creativity", json!({"story": "s"})).await;

    assert_eq!(mock.calls(), 4);
    assert_eq!(result["standalone_creativity"]["score"], 10.0);
    assert_eq!(result["contextual_creativity"]["score"], 16.0);
    assert_eq!(result["difference_analysis"]["difference"], 6.0);
    assert_eq!(
        result["difference_analysis"]["influential_categories"],
        json!(["Coherent"])
    );
    assert!(result["all_categories"].as_object().unwrap().contains_key("Coherent"));
}

// ─── Dataset tools ────────────────────────────────────────────────────────────

#[tokio::test]
async fn read_dataset_row_returns_the_entry() {
    let ctx = make_ctx(
        Arc::new(MockChatClient::scripted(vec![])),
        sample_dataset(),
        PathBuf::from("."),
    );
    let result = call_tool(&ctx, "read_dataset_row", json!({"index": 1})).await;
    assert_eq!(result["index"], 1);
    assert_eq!(result["model"], "beta");
    assert_eq!(result["response"], "second story");
    assert_eq!(result["total_entries"], 2);
}

#[tokio::test]
async fn read_dataset_row_one_past_last_is_out_of_range() {
    let ctx = make_ctx(
        Arc::new(MockChatClient::scripted(vec![])),
        sample_dataset(),
        PathBuf::from("."),
    );
    let result = call_tool(&ctx, "read_dataset_row", json!({"index": 2})).await;
    let message = result["error"].as_str().unwrap();
    assert!(message.contains("out of range"), "{message}");
}

#[tokio::test]
async fn dataset_tools_report_not_loaded_when_empty() {
    let mock = Arc::new(MockChatClient::scripted(vec![]));
    let ctx = make_ctx(mock.clone(), Dataset::default(), PathBuf::from("."));

    let read = call_tool(&ctx, "read_dataset_row", json!({"index": 0})).await;
    assert!(read["error"].as_str().unwrap().contains("not loaded"));

    let export = call_tool(&ctx, "evaluate_full_dataset", json!({})).await;
    assert!(export["error"].as_str().unwrap().contains("not loaded"));
    assert_eq!(mock.calls(), 0, "empty dataset must issue zero transport calls");
}

#[tokio::test]
async fn evaluate_full_dataset_writes_and_reports_the_csv() {
    let per_row = [
        r#"{"score": 12.0}"#,
        r#"{"scores": {"Coherent": 16.5}}"#,
        r#"{"score": 12.0}"#,
    ];
    // Difference is 0.0 — the attribution call short-circuits, so 3 calls/row.
    let mut script: Vec<&str> = Vec::new();
    script.extend(per_row);
    script.extend(per_row);
    let mock = Arc::new(MockChatClient::scripted(script));

    let dir = tempfile::tempdir().unwrap();
    let ctx = make_ctx(mock.clone(), sample_dataset(), dir.path().to_path_buf());
    let result = call_tool(
        &ctx,
        "evaluate_full_dataset",
        json!({"output_filename": "run.csv"}),
    )
    .await;

    assert_eq!(mock.calls(), 6);
    assert_eq!(result["entries_evaluated"], 2);
    assert_eq!(result["total_entries"], 2);
    let path = PathBuf::from(result["output_file_path"].as_str().unwrap());
    assert_eq!(path, dir.path().join("run.csv"));
    let written = std::fs::read_to_string(&path).unwrap();
    assert_eq!(written, result["csv_content"].as_str().unwrap());
}

// ─── Error mapping ────────────────────────────────────────────────────────────

#[tokio::test]
async fn malformed_frame_is_a_parse_error() {
    let ctx = make_ctx(
        Arc::new(MockChatClient::scripted(vec![])),
        Dataset::default(),
        PathBuf::from("."),
    );
    let response = handle_message(&ctx, "{not json").await.unwrap();
    assert_eq!(response.error.unwrap().code, MCP_PARSE_ERROR);
}

#[tokio::test]
async fn unknown_method_with_id_is_method_not_found() {
    let ctx = make_ctx(
        Arc::new(MockChatClient::scripted(vec![])),
        Dataset::default(),
        PathBuf::from("."),
    );
    let frame = r#"{"jsonrpc":"2.0","id":3,"method":"resources/list"}"#;
    let response = handle_message(&ctx, frame).await.unwrap();
    assert_eq!(response.error.unwrap().code, MCP_METHOD_NOT_FOUND);
}

#[tokio::test]
async fn unknown_tool_is_invalid_params() {
    let ctx = make_ctx(
        Arc::new(MockChatClient::scripted(vec![])),
        Dataset::default(),
        PathBuf::from("."),
    );
    let frame = r#"{"jsonrpc":"2.0","id":4,"method":"tools/call","params":{"name":"no_such_tool","arguments":{}}}"#;
    let response = handle_message(&ctx, frame).await.unwrap();
    assert_eq!(response.error.unwrap().code, MCP_INVALID_PARAMS);
}

#[tokio::test]
async fn missing_story_param_is_invalid_params() {
    let ctx = make_ctx(
        Arc::new(MockChatClient::scripted(vec![])),
        Dataset::default(),
        PathBuf::from("."),
    );
    let frame =
        r#"{"jsonrpc":"2.0","id":5,"method":"tools/call","params":{"name":"evaluate","arguments":{}}}"#;
    let response = handle_message(&ctx, frame).await.unwrap();
    let error = response.error.unwrap();
    assert_eq!(error.code, MCP_INVALID_PARAMS);
    assert!(error.message.contains("story"));
}
