//! storyd — literary story evaluation daemon.
//!
//! A thin orchestration layer over a remote OpenAI-compatible completion
//! endpoint: stories are scored along a fixed literary category list, the
//! model's free-form replies are parsed into bounded numeric scores, and the
//! aggregated results are exposed as MCP tools and a CSV export.

pub mod categories;
pub mod client;
pub mod config;
pub mod dataset;
pub mod evaluator;
pub mod export;
pub mod mcp;
pub mod parser;
pub mod prompts;

use std::sync::Arc;

use client::ChatClient;
use config::EvalConfig;
use dataset::Dataset;
use evaluator::StoryEvaluator;

/// Shared application state passed to every tool handler.
///
/// Everything in here is immutable after startup: endpoint configuration is
/// fixed at construction and the dataset is an explicitly loaded, read-only
/// handle — no hidden process-wide mutable state.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<EvalConfig>,
    pub evaluator: Arc<StoryEvaluator>,
    pub dataset: Arc<Dataset>,
}

impl AppContext {
    pub fn new(config: EvalConfig, client: Arc<dyn ChatClient>, dataset: Dataset) -> Self {
        Self {
            config: Arc::new(config),
            evaluator: Arc::new(StoryEvaluator::new(client)),
            dataset: Arc::new(dataset),
        }
    }
}
