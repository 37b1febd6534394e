use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use storyd::client::HttpChatClient;
use storyd::config::EvalConfig;
use storyd::dataset::Dataset;
use storyd::{categories, export, mcp, AppContext};
use tracing::info;

#[derive(Parser)]
#[command(
    name = "storyd",
    about = "storyd — literary story evaluation MCP daemon",
    version
)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Base URL of the OpenAI-compatible completion endpoint
    #[arg(long, env = "STORYD_BASE_URL")]
    base_url: Option<String>,

    /// Bearer credential for the endpoint ("EMPTY" works for vLLM)
    #[arg(long, env = "STORYD_API_KEY")]
    api_key: Option<String>,

    /// Model identifier passed on every completion request
    #[arg(long, env = "STORYD_MODEL")]
    model: Option<String>,

    /// Sampling temperature
    #[arg(long, env = "STORYD_TEMPERATURE")]
    temperature: Option<f64>,

    /// Directory holding config.toml (default: current directory)
    #[arg(long, env = "STORYD_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Dataset CSV with `model` and `response` columns
    #[arg(long, env = "STORYD_DATASET")]
    dataset: Option<PathBuf>,

    /// Directory result CSVs are written to
    #[arg(long, env = "STORYD_RESULTS_DIR")]
    results_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "STORYD_LOG")]
    log: Option<String>,

    /// Log output format: "pretty" (default) | "json"
    #[arg(long, env = "STORYD_LOG_FORMAT")]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the MCP server on stdio (default when no subcommand given).
    ///
    /// Protocol frames go over stdout; logs go to stderr.
    ///
    /// Examples:
    ///   storyd serve
    ///   storyd
    Serve,
    /// Print all evaluation categories in evaluation order.
    ///
    /// Examples:
    ///   storyd categories
    Categories,
    /// Evaluate one story from a file (or stdin with "-") and print the
    /// result set as JSON.
    ///
    /// Examples:
    ///   storyd evaluate story.txt
    ///   cat story.txt | storyd evaluate -
    ///   storyd evaluate story.txt --compare
    Evaluate {
        /// Story file path, or "-" for stdin
        file: PathBuf,
        /// Also score standalone creativity and attribute the difference
        #[arg(long)]
        compare: bool,
    },
    /// Evaluate the whole dataset and write the results CSV.
    ///
    /// Examples:
    ///   storyd export-dataset
    ///   storyd export-dataset --output results.csv
    ExportDataset {
        /// Result CSV filename (default: timestamped)
        #[arg(long)]
        output: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let data_dir = args.data_dir.clone().unwrap_or_else(|| PathBuf::from("."));
    let config = EvalConfig::new(
        &data_dir,
        args.base_url,
        args.api_key,
        args.model,
        args.temperature,
        args.dataset,
        args.results_dir,
        args.log,
        args.log_format,
    );

    // stdout is the MCP wire — all diagnostics go to stderr.
    setup_logging(&config.log, &config.log_format);

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let ctx = build_context(config)?;
            mcp::serve(ctx).await
        }
        Command::Categories => {
            for name in categories::names() {
                println!("{name}");
            }
            Ok(())
        }
        Command::Evaluate { file, compare } => {
            let story = read_story(&file)?;
            let ctx = build_context(config)?;
            if compare {
                let standalone = ctx.evaluator.evaluate_creativity(&story).await?;
                let all = ctx.evaluator.evaluate_all(&story).await?;
                let analysis = ctx
                    .evaluator
                    .analyze_difference(&story, &standalone, &all)
                    .await?;
                let out = serde_json::json!({
                    "standalone_creativity": standalone,
                    "all_categories": all,
                    "difference_analysis": analysis,
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                let results = ctx.evaluator.evaluate_all(&story).await?;
                println!("{}", serde_json::to_string_pretty(&results)?);
            }
            Ok(())
        }
        Command::ExportDataset { output } => {
            let ctx = build_context(config)?;
            let summary = export::evaluate_full_dataset(
                &ctx.evaluator,
                &ctx.dataset,
                &ctx.config.results_dir,
                output,
            )
            .await?;
            info!(
                path = %summary.output_file_path.display(),
                entries = summary.entries_evaluated,
                "export finished"
            );
            println!("{}", summary.output_file_path.display());
            Ok(())
        }
    }
}

fn build_context(config: EvalConfig) -> Result<Arc<AppContext>> {
    let client = HttpChatClient::new(&config).context("building the completion client")?;
    let dataset = Dataset::load_or_empty(&config.dataset_path);
    Ok(Arc::new(AppContext::new(config, Arc::new(client), dataset)))
}

fn read_story(file: &PathBuf) -> Result<String> {
    if file.as_os_str() == "-" {
        use std::io::Read as _;
        let mut story = String::new();
        std::io::stdin()
            .read_to_string(&mut story)
            .context("reading story from stdin")?;
        Ok(story)
    } else {
        std::fs::read_to_string(file)
            .with_context(|| format!("reading story from {}", file.display()))
    }
}

fn setup_logging(log_level: &str, log_format: &str) {
    if log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(log_level)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(log_level)
            .with_writer(std::io::stderr)
            .compact()
            .init();
    }
}
