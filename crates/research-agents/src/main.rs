use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use coordination::{EventBus, WorkflowController, WorkflowEvent};
use research_agents::{build_panel, build_producer, render, AgentsConfig, PROMPT_VERSION};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Markdown,
    Json,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Research query
    query: String,

    /// TOML config file (defaults to the built-in OpenRouter council)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Maximum produce/review rounds (overrides COUNCIL_MAX_ITERATIONS)
    #[arg(long)]
    max_iterations: Option<u32>,

    /// Per-reviewer timeout in seconds (overrides COUNCIL_REVIEWER_TIMEOUT_SECS)
    #[arg(long)]
    reviewer_timeout_secs: Option<f64>,

    /// Output format written to stdout
    #[arg(long, value_enum, default_value_t = OutputFormat::Markdown)]
    format: OutputFormat,
}

fn load_config(args: &Args) -> Result<AgentsConfig> {
    let mut config = match &args.config {
        Some(path) => AgentsConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => AgentsConfig::default(),
    };
    config.apply_env_overrides();
    if let Some(n) = args.max_iterations {
        config.workflow.max_iterations = n;
    }
    if let Some(secs) = args.reviewer_timeout_secs {
        config.workflow.reviewer_timeout_secs = Some(secs);
    }
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn log_event(event: &WorkflowEvent) {
    match event {
        WorkflowEvent::RunStarted {
            run_id,
            max_iterations,
            reviewers,
            ..
        } => info!(%run_id, max_iterations, reviewers, "Research started"),
        WorkflowEvent::PhaseChanged {
            iteration, to, ..
        } => info!(iteration, phase = %to, "Phase"),
        WorkflowEvent::ReviewRecorded {
            reviewer_label,
            score,
            recommendation,
            ..
        } => info!(reviewer = %reviewer_label, score, %recommendation, "Review"),
        WorkflowEvent::RoundCompleted {
            iteration,
            passing,
            accepted,
            duration_ms,
            ..
        } => info!(iteration, passing, accepted, duration_ms, "Round complete"),
        WorkflowEvent::RunFinished {
            status, iterations, ..
        } => info!(%status, iterations, "Research finished"),
        WorkflowEvent::RunFailed {
            iteration, error, ..
        } => warn!(iteration, %error, "Research failed"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("research_agents=info".parse()?)
                .add_directive("research_council=info".parse()?)
                .add_directive("coordination=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    info!(
        api_base = %config.api_base,
        researcher = %config.researcher.model,
        reviewers = config.reviewers.len(),
        prompt_version = PROMPT_VERSION,
        "Research council starting"
    );

    let api_key = config
        .resolve_api_key()
        .with_context(|| format!("Set {} to your API key", config.api_key_env))?;
    let producer = build_producer(&config, &api_key).context("Failed to build researcher")?;
    let panel = build_panel(&config, &api_key).context("Failed to build review council")?;

    let bus = EventBus::new().shared();
    let mut events = bus.subscribe();
    let progress = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    log_event(&event);
                    if event.is_terminal() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "Progress log lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let controller = WorkflowController::new(producer, panel, config.workflow.clone())
        .context("Failed to build workflow")?
        .with_event_bus(bus);

    let outcome = controller.execute(&args.query).await;
    drop(controller);
    if let Err(e) = progress.await {
        warn!("Progress task failed: {e}");
    }
    let result = outcome.context("Research workflow failed")?;

    let output = match args.format {
        OutputFormat::Text => render::to_text(&result, &config.workflow),
        OutputFormat::Markdown => render::to_markdown(&result, &config.workflow),
        OutputFormat::Json => render::to_json(&result).context("Failed to serialize result")?,
    };
    println!("{}", output);

    Ok(())
}
