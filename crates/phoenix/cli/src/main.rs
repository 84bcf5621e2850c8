//! Phoenix - self-improving service runtime
//!
//! Loads a specification, runs the improvement pipeline against it and exits
//! with the state of the active implementation:
//! - 0: an implementation is serving
//! - 1: the run failed (e.g. invalid specification)
//! - 2: configuration error

use anyhow::Context;
use clap::Parser;
use phoenix_kernel::{Kernel, KernelConfig, LoggingConfig, RunOutcome};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Phoenix CLI
#[derive(Parser, Debug)]
#[command(name = "phoenix")]
#[command(about = "Phoenix - self-improving service runtime", long_about = None)]
#[command(version)]
struct Cli {
    /// Specification document (JSON)
    spec: PathBuf,

    /// Configuration file path
    #[arg(short, long, env = "PHOENIX_CONFIG")]
    config: Option<PathBuf>,

    /// Registry file, overrides kernel.registry_path
    #[arg(short, long, env = "PHOENIX_REGISTRY")]
    registry: Option<PathBuf>,

    /// Log level, overrides logging.level
    #[arg(long, env = "PHOENIX_LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, env = "PHOENIX_LOG_JSON")]
    json: bool,
}

const EXIT_RUN_FAILED: u8 = 1;
const EXIT_CONFIG: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("phoenix: {e:#}");
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    init_tracing(&config.logging);

    match run(config, &cli.spec).await {
        Ok(outcome) => {
            report(&outcome);
            if outcome.succeeded() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(EXIT_RUN_FAILED)
            }
        }
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "run failed");
            ExitCode::from(EXIT_RUN_FAILED)
        }
    }
}

/// Layered config with command-line overrides applied last.
fn load_config(cli: &Cli) -> anyhow::Result<KernelConfig> {
    let mut config =
        KernelConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(registry) = &cli.registry {
        config.kernel.registry_path = registry.clone();
    }
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    config.logging.json |= cli.json;
    Ok(config)
}

fn init_tracing(logging: &LoggingConfig) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| logging.level.clone().into());

    if logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn run(config: KernelConfig, spec: &Path) -> anyhow::Result<RunOutcome> {
    let mut kernel = Kernel::new(config).context("failed to build kernel")?;
    let outcome = kernel
        .run(spec)
        .await
        .with_context(|| format!("run aborted for {}", spec.display()))?;
    let metrics = kernel.metrics();
    tracing::info!(
        iterations = metrics.iterations,
        accepted = metrics.accepted,
        rejected = metrics.rejected,
        rollbacks = metrics.rollbacks,
        fallbacks = metrics.generation_fallbacks,
        "run complete"
    );
    Ok(outcome)
}

fn report(outcome: &RunOutcome) {
    for it in &outcome.iterations {
        match &it.failed_stage {
            None => println!("iteration {}: {} {}", it.iteration, it.version_id, it.decision),
            Some(stage) => println!(
                "iteration {}: {} {} at {stage}: {}",
                it.iteration,
                it.version_id,
                it.decision,
                it.error.as_deref().unwrap_or("")
            ),
        }
    }
    println!("active: {}", outcome.active_version);
}
