//! Command handlers.

use super::render::print_envelope;
use quarry::{
    Agent, BackendKind, BackendRegistry, ConfigError, NluClient, OutputFormat, QuarryConfig,
    QuarryError, QuarryErrorKind, QuarryResult, QueryOptions, export_envelope,
};
use std::error::Error;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

type CliResult = Result<(), Box<dyn Error>>;

/// Load configuration and build an agent for `engine`.
///
/// # Errors
///
/// Returns a configuration error when the configuration is malformed, the
/// language-model key is missing (unless `offline`), or the backend cannot
/// be created.
pub fn build_agent(
    config_path: Option<&Path>,
    engine: Option<BackendKind>,
    offline: bool,
) -> QuarryResult<Agent<NluClient>> {
    let config = match config_path {
        Some(path) => QuarryConfig::from_file(path)?,
        None => QuarryConfig::load()?,
    };

    let nlu = if offline {
        info!("Running offline, rule-based analysis only");
        NluClient::offline()
    } else {
        NluClient::from_config(config.nlu()).map_err(with_offline_hint)?
    };

    Agent::from_config(&config, nlu, &BackendRegistry::standard(), engine)
}

fn with_offline_hint(error: QuarryError) -> QuarryError {
    match error.kind() {
        QuarryErrorKind::Config(e) => ConfigError::new(format!(
            "{}; set the key or pass --offline for rule-based analysis",
            e.message
        ))
        .into(),
        _ => error,
    }
}

/// Handle `quarry query`.
pub async fn handle_query(
    agent: &Agent<NluClient>,
    text: &str,
    format: Option<OutputFormat>,
    output: Option<PathBuf>,
    page: Option<usize>,
    page_size: usize,
) -> CliResult {
    agent.connect().await?;

    let mut options = agent.defaults().clone().with_page_size(page_size);
    if let Some(page) = page {
        options = options.with_page(page);
    }
    let envelope = agent.query(text, format, &options).await;
    agent.disconnect().await;

    print_envelope(&envelope)?;
    if let Some(path) = output
        && *envelope.success()
    {
        export_envelope(&envelope, &path, None)?;
        info!(path = %path.display(), "Result exported");
    }
    failure_to_error(envelope.error().as_deref())
}

/// Handle `quarry preview`.
pub async fn handle_preview(agent: &Agent<NluClient>, text: &str, sample_size: u64) -> CliResult {
    agent.connect().await?;
    let envelope = agent.preview(text, sample_size).await;
    agent.disconnect().await;

    print_envelope(&envelope)?;
    failure_to_error(envelope.error().as_deref())
}

/// Handle `quarry estimate`. A backend that cannot be reached only costs the
/// row count.
pub async fn handle_estimate(agent: &Agent<NluClient>, text: &str) -> CliResult {
    if let Err(e) = agent.connect().await {
        warn!(error = %e, "Backend unreachable, estimating without a row count");
    }
    let report = agent.estimate_cost(text).await;
    agent.disconnect().await;

    println!("{}", serde_json::to_string_pretty(&report?)?);
    Ok(())
}

/// Handle `quarry batch`.
pub async fn handle_batch(
    agent: &Agent<NluClient>,
    file: &Path,
    format: Option<OutputFormat>,
) -> CliResult {
    let contents = std::fs::read_to_string(file)
        .map_err(|e| ConfigError::new(format!("Cannot read {}: {}", file.display(), e)))?;
    let requests = batch_lines(&contents);
    info!(count = requests.len(), file = %file.display(), "Running batch");

    agent.connect().await?;
    let envelopes = agent.batch_query(&requests, format).await;
    agent.disconnect().await;

    let failed = envelopes.iter().filter(|e| !*e.success()).count();
    println!("{}", serde_json::to_string_pretty(&envelopes)?);
    if failed > 0 {
        warn!(failed, total = envelopes.len(), "Some batch requests failed");
    }
    Ok(())
}

/// Handle `quarry engines`.
pub fn handle_engines(agent: &Agent<NluClient>) -> CliResult {
    for kind in agent.supported_engines() {
        let marker = if *kind == agent.kind() { "*" } else { " " };
        println!("{} {} ({})", marker, kind, kind.dialect());
    }
    Ok(())
}

/// Handle `quarry status`.
pub async fn handle_status(agent: &Agent<NluClient>) -> CliResult {
    if let Err(e) = agent.connect().await {
        warn!(error = %e, "Backend unreachable");
    }
    let status = agent.status().await;
    agent.disconnect().await;

    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}

/// Requests in a batch file: trimmed, without blanks or `#` comments.
fn batch_lines(contents: &str) -> Vec<&str> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .collect()
}

fn failure_to_error(error: Option<&str>) -> CliResult {
    match error {
        Some(message) => Err(format!("Request failed: {}", message).into()),
        None => Ok(()),
    }
}
