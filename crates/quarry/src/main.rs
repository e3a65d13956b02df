//! Quarry CLI binary.
//!
//! This binary provides command-line access to the Quarry pipeline:
//! - Answer analytic requests on a backend, optionally exporting the result
//! - Preview samples and estimate cost
//! - Run request files in batch

use clap::Parser;

mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use cli::{
        Cli, Commands, build_agent, handle_batch, handle_engines, handle_estimate, handle_preview,
        handle_query, handle_status,
    };

    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    // Initialize tracing
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    #[cfg(feature = "observability")]
    quarry::observability::init_observability_with_config(
        quarry::observability::ObservabilityConfig::default()
            .with_log_level(log_level.as_str().to_lowercase()),
    )?;

    #[cfg(not(feature = "observability"))]
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Listing engines and checking status never consult the language model
    let offline = cli.offline || matches!(cli.command, Commands::Engines | Commands::Status);
    let agent = build_agent(cli.config.as_deref(), cli.engine.map(Into::into), offline)?;

    // Execute the requested command
    match cli.command {
        Commands::Query {
            text,
            format,
            output,
            page,
            page_size,
        } => {
            handle_query(&agent, &text, format.map(Into::into), output, page, page_size).await?;
        }

        Commands::Preview { text, sample_size } => {
            handle_preview(&agent, &text, sample_size).await?;
        }

        Commands::Estimate { text } => {
            handle_estimate(&agent, &text).await?;
        }

        Commands::Batch { file, format } => {
            handle_batch(&agent, &file, format.map(Into::into)).await?;
        }

        Commands::Engines => {
            handle_engines(&agent)?;
        }

        Commands::Status => {
            handle_status(&agent).await?;
        }
    }

    Ok(())
}
