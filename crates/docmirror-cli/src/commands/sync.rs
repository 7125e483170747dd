//! Sync command - Mirror the source tree into the destination bucket
//!
//! Provides the `docmirror sync` CLI command which:
//! 1. Loads configuration and applies command-line overrides
//! 2. Creates the WorkDocs source and S3 destination adapters
//! 3. Runs one reconciliation pass, cancelling it on Ctrl+C / SIGTERM
//! 4. Displays the run summary and fails if the run did not complete

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use docmirror_core::config::{Config, ConfigBuilder};
use docmirror_core::domain::newtypes::FolderId;
use docmirror_sync::path::PathMapper;
use docmirror_sync::retry::RetryPolicy;
use docmirror_sync::{EngineOptions, ReconciliationEngine, RunSummary};

use super::config::report_validation;
use super::ConfigSource;
use crate::output::{get_formatter, plural, OutputFormat, OutputFormatter};

/// Sync command with clap options
#[derive(Debug, Args)]
pub struct SyncCommand {
    /// Source folder to mirror (overrides source.root_folder_id)
    #[arg(long)]
    pub root_folder_id: Option<String>,

    /// Destination bucket (overrides destination.bucket)
    #[arg(long)]
    pub bucket: Option<String>,

    /// Destination key prefix (overrides destination.prefix)
    #[arg(long)]
    pub prefix: Option<String>,

    /// AWS region (overrides aws.region)
    #[arg(long)]
    pub region: Option<String>,

    /// S3-compatible endpoint URL (overrides aws.endpoint_url)
    #[arg(long)]
    pub endpoint_url: Option<String>,

    /// Maximum concurrent transfers (overrides transfer.max_workers)
    #[arg(long)]
    pub max_workers: Option<usize>,

    /// HTTP connection pool size (overrides transfer.max_pool_connections)
    #[arg(long)]
    pub max_pool_connections: Option<usize>,

    /// Show what would be done without making changes
    #[arg(long)]
    pub dry_run: bool,
}

impl SyncCommand {
    /// Apply command-line overrides on top of the loaded configuration
    pub fn apply_overrides(&self, config: Config) -> Config {
        let mut builder = ConfigBuilder::from_config(config);
        if let Some(id) = &self.root_folder_id {
            builder = builder.root_folder_id(id);
        }
        if let Some(bucket) = &self.bucket {
            builder = builder.bucket(bucket);
        }
        if let Some(prefix) = &self.prefix {
            builder = builder.prefix(prefix);
        }
        if let Some(region) = &self.region {
            builder = builder.region(region);
        }
        if let Some(endpoint) = &self.endpoint_url {
            builder = builder.endpoint_url(endpoint);
        }
        if let Some(n) = self.max_workers {
            builder = builder.max_workers(n);
        }
        if let Some(n) = self.max_pool_connections {
            builder = builder.max_pool_connections(n);
        }
        builder.build()
    }

    /// Execute the sync command
    pub async fn execute(&self, format: OutputFormat, quiet: bool, source: &ConfigSource) -> Result<()> {
        let formatter = get_formatter(format, quiet);

        // Step 1: Load config and apply overrides
        let config = self.apply_overrides(source.load()?);
        info!(config_path = %source.path.display(), "Loaded configuration");

        let errors = config.validate_for_run();
        if !errors.is_empty() {
            report_validation(&errors, &source.path.display().to_string(), format, quiet);
            anyhow::bail!("configuration is invalid");
        }

        let root = FolderId::new(config.source.root_folder_id.clone().unwrap_or_default())?;

        // Step 2: Create adapters
        let (workdocs, s3) = docmirror_aws::client::connect(&config).await?;

        // Step 3: Build the engine
        let options = EngineOptions {
            root_folder_id: root,
            max_workers: config.transfer.max_workers,
            retry: RetryPolicy::new(
                config.transfer.fetch_retry_attempts,
                Duration::from_millis(config.transfer.fetch_retry_base_delay_ms),
            ),
            dry_run: self.dry_run,
        };
        let engine = ReconciliationEngine::new(
            Arc::new(workdocs),
            Arc::new(s3),
            PathMapper::new(&config.destination.prefix),
            options,
        );

        if self.dry_run {
            formatter.info("Dry run mode - no changes will be made");
        }
        formatter.info(&format!(
            "Mirroring folder into s3://{}/{}",
            config.destination.bucket.as_deref().unwrap_or_default(),
            engine.mapper().prefix()
        ));

        // Step 4: Run, cancelling on shutdown signals
        let signal = tokio::spawn(shutdown_signal(engine.cancellation_token()));
        let result = engine.sync().await;
        signal.abort();

        let summary = result?;

        // Step 5: Display results
        print_summary(&summary, format, formatter.as_ref())?;

        if summary.is_success() {
            Ok(())
        } else {
            anyhow::bail!(
                "run {} failed: {}",
                summary.run_id,
                summary.fatal_error.as_deref().unwrap_or("unknown error")
            )
        }
    }
}

fn print_summary(
    summary: &RunSummary,
    format: OutputFormat,
    formatter: &dyn OutputFormatter,
) -> Result<()> {
    if matches!(format, OutputFormat::Json) {
        formatter.print_json(&serde_json::to_value(summary)?);
        return Ok(());
    }

    let duration_display = if summary.duration_ms >= 1000 {
        format!("{:.1}s", summary.duration_ms as f64 / 1000.0)
    } else {
        format!("{}ms", summary.duration_ms)
    };

    let changes = summary.files_transferred() + summary.objects_deleted;
    if !summary.is_success() {
        formatter.error(&format!("Run failed after {duration_display}"));
    } else if changes == 0 && summary.errors.is_empty() {
        formatter.success("Already up to date");
    } else if summary.dry_run {
        formatter.success(&format!("Dry run completed in {duration_display}"));
    } else {
        formatter.success(&format!("Sync completed in {duration_display}"));
    }

    let verb = |done: &str, planned: &str| {
        if summary.dry_run {
            planned.to_string()
        } else {
            done.to_string()
        }
    };

    if summary.files_created > 0 {
        formatter.info(&format!(
            "{:<12}{} file{}",
            verb("Created:", "To create:"),
            summary.files_created,
            plural(summary.files_created)
        ));
    }
    if summary.files_updated > 0 {
        formatter.info(&format!(
            "{:<12}{} file{}",
            verb("Updated:", "To update:"),
            summary.files_updated,
            plural(summary.files_updated)
        ));
    }
    if summary.objects_deleted > 0 {
        formatter.info(&format!(
            "{:<12}{} object{}",
            verb("Deleted:", "To delete:"),
            summary.objects_deleted,
            plural(summary.objects_deleted)
        ));
    }
    formatter.info(&format!(
        "{:<12}{} file{}",
        "Unchanged:",
        summary.files_skipped,
        plural(summary.files_skipped)
    ));
    formatter.info(&format!(
        "{:<12}{} folder{}",
        "Folders:",
        summary.folders_ensured,
        plural(summary.folders_ensured)
    ));

    if let Some(fatal) = &summary.fatal_error {
        formatter.error(fatal);
    }

    if !summary.errors.is_empty() {
        formatter.warn(&format!(
            "{} error{} occurred:",
            summary.errors.len(),
            plural(summary.errors.len() as u64)
        ));
        for error in &summary.errors {
            formatter.warn(error);
        }
    }

    Ok(())
}

/// Cancel `token` on SIGINT or SIGTERM
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), stopping after in-flight transfers");
        }
        _ = terminate => {
            info!("Received SIGTERM, stopping after in-flight transfers");
        }
    }

    token.cancel();
}
