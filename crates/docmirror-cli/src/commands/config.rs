//! Config command - View and validate DocMirror configuration
//!
//! Provides the `docmirror config` CLI command which:
//! 1. Shows the effective configuration (YAML or JSON)
//! 2. Validates the configuration file and reports errors
//! 3. Prints the configuration file path

use anyhow::{Context, Result};
use clap::Subcommand;
use tracing::info;

use docmirror_core::config::ValidationError;

use super::ConfigSource;
use crate::output::{get_formatter, plural, OutputFormat};

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display current configuration
    Show,
    /// Validate configuration file
    Validate {
        /// Also require the fields a sync run needs (root folder, bucket)
        #[arg(long)]
        for_run: bool,
    },
    /// Print the configuration file path
    Path,
}

impl ConfigCommand {
    /// Execute the config command
    pub async fn execute(&self, format: OutputFormat, quiet: bool, source: &ConfigSource) -> Result<()> {
        match self {
            ConfigCommand::Show => execute_show(format, quiet, source),
            ConfigCommand::Validate { for_run } => execute_validate(*for_run, format, quiet, source),
            ConfigCommand::Path => execute_path(format, quiet, source),
        }
    }
}

fn execute_show(format: OutputFormat, quiet: bool, source: &ConfigSource) -> Result<()> {
    let formatter = get_formatter(format, quiet);
    let config = source.load()?;

    info!(config_path = %source.path.display(), "Showing configuration");

    if matches!(format, OutputFormat::Json) {
        let json =
            serde_json::to_value(&config).context("Failed to serialize configuration to JSON")?;
        formatter.print_json(&json);
    } else {
        formatter.success(&format!("Configuration ({})", source.path.display()));
        formatter.info("");

        let yaml =
            serde_yaml::to_string(&config).context("Failed to serialize configuration to YAML")?;
        for line in yaml.lines() {
            formatter.info(line);
        }
    }

    Ok(())
}

fn execute_validate(
    for_run: bool,
    format: OutputFormat,
    quiet: bool,
    source: &ConfigSource,
) -> Result<()> {
    let formatter = get_formatter(format, quiet);
    let path = source.path.display().to_string();

    let config = match source.load() {
        Ok(config) => config,
        Err(e) => {
            if matches!(format, OutputFormat::Json) {
                formatter.print_json(&serde_json::json!({
                    "valid": false,
                    "config_path": path,
                    "errors": [format!("{e:#}")],
                }));
            } else {
                formatter.error(&format!("{e:#}"));
            }
            anyhow::bail!("configuration could not be loaded");
        }
    };

    if !source.path.exists() {
        formatter.info(&format!("Configuration file not found at {path}; checking defaults"));
    }

    info!(config_path = %path, for_run, "Validating configuration");

    let errors = if for_run {
        config.validate_for_run()
    } else {
        config.validate()
    };

    report_validation(&errors, &path, format, quiet);

    if errors.is_empty() {
        Ok(())
    } else {
        anyhow::bail!("configuration is invalid")
    }
}

fn execute_path(format: OutputFormat, quiet: bool, source: &ConfigSource) -> Result<()> {
    let formatter = get_formatter(format, quiet);
    let path = source.path.display().to_string();

    if matches!(format, OutputFormat::Json) {
        formatter.print_json(&serde_json::json!({
            "config_path": path,
            "exists": source.path.exists(),
        }));
    } else {
        // Printed even with --quiet so the path can be captured by scripts
        println!("{path}");
    }
    Ok(())
}

/// Print validation results in the selected format
pub(crate) fn report_validation(
    errors: &[ValidationError],
    path: &str,
    format: OutputFormat,
    quiet: bool,
) {
    let formatter = get_formatter(format, quiet);

    if matches!(format, OutputFormat::Json) {
        let error_strings: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        formatter.print_json(&serde_json::json!({
            "valid": errors.is_empty(),
            "config_path": path,
            "errors": error_strings,
        }));
    } else if errors.is_empty() {
        formatter.success("Configuration is valid");
        formatter.info(&format!("File: {path}"));
    } else {
        formatter.error(&format!(
            "Configuration has {} error{}:",
            errors.len(),
            plural(errors.len() as u64)
        ));
        formatter.info(&format!("File: {path}"));
        formatter.info("");
        for error in errors {
            // Errors must be visible under --quiet as well
            eprintln!("  {} - {}", error.field, error.message);
        }
    }
}
