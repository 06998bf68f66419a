// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `validate` command.

use hda_config::HdaConfig;

use crate::cli::{Cli, OutputFormat, ValidateArgs};
use crate::error::{BinError, BinResult};

/// Loads and validates the configuration file, then prints a summary.
pub fn validate(cli: &Cli, args: ValidateArgs) -> BinResult<()> {
    let config_path = cli
        .config
        .as_ref()
        .ok_or_else(|| BinError::config("no configuration file given (use --config)"))?;

    if !config_path.exists() {
        return Err(BinError::Configuration(format!(
            "Configuration file not found: {}",
            config_path.display()
        )));
    }

    let config = hda_config::load_config(config_path).map_err(|e| {
        BinError::Configuration(format!("Configuration validation failed: {}", e.user_message()))
    })?;

    let warnings = collect_warnings(&config);

    match args.format {
        OutputFormat::Text => {
            println!("✓ Configuration is valid: {}", config_path.display());
            println!();
            println!("Summary:");
            println!("  Server: {}", config.server.name);
            println!(
                "  Continuation points per session: {}",
                config.server.max_continuation_points_per_session
            );
            println!("  Default archive capacity: {}", describe_capacity(config.archive.max_online_values));
            println!("  Variables: {}", config.variables.len());
            for variable in &config.variables {
                println!(
                    "    {} ({}, capacity {}, {})",
                    variable.node_id,
                    variable.effective_browse_name(),
                    describe_capacity(config.capacity_for(variable)),
                    if variable.historizing { "historizing" } else { "suspended" }
                );
            }
            println!("  Metrics: {}", if config.metrics.enabled { "enabled" } else { "disabled" });
            println!(
                "  Logging: {} ({})",
                config.logging.level.as_str(),
                config.logging.format.as_str()
            );

            if !warnings.is_empty() {
                println!();
                println!("Warnings:");
                for warning in &warnings {
                    println!("  ⚠ {}", warning);
                }
            }

            if args.show_config {
                println!();
                println!("Parsed configuration:");
                println!("{}", serde_json::to_string_pretty(&config)?);
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "valid": true,
                "config_path": config_path.display().to_string(),
                "summary": {
                    "server_name": config.server.name,
                    "max_continuation_points_per_session": config.server.max_continuation_points_per_session,
                    "max_online_values": config.archive.max_online_values,
                    "variable_count": config.variables.len(),
                    "metrics_enabled": config.metrics.enabled,
                },
                "warnings": warnings,
                "config": if args.show_config { Some(&config) } else { None },
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

/// Flags settings that are valid but probably unintended.
pub(crate) fn collect_warnings(config: &HdaConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.variables.is_empty() {
        warnings.push("No variables configured".to_string());
    }
    for variable in &config.variables {
        if config.capacity_for(variable) == 0 {
            warnings.push(format!(
                "{} keeps every value (max_online_values = 0)",
                variable.node_id
            ));
        }
    }
    if config.simulation.interval > config.simulation.period {
        warnings.push("simulation.interval is longer than simulation.period".to_string());
    }

    warnings
}

fn describe_capacity(max_online_values: usize) -> String {
    if max_online_values == 0 {
        "unbounded".to_string()
    } else {
        max_online_values.to_string()
    }
}
