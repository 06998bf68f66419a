// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! CLI argument parsing and command definitions.
//!
//! - `run`: Serve simulated values into the archive (default)
//! - `read`: Record samples, then page through them with HistoryRead
//! - `validate`: Validate a configuration file
//! - `version`: Show version information

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

// =============================================================================
// Main CLI Structure
// =============================================================================

/// HDA - OPC UA historical data access
///
/// Keeps a bounded, time-ordered history of variable values and serves raw
/// HistoryRead requests with continuation points.
#[derive(Parser, Debug)]
#[command(
    name = "hda",
    author = "Sylvex <contact@sylvex.io>",
    version = hda_core::VERSION,
    about = "OPC UA historical data access archive",
    long_about = None,
    propagate_version = true
)]
pub struct Cli {
    /// Configuration file path (built-in defaults when omitted)
    #[arg(short, long, env = "HDA_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(short, long, env = "HDA_LOG_LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Log format; overrides the config file
    #[arg(long, env = "HDA_LOG_FORMAT", global = true)]
    pub log_format: Option<LogFormat>,

    /// Enable quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

// =============================================================================
// Subcommands
// =============================================================================

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Record simulated values until interrupted
    ///
    /// This is the default command when no subcommand is specified.
    Run(RunArgs),

    /// Record simulated samples and print them through paged HistoryRead
    Read(ReadArgs),

    /// Validate the configuration file
    Validate(ValidateArgs),

    /// Show detailed version information
    Version,
}

// =============================================================================
// Command Arguments
// =============================================================================

/// Arguments for the `run` command.
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// How often to log archive statistics
    #[arg(long, default_value = "30s", value_parser = humantime::parse_duration)]
    pub stats_interval: Duration,

    /// Stop after this long instead of waiting for a signal
    #[arg(long, value_parser = humantime::parse_duration)]
    pub duration: Option<Duration>,
}

/// Arguments for the `read` command.
#[derive(Args, Debug, Clone)]
pub struct ReadArgs {
    /// Node to read (first configured variable when omitted)
    #[arg(short, long)]
    pub node: Option<String>,

    /// Number of samples to record before reading
    #[arg(short, long, default_value = "20")]
    pub samples: usize,

    /// Values per page (NumValuesPerNode)
    #[arg(short, long, default_value = "5")]
    pub page_size: u32,

    /// Read newest first
    #[arg(short, long)]
    pub reverse: bool,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for the `validate` command.
#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    /// Show parsed configuration after validation
    #[arg(short, long)]
    pub show_config: bool,

    /// Output format for validation results
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

// =============================================================================
// Enums
// =============================================================================

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON format for structured logging
    Json,
    /// Compact format for minimal output
    Compact,
}

impl From<hda_config::LogFormat> for LogFormat {
    fn from(format: hda_config::LogFormat) -> Self {
        match format {
            hda_config::LogFormat::Text => LogFormat::Text,
            hda_config::LogFormat::Json => LogFormat::Json,
            hda_config::LogFormat::Compact => LogFormat::Compact,
        }
    }
}

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON format for programmatic parsing
    Json,
}

// =============================================================================
// Helper Methods
// =============================================================================

impl Cli {
    /// Parse CLI arguments from the command line.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective command, defaulting to `Run` if none specified.
    pub fn effective_command(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or_else(|| Commands::Run(RunArgs::default()))
    }

    /// Check if verbose logging is enabled.
    pub fn is_verbose(&self) -> bool {
        self.verbose && !self.quiet
    }

    /// Get the effective log level: flags, then `--log-level`, then `configured`.
    pub fn effective_log_level<'a>(&'a self, configured: &'a str) -> &'a str {
        if self.quiet {
            "warn"
        } else if self.verbose {
            "debug"
        } else {
            self.log_level.as_deref().unwrap_or(configured)
        }
    }

    /// Get the effective log format: `--log-format`, then `configured`.
    pub fn effective_log_format(&self, configured: hda_config::LogFormat) -> LogFormat {
        self.log_format.unwrap_or_else(|| configured.into())
    }
}

impl Default for RunArgs {
    fn default() -> Self {
        Self {
            stats_interval: Duration::from_secs(30),
            duration: None,
        }
    }
}

impl Default for ReadArgs {
    fn default() -> Self {
        Self {
            node: None,
            samples: 20,
            page_size: 5,
            reverse: false,
            format: OutputFormat::Text,
        }
    }
}

impl Default for ValidateArgs {
    fn default() -> Self {
        Self {
            show_config: false,
            format: OutputFormat::Text,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command() {
        let cli = Cli::parse_from(["hda"]);
        assert!(cli.command.is_none());
        assert!(matches!(cli.effective_command(), Commands::Run(_)));
    }

    #[test]
    fn test_run_command() {
        let cli = Cli::parse_from(["hda", "run", "--stats-interval", "5s", "--duration", "1m"]);
        match cli.command {
            Some(Commands::Run(args)) => {
                assert_eq!(args.stats_interval, Duration::from_secs(5));
                assert_eq!(args.duration, Some(Duration::from_secs(60)));
            }
            other => panic!("Expected Run command, got {other:?}"),
        }
    }

    #[test]
    fn test_read_command() {
        let cli = Cli::parse_from([
            "hda", "read", "-n", "ns=2;i=7", "-s", "12", "-p", "4", "--reverse", "-f", "json",
        ]);
        match cli.command {
            Some(Commands::Read(args)) => {
                assert_eq!(args.node.as_deref(), Some("ns=2;i=7"));
                assert_eq!(args.samples, 12);
                assert_eq!(args.page_size, 4);
                assert!(args.reverse);
                assert_eq!(args.format, OutputFormat::Json);
            }
            other => panic!("Expected Read command, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_command() {
        let cli = Cli::parse_from(["hda", "validate", "--show-config"]);
        if let Some(Commands::Validate(args)) = cli.command {
            assert!(args.show_config);
        } else {
            panic!("Expected Validate command");
        }
    }

    #[test]
    fn test_config_path() {
        let cli = Cli::parse_from(["hda", "-c", "/etc/hda/hda.yaml"]);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/hda/hda.yaml")));
    }

    #[test]
    fn test_log_level_precedence() {
        let cli = Cli::parse_from(["hda", "-l", "trace"]);
        assert_eq!(cli.effective_log_level("info"), "trace");

        let cli = Cli::parse_from(["hda", "-q"]);
        assert_eq!(cli.effective_log_level("info"), "warn");

        let cli = Cli::parse_from(["hda", "-v"]);
        assert!(cli.is_verbose());
        assert_eq!(cli.effective_log_level("info"), "debug");
    }

    #[test]
    fn test_log_format_precedence() {
        let cli = Cli::parse_from(["hda", "--log-format", "json"]);
        assert_eq!(
            cli.effective_log_format(hda_config::LogFormat::Compact),
            LogFormat::Json
        );
    }
}
