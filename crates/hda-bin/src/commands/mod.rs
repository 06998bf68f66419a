// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! CLI command implementations.
//!
//! - `run`: Record simulated values until interrupted
//! - `read`: Record samples and page through them with HistoryRead
//! - `validate`: Validate configuration file
//! - `version`: Show version information

mod read;
mod run;
mod validate;
mod version;

pub use read::{read, read_pages};
pub use run::run;
pub use validate::validate;
pub use version::version;

use hda_config::{load_config, HdaConfig};

use crate::cli::{Cli, Commands};
use crate::error::{BinError, BinResult};
use crate::logging::init_logging;

/// Executes the appropriate command based on CLI arguments.
///
/// Logging is initialized here, after the configuration for commands that
/// need one, so the config file's `logging` section applies.
pub async fn execute(cli: Cli) -> BinResult<()> {
    match cli.effective_command() {
        Commands::Run(args) => {
            let config = load_cli_config(&cli)?;
            start_logging(&cli, &config);
            run::run(config, args).await
        }
        Commands::Read(args) => {
            let config = load_cli_config(&cli)?;
            start_logging(&cli, &config);
            read::read(config, args)
        }
        Commands::Validate(args) => {
            init_logging(cli.effective_log_level("warn"), cli.effective_log_format(Default::default()));
            validate::validate(&cli, args)
        }
        Commands::Version => version::version(&cli),
    }
}

/// Loads the `--config` file, or the built-in defaults when none is given.
pub fn load_cli_config(cli: &Cli) -> BinResult<HdaConfig> {
    match &cli.config {
        Some(path) => load_config(path)
            .map_err(|e| BinError::from(e).with_context(format!("loading {}", path.display()))),
        None => Ok(HdaConfig::default()),
    }
}

fn start_logging(cli: &Cli, config: &HdaConfig) {
    let level = cli.effective_log_level(config.logging.level.as_str());
    init_logging(level, cli.effective_log_format(config.logging.format));
}
