// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `run` command.

use hda_config::HdaConfig;
use tracing::info;

use crate::cli::RunArgs;
use crate::error::BinResult;
use crate::runtime::RuntimeBuilder;

/// Records simulated values until a signal (or `--duration`) stops it.
pub async fn run(config: HdaConfig, args: RunArgs) -> BinResult<()> {
    info!("Starting HDA historian...");

    let runtime = RuntimeBuilder::new().config(config).build()?;
    runtime.run(args.stats_interval, args.duration).await
}
