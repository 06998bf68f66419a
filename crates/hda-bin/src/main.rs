// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! HDA - OPC UA historical data access
//!
//! Main binary entry point.

use hda_bin::cli::Cli;
use hda_bin::commands::execute;
use hda_bin::error::report_error_and_exit;

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();

    if let Err(error) = execute(cli).await {
        report_error_and_exit(error);
    }
}
