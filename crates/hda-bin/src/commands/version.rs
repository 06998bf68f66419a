// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `version` command.

use crate::cli::Cli;
use crate::error::BinResult;

/// Displays version information.
pub fn version(_cli: &Cli) -> BinResult<()> {
    println!("HDA - OPC UA historical data access");
    println!();
    println!("Version Information:");
    println!("  hda-bin:     {}", env!("CARGO_PKG_VERSION"));
    println!("  hda-core:    {}", hda_core::VERSION);
    println!("  hda-archive: {}", hda_archive::VERSION);
    println!("  hda-config:  {}", hda_config::VERSION);
    println!();
    println!("Build Information:");
    println!("  Target:       {}", std::env::consts::ARCH);
    println!("  OS:           {}", std::env::consts::OS);
    println!();
    println!("License: PolyForm Noncommercial License 1.0.0");
    println!("Copyright (c) 2025 Sylvex. All rights reserved.");

    Ok(())
}
