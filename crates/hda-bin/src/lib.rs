// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # hda-bin
//!
//! The `hda` command-line historian.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         main.rs                             │
//! └─────────────────────────┬───────────────────────────────────┘
//!                           │
//!                    ┌──────▼──────┐
//!                    │   cli.rs    │
//!                    └──────┬──────┘
//!                           │
//!               ┌───────────┼───────────┐
//!               ▼           ▼           ▼
//!        ┌──────────┐ ┌──────────┐ ┌──────────┐
//!        │ commands │ │ runtime  │ │ logging  │
//!        └──────────┘ └────┬─────┘ └──────────┘
//!                          │
//!               ┌──────────┼──────────┐
//!               ▼                     ▼
//!        ┌────────────┐        ┌────────────┐
//!        │ simulation │        │  shutdown  │
//!        └────────────┘        └────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Record simulated values with built-in defaults (default command)
//! hda
//!
//! # Record with a config file, stopping after ten minutes
//! hda -c /etc/hda/hda.yaml run --duration 10m
//!
//! # Record 50 samples and page through them, newest first
//! hda read --samples 50 --page-size 10 --reverse
//!
//! # Validate configuration
//! hda -c hda.yaml validate --show-config
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

// =============================================================================
// Modules
// =============================================================================

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod runtime;
pub mod shutdown;
pub mod simulation;

// =============================================================================
// Re-exports
// =============================================================================

pub use cli::{Cli, Commands};
pub use error::{BinError, BinResult};
pub use logging::init_logging;
pub use runtime::{HistorianRuntime, RuntimeBuilder};
pub use shutdown::{ShutdownCoordinator, ShutdownToken};
pub use simulation::SignalGenerator;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
