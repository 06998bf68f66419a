// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # hda-config
//!
//! Configuration management for the HDA historian.
//!
//! ## Features
//!
//! - **Schema Definition**: server, archive, metrics, simulation, variables, logging
//! - **Multi-Format Support**: YAML, TOML, and JSON configuration files
//! - **Environment Overrides**: `${VAR:default}` placeholders and `HDA_*` variables
//! - **Validation**: node id parsing, duplicate detection, range checks
//!
//! ## Quick Start
//!
//! ```no_run
//! use hda_config::loader::load_config;
//!
//! let config = load_config("hda.yaml").unwrap();
//! println!("Server: {}", config.server.name);
//! println!("Variables: {}", config.variables.len());
//! ```
//!
//! Loading from a string:
//!
//! ```
//! use hda_config::{load_config_str, ConfigFormat};
//!
//! let config = load_config_str(
//!     r#"{ "variables": [ { "node_id": "ns=2;i=1001", "browse_name": "Pressure" } ] }"#,
//!     ConfigFormat::Json,
//! )
//! .unwrap();
//! assert_eq!(config.variables[0].effective_browse_name(), "Pressure");
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod loader;
pub mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{load_config, load_config_str, ConfigFormat, ConfigLoader, ConfigLoaderBuilder};
pub use schema::{
    ArchiveSettings, HdaConfig, LogFormat, LogLevel, LoggingConfig, MetricsSettings,
    ServerSettings, SimulationSettings, VariableConfig,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
