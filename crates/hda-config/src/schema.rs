// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration schema for the HDA historian.
//!
//! # Structure
//!
//! ```text
//! HdaConfig
//! ├── server: ServerSettings
//! ├── archive: ArchiveSettings
//! ├── metrics: MetricsSettings
//! ├── simulation: SimulationSettings
//! ├── variables: Vec<VariableConfig>
//! └── logging: LoggingConfig
//! ```
//!
//! # Example (YAML)
//!
//! ```yaml
//! server:
//!   name: line-1-historian
//!   max_continuation_points_per_session: 50
//! archive:
//!   max_online_values: 5000
//! simulation:
//!   interval: 500ms
//!   amplitude: 25.0
//!   period: 2m
//! variables:
//!   - node_id: "ns=2;s=Line1.Temperature"
//!     initial_value: 21.5
//!   - node_id: "ns=2;i=1001"
//!     browse_name: Pressure
//!     max_online_values: 100
//! logging:
//!   level: debug
//!   format: json
//! ```

use crate::error::{ConfigError, ConfigResult};
use hda_core::{Identifier, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

/// Default server name.
pub const DEFAULT_SERVER_NAME: &str = "hda";

/// Default continuation point limit per session.
pub const DEFAULT_MAX_CONTINUATION_POINTS: usize = 100;

/// Default archive capacity per variable.
pub const DEFAULT_MAX_ONLINE_VALUES: usize = 1000;

/// Upper bound accepted for the per-session continuation point limit.
pub const MAX_CONTINUATION_POINTS_LIMIT: usize = 10_000;

// =============================================================================
// Root Configuration
// =============================================================================

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HdaConfig {
    /// Server settings.
    #[serde(default)]
    pub server: ServerSettings,

    /// Default archive settings.
    #[serde(default)]
    pub archive: ArchiveSettings,

    /// Metrics settings.
    #[serde(default)]
    pub metrics: MetricsSettings,

    /// Value source settings.
    #[serde(default)]
    pub simulation: SimulationSettings,

    /// Variables to create and historize.
    #[serde(default = "default_variables")]
    pub variables: Vec<VariableConfig>,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl HdaConfig {
    /// Validates the whole configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        self.server.validate()?;
        self.simulation.validate()?;

        let mut seen = HashSet::new();
        for variable in &self.variables {
            let node_id = variable.parsed_node_id()?;
            if !seen.insert(node_id) {
                return Err(ConfigError::duplicate_variable(&variable.node_id));
            }
            variable.validate()?;
        }

        self.logging.validate()?;

        Ok(())
    }

    /// Returns the archive capacity for a variable, falling back to the default.
    pub fn capacity_for(&self, variable: &VariableConfig) -> usize {
        variable
            .max_online_values
            .unwrap_or(self.archive.max_online_values)
    }

    /// Returns a variable configuration by its node id text.
    pub fn get_variable(&self, node_id: &str) -> Option<&VariableConfig> {
        self.variables.iter().find(|v| v.node_id == node_id)
    }
}

impl Default for HdaConfig {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            archive: ArchiveSettings::default(),
            metrics: MetricsSettings::default(),
            simulation: SimulationSettings::default(),
            variables: default_variables(),
            logging: LoggingConfig::default(),
        }
    }
}

fn default_variables() -> Vec<VariableConfig> {
    vec![VariableConfig::new("ns=2;s=Demo.Sine")]
}

// =============================================================================
// Server Settings
// =============================================================================

/// History server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSettings {
    /// Server name, used in logs.
    #[serde(default = "default_server_name")]
    pub name: String,

    /// Outstanding continuation points allowed per session.
    #[serde(default = "default_max_continuation_points")]
    pub max_continuation_points_per_session: usize,
}

impl ServerSettings {
    /// Validates the server settings.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::validation("server.name", "cannot be empty"));
        }
        let max = self.max_continuation_points_per_session;
        if max == 0 || max > MAX_CONTINUATION_POINTS_LIMIT {
            return Err(ConfigError::out_of_range(
                "server.max_continuation_points_per_session",
                max,
                1,
                MAX_CONTINUATION_POINTS_LIMIT,
            ));
        }
        Ok(())
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            name: default_server_name(),
            max_continuation_points_per_session: default_max_continuation_points(),
        }
    }
}

fn default_server_name() -> String {
    DEFAULT_SERVER_NAME.to_string()
}

fn default_max_continuation_points() -> usize {
    DEFAULT_MAX_CONTINUATION_POINTS
}

// =============================================================================
// Archive Settings
// =============================================================================

/// Defaults applied to every archive.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArchiveSettings {
    /// Archive capacity. `0` keeps every value.
    #[serde(default = "default_max_online_values")]
    pub max_online_values: usize,
}

impl Default for ArchiveSettings {
    fn default() -> Self {
        Self {
            max_online_values: default_max_online_values(),
        }
    }
}

fn default_max_online_values() -> usize {
    DEFAULT_MAX_ONLINE_VALUES
}

// =============================================================================
// Metrics Settings
// =============================================================================

/// Prometheus metrics settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsSettings {
    /// Record Prometheus metrics.
    #[serde(default)]
    pub enabled: bool,
}

// =============================================================================
// Simulation Settings
// =============================================================================

/// Settings for the built-in value source.
///
/// Each variable follows `initial_value + amplitude * sin(2π t / period)`
/// plus uniform noise in `[-noise, noise]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulationSettings {
    /// Time between samples.
    #[serde(default = "default_interval", with = "humantime_duration")]
    pub interval: Duration,

    /// Peak deviation of the sine wave.
    #[serde(default = "default_amplitude")]
    pub amplitude: f64,

    /// Period of the sine wave.
    #[serde(default = "default_period", with = "humantime_duration")]
    pub period: Duration,

    /// Half-width of the uniform noise added to each sample.
    #[serde(default)]
    pub noise: f64,
}

impl SimulationSettings {
    /// Validates the simulation settings.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.interval.is_zero() {
            return Err(ConfigError::validation(
                "simulation.interval",
                "must be greater than zero",
            ));
        }
        if self.period.is_zero() {
            return Err(ConfigError::validation(
                "simulation.period",
                "must be greater than zero",
            ));
        }
        if !self.amplitude.is_finite() || self.amplitude < 0.0 {
            return Err(ConfigError::validation(
                "simulation.amplitude",
                "must be a finite, non-negative number",
            ));
        }
        if !self.noise.is_finite() || self.noise < 0.0 {
            return Err(ConfigError::validation(
                "simulation.noise",
                "must be a finite, non-negative number",
            ));
        }
        Ok(())
    }
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            amplitude: default_amplitude(),
            period: default_period(),
            noise: 0.0,
        }
    }
}

fn default_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_amplitude() -> f64 {
    10.0
}

fn default_period() -> Duration {
    Duration::from_secs(60)
}

// =============================================================================
// Variable Configuration
// =============================================================================

/// A variable exposed and historized by the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VariableConfig {
    /// Node id text, e.g. `ns=2;s=Line1.Temperature`.
    pub node_id: String,

    /// Browse name. Derived from the node id when absent.
    #[serde(default)]
    pub browse_name: Option<String>,

    /// Whether history recording starts enabled.
    #[serde(default = "default_historizing")]
    pub historizing: bool,

    /// Archive capacity override for this variable.
    #[serde(default)]
    pub max_online_values: Option<usize>,

    /// Value present before the first sample.
    #[serde(default)]
    pub initial_value: Option<f64>,
}

impl VariableConfig {
    /// Creates a historized variable configuration with defaults.
    pub fn new(node_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            browse_name: None,
            historizing: default_historizing(),
            max_online_values: None,
            initial_value: None,
        }
    }

    /// Parses the node id.
    pub fn parsed_node_id(&self) -> ConfigResult<NodeId> {
        self.node_id
            .parse()
            .map_err(|e: hda_core::ParseError| ConfigError::invalid_node_id(&self.node_id, e.to_string()))
    }

    /// Returns the browse name, derived from a string identifier or the
    /// node id text when none is configured.
    pub fn effective_browse_name(&self) -> String {
        if let Some(name) = &self.browse_name {
            return name.clone();
        }
        match self.parsed_node_id() {
            Ok(NodeId {
                identifier: Identifier::String(s),
                ..
            }) => s,
            _ => self.node_id.clone(),
        }
    }

    /// Validates the variable configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(name) = &self.browse_name {
            if name.trim().is_empty() {
                return Err(ConfigError::validation(
                    format!("variables[{}].browse_name", self.node_id),
                    "cannot be empty",
                ));
            }
        }
        if let Some(value) = self.initial_value {
            if !value.is_finite() {
                return Err(ConfigError::validation(
                    format!("variables[{}].initial_value", self.node_id),
                    "must be a finite number",
                ));
            }
        }
        Ok(())
    }
}

fn default_historizing() -> bool {
    true
}

// =============================================================================
// Logging Configuration
// =============================================================================

/// Logging configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level.
    #[serde(default)]
    pub level: LogLevel,

    /// Log format.
    #[serde(default)]
    pub format: LogFormat,
}

impl LoggingConfig {
    /// Validates the logging configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        Ok(())
    }
}

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    #[default]
    Info,
    /// Warning level.
    Warn,
    /// Error level.
    Error,
}

impl LogLevel {
    /// Returns the level as a filter directive.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Log format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Compact single-line text.
    Compact,
    /// JSON lines.
    Json,
}

impl LogFormat {
    /// Returns the format name.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Text => "text",
            LogFormat::Compact => "compact",
            LogFormat::Json => "json",
        }
    }
}

// =============================================================================
// Duration serde
// =============================================================================

mod humantime_duration {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*value).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = HdaConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.name, "hda");
        assert_eq!(config.server.max_continuation_points_per_session, 100);
        assert_eq!(config.archive.max_online_values, 1000);
        assert!(!config.metrics.enabled);
        assert_eq!(config.variables.len(), 1);
    }

    #[test]
    fn test_duplicate_variables_rejected() {
        let mut config = HdaConfig::default();
        config.variables = vec![
            VariableConfig::new("ns=2;i=7"),
            VariableConfig::new("ns=2;i=8"),
            VariableConfig::new(" ns=2;i=7"),
        ];
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateVariable { .. }));
    }

    #[test]
    fn test_invalid_node_id_rejected() {
        let mut config = HdaConfig::default();
        config.variables = vec![VariableConfig::new("ns=two;i=7")];
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidNodeId { .. }));
    }

    #[test]
    fn test_server_limits() {
        let mut settings = ServerSettings::default();
        settings.max_continuation_points_per_session = 0;
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::OutOfRange { .. })
        ));

        settings.max_continuation_points_per_session = 5;
        settings.name = "  ".to_string();
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::Validation { .. })
        ));
    }

    #[test]
    fn test_simulation_validation() {
        let mut sim = SimulationSettings::default();
        assert!(sim.validate().is_ok());

        sim.interval = Duration::ZERO;
        assert!(sim.validate().is_err());

        sim.interval = Duration::from_millis(100);
        sim.amplitude = f64::NAN;
        assert!(sim.validate().is_err());
    }

    #[test]
    fn test_effective_browse_name() {
        let v = VariableConfig::new("ns=2;s=Line1.Temperature");
        assert_eq!(v.effective_browse_name(), "Line1.Temperature");

        let v = VariableConfig::new("ns=2;i=1001");
        assert_eq!(v.effective_browse_name(), "ns=2;i=1001");

        let mut v = VariableConfig::new("ns=2;i=1001");
        v.browse_name = Some("Pressure".to_string());
        assert_eq!(v.effective_browse_name(), "Pressure");
    }

    #[test]
    fn test_capacity_for() {
        let config = HdaConfig::default();
        let mut v = VariableConfig::new("ns=2;i=1");
        assert_eq!(config.capacity_for(&v), 1000);
        v.max_online_values = Some(5);
        assert_eq!(config.capacity_for(&v), 5);
    }

    #[test]
    fn test_json_round_trip_keeps_durations() {
        let mut config = HdaConfig::default();
        config.simulation.interval = Duration::from_millis(250);
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"250ms\""));

        let parsed: HdaConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.simulation.interval, Duration::from_millis(250));
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let json = r#"{ "server": { "name": "x", "port": 4840 } }"#;
        assert!(serde_json::from_str::<HdaConfig>(json).is_err());
    }

    #[test]
    fn test_log_enums() {
        assert_eq!(LogLevel::default().as_str(), "info");
        assert_eq!(LogFormat::default().as_str(), "text");
        let format: LogFormat = serde_json::from_str("\"compact\"").unwrap();
        assert_eq!(format, LogFormat::Compact);
    }
}
