// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Configuration Integration Tests
//!
//! Integration tests for hda-config:
//!
//! - YAML, TOML and JSON parse to the same configuration
//! - File loading, placeholders and environment overrides
//! - Validation errors
//! - Driving a history server from a loaded configuration
//!
//! ## Test Categories
//!
//! - `test_config_format_*`: Format equivalence tests
//! - `test_config_load_*`: File and environment tests
//! - `test_config_validation_*`: Validation tests
//! - `test_config_server_*`: End-to-end tests

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use hda_archive::{ArchiveConfig, HistoryServer, HistoryServerConfig};
use hda_config::{
    load_config, load_config_str, ConfigError, ConfigFormat, ConfigLoader, HdaConfig, LogFormat,
    LogLevel,
};
use hda_core::{QualifiedName, Variable};

use hda_tests::common::{init_test_logging, temp_test_dir};
use hda_tests::prelude::*;

// =============================================================================
// Helper Functions
// =============================================================================

/// Loader with a prefix no other test sets.
fn isolated_loader(prefix: &str) -> ConfigLoader {
    ConfigLoader::new().with_env_prefix(prefix)
}

fn as_json(config: &HdaConfig) -> serde_json::Value {
    serde_json::to_value(config).expect("Config serialization failed")
}

fn assert_fixture_config(config: &HdaConfig) {
    assert_eq!(config.server.name, "fixture-historian");
    assert_eq!(config.server.max_continuation_points_per_session, 4);
    assert_eq!(config.archive.max_online_values, 3);
    assert_eq!(config.simulation.interval, Duration::from_millis(100));
    assert_eq!(config.simulation.period, Duration::from_secs(10));
    assert_eq!(config.simulation.amplitude, 2.0);
    assert_eq!(config.logging.level, LogLevel::Warn);
    assert_eq!(config.logging.format, LogFormat::Compact);

    assert_eq!(config.variables.len(), 2);
    let temperature = &config.variables[0];
    assert_eq!(temperature.node_id, "ns=2;s=Boiler.Temperature");
    assert!(temperature.historizing);
    assert_eq!(temperature.initial_value, Some(20.0));
    assert_eq!(config.capacity_for(temperature), 3);

    let pressure = &config.variables[1];
    assert_eq!(pressure.effective_browse_name(), "Pressure");
    assert!(!pressure.historizing);
    assert_eq!(config.capacity_for(pressure), 10);
}

// =============================================================================
// Format Tests
// =============================================================================

#[test]
fn test_config_format_yaml() {
    init_test_logging();
    let config = isolated_loader("HDA_IT_YAML")
        .load_from_str(ConfigFixtures::yaml(), ConfigFormat::Yaml)
        .expect("YAML config failed to load");
    assert_fixture_config(&config);
}

#[test]
fn test_config_format_toml() {
    let config = isolated_loader("HDA_IT_TOML")
        .load_from_str(ConfigFixtures::toml(), ConfigFormat::Toml)
        .expect("TOML config failed to load");
    assert_fixture_config(&config);
}

#[test]
fn test_config_format_json() {
    let config = isolated_loader("HDA_IT_JSON")
        .load_from_str(ConfigFixtures::json(), ConfigFormat::Json)
        .expect("JSON config failed to load");
    assert_fixture_config(&config);
}

#[test]
fn test_config_format_equivalence() {
    let loader = isolated_loader("HDA_IT_EQUIV");
    let yaml = loader.load_from_str(ConfigFixtures::yaml(), ConfigFormat::Yaml).unwrap();
    let toml = loader.load_from_str(ConfigFixtures::toml(), ConfigFormat::Toml).unwrap();
    let json = loader.load_from_str(ConfigFixtures::json(), ConfigFormat::Json).unwrap();

    assert_eq!(as_json(&yaml), as_json(&toml));
    assert_eq!(as_json(&yaml), as_json(&json));
}

#[test]
fn test_config_format_defaults() {
    let config = isolated_loader("HDA_IT_DEFAULTS")
        .load_from_str("{}", ConfigFormat::Json)
        .expect("Empty config failed to load");

    assert_eq!(config.server.name, "hda");
    assert_eq!(config.server.max_continuation_points_per_session, 100);
    assert_eq!(config.archive.max_online_values, 1000);
    assert!(!config.metrics.enabled);
    assert_eq!(config.simulation.interval, Duration::from_secs(1));
    assert_eq!(config.variables.len(), 1);
    assert_eq!(config.variables[0].node_id, "ns=2;s=Demo.Sine");
}

// =============================================================================
// Load Tests
// =============================================================================

#[test]
fn test_config_load_from_files() {
    let dir = temp_test_dir("hda-config-");
    let files = [
        ("historian.yaml", ConfigFixtures::yaml()),
        ("historian.yml", ConfigFixtures::yaml()),
        ("historian.toml", ConfigFixtures::toml()),
        ("historian.json", ConfigFixtures::json()),
    ];

    for (name, content) in files {
        let path = dir.path().join(name);
        fs::write(&path, content).expect("Failed to write config file");

        let config = isolated_loader("HDA_IT_FILES")
            .load(&path)
            .unwrap_or_else(|e| panic!("{} failed to load: {}", name, e));
        assert_fixture_config(&config);
    }
}

#[test]
fn test_config_load_missing_file() {
    let dir = temp_test_dir("hda-config-");
    let result = load_config(dir.path().join("absent.yaml"));
    assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
}

#[test]
fn test_config_load_unsupported_extension() {
    let dir = temp_test_dir("hda-config-");
    let path = dir.path().join("historian.ini");
    fs::write(&path, "[server]\nname = x\n").unwrap();

    let result = load_config(&path);
    assert!(matches!(result, Err(ConfigError::UnsupportedFormat { .. })));
}

#[test]
fn test_config_load_parse_error_names_file() {
    let dir = temp_test_dir("hda-config-");
    let path = dir.path().join("broken.toml");
    fs::write(&path, "[server\nname = ").unwrap();

    let err = isolated_loader("HDA_IT_BROKEN").load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().contains("broken.toml"));
}

#[test]
fn test_config_load_placeholders() {
    std::env::set_var("HDA_IT_PLACEHOLDER_NAME", "plant-7");
    let content = r#"
server:
  name: "${HDA_IT_PLACEHOLDER_NAME}"
archive:
  max_online_values: ${HDA_IT_PLACEHOLDER_UNSET:25}
"#;

    let config = isolated_loader("HDA_IT_PLACEHOLDER")
        .load_from_str(content, ConfigFormat::Yaml)
        .expect("Placeholder config failed to load");

    assert_eq!(config.server.name, "plant-7");
    assert_eq!(config.archive.max_online_values, 25);
}

#[test]
fn test_config_load_placeholders_disabled() {
    let loader = ConfigLoader::builder()
        .env_prefix("HDA_IT_NOVARS")
        .resolve_env_vars(false)
        .build();
    let content = r#"{ "server": { "name": "${HDA_IT_NOT_RESOLVED}" } }"#;

    let config = loader.load_from_str(content, ConfigFormat::Json).unwrap();
    assert_eq!(config.server.name, "${HDA_IT_NOT_RESOLVED}");
}

#[test]
fn test_config_load_env_overrides() {
    std::env::set_var("HDA_IT_OVR_SERVER_NAME", "from-env");
    std::env::set_var("HDA_IT_OVR_METRICS_ENABLED", "true");
    std::env::set_var("HDA_IT_OVR_SIMULATION_INTERVAL", "250ms");
    std::env::set_var("HDA_IT_OVR_LOG_FORMAT", "json");

    let config = isolated_loader("HDA_IT_OVR")
        .load_from_str(ConfigFixtures::yaml(), ConfigFormat::Yaml)
        .expect("Config with overrides failed to load");

    assert_eq!(config.server.name, "from-env");
    assert!(config.metrics.enabled);
    assert_eq!(config.simulation.interval, Duration::from_millis(250));
    assert_eq!(config.logging.format, LogFormat::Json);
    // Untouched settings keep the file values.
    assert_eq!(config.archive.max_online_values, 3);
}

#[test]
fn test_config_load_invalid_env_override() {
    std::env::set_var("HDA_IT_BADENV_ARCHIVE_MAX_ONLINE_VALUES", "lots");

    let result = isolated_loader("HDA_IT_BADENV").load_from_str("{}", ConfigFormat::Json);
    assert!(matches!(result, Err(ConfigError::InvalidEnvVar { .. })));
}

// =============================================================================
// Validation Tests
// =============================================================================

#[test]
fn test_config_validation_invalid_node_id() {
    let content = r#"{ "variables": [ { "node_id": "ns=2;x=Nope" } ] }"#;
    let result = load_config_str(content, ConfigFormat::Json);
    assert!(matches!(result, Err(ConfigError::InvalidNodeId { .. })));
}

#[test]
fn test_config_validation_duplicate_variables() {
    let content = r#"
[[variables]]
node_id = "ns=2;s=Boiler.Temperature"

[[variables]]
node_id = " ns=2;s=Boiler.Temperature "
"#;
    let result = load_config_str(content, ConfigFormat::Toml);
    assert!(matches!(result, Err(ConfigError::DuplicateVariable { .. })));
}

#[test]
fn test_config_validation_continuation_point_range() {
    for value in [0, 10_001] {
        let content = format!(
            r#"{{ "server": {{ "max_continuation_points_per_session": {} }} }}"#,
            value
        );
        let result = load_config_str(&content, ConfigFormat::Json);
        assert!(
            matches!(result, Err(ConfigError::OutOfRange { .. })),
            "{} should be out of range",
            value
        );
    }
}

#[test]
fn test_config_validation_empty_server_name() {
    let result = load_config_str("server:\n  name: \"\"\n", ConfigFormat::Yaml);
    assert!(matches!(result, Err(ConfigError::Validation { .. })));
}

#[test]
fn test_config_validation_simulation() {
    let zero_interval = r#"{ "simulation": { "interval": "0s" } }"#;
    assert!(load_config_str(zero_interval, ConfigFormat::Json).is_err());

    let negative_noise = r#"{ "simulation": { "noise": -1.0 } }"#;
    assert!(load_config_str(negative_noise, ConfigFormat::Json).is_err());
}

#[test]
fn test_config_validation_unknown_field() {
    let result = load_config_str(r#"{ "archive": { "max_values": 5 } }"#, ConfigFormat::Json);
    assert!(result.is_err());
}

#[test]
fn test_config_validation_error_messages() {
    let err = load_config_str(
        r#"{ "server": { "max_continuation_points_per_session": 0 } }"#,
        ConfigFormat::Json,
    )
    .unwrap_err();

    assert!(!err.user_message().is_empty());
    assert!(err.to_string().contains("max_continuation_points_per_session"));
}

// =============================================================================
// End-to-End Tests
// =============================================================================

#[test]
fn test_config_server_from_loaded_config() {
    let config = isolated_loader("HDA_IT_E2E")
        .load_from_str(ConfigFixtures::yaml(), ConfigFormat::Yaml)
        .unwrap();

    let server = HistoryServer::new(
        HistoryServerConfig::builder()
            .name(config.server.name.clone())
            .max_continuation_points_per_session(config.server.max_continuation_points_per_session)
            .build(),
    );

    let mut variables = Vec::new();
    for entry in &config.variables {
        let node_id = entry.parsed_node_id().unwrap();
        let browse_name = QualifiedName::new(node_id.namespace_index, entry.effective_browse_name());
        let variable = Arc::new(Variable::new(node_id, browse_name));
        let archive = ArchiveConfig::builder()
            .max_online_values(config.capacity_for(entry))
            .build();
        let historized = server.install(&variable, Some(archive)).unwrap();
        if !entry.historizing {
            historized.set_historizing(false);
        }
        variables.push((variable, historized));
    }

    for (variable, _) in &variables {
        SeriesFixtures::write(variable, 5, 60);
    }

    let (_, temperature) = &variables[0];
    temperature.archive().assert_timestamps(&[120, 180, 240]);
    assert_eq!(temperature.max_online_values(), 3);

    let (_, pressure) = &variables[1];
    assert!(pressure.archive().is_empty());
    assert_eq!(pressure.stats().values_skipped, 5);
    assert_eq!(pressure.max_online_values(), 10);

    assert_eq!(server.config().max_continuation_points_per_session, 4);
    server.dispose();
}
