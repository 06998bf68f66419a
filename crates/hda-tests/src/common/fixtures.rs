// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Test Fixtures
//!
//! Timestamps are expressed as whole-second offsets from a fixed origin
//! ([`TimeFixtures::t0`]) so expected series read like `[0, 60, 120]`.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use hda_archive::{HistoryReadDetails, ReadRawModifiedDetails};
use hda_core::{DataValue, NodeId, Variable};

// =============================================================================
// Time Fixtures
// =============================================================================

/// Fixed timestamps for reproducible series.
pub struct TimeFixtures;

impl TimeFixtures {
    /// The origin of every fixture series: 2024-01-01T00:00:00Z.
    pub fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .single()
            .expect("valid fixture timestamp")
    }

    /// `t0` plus `seconds`.
    pub fn at(seconds: i64) -> DateTime<Utc> {
        Self::t0() + Duration::seconds(seconds)
    }

    /// A timestamp well before any fixture series.
    pub fn far_past() -> DateTime<Utc> {
        Self::t0() - Duration::days(365)
    }

    /// A timestamp well after any fixture series.
    pub fn far_future() -> DateTime<Utc> {
        Self::t0() + Duration::days(365)
    }

    /// Seconds between `t0` and `timestamp`.
    pub fn offset_of(timestamp: DateTime<Utc>) -> i64 {
        (timestamp - Self::t0()).num_seconds()
    }
}

// =============================================================================
// Variable Fixtures
// =============================================================================

/// Ready-made variables.
pub struct VariableFixtures;

impl VariableFixtures {
    /// `ns=2;s=Boiler.Temperature`, no value yet.
    pub fn temperature() -> Arc<Variable> {
        Arc::new(Variable::new(Self::temperature_id(), "Temperature"))
    }

    /// Node id of [`temperature`](Self::temperature).
    pub fn temperature_id() -> NodeId {
        NodeId::string(2, "Boiler.Temperature")
    }

    /// `ns=2;i=1001`, no value yet.
    pub fn pressure() -> Arc<Variable> {
        Arc::new(Variable::new(NodeId::numeric(2, 1001), "Pressure"))
    }

    /// A numeric variable in namespace 2 with a value at `t0 + seconds`.
    pub fn with_value(id: u32, value: f64, seconds: i64) -> Arc<Variable> {
        Arc::new(
            Variable::new(NodeId::numeric(2, id), format!("Var{}", id).as_str())
                .with_value(DataValue::good(value, TimeFixtures::at(seconds))),
        )
    }

    /// `count` distinct numeric variables.
    pub fn batch(count: u32) -> Vec<Arc<Variable>> {
        (0..count)
            .map(|i| Arc::new(Variable::new(NodeId::numeric(3, i), format!("Batch{}", i).as_str())))
            .collect()
    }
}

// =============================================================================
// Series Fixtures
// =============================================================================

/// Value series at regular intervals from `t0`.
pub struct SeriesFixtures;

impl SeriesFixtures {
    /// `count` good values; value `i` is `i as f64` at `t0 + i * step_seconds`.
    pub fn values(count: usize, step_seconds: i64) -> Vec<DataValue> {
        (0..count)
            .map(|i| DataValue::good(i as f64, TimeFixtures::at(i as i64 * step_seconds)))
            .collect()
    }

    /// Writes [`values`](Self::values) to `variable`, notifying listeners.
    pub fn write(variable: &Variable, count: usize, step_seconds: i64) {
        for value in Self::values(count, step_seconds) {
            variable.set_value(value);
        }
    }

    /// Writes one value at `t0 + seconds`.
    pub fn write_at(variable: &Variable, value: f64, seconds: i64) {
        variable.set_value(DataValue::good(value, TimeFixtures::at(seconds)));
    }
}

// =============================================================================
// Read Fixtures
// =============================================================================

/// Raw read details.
pub struct ReadFixtures;

impl ReadFixtures {
    /// Everything, oldest first, `num` values per page.
    pub fn forward_all(num: u32) -> HistoryReadDetails {
        ReadRawModifiedDetails::between(TimeFixtures::far_past(), TimeFixtures::far_future())
            .with_num_values(num)
            .into()
    }

    /// Everything, newest first, `num` values per page.
    pub fn reverse_all(num: u32) -> HistoryReadDetails {
        ReadRawModifiedDetails::between(TimeFixtures::far_future(), TimeFixtures::far_past())
            .with_num_values(num)
            .into()
    }

    /// Values in `[t0 + start, t0 + end]`; reversed when `start > end`.
    pub fn between(start: i64, end: i64, num: u32) -> HistoryReadDetails {
        ReadRawModifiedDetails::between(TimeFixtures::at(start), TimeFixtures::at(end))
            .with_num_values(num)
            .into()
    }

    /// Only a start bound at `t0 + start`.
    pub fn starting_at(start: i64, num: u32) -> HistoryReadDetails {
        ReadRawModifiedDetails::starting_at(TimeFixtures::at(start))
            .with_num_values(num)
            .into()
    }

    /// Only an end bound at `t0 + end`.
    pub fn ending_at(end: i64, num: u32) -> HistoryReadDetails {
        ReadRawModifiedDetails::ending_at(TimeFixtures::at(end))
            .with_num_values(num)
            .into()
    }
}

// =============================================================================
// Config Fixtures
// =============================================================================

/// The same configuration in each supported format.
pub struct ConfigFixtures;

impl ConfigFixtures {
    /// YAML text.
    pub fn yaml() -> &'static str {
        r#"
server:
  name: fixture-historian
  max_continuation_points_per_session: 4
archive:
  max_online_values: 3
simulation:
  interval: 100ms
  amplitude: 2.0
  period: 10s
variables:
  - node_id: "ns=2;s=Boiler.Temperature"
    initial_value: 20.0
  - node_id: "ns=2;i=1001"
    browse_name: Pressure
    historizing: false
    max_online_values: 10
logging:
  level: warn
  format: compact
"#
    }

    /// TOML text.
    pub fn toml() -> &'static str {
        r#"
[server]
name = "fixture-historian"
max_continuation_points_per_session = 4

[archive]
max_online_values = 3

[simulation]
interval = "100ms"
amplitude = 2.0
period = "10s"

[[variables]]
node_id = "ns=2;s=Boiler.Temperature"
initial_value = 20.0

[[variables]]
node_id = "ns=2;i=1001"
browse_name = "Pressure"
historizing = false
max_online_values = 10

[logging]
level = "warn"
format = "compact"
"#
    }

    /// JSON text.
    pub fn json() -> &'static str {
        r#"{
  "server": { "name": "fixture-historian", "max_continuation_points_per_session": 4 },
  "archive": { "max_online_values": 3 },
  "simulation": { "interval": "100ms", "amplitude": 2.0, "period": "10s" },
  "variables": [
    { "node_id": "ns=2;s=Boiler.Temperature", "initial_value": 20.0 },
    { "node_id": "ns=2;i=1001", "browse_name": "Pressure", "historizing": false, "max_online_values": 10 }
  ],
  "logging": { "level": "warn", "format": "compact" }
}"#
    }
}
