// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Prometheus metrics for the history subsystem.
//!
//! # Metrics Overview
//!
//! | Metric | Type | Description |
//! |--------|------|-------------|
//! | `hda_archive_values_recorded_total` | Counter | Values recorded into online archives |
//! | `hda_archive_values_evicted_total` | Counter | Values evicted at capacity |
//! | `hda_archive_values_skipped_total` | Counter | Changes not recorded (historizing off) |
//! | `hda_archive_values_rejected_total` | Counter | Out-of-order values rejected |
//! | `hda_history_read_total` | Counter | HistoryRead results by status |
//! | `hda_history_read_values_returned_total` | Counter | Values returned by HistoryRead |
//! | `hda_continuation_points_active` | Gauge | Outstanding continuation points |
//! | `hda_historized_variables` | Gauge | Installed historizing bindings |

use once_cell::sync::Lazy;
use prometheus::{register_counter, register_counter_vec, register_gauge, Counter, CounterVec, Gauge};

use hda_core::types::StatusCode;

// =============================================================================
// Metric Definitions
// =============================================================================

static VALUES_RECORDED_TOTAL: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "hda_archive_values_recorded_total",
        "Total number of values recorded into online archives"
    )
    .expect("Failed to register values_recorded_total metric")
});

static VALUES_EVICTED_TOTAL: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "hda_archive_values_evicted_total",
        "Total number of values evicted from online archives at capacity"
    )
    .expect("Failed to register values_evicted_total metric")
});

static VALUES_SKIPPED_TOTAL: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "hda_archive_values_skipped_total",
        "Total number of value changes not recorded because historizing was disabled"
    )
    .expect("Failed to register values_skipped_total metric")
});

static VALUES_REJECTED_TOTAL: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "hda_archive_values_rejected_total",
        "Total number of out-of-order values rejected by online archives"
    )
    .expect("Failed to register values_rejected_total metric")
});

/// HistoryRead results by status code name.
static HISTORY_READ_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "hda_history_read_total",
        "Total number of HistoryRead results by status",
        &["status"]
    )
    .expect("Failed to register history_read_total metric")
});

static HISTORY_READ_VALUES_RETURNED: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "hda_history_read_values_returned_total",
        "Total number of values returned by HistoryRead"
    )
    .expect("Failed to register history_read_values_returned_total metric")
});

static CONTINUATION_POINTS_ACTIVE: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!(
        "hda_continuation_points_active",
        "Number of outstanding continuation points"
    )
    .expect("Failed to register continuation_points_active metric")
});

static HISTORIZED_VARIABLES: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!(
        "hda_historized_variables",
        "Number of variables with an installed historizing binding"
    )
    .expect("Failed to register historized_variables metric")
});

// =============================================================================
// Metrics Collector
// =============================================================================

/// Records history metrics when enabled.
#[derive(Debug, Clone, Default)]
pub struct HistoryMetricsCollector {
    enabled: bool,
}

impl HistoryMetricsCollector {
    /// Creates a new metrics collector.
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Creates a disabled metrics collector (no-op).
    pub fn disabled() -> Self {
        Self { enabled: false }
    }

    /// Returns whether metrics collection is enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Records values accepted into an archive.
    pub fn record_values_recorded(&self, count: u64) {
        if !self.enabled {
            return;
        }
        VALUES_RECORDED_TOTAL.inc_by(count as f64);
    }

    /// Records values evicted at capacity.
    pub fn record_values_evicted(&self, count: u64) {
        if !self.enabled {
            return;
        }
        VALUES_EVICTED_TOTAL.inc_by(count as f64);
    }

    /// Records value changes skipped while historizing was off.
    pub fn record_values_skipped(&self, count: u64) {
        if !self.enabled {
            return;
        }
        VALUES_SKIPPED_TOTAL.inc_by(count as f64);
    }

    /// Records rejected out-of-order values.
    pub fn record_values_rejected(&self, count: u64) {
        if !self.enabled {
            return;
        }
        VALUES_REJECTED_TOTAL.inc_by(count as f64);
    }

    /// Records one HistoryRead result.
    pub fn record_history_read(&self, status: StatusCode, values_returned: usize) {
        if !self.enabled {
            return;
        }
        HISTORY_READ_TOTAL
            .with_label_values(&[status.to_string().as_str()])
            .inc();
        HISTORY_READ_VALUES_RETURNED.inc_by(values_returned as f64);
    }

    /// Updates the outstanding continuation point gauge.
    pub fn set_active_continuation_points(&self, count: usize) {
        if !self.enabled {
            return;
        }
        CONTINUATION_POINTS_ACTIVE.set(count as f64);
    }

    /// Updates the historized variable gauge.
    pub fn set_historized_variables(&self, count: usize) {
        if !self.enabled {
            return;
        }
        HISTORIZED_VARIABLES.set(count as f64);
    }
}

// =============================================================================
// Tests
// =============================================================================
