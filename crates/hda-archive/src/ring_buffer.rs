// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Bounded, time-ordered in-memory archive.
//!
//! [`RingBufferArchive`] keeps the most recent `max_online_values` samples of
//! one variable in a `VecDeque`, oldest at the front:
//!
//! ```text
//!   front (oldest)                                   back (newest)
//!   ┌──────┬──────┬──────┬──────┬──────┐
//!   │ t=0  │ t=60 │ t=120│ t=180│ t=240│ ◄── push(t=300) evicts t=0
//!   └──────┴──────┴──────┴──────┴──────┘
//! ```
//!
//! # Features
//!
//! - **Ordered**: rejects samples older than the newest stored one
//! - **Bounded**: evicts exactly one oldest sample per overflowing push
//! - **Binary-searched slices**: range reads use `partition_point`
//! - **Thread-Safe**: `parking_lot::RwLock` around the queue, atomic counters

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::{debug, warn};

use hda_core::error::ArchiveError;
use hda_core::types::DataValue;

use crate::metrics::HistoryMetricsCollector;
use crate::traits::{ArchiveConfig, ArchiveStats, ArchiveStatsInner, HistoricalArchive};

/// An in-memory ring buffer archive.
#[derive(Debug)]
pub struct RingBufferArchive {
    /// Values ordered by source timestamp.
    queue: RwLock<VecDeque<DataValue>>,

    /// Archive configuration.
    config: ArchiveConfig,

    /// Lock-free statistics.
    stats: ArchiveStatsInner,

    /// Prometheus metrics.
    metrics: HistoryMetricsCollector,
}

impl RingBufferArchive {
    /// Creates a new archive with the given configuration.
    pub fn new(config: ArchiveConfig) -> Self {
        let initial_capacity = if config.is_unbounded() {
            64
        } else {
            config.max_online_values.min(10_000)
        };

        Self {
            queue: RwLock::new(VecDeque::with_capacity(initial_capacity)),
            config,
            stats: ArchiveStatsInner::new(),
            metrics: HistoryMetricsCollector::disabled(),
        }
    }

    /// Creates a new archive with the testing configuration.
    pub fn with_defaults() -> Self {
        Self::new(ArchiveConfig::for_testing())
    }

    /// Attaches a metrics collector.
    pub fn with_metrics(mut self, metrics: HistoryMetricsCollector) -> Self {
        self.metrics = metrics;
        self
    }

    /// Returns a copy of every stored value, oldest first.
    pub fn values(&self) -> Vec<DataValue> {
        self.queue.read().iter().cloned().collect()
    }
}

impl HistoricalArchive for RingBufferArchive {
    fn push(&self, value: DataValue) -> Result<(), ArchiveError> {
        let evicted = {
            let mut queue = self.queue.write();

            if let Some(newest) = queue.back().map(|v| v.source_timestamp) {
                if value.source_timestamp < newest {
                    drop(queue);

                    warn!(
                        timestamp = %value.source_timestamp,
                        newest = %newest,
                        "Rejecting out-of-order sample"
                    );
                    self.stats.record_rejected();
                    self.metrics.record_values_rejected(1);
                    return Err(ArchiveError::out_of_order(value.source_timestamp, newest));
                }
            }

            let max = self.config.max_online_values;
            let evicted = if max > 0 && queue.len() >= max {
                let dropped = queue.pop_front();
                debug!(
                    evicted_timestamp = ?dropped.as_ref().map(|v| v.source_timestamp),
                    max_online_values = max,
                    "Evicting oldest value from online archive"
                );
                dropped.is_some()
            } else {
                false
            };

            queue.push_back(value);
            evicted
        };

        if evicted {
            self.stats.record_evicted(1);
            self.metrics.record_values_evicted(1);
        }
        self.stats.record_recorded();
        self.metrics.record_values_recorded(1);

        Ok(())
    }

    fn slice(&self, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Vec<DataValue> {
        let (lower, upper) = match (start, end) {
            (Some(s), Some(e)) if s > e => (Some(e), Some(s)),
            bounds => bounds,
        };

        let queue = self.queue.read();
        let from = lower
            .map(|t| queue.partition_point(|v| v.source_timestamp < t))
            .unwrap_or(0);
        let to = upper
            .map(|t| queue.partition_point(|v| v.source_timestamp <= t))
            .unwrap_or(queue.len());

        if from >= to {
            return Vec::new();
        }
        queue.range(from..to).cloned().collect()
    }

    fn oldest_timestamp(&self) -> Option<DateTime<Utc>> {
        self.queue.read().front().map(|v| v.source_timestamp)
    }

    fn newest_timestamp(&self) -> Option<DateTime<Utc>> {
        self.queue.read().back().map(|v| v.source_timestamp)
    }

    #[inline]
    fn len(&self) -> usize {
        self.queue.read().len()
    }

    fn clear(&self) {
        self.queue.write().clear();
        self.stats.record_cleared();
    }

    fn record_skipped(&self) {
        self.stats.record_skipped();
        self.metrics.record_values_skipped(1);
    }

    fn stats(&self) -> ArchiveStats {
        let mut stats = self.stats.snapshot();
        let queue = self.queue.read();
        stats.current_values = queue.len() as u64;
        stats.oldest_timestamp = queue.front().map(|v| v.source_timestamp);
        stats.newest_timestamp = queue.back().map(|v| v.source_timestamp);
        stats
    }

    fn config(&self) -> &ArchiveConfig {
        &self.config
    }
}

// =============================================================================
// Tests
// =============================================================================
