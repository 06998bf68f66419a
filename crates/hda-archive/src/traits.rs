// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Archive traits and configuration.
//!
//! A [`HistoricalArchive`] holds the online history of one variable, ordered
//! by source timestamp. Counters are kept in [`ArchiveStatsInner`] with
//! atomic types so that `stats()` never takes the data lock.
//!
//! # Example
//!
//! ```rust
//! use hda_archive::{ArchiveConfig, HistoricalArchive, RingBufferArchive};
//! use hda_core::types::DataValue;
//!
//! let archive = RingBufferArchive::new(ArchiveConfig::builder().max_online_values(3).build());
//! archive.push(DataValue::now(1.0)).unwrap();
//! assert_eq!(archive.len(), 1);
//! ```

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use hda_core::error::ArchiveError;
use hda_core::types::DataValue;

// =============================================================================
// Archive Configuration
// =============================================================================

/// Configuration for an online archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Maximum number of values kept online (`0` = unbounded).
    #[serde(default = "default_max_online_values")]
    pub max_online_values: usize,
}

fn default_max_online_values() -> usize {
    1000
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            max_online_values: default_max_online_values(),
        }
    }
}

impl ArchiveConfig {
    /// Creates a new archive configuration builder.
    pub fn builder() -> ArchiveConfigBuilder {
        ArchiveConfigBuilder::default()
    }

    /// Creates a configuration for testing (small capacity).
    pub fn for_testing() -> Self {
        Self {
            max_online_values: 10,
        }
    }

    /// Creates an unbounded configuration.
    pub fn unbounded() -> Self {
        Self {
            max_online_values: 0,
        }
    }

    /// Returns `true` if the archive has no capacity limit.
    pub fn is_unbounded(&self) -> bool {
        self.max_online_values == 0
    }
}

/// Builder for ArchiveConfig.
#[derive(Debug, Default)]
pub struct ArchiveConfigBuilder {
    config: ArchiveConfig,
}

impl ArchiveConfigBuilder {
    /// Sets the maximum number of online values.
    pub fn max_online_values(mut self, max: usize) -> Self {
        self.config.max_online_values = max;
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> ArchiveConfig {
        self.config
    }
}

// =============================================================================
// Archive Statistics
// =============================================================================

/// Lock-free archive statistics using atomic types.
#[derive(Debug, Default)]
pub struct ArchiveStatsInner {
    /// Values accepted into the archive (cumulative).
    pub values_recorded: AtomicU64,
    /// Values dropped to stay within capacity (cumulative).
    pub values_evicted: AtomicU64,
    /// Values rejected as out of order (cumulative).
    pub values_rejected: AtomicU64,
    /// Value changes not recorded because historizing was off (cumulative).
    pub values_skipped: AtomicU64,
    /// Current number of values (live counter).
    pub current_values: AtomicU64,
}

impl ArchiveStatsInner {
    /// Creates new statistics with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an accepted value.
    #[inline]
    pub fn record_recorded(&self) {
        self.values_recorded.fetch_add(1, Ordering::Relaxed);
        self.current_values.fetch_add(1, Ordering::Relaxed);
    }

    /// Records evicted values.
    #[inline]
    pub fn record_evicted(&self, count: u64) {
        self.values_evicted.fetch_add(count, Ordering::Relaxed);
        self.current_values.fetch_sub(count, Ordering::Relaxed);
    }

    /// Records a rejected value.
    #[inline]
    pub fn record_rejected(&self) {
        self.values_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a skipped value change.
    #[inline]
    pub fn record_skipped(&self) {
        self.values_skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Records removal of all values.
    #[inline]
    pub fn record_cleared(&self) {
        self.current_values.store(0, Ordering::Relaxed);
    }

    /// Creates a snapshot of the counters. Timestamps are left empty.
    pub fn snapshot(&self) -> ArchiveStats {
        ArchiveStats {
            values_recorded: self.values_recorded.load(Ordering::Relaxed),
            values_evicted: self.values_evicted.load(Ordering::Relaxed),
            values_rejected: self.values_rejected.load(Ordering::Relaxed),
            values_skipped: self.values_skipped.load(Ordering::Relaxed),
            current_values: self.current_values.load(Ordering::Relaxed),
            oldest_timestamp: None,
            newest_timestamp: None,
        }
    }
}

/// Immutable snapshot of archive statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveStats {
    /// Values accepted into the archive (cumulative).
    pub values_recorded: u64,
    /// Values dropped to stay within capacity (cumulative).
    pub values_evicted: u64,
    /// Values rejected as out of order (cumulative).
    pub values_rejected: u64,
    /// Value changes not recorded because historizing was off (cumulative).
    pub values_skipped: u64,
    /// Current number of values.
    pub current_values: u64,
    /// Source timestamp of the oldest value.
    pub oldest_timestamp: Option<DateTime<Utc>>,
    /// Source timestamp of the newest value.
    pub newest_timestamp: Option<DateTime<Utc>>,
}

impl ArchiveStats {
    /// Returns the fill ratio (0.0 to 1.0) against a capacity.
    ///
    /// Unbounded archives (`max_online_values == 0`) report 0.0.
    pub fn fill_ratio(&self, max_online_values: usize) -> f64 {
        if max_online_values == 0 {
            return 0.0;
        }
        self.current_values as f64 / max_online_values as f64
    }

    /// Adds another snapshot's counters into this one.
    pub fn accumulate(&mut self, other: &ArchiveStats) {
        self.values_recorded += other.values_recorded;
        self.values_evicted += other.values_evicted;
        self.values_rejected += other.values_rejected;
        self.values_skipped += other.values_skipped;
        self.current_values += other.current_values;
        self.oldest_timestamp = match (self.oldest_timestamp, other.oldest_timestamp) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        self.newest_timestamp = match (self.newest_timestamp, other.newest_timestamp) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
    }
}

// =============================================================================
// HistoricalArchive Trait
// =============================================================================

/// Online history of a single variable.
///
/// # Invariants
///
/// - Values are ordered by `source_timestamp`, ascending; equal timestamps
///   keep insertion order.
/// - `len()` never exceeds `config().max_online_values` unless it is `0`.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`. Each call is atomic with respect
/// to the others.
pub trait HistoricalArchive: Send + Sync + Debug {
    /// Appends a value, evicting the oldest one when at capacity.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::OutOfOrder`] if `value` is older than the
    /// newest stored value. The archive is left unchanged.
    fn push(&self, value: DataValue) -> Result<(), ArchiveError>;

    /// Returns the values whose timestamps fall in
    /// `[min(start, end), max(start, end)]`, ascending.
    ///
    /// A missing bound is open in that direction.
    fn slice(&self, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Vec<DataValue>;

    /// Returns the source timestamp of the oldest value.
    fn oldest_timestamp(&self) -> Option<DateTime<Utc>>;

    /// Returns the source timestamp of the newest value.
    fn newest_timestamp(&self) -> Option<DateTime<Utc>>;

    /// Returns the number of values.
    fn len(&self) -> usize;

    /// Returns `true` if the archive holds no value.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every value.
    fn clear(&self);

    /// Counts a value change that was not recorded.
    fn record_skipped(&self);

    /// Returns a statistics snapshot.
    fn stats(&self) -> ArchiveStats;

    /// Returns the archive configuration.
    fn config(&self) -> &ArchiveConfig;
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_archive_config_defaults() {
        let config = ArchiveConfig::default();
        assert_eq!(config.max_online_values, 1000);
        assert!(!config.is_unbounded());
        assert!(ArchiveConfig::unbounded().is_unbounded());
    }

    #[test]
    fn test_archive_config_builder() {
        let config = ArchiveConfig::builder().max_online_values(42).build();
        assert_eq!(config.max_online_values, 42);
    }

    #[test]
    fn test_archive_config_serde_default() {
        let config: ArchiveConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ArchiveConfig::default());
    }

    #[test]
    fn test_stats_inner_counters() {
        let stats = ArchiveStatsInner::new();
        stats.record_recorded();
        stats.record_recorded();
        stats.record_recorded();
        stats.record_evicted(1);
        stats.record_rejected();
        stats.record_skipped();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.values_recorded, 3);
        assert_eq!(snapshot.values_evicted, 1);
        assert_eq!(snapshot.values_rejected, 1);
        assert_eq!(snapshot.values_skipped, 1);
        assert_eq!(snapshot.current_values, 2);

        stats.record_cleared();
        assert_eq!(stats.snapshot().current_values, 0);
    }

    #[test]
    fn test_stats_fill_ratio() {
        let stats = ArchiveStats {
            current_values: 25,
            ..Default::default()
        };
        assert_eq!(stats.fill_ratio(100), 0.25);
        assert_eq!(stats.fill_ratio(0), 0.0);
    }

    #[test]
    fn test_stats_accumulate() {
        let t0 = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let t1 = Utc.timestamp_opt(1_700_000_060, 0).unwrap();

        let mut total = ArchiveStats::default();
        total.accumulate(&ArchiveStats {
            values_recorded: 2,
            current_values: 2,
            oldest_timestamp: Some(t1),
            newest_timestamp: Some(t1),
            ..Default::default()
        });
        total.accumulate(&ArchiveStats {
            values_recorded: 1,
            current_values: 1,
            oldest_timestamp: Some(t0),
            newest_timestamp: Some(t0),
            ..Default::default()
        });

        assert_eq!(total.values_recorded, 3);
        assert_eq!(total.oldest_timestamp, Some(t0));
        assert_eq!(total.newest_timestamp, Some(t1));
    }
}
