// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # hda-archive
//!
//! Online history archive and HistoryRead for the HDA historian.
//!
//! - **RingBufferArchive**: bounded, time-ordered value history per variable
//! - **HistorizedVariable**: records a variable's value changes, gated by `Historizing`
//! - **ContinuationPointManager**: per-session tokens for paged reads
//! - **HistoryReadOrchestrator**: raw HistoryRead with paging in both directions
//! - **HistoryServer**: registry of historized variables and service entry point
//! - **Metrics**: Prometheus counters and gauges

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod binding;
pub mod continuation;
pub mod history_read;
pub mod metrics;
pub mod ring_buffer;
pub mod server;
pub mod traits;

pub use binding::{HaConfiguration, HistorizedVariable};
pub use continuation::{
    ContinuationPoint, ContinuationPointManager, ContinuationState, ReadDirection,
    DEFAULT_MAX_CONTINUATION_POINTS_PER_SESSION,
};
pub use history_read::{
    HistoryData, HistoryReadContext, HistoryReadDetails, HistoryReadOptions,
    HistoryReadOrchestrator, HistoryReadResult, ReadRawModifiedDetails,
};
pub use metrics::HistoryMetricsCollector;
pub use ring_buffer::RingBufferArchive;
pub use server::{
    HistoryReadRequest, HistoryReadService, HistoryReadValueId, HistoryServer,
    HistoryServerConfig, HistoryServerConfigBuilder, HistoryServerStats,
};
pub use traits::{ArchiveConfig, ArchiveConfigBuilder, ArchiveStats, ArchiveStatsInner, HistoricalArchive};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
