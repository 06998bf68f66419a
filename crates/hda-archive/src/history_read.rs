// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! HistoryRead (raw) for online archives.
//!
//! # State Machine
//!
//! ```text
//!   Idle ──► Validating ──┬──► Rejected            (BadHistoryOperationUnsupported)
//!                         └──► Scanning ──┬──► Rejected (BadContinuationPointInvalid)
//!                                         └──► Emitting ──┬──► Done
//!                                                         └──► PagedPending (+ token)
//! ```
//!
//! - **Validating**: only raw, non-modified reads are served. At least two of
//!   `{start_time, end_time, num_values_per_node > 0}` must be given.
//! - **Scanning**: a fresh read slices the archive; a resumed read pops the
//!   continuation point.
//! - **Emitting**: up to `num_values_per_node` values (all when `0`) are
//!   returned; the rest is parked behind a new continuation point.
//!
//! # Direction
//!
//! | start | end | direction |
//! |-------|-----|-----------|
//! | `s`   | `e`, `s <= e` | forward |
//! | `s`   | `e`, `s > e`  | backward |
//! | `s`   | -   | forward |
//! | -     | `e` | backward |
//!
//! Backward reads return newest to oldest.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use hda_core::types::{DataValue, NodeId, QualifiedName, SessionId, StatusCode};

use crate::continuation::{ContinuationPoint, ContinuationPointManager, ContinuationState, ReadDirection};
use crate::traits::HistoricalArchive;

// =============================================================================
// Request Types
// =============================================================================

/// Parameters of a raw (or modified) history read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadRawModifiedDetails {
    /// Start of the time domain.
    pub start_time: Option<DateTime<Utc>>,
    /// End of the time domain.
    pub end_time: Option<DateTime<Utc>>,
    /// Page size (`0` = no limit).
    pub num_values_per_node: u32,
    /// Whether bounding values are requested.
    pub return_bounds: bool,
    /// Whether modified values are requested.
    pub is_read_modified: bool,
}

impl ReadRawModifiedDetails {
    /// Creates a read over `[start, end]` (or `[end, start]` backwards).
    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start_time: Some(start),
            end_time: Some(end),
            ..Default::default()
        }
    }

    /// Creates a read from `start` onwards.
    pub fn starting_at(start: DateTime<Utc>) -> Self {
        Self {
            start_time: Some(start),
            ..Default::default()
        }
    }

    /// Creates a read backwards from `end`.
    pub fn ending_at(end: DateTime<Utc>) -> Self {
        Self {
            end_time: Some(end),
            ..Default::default()
        }
    }

    /// Sets the page size.
    pub fn with_num_values(mut self, num_values_per_node: u32) -> Self {
        self.num_values_per_node = num_values_per_node;
        self
    }

    /// Requests bounding values.
    pub fn with_return_bounds(mut self, return_bounds: bool) -> Self {
        self.return_bounds = return_bounds;
        self
    }

    /// Requests modified values instead of raw ones.
    pub fn read_modified(mut self) -> Self {
        self.is_read_modified = true;
        self
    }

    /// Returns `true` if at least two constraints are usable.
    pub fn is_valid(&self) -> bool {
        let constraints = [
            self.start_time.is_some(),
            self.end_time.is_some(),
            self.num_values_per_node > 0,
        ];
        constraints.iter().filter(|c| **c).count() >= 2
    }

    /// Returns the iteration direction implied by the bounds.
    pub fn direction(&self) -> ReadDirection {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) if start > end => ReadDirection::Backward,
            (None, Some(_)) => ReadDirection::Backward,
            _ => ReadDirection::Forward,
        }
    }
}

/// The kind of history read requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HistoryReadDetails {
    /// Raw or modified values.
    ReadRaw(ReadRawModifiedDetails),
    /// Event history.
    ReadEvent,
    /// Aggregated values.
    ReadProcessed,
    /// Values at specific times.
    ReadAtTime,
}

impl HistoryReadDetails {
    /// Returns the kind as a string for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            HistoryReadDetails::ReadRaw(d) if d.is_read_modified => "read_modified",
            HistoryReadDetails::ReadRaw(_) => "read_raw",
            HistoryReadDetails::ReadEvent => "read_event",
            HistoryReadDetails::ReadProcessed => "read_processed",
            HistoryReadDetails::ReadAtTime => "read_at_time",
        }
    }
}

impl From<ReadRawModifiedDetails> for HistoryReadDetails {
    fn from(details: ReadRawModifiedDetails) -> Self {
        HistoryReadDetails::ReadRaw(details)
    }
}

/// Caller context of a history read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryReadContext {
    /// Session issuing the read.
    pub session_id: SessionId,
}

impl HistoryReadContext {
    /// Creates a context for a session.
    pub fn new(session_id: SessionId) -> Self {
        Self { session_id }
    }
}

/// Per-node continuation options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryReadOptions {
    /// Token returned by a previous page.
    pub continuation_point: Option<ContinuationPoint>,
    /// Release the token instead of resuming.
    pub release_continuation_points: bool,
}

impl HistoryReadOptions {
    /// Options resuming from a token.
    pub fn resume(continuation_point: ContinuationPoint) -> Self {
        Self {
            continuation_point: Some(continuation_point),
            release_continuation_points: false,
        }
    }

    /// Options releasing a token.
    pub fn release(continuation_point: ContinuationPoint) -> Self {
        Self {
            continuation_point: Some(continuation_point),
            release_continuation_points: true,
        }
    }
}

// =============================================================================
// Result Types
// =============================================================================

/// Values returned for one node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryData {
    /// Values in emission order.
    pub data_values: Vec<DataValue>,
}

/// Outcome of a history read for one node.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryReadResult {
    /// Outcome status.
    pub status_code: StatusCode,
    /// Returned values.
    pub history_data: HistoryData,
    /// Token for the next page, if values remain.
    pub continuation_point: Option<ContinuationPoint>,
}

impl HistoryReadResult {
    /// Creates a good result.
    pub fn good(data_values: Vec<DataValue>, continuation_point: Option<ContinuationPoint>) -> Self {
        Self {
            status_code: StatusCode::GOOD,
            history_data: HistoryData { data_values },
            continuation_point,
        }
    }

    /// Creates a result without data.
    pub fn status(status_code: StatusCode) -> Self {
        Self {
            status_code,
            history_data: HistoryData::default(),
            continuation_point: None,
        }
    }

    /// Returns the returned values.
    pub fn values(&self) -> &[DataValue] {
        &self.history_data.data_values
    }

    /// Returns `true` if more pages are pending.
    pub fn has_more(&self) -> bool {
        self.continuation_point.is_some()
    }
}

// =============================================================================
// HistoryReadOrchestrator
// =============================================================================

/// Serves raw history reads against an archive.
#[derive(Debug, Clone)]
pub struct HistoryReadOrchestrator {
    continuation_points: Arc<ContinuationPointManager>,
}

impl HistoryReadOrchestrator {
    /// Creates an orchestrator over a continuation point store.
    pub fn new(continuation_points: Arc<ContinuationPointManager>) -> Self {
        Self {
            continuation_points,
        }
    }

    /// Returns the continuation point store.
    pub fn continuation_points(&self) -> &Arc<ContinuationPointManager> {
        &self.continuation_points
    }

    /// Reads history for one node.
    ///
    /// `index_range` and `data_encoding` are accepted and ignored;
    /// `return_bounds` is accepted and no bounding values are produced.
    #[allow(clippy::too_many_arguments)]
    pub fn read(
        &self,
        ctx: &HistoryReadContext,
        node_id: &NodeId,
        archive: &dyn HistoricalArchive,
        details: &HistoryReadDetails,
        _index_range: Option<&str>,
        _data_encoding: Option<&QualifiedName>,
        options: &HistoryReadOptions,
    ) -> HistoryReadResult {
        let raw = match details {
            HistoryReadDetails::ReadRaw(raw) if !raw.is_read_modified => raw,
            _ => {
                debug!(node_id = %node_id, kind = details.kind(), "Unsupported history read");
                return HistoryReadResult::status(StatusCode::BAD_HISTORY_OPERATION_UNSUPPORTED);
            }
        };

        if !raw.is_valid() {
            debug!(node_id = %node_id, "History read with fewer than two constraints");
            return HistoryReadResult::status(StatusCode::BAD_HISTORY_OPERATION_UNSUPPORTED);
        }

        match &options.continuation_point {
            Some(token) => self.resume(ctx, node_id, token, options.release_continuation_points),
            None if options.release_continuation_points => HistoryReadResult::good(Vec::new(), None),
            None => self.scan(ctx, node_id, archive, raw),
        }
    }

    fn scan(
        &self,
        ctx: &HistoryReadContext,
        node_id: &NodeId,
        archive: &dyn HistoricalArchive,
        details: &ReadRawModifiedDetails,
    ) -> HistoryReadResult {
        let direction = details.direction();
        let mut candidates = archive.slice(details.start_time, details.end_time);
        if direction == ReadDirection::Backward {
            candidates.reverse();
        }

        debug!(
            node_id = %node_id,
            direction = direction.as_str(),
            candidates = candidates.len(),
            num_values_per_node = details.num_values_per_node,
            "Scanning online archive"
        );

        self.emit(ctx, node_id, candidates, direction, details.num_values_per_node)
    }

    fn resume(
        &self,
        ctx: &HistoryReadContext,
        node_id: &NodeId,
        token: &ContinuationPoint,
        release: bool,
    ) -> HistoryReadResult {
        let state = match self.continuation_points.pop(ctx.session_id, token) {
            Ok(state) => state,
            Err(e) => {
                debug!(node_id = %node_id, error = %e, "Rejecting continuation point");
                return HistoryReadResult::status(StatusCode::BAD_CONTINUATION_POINT_INVALID);
            }
        };

        if &state.node_id != node_id {
            debug!(
                continuation_point = %token,
                expected = %state.node_id,
                actual = %node_id,
                "Continuation point presented for another node"
            );
            return HistoryReadResult::status(StatusCode::BAD_CONTINUATION_POINT_INVALID);
        }

        if release {
            return HistoryReadResult::good(Vec::new(), None);
        }

        self.emit(ctx, node_id, state.remaining, state.direction, state.page_size)
    }

    fn emit(
        &self,
        ctx: &HistoryReadContext,
        node_id: &NodeId,
        mut values: Vec<DataValue>,
        direction: ReadDirection,
        page_size: u32,
    ) -> HistoryReadResult {
        let page_size = page_size as usize;
        if page_size == 0 || values.len() <= page_size {
            return HistoryReadResult::good(values, None);
        }

        let remaining = values.split_off(page_size);
        let state = ContinuationState::new(node_id.clone(), remaining, direction, page_size as u32);
        let token = self.continuation_points.create(ctx.session_id, state);

        HistoryReadResult::good(values, Some(token))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ring_buffer::RingBufferArchive;
    use crate::traits::ArchiveConfig;
    use chrono::{Duration, TimeZone};

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    struct Fixture {
        orchestrator: HistoryReadOrchestrator,
        archive: RingBufferArchive,
        node: NodeId,
        ctx: HistoryReadContext,
    }

    impl Fixture {
        fn new() -> Self {
            let archive = RingBufferArchive::new(ArchiveConfig::unbounded());
            for i in 0..7 {
                archive.push(DataValue::good(i as f64, ts(i * 60))).unwrap();
            }
            Self {
                orchestrator: HistoryReadOrchestrator::new(Arc::new(ContinuationPointManager::default())),
                archive,
                node: NodeId::string(2, "Series"),
                ctx: HistoryReadContext::new(SessionId::new()),
            }
        }

        fn read(&self, details: ReadRawModifiedDetails, options: HistoryReadOptions) -> HistoryReadResult {
            self.orchestrator.read(
                &self.ctx,
                &self.node,
                &self.archive,
                &HistoryReadDetails::from(details),
                None,
                None,
                &options,
            )
        }
    }

    fn secs(result: &HistoryReadResult) -> Vec<i64> {
        result
            .values()
            .iter()
            .map(|v| (v.source_timestamp - ts(0)).num_seconds())
            .collect()
    }

    #[test]
    fn test_details_validity() {
        assert!(ReadRawModifiedDetails::between(ts(0), ts(1)).is_valid());
        assert!(ReadRawModifiedDetails::starting_at(ts(0)).with_num_values(1).is_valid());
        assert!(!ReadRawModifiedDetails::starting_at(ts(0)).is_valid());
        assert!(!ReadRawModifiedDetails::default().with_num_values(10).is_valid());
    }

    #[test]
    fn test_details_direction() {
        assert_eq!(ReadRawModifiedDetails::between(ts(0), ts(1)).direction(), ReadDirection::Forward);
        assert_eq!(ReadRawModifiedDetails::between(ts(1), ts(0)).direction(), ReadDirection::Backward);
        assert_eq!(ReadRawModifiedDetails::starting_at(ts(0)).direction(), ReadDirection::Forward);
        assert_eq!(ReadRawModifiedDetails::ending_at(ts(0)).direction(), ReadDirection::Backward);
    }

    #[test]
    fn test_forward_paging() {
        let f = Fixture::new();
        let details = ReadRawModifiedDetails::between(ts(-3600), ts(3600)).with_num_values(3);

        let page1 = f.read(details.clone(), HistoryReadOptions::default());
        assert_eq!(page1.status_code, StatusCode::GOOD);
        assert_eq!(secs(&page1), vec![0, 60, 120]);

        let page2 = f.read(details.clone(), HistoryReadOptions::resume(page1.continuation_point.unwrap()));
        assert_eq!(secs(&page2), vec![180, 240, 300]);
        let token2 = page2.continuation_point.clone().unwrap();

        let page3 = f.read(details.clone(), HistoryReadOptions::resume(token2.clone()));
        assert_eq!(secs(&page3), vec![360]);
        assert!(page3.continuation_point.is_none());

        let reused = f.read(details, HistoryReadOptions::resume(token2));
        assert_eq!(reused.status_code, StatusCode::BAD_CONTINUATION_POINT_INVALID);
        assert!(reused.values().is_empty());
        assert!(reused.continuation_point.is_none());
    }

    #[test]
    fn test_backward_paging() {
        let f = Fixture::new();
        let details = ReadRawModifiedDetails::between(ts(0) + Duration::days(365), ts(0) - Duration::days(365))
            .with_num_values(3);

        let page1 = f.read(details.clone(), HistoryReadOptions::default());
        assert_eq!(secs(&page1), vec![360, 300, 240]);

        let page2 = f.read(details.clone(), HistoryReadOptions::resume(page1.continuation_point.unwrap()));
        assert_eq!(secs(&page2), vec![180, 120, 60]);

        let page3 = f.read(details, HistoryReadOptions::resume(page2.continuation_point.unwrap()));
        assert_eq!(secs(&page3), vec![0]);
        assert!(!page3.has_more());
    }

    #[test]
    fn test_single_bound_probes() {
        let f = Fixture::new();

        let earliest = f.read(
            ReadRawModifiedDetails::starting_at(ts(-3600)).with_num_values(1),
            HistoryReadOptions::default(),
        );
        assert_eq!(secs(&earliest), vec![0]);
        assert!(earliest.has_more());

        let latest = f.read(
            ReadRawModifiedDetails::ending_at(ts(0) + Duration::days(1)).with_num_values(1),
            HistoryReadOptions::default(),
        );
        assert_eq!(secs(&latest), vec![360]);
    }

    #[test]
    fn test_unbounded_page() {
        let f = Fixture::new();
        let result = f.read(ReadRawModifiedDetails::between(ts(60), ts(180)), HistoryReadOptions::default());
        assert_eq!(secs(&result), vec![60, 120, 180]);
        assert!(!result.has_more());
    }

    #[test]
    fn test_insufficient_constraints() {
        let f = Fixture::new();

        let none = f.read(ReadRawModifiedDetails::default().with_num_values(5), HistoryReadOptions::default());
        assert_eq!(none.status_code, StatusCode::BAD_HISTORY_OPERATION_UNSUPPORTED);

        let only_end = f.read(ReadRawModifiedDetails::ending_at(ts(600)), HistoryReadOptions::default());
        assert_eq!(only_end.status_code, StatusCode::BAD_HISTORY_OPERATION_UNSUPPORTED);
        assert!(only_end.values().is_empty());
    }

    #[test]
    fn test_unsupported_kinds() {
        let f = Fixture::new();
        for details in [
            HistoryReadDetails::ReadEvent,
            HistoryReadDetails::ReadProcessed,
            HistoryReadDetails::ReadAtTime,
            ReadRawModifiedDetails::between(ts(0), ts(60)).read_modified().into(),
        ] {
            let result = f.orchestrator.read(
                &f.ctx,
                &f.node,
                &f.archive,
                &details,
                None,
                None,
                &HistoryReadOptions::default(),
            );
            assert_eq!(result.status_code, StatusCode::BAD_HISTORY_OPERATION_UNSUPPORTED);
        }
    }

    #[test]
    fn test_release_continuation_point() {
        let f = Fixture::new();
        let details = ReadRawModifiedDetails::between(ts(0), ts(360)).with_num_values(2);

        let page1 = f.read(details.clone(), HistoryReadOptions::default());
        let token = page1.continuation_point.unwrap();

        let released = f.read(details.clone(), HistoryReadOptions::release(token.clone()));
        assert_eq!(released.status_code, StatusCode::GOOD);
        assert!(released.values().is_empty());
        assert!(f.orchestrator.continuation_points().is_empty());

        let resumed = f.read(details, HistoryReadOptions::resume(token));
        assert_eq!(resumed.status_code, StatusCode::BAD_CONTINUATION_POINT_INVALID);
    }

    #[test]
    fn test_token_for_other_node() {
        let f = Fixture::new();
        let details = ReadRawModifiedDetails::between(ts(0), ts(360)).with_num_values(2);
        let token = f.read(details.clone(), HistoryReadOptions::default()).continuation_point.unwrap();

        let result = f.orchestrator.read(
            &f.ctx,
            &NodeId::string(2, "Other"),
            &f.archive,
            &HistoryReadDetails::from(details),
            None,
            None,
            &HistoryReadOptions::resume(token),
        );
        assert_eq!(result.status_code, StatusCode::BAD_CONTINUATION_POINT_INVALID);
    }

    #[test]
    fn test_empty_range() {
        let f = Fixture::new();
        let result = f.read(
            ReadRawModifiedDetails::between(ts(10_000), ts(20_000)).with_num_values(3),
            HistoryReadOptions::default(),
        );
        assert_eq!(result.status_code, StatusCode::GOOD);
        assert!(result.values().is_empty());
        assert!(!result.has_more());
    }
}
