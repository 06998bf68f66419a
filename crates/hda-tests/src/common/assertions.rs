// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Custom Test Assertions
//!
//! Timestamps are compared as second offsets from [`TimeFixtures::t0`].

use hda_archive::{HistoricalArchive, HistoryReadResult};
use hda_core::{DataValue, StatusCode};

use super::fixtures::TimeFixtures;

/// Second offsets of `values` from `t0`.
pub fn offsets(values: &[DataValue]) -> Vec<i64> {
    values
        .iter()
        .map(|v| TimeFixtures::offset_of(v.source_timestamp))
        .collect()
}

// =============================================================================
// HistoryReadResult Assertions
// =============================================================================

/// Assertion extensions for a single [`HistoryReadResult`].
pub trait HistoryResultAssertions {
    /// Assert a `Good` status.
    fn assert_good(&self);

    /// Assert a specific status and no data.
    fn assert_rejected(&self, expected: StatusCode);

    /// Assert the returned timestamps, as offsets from `t0`.
    fn assert_timestamps(&self, expected: &[i64]);

    /// Assert a continuation point was returned.
    fn assert_has_more(&self);

    /// Assert no continuation point was returned.
    fn assert_complete(&self);
}

impl HistoryResultAssertions for HistoryReadResult {
    fn assert_good(&self) {
        assert!(
            self.status_code.is_good(),
            "Expected Good, but got {}",
            self.status_code
        );
    }

    fn assert_rejected(&self, expected: StatusCode) {
        assert_eq!(
            self.status_code, expected,
            "Expected {}, but got {}",
            expected, self.status_code
        );
        assert!(
            self.values().is_empty(),
            "Expected no data with {}, but got {} values",
            expected,
            self.values().len()
        );
        assert!(self.continuation_point.is_none(), "Unexpected continuation point");
    }

    fn assert_timestamps(&self, expected: &[i64]) {
        assert_eq!(
            offsets(self.values()),
            expected,
            "Returned timestamps (seconds from t0) differ"
        );
    }

    fn assert_has_more(&self) {
        assert!(
            self.continuation_point.is_some(),
            "Expected a continuation point after {:?}",
            offsets(self.values())
        );
    }

    fn assert_complete(&self) {
        assert!(
            self.continuation_point.is_none(),
            "Expected the last page, but a continuation point was returned after {:?}",
            offsets(self.values())
        );
    }
}

// =============================================================================
// Page Assertions
// =============================================================================

/// Assertion extensions for the pages of a paged read.
pub trait PageAssertions {
    /// Assert every page is good and the timestamps of each page.
    fn assert_page_timestamps(&self, expected: &[&[i64]]);
}

impl PageAssertions for [HistoryReadResult] {
    fn assert_page_timestamps(&self, expected: &[&[i64]]) {
        let actual: Vec<Vec<i64>> = self.iter().map(|page| offsets(page.values())).collect();
        let expected: Vec<Vec<i64>> = expected.iter().map(|page| page.to_vec()).collect();
        assert_eq!(actual, expected, "Page timestamps (seconds from t0) differ");

        for (index, page) in self.iter().enumerate() {
            assert!(page.status_code.is_good(), "Page {} is {}", index, page.status_code);
            let is_last = index + 1 == self.len();
            assert_eq!(
                page.continuation_point.is_none(),
                is_last,
                "Page {} continuation point mismatch",
                index
            );
        }
    }
}

impl PageAssertions for Vec<HistoryReadResult> {
    fn assert_page_timestamps(&self, expected: &[&[i64]]) {
        self.as_slice().assert_page_timestamps(expected)
    }
}

// =============================================================================
// Archive Assertions
// =============================================================================

/// Assertion extensions for archives.
pub trait ArchiveAssertions {
    /// Assert the stored timestamps, as offsets from `t0`.
    fn assert_timestamps(&self, expected: &[i64]);

    /// Assert values are in non-decreasing timestamp order.
    fn assert_ordered(&self);
}

impl<A: HistoricalArchive + ?Sized> ArchiveAssertions for A {
    fn assert_timestamps(&self, expected: &[i64]) {
        assert_eq!(
            offsets(&self.slice(None, None)),
            expected,
            "Archived timestamps (seconds from t0) differ"
        );
    }

    fn assert_ordered(&self) {
        let values = self.slice(None, None);
        for pair in values.windows(2) {
            assert!(
                pair[0].source_timestamp <= pair[1].source_timestamp,
                "Archive out of order: {} before {}",
                pair[0].source_timestamp,
                pair[1].source_timestamp
            );
        }
    }
}
