// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # HDA Integration Tests
//!
//! Test support and integration suites for the HDA historian.
//!
//! ## Module Structure
//!
//! - [`common`]: Shared test utilities
//!   - `fixtures`: Timestamps, variables, value series and config texts
//!   - `assertions`: Assertion traits for history results and archives
//!   - `harness`: A server with one historized variable, and a concurrent task runner
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p hda-tests
//! cargo test -p hda-tests --test integration_archive
//! cargo test -p hda-tests --test integration_history_read
//! cargo test -p hda-tests --test integration_config
//! ```
//!
//! ## Writing New Tests
//!
//! ```rust,ignore
//! use hda_tests::prelude::*;
//!
//! #[test]
//! fn test_something() {
//!     let harness = HistoryHarness::with_series(7, 60);
//!     let pages = harness.read_all(&ReadFixtures::forward_all(3));
//!     pages.assert_page_timestamps(&[&[0, 60, 120], &[180, 240, 300], &[360]]);
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod common;

/// Re-export commonly used items for convenience.
pub mod prelude {
    pub use crate::common::assertions::*;
    pub use crate::common::fixtures::*;
    pub use crate::common::harness::*;
}
