// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Test Harness
//!
//! [`HistoryHarness`] wires a [`HistoryServer`] to one historized variable
//! and a session, so tests only describe the series and the reads.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use hda_archive::{
    ArchiveConfig, HistorizedVariable, HistoryReadContext, HistoryReadDetails,
    HistoryReadOptions, HistoryReadResult, HistoryServer, HistoryServerConfig,
};
use hda_core::{SessionId, Variable};

use super::fixtures::{SeriesFixtures, VariableFixtures};

/// Upper bound on pages followed by [`HistoryHarness::read_all`].
const MAX_PAGES: usize = 10_000;

// =============================================================================
// History Harness
// =============================================================================

/// A server with one historized variable and one session.
pub struct HistoryHarness {
    /// The server under test.
    pub server: Arc<HistoryServer>,

    /// The historized variable.
    pub variable: Arc<Variable>,

    /// The binding returned by install.
    pub historized: Arc<HistorizedVariable>,

    /// The session used by [`read`](Self::read).
    pub ctx: HistoryReadContext,
}

impl HistoryHarness {
    /// Unbounded archive, no values.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Archive keeping at most `max_online_values` (`0` = unbounded).
    pub fn with_capacity(max_online_values: usize) -> Self {
        Self::with_server_config(HistoryServerConfig::for_testing(), max_online_values)
    }

    /// Custom server configuration.
    pub fn with_server_config(config: HistoryServerConfig, max_online_values: usize) -> Self {
        let server = Arc::new(HistoryServer::new(config));
        let variable = VariableFixtures::temperature();
        let archive = ArchiveConfig::builder()
            .max_online_values(max_online_values)
            .build();
        let historized = server
            .install(&variable, Some(archive))
            .expect("Failed to install fixture variable");

        Self {
            server,
            variable,
            historized,
            ctx: HistoryReadContext::new(SessionId::new()),
        }
    }

    /// Unbounded archive holding `count` values every `step_seconds` from `t0`.
    pub fn with_series(count: usize, step_seconds: i64) -> Self {
        let harness = Self::new();
        SeriesFixtures::write(&harness.variable, count, step_seconds);
        harness
    }

    /// Reads the variable in the harness session.
    pub fn read(&self, details: &HistoryReadDetails, options: &HistoryReadOptions) -> HistoryReadResult {
        self.read_in(&self.ctx, details, options)
    }

    /// Reads the variable in another session.
    pub fn read_in(
        &self,
        ctx: &HistoryReadContext,
        details: &HistoryReadDetails,
        options: &HistoryReadOptions,
    ) -> HistoryReadResult {
        self.server
            .history_read(ctx, self.variable.node_id(), details, None, None, options)
    }

    /// Reads the first page.
    pub fn first_page(&self, details: &HistoryReadDetails) -> HistoryReadResult {
        self.read(details, &HistoryReadOptions::default())
    }

    /// Follows continuation points until the last page or a bad status.
    pub fn read_all(&self, details: &HistoryReadDetails) -> Vec<HistoryReadResult> {
        let mut pages = Vec::new();
        let mut options = HistoryReadOptions::default();

        for _ in 0..MAX_PAGES {
            let page = self.read(details, &options);
            let next = page.continuation_point.clone();
            let bad = page.status_code.is_bad();
            pages.push(page);

            match next {
                Some(token) if !bad => options = HistoryReadOptions::resume(token),
                _ => return pages,
            }
        }
        panic!("read_all did not terminate after {} pages", MAX_PAGES);
    }

    /// A context for a fresh session.
    pub fn new_session() -> HistoryReadContext {
        HistoryReadContext::new(SessionId::new())
    }

    /// Outstanding continuation points across all sessions.
    pub fn outstanding_continuation_points(&self) -> usize {
        self.server.continuation_points().len()
    }
}

impl Default for HistoryHarness {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Concurrent Test Helpers
// =============================================================================

/// Helper for testing concurrent operations.
pub struct ConcurrentTestHelper {
    /// Number of concurrent tasks.
    task_count: usize,

    /// Timeout per task.
    task_timeout: Duration,
}

impl ConcurrentTestHelper {
    /// Create a new helper.
    pub fn new(task_count: usize) -> Self {
        Self {
            task_count,
            task_timeout: Duration::from_secs(10),
        }
    }

    /// Set the task timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.task_timeout = timeout;
        self
    }

    /// Run a function concurrently and collect results.
    pub async fn run<F, Fut, T>(&self, task_fn: F) -> Vec<Result<T, String>>
    where
        F: Fn(usize) -> Fut + Send + Sync + Clone + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let mut handles = Vec::with_capacity(self.task_count);

        for i in 0..self.task_count {
            let task_fn = task_fn.clone();
            let timeout = self.task_timeout;

            handles.push(tokio::spawn(async move {
                match tokio::time::timeout(timeout, task_fn(i)).await {
                    Ok(result) => Ok(result),
                    Err(_) => Err(format!("Task {} timed out", i)),
                }
            }));
        }

        let mut results = Vec::with_capacity(self.task_count);
        for handle in handles {
            match handle.await {
                Ok(result) => results.push(result),
                Err(e) => results.push(Err(format!("Task panicked: {}", e))),
            }
        }

        results
    }

    /// Run a function concurrently and assert all succeed.
    pub async fn run_all_succeed<F, Fut, T>(&self, task_fn: F) -> Vec<T>
    where
        F: Fn(usize) -> Fut + Send + Sync + Clone + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let results = self.run(task_fn).await;
        results
            .into_iter()
            .enumerate()
            .map(|(i, r)| r.unwrap_or_else(|e| panic!("Task {} failed: {}", i, e)))
            .collect()
    }
}
