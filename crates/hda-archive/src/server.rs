// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! History server facade.
//!
//! [`HistoryServer`] owns the historized variables of an address space,
//! keyed by [`NodeId`], and serves HistoryRead requests against them.
//!
//! ```text
//!                   ┌──────────────────────────────────────────────┐
//!   HistoryRead ──► │ HistoryServer                                │
//!                   │   variables: DashMap<NodeId, HistorizedVar>  │
//!                   │   orchestrator ──► ContinuationPointManager  │
//!                   │   metrics                                    │
//!                   └──────────────────────────────────────────────┘
//! ```
//!
//! Transport layers talk to it through the async [`HistoryReadService`]
//! trait.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use hda_archive::{
//!     HistoryReadContext, HistoryReadOptions, HistoryServer, HistoryServerConfig,
//!     ReadRawModifiedDetails,
//! };
//! use hda_core::types::{DataValue, NodeId, SessionId};
//! use hda_core::variable::Variable;
//! use chrono::{Duration, Utc};
//!
//! let server = HistoryServer::new(HistoryServerConfig::default());
//! let variable = Arc::new(Variable::new(NodeId::string(2, "Speed"), "Speed"));
//! server.install(&variable, None).unwrap();
//! variable.set_value(DataValue::now(42.0));
//!
//! let ctx = HistoryReadContext::new(SessionId::new());
//! let details = ReadRawModifiedDetails::between(Utc::now() - Duration::hours(1), Utc::now());
//! let result = server.history_read(
//!     &ctx,
//!     variable.node_id(),
//!     &details.into(),
//!     None,
//!     None,
//!     &HistoryReadOptions::default(),
//! );
//! assert_eq!(result.values().len(), 1);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::info;

use hda_core::error::ArchiveError;
use hda_core::types::{NodeId, QualifiedName, SessionId, StatusCode};
use hda_core::variable::Variable;

use crate::binding::HistorizedVariable;
use crate::continuation::{
    ContinuationPoint, ContinuationPointManager, DEFAULT_MAX_CONTINUATION_POINTS_PER_SESSION,
};
use crate::history_read::{
    HistoryReadContext, HistoryReadDetails, HistoryReadOptions, HistoryReadOrchestrator,
    HistoryReadResult,
};
use crate::metrics::HistoryMetricsCollector;
use crate::ring_buffer::RingBufferArchive;
use crate::traits::{ArchiveConfig, ArchiveStats};

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the history server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryServerConfig {
    /// Server name (for logging).
    #[serde(default = "default_name")]
    pub name: String,

    /// Continuation point limit per session (`0` = unbounded).
    #[serde(default = "default_max_continuation_points_per_session")]
    pub max_continuation_points_per_session: usize,

    /// Archive configuration for variables installed without one.
    #[serde(default)]
    pub default_archive: ArchiveConfig,

    /// Whether Prometheus metrics are recorded.
    #[serde(default)]
    pub metrics_enabled: bool,
}

fn default_name() -> String {
    "hda".to_string()
}

fn default_max_continuation_points_per_session() -> usize {
    DEFAULT_MAX_CONTINUATION_POINTS_PER_SESSION
}

impl Default for HistoryServerConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            max_continuation_points_per_session: default_max_continuation_points_per_session(),
            default_archive: ArchiveConfig::default(),
            metrics_enabled: false,
        }
    }
}

impl HistoryServerConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> HistoryServerConfigBuilder {
        HistoryServerConfigBuilder::default()
    }

    /// Creates a configuration for testing.
    pub fn for_testing() -> Self {
        Self {
            name: "hda-test".to_string(),
            max_continuation_points_per_session: 10,
            default_archive: ArchiveConfig::for_testing(),
            metrics_enabled: false,
        }
    }
}

/// Builder for HistoryServerConfig.
#[derive(Debug, Default)]
pub struct HistoryServerConfigBuilder {
    config: HistoryServerConfig,
}

impl HistoryServerConfigBuilder {
    /// Sets the server name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    /// Sets the continuation point limit per session.
    pub fn max_continuation_points_per_session(mut self, max: usize) -> Self {
        self.config.max_continuation_points_per_session = max;
        self
    }

    /// Sets the default archive configuration.
    pub fn default_archive(mut self, config: ArchiveConfig) -> Self {
        self.config.default_archive = config;
        self
    }

    /// Enables or disables metrics.
    pub fn metrics_enabled(mut self, enabled: bool) -> Self {
        self.config.metrics_enabled = enabled;
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> HistoryServerConfig {
        self.config
    }
}

// =============================================================================
// Request Types
// =============================================================================

/// One node of a batched history read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryReadValueId {
    /// Node to read.
    pub node_id: NodeId,
    /// Index range (ignored).
    pub index_range: Option<String>,
    /// Data encoding (ignored).
    pub data_encoding: Option<QualifiedName>,
    /// Token returned by a previous page for this node.
    pub continuation_point: Option<ContinuationPoint>,
}

impl HistoryReadValueId {
    /// Creates a fresh read of a node.
    pub fn new(node_id: NodeId) -> Self {
        Self {
            node_id,
            index_range: None,
            data_encoding: None,
            continuation_point: None,
        }
    }

    /// Resumes from a continuation point.
    pub fn with_continuation_point(mut self, continuation_point: ContinuationPoint) -> Self {
        self.continuation_point = Some(continuation_point);
        self
    }
}

/// A batched history read request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryReadRequest {
    /// What to read.
    pub details: HistoryReadDetails,
    /// Release the given continuation points instead of resuming.
    pub release_continuation_points: bool,
    /// Nodes to read.
    pub nodes_to_read: Vec<HistoryReadValueId>,
}

// =============================================================================
// Service Trait
// =============================================================================

/// HistoryRead service as seen by a transport layer.
#[async_trait]
pub trait HistoryReadService: Send + Sync {
    /// Serves a batched history read; one result per node, in order.
    async fn history_read(
        &self,
        ctx: &HistoryReadContext,
        request: HistoryReadRequest,
    ) -> Vec<HistoryReadResult>;

    /// Drops the session's continuation points.
    async fn close_session(&self, session: SessionId);
}

// =============================================================================
// Statistics
// =============================================================================

/// Snapshot of server statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryServerStats {
    /// Installed historizing bindings.
    pub historized_variables: usize,
    /// Outstanding continuation points.
    pub active_continuation_points: usize,
    /// Sessions holding continuation points.
    pub sessions_with_continuation_points: usize,
    /// History reads served (per node).
    pub history_reads: u64,
    /// Totals over every archive.
    pub archive: ArchiveStats,
}

// =============================================================================
// HistoryServer
// =============================================================================

/// Registry of historized variables serving HistoryRead.
#[derive(Debug)]
pub struct HistoryServer {
    config: HistoryServerConfig,
    variables: DashMap<NodeId, Arc<HistorizedVariable>>,
    orchestrator: HistoryReadOrchestrator,
    metrics: HistoryMetricsCollector,
    history_reads: AtomicU64,
}

impl HistoryServer {
    /// Creates a server.
    pub fn new(config: HistoryServerConfig) -> Self {
        let continuation_points = Arc::new(ContinuationPointManager::new(
            config.max_continuation_points_per_session,
        ));
        let metrics = HistoryMetricsCollector::new(config.metrics_enabled);

        info!(
            name = %config.name,
            max_continuation_points_per_session = config.max_continuation_points_per_session,
            metrics_enabled = config.metrics_enabled,
            "History server created"
        );

        Self {
            config,
            variables: DashMap::new(),
            orchestrator: HistoryReadOrchestrator::new(continuation_points),
            metrics,
            history_reads: AtomicU64::new(0),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &HistoryServerConfig {
        &self.config
    }

    /// Returns the continuation point store.
    pub fn continuation_points(&self) -> &Arc<ContinuationPointManager> {
        self.orchestrator.continuation_points()
    }

    /// Historizes a variable.
    ///
    /// `config` defaults to the server's `default_archive`.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::AlreadyInstalled`] if the node is already
    /// historized.
    pub fn install(
        &self,
        variable: &Arc<Variable>,
        config: Option<ArchiveConfig>,
    ) -> Result<Arc<HistorizedVariable>, ArchiveError> {
        let config = config.unwrap_or_else(|| self.config.default_archive.clone());

        let historized = match self.variables.entry(variable.node_id().clone()) {
            Entry::Occupied(_) => {
                return Err(ArchiveError::already_installed(variable.node_id().to_string()))
            }
            Entry::Vacant(slot) => {
                let archive = RingBufferArchive::new(config).with_metrics(self.metrics.clone());
                let historized = HistorizedVariable::install_with_archive(variable, Arc::new(archive))?;
                slot.insert(Arc::clone(&historized));
                historized
            }
        };

        self.metrics.set_historized_variables(self.variables.len());
        Ok(historized)
    }

    /// Removes and disposes a variable's binding.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::NotInstalled`] if the node is not historized.
    pub fn uninstall(&self, node_id: &NodeId) -> Result<(), ArchiveError> {
        let (_, historized) = self
            .variables
            .remove(node_id)
            .ok_or_else(|| ArchiveError::not_installed(node_id.to_string()))?;
        historized.dispose();
        self.metrics.set_historized_variables(self.variables.len());
        Ok(())
    }

    /// Looks up a historized variable.
    pub fn get(&self, node_id: &NodeId) -> Option<Arc<HistorizedVariable>> {
        self.variables.get(node_id).map(|entry| Arc::clone(entry.value()))
    }

    /// Returns the historized node ids, sorted.
    pub fn node_ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.variables.iter().map(|entry| entry.key().clone()).collect();
        ids.sort();
        ids
    }

    /// Returns the number of historized variables.
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    /// Returns `true` if no variable is historized.
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Reads history for one node.
    ///
    /// Unknown nodes yield `BadNodeIdUnknown`.
    pub fn history_read(
        &self,
        ctx: &HistoryReadContext,
        node_id: &NodeId,
        details: &HistoryReadDetails,
        index_range: Option<&str>,
        data_encoding: Option<&QualifiedName>,
        options: &HistoryReadOptions,
    ) -> HistoryReadResult {
        let result = match self.get(node_id) {
            Some(historized) => self.orchestrator.read(
                ctx,
                node_id,
                historized.archive().as_ref(),
                details,
                index_range,
                data_encoding,
                options,
            ),
            None => HistoryReadResult::status(StatusCode::BAD_NODE_ID_UNKNOWN),
        };

        self.history_reads.fetch_add(1, Ordering::Relaxed);
        self.metrics.record_history_read(result.status_code, result.values().len());
        self.metrics
            .set_active_continuation_points(self.continuation_points().len());

        result
    }

    /// Reads history for several nodes; one result per node, in order.
    pub fn history_read_many(
        &self,
        ctx: &HistoryReadContext,
        nodes_to_read: &[HistoryReadValueId],
        details: &HistoryReadDetails,
        release_continuation_points: bool,
    ) -> Vec<HistoryReadResult> {
        nodes_to_read
            .iter()
            .map(|node| {
                let options = HistoryReadOptions {
                    continuation_point: node.continuation_point.clone(),
                    release_continuation_points,
                };
                self.history_read(
                    ctx,
                    &node.node_id,
                    details,
                    node.index_range.as_deref(),
                    node.data_encoding.as_ref(),
                    &options,
                )
            })
            .collect()
    }

    /// Drops a session's continuation points. Returns how many were dropped.
    pub fn close_session(&self, session: SessionId) -> usize {
        let dropped = self.continuation_points().close_session(session);
        self.metrics
            .set_active_continuation_points(self.continuation_points().len());
        dropped
    }

    /// Uninstalls every variable and drops every continuation point.
    pub fn dispose(&self) {
        let node_ids = self.node_ids();
        for node_id in &node_ids {
            if let Some((_, historized)) = self.variables.remove(node_id) {
                historized.dispose();
            }
        }
        self.continuation_points().clear();

        self.metrics.set_historized_variables(0);
        self.metrics.set_active_continuation_points(0);
        info!(name = %self.config.name, variables = node_ids.len(), "History server disposed");
    }

    /// Returns a statistics snapshot.
    pub fn stats(&self) -> HistoryServerStats {
        let mut archive = ArchiveStats::default();
        for entry in self.variables.iter() {
            archive.accumulate(&entry.value().stats());
        }

        HistoryServerStats {
            historized_variables: self.variables.len(),
            active_continuation_points: self.continuation_points().len(),
            sessions_with_continuation_points: self.continuation_points().session_count(),
            history_reads: self.history_reads.load(Ordering::Relaxed),
            archive,
        }
    }
}

impl Default for HistoryServer {
    fn default() -> Self {
        Self::new(HistoryServerConfig::default())
    }
}

#[async_trait]
impl HistoryReadService for HistoryServer {
    async fn history_read(
        &self,
        ctx: &HistoryReadContext,
        request: HistoryReadRequest,
    ) -> Vec<HistoryReadResult> {
        self.history_read_many(
            ctx,
            &request.nodes_to_read,
            &request.details,
            request.release_continuation_points,
        )
    }

    async fn close_session(&self, session: SessionId) {
        HistoryServer::close_session(self, session);
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history_read::ReadRawModifiedDetails;
    use chrono::{DateTime, TimeZone, Utc};
    use hda_core::types::DataValue;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn variable(name: &str) -> Arc<Variable> {
        Arc::new(Variable::new(NodeId::string(2, name), name))
    }

    fn server_with(names: &[&str], samples: i64) -> (HistoryServer, Vec<Arc<Variable>>) {
        let server = HistoryServer::new(HistoryServerConfig::for_testing());
        let variables: Vec<_> = names.iter().map(|n| variable(n)).collect();
        for var in &variables {
            server.install(var, Some(ArchiveConfig::unbounded())).unwrap();
            for i in 0..samples {
                var.set_value(DataValue::good(i as f64, ts(i * 60)));
            }
        }
        (server, variables)
    }

    fn details(num: u32) -> HistoryReadDetails {
        ReadRawModifiedDetails::between(ts(-60), ts(100_000))
            .with_num_values(num)
            .into()
    }

    #[test]
    fn test_install_and_get() {
        let (server, vars) = server_with(&["A", "B"], 0);
        assert_eq!(server.len(), 2);
        assert!(server.get(vars[0].node_id()).is_some());
        assert_eq!(
            server.node_ids(),
            vec![NodeId::string(2, "A"), NodeId::string(2, "B")]
        );
    }

    #[test]
    fn test_install_twice_fails() {
        let (server, vars) = server_with(&["A"], 0);
        let result = server.install(&vars[0], None);
        assert!(matches!(result, Err(ArchiveError::AlreadyInstalled { .. })));
    }

    #[test]
    fn test_install_uses_default_archive() {
        let server = HistoryServer::new(HistoryServerConfig::for_testing());
        let var = variable("A");
        let historized = server.install(&var, None).unwrap();
        assert_eq!(historized.max_online_values(), 10);
    }

    #[test]
    fn test_uninstall() {
        let (server, vars) = server_with(&["A"], 3);
        server.uninstall(vars[0].node_id()).unwrap();

        assert!(server.is_empty());
        assert_eq!(vars[0].listener_count(), 0);
        assert!(matches!(
            server.uninstall(vars[0].node_id()),
            Err(ArchiveError::NotInstalled { .. })
        ));
    }

    #[test]
    fn test_history_read_unknown_node() {
        let server = HistoryServer::default();
        let ctx = HistoryReadContext::new(SessionId::new());
        let result = server.history_read(
            &ctx,
            &NodeId::numeric(9, 9),
            &details(0),
            None,
            None,
            &HistoryReadOptions::default(),
        );
        assert_eq!(result.status_code, StatusCode::BAD_NODE_ID_UNKNOWN);
    }

    #[test]
    fn test_history_read_many() {
        let (server, vars) = server_with(&["A", "B"], 5);
        let ctx = HistoryReadContext::new(SessionId::new());
        let nodes = vec![
            HistoryReadValueId::new(vars[0].node_id().clone()),
            HistoryReadValueId::new(NodeId::string(2, "Missing")),
            HistoryReadValueId::new(vars[1].node_id().clone()),
        ];

        let results = server.history_read_many(&ctx, &nodes, &details(2), false);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].values().len(), 2);
        assert!(results[0].has_more());
        assert_eq!(results[1].status_code, StatusCode::BAD_NODE_ID_UNKNOWN);
        assert_eq!(results[2].values().len(), 2);

        let resumed = vec![
            HistoryReadValueId::new(vars[0].node_id().clone())
                .with_continuation_point(results[0].continuation_point.clone().unwrap()),
            HistoryReadValueId::new(vars[1].node_id().clone())
                .with_continuation_point(results[2].continuation_point.clone().unwrap()),
        ];
        let next = server.history_read_many(&ctx, &resumed, &details(2), false);
        assert!(next.iter().all(|r| r.values().len() == 2));
    }

    #[test]
    fn test_close_session_and_stats() {
        let (server, vars) = server_with(&["A"], 5);
        let session = SessionId::new();
        let ctx = HistoryReadContext::new(session);

        let result = server.history_read(
            &ctx,
            vars[0].node_id(),
            &details(1),
            None,
            None,
            &HistoryReadOptions::default(),
        );
        assert!(result.has_more());

        let stats = server.stats();
        assert_eq!(stats.historized_variables, 1);
        assert_eq!(stats.active_continuation_points, 1);
        assert_eq!(stats.history_reads, 1);
        assert_eq!(stats.archive.values_recorded, 5);

        assert_eq!(server.close_session(session), 1);
        assert_eq!(server.stats().active_continuation_points, 0);
    }

    #[test]
    fn test_dispose() {
        let (server, vars) = server_with(&["A", "B"], 3);
        server.dispose();

        assert!(server.is_empty());
        assert!(server.continuation_points().is_empty());
        assert!(vars.iter().all(|v| v.listener_count() == 0));
    }

    #[tokio::test]
    async fn test_service_trait() {
        let (server, vars) = server_with(&["A"], 4);
        let service: &dyn HistoryReadService = &server;
        let session = SessionId::new();
        let ctx = HistoryReadContext::new(session);

        let results = service
            .history_read(
                &ctx,
                HistoryReadRequest {
                    details: details(3),
                    release_continuation_points: false,
                    nodes_to_read: vec![HistoryReadValueId::new(vars[0].node_id().clone())],
                },
            )
            .await;
        assert_eq!(results[0].values().len(), 3);
        assert_eq!(server.continuation_points().len(), 1);

        service.close_session(session).await;
        assert!(server.continuation_points().is_empty());
    }
}
