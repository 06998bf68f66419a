// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Historian runtime.
//!
//! Builds the [`HistoryServer`] from configuration, creates and historizes
//! the configured variables, and drives them from the simulated source.

use std::f64::consts::TAU;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use hda_archive::{ArchiveConfig, HistoryServer, HistoryServerConfig};
use hda_config::{load_config, HdaConfig};
use hda_core::{DataValue, NodeId, QualifiedName, Variable};

use crate::error::{BinError, BinResult};
use crate::shutdown::ShutdownCoordinator;
use crate::simulation::SignalGenerator;

// =============================================================================
// Configuration mapping
// =============================================================================

/// Maps the configuration file onto the history server settings.
pub fn server_config_from(config: &HdaConfig) -> HistoryServerConfig {
    HistoryServerConfig::builder()
        .name(config.server.name.clone())
        .max_continuation_points_per_session(config.server.max_continuation_points_per_session)
        .default_archive(
            ArchiveConfig::builder()
                .max_online_values(config.archive.max_online_values)
                .build(),
        )
        .metrics_enabled(config.metrics.enabled)
        .build()
}

// =============================================================================
// HistorianRuntime
// =============================================================================

/// A configured variable fed by the simulated source.
#[derive(Debug)]
struct SimulatedVariable {
    variable: Arc<Variable>,
    offset: f64,
    phase: f64,
}

/// The running historian: server, variables and value source.
#[derive(Debug)]
pub struct HistorianRuntime {
    config: Arc<HdaConfig>,
    server: Arc<HistoryServer>,
    sources: Vec<SimulatedVariable>,
    generator: SignalGenerator,
    shutdown: ShutdownCoordinator,
}

impl HistorianRuntime {
    /// Creates the server and installs every configured variable.
    pub fn new(config: HdaConfig) -> BinResult<Self> {
        let generator = SignalGenerator::new(&config.simulation);
        Self::with_generator(config, generator)
    }

    /// Creates the runtime with a specific value generator.
    pub fn with_generator(config: HdaConfig, generator: SignalGenerator) -> BinResult<Self> {
        let server = Arc::new(HistoryServer::new(server_config_from(&config)));
        let count = config.variables.len().max(1) as f64;

        let mut sources = Vec::with_capacity(config.variables.len());
        for (index, variable_config) in config.variables.iter().enumerate() {
            let node_id = variable_config.parsed_node_id()?;
            let name = variable_config.effective_browse_name();

            let mut variable = Variable::new(
                node_id.clone(),
                QualifiedName::new(node_id.namespace_index, name.as_str()),
            )
            .with_display_name(name.as_str());
            let offset = variable_config.initial_value.unwrap_or(0.0);
            if let Some(initial) = variable_config.initial_value {
                variable = variable.with_value(DataValue::now(initial));
            }
            let variable = Arc::new(variable);

            let archive = variable_config
                .max_online_values
                .map(|max| ArchiveConfig::builder().max_online_values(max).build());
            server
                .install(&variable, archive)
                .map_err(|e| BinError::from(e).with_context(format!("installing {}", node_id)))?;

            if !variable_config.historizing {
                variable.set_historizing(false);
            }

            debug!(
                node_id = %node_id,
                capacity = config.capacity_for(variable_config),
                historizing = variable_config.historizing,
                "Variable configured"
            );

            sources.push(SimulatedVariable {
                variable,
                offset,
                phase: TAU * index as f64 / count,
            });
        }

        Ok(Self {
            config: Arc::new(config),
            server,
            sources,
            generator,
            shutdown: ShutdownCoordinator::new(),
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &Arc<HdaConfig> {
        &self.config
    }

    /// Returns the history server.
    pub fn server(&self) -> &Arc<HistoryServer> {
        &self.server
    }

    /// Returns the shutdown coordinator.
    pub fn shutdown(&self) -> &ShutdownCoordinator {
        &self.shutdown
    }

    /// Returns the configured variables in configuration order.
    pub fn variables(&self) -> impl Iterator<Item = &Arc<Variable>> {
        self.sources.iter().map(|source| &source.variable)
    }

    /// Looks up a configured variable.
    pub fn variable(&self, node_id: &NodeId) -> Option<&Arc<Variable>> {
        self.variables().find(|v| v.node_id() == node_id)
    }

    /// Writes one sample to every variable, stamped with `timestamp`.
    pub fn tick(&mut self, timestamp: DateTime<Utc>, elapsed: Duration) {
        for source in &self.sources {
            let value = self.generator.sample(source.offset, source.phase, elapsed);
            source.variable.set_value(DataValue::good(value, timestamp));
        }
    }

    /// Writes `count` samples per variable at `start`, `start + interval`, ...
    ///
    /// Returns the number of values written. Fails before writing anything
    /// if the last timestamp would be out of range.
    pub fn record_samples(
        &mut self,
        count: usize,
        start: DateTime<Utc>,
        interval: Duration,
    ) -> BinResult<usize> {
        let step = chrono::Duration::from_std(interval)
            .map_err(|e| BinError::runtime(format!("invalid sample interval: {}", e)))?;
        let out_of_range = || {
            BinError::runtime(format!(
                "{} samples from {} run past the supported time range",
                count, start
            ))
        };

        let steps = i32::try_from(count.saturating_sub(1)).map_err(|_| out_of_range())?;
        step.checked_mul(steps)
            .and_then(|span| start.checked_add_signed(span))
            .ok_or_else(out_of_range)?;

        let mut timestamp = start;
        let mut elapsed = Duration::ZERO;
        for index in 0..count {
            if index > 0 {
                timestamp = timestamp.checked_add_signed(step).ok_or_else(out_of_range)?;
                elapsed = elapsed.saturating_add(interval);
            }
            self.tick(timestamp, elapsed);
        }

        Ok(count * self.sources.len())
    }

    /// Records simulated values until shutdown, logging stats periodically.
    ///
    /// With `duration`, shutdown is initiated after that long.
    pub async fn run(mut self, stats_interval: Duration, duration: Option<Duration>) -> BinResult<()> {
        info!(
            name = %self.config.server.name,
            variables = self.sources.len(),
            interval = %humantime::format_duration(self.config.simulation.interval),
            "Starting HDA historian v{}",
            hda_archive::VERSION
        );

        let signals = self.shutdown.clone();
        tokio::spawn(async move { signals.wait_for_shutdown().await });

        if let Some(duration) = duration {
            let timer = self.shutdown.clone();
            tokio::spawn(async move {
                tokio::time::sleep(duration).await;
                timer.initiate_shutdown();
            });
        }

        let mut shutdown_rx = self.shutdown.subscribe();
        let mut samples = tokio::time::interval(self.config.simulation.interval);
        let mut stats = tokio::time::interval(stats_interval);
        stats.tick().await;
        let started = tokio::time::Instant::now();

        loop {
            if self.shutdown.is_shutdown_initiated() {
                break;
            }
            tokio::select! {
                _ = shutdown_rx.recv() => break,
                _ = samples.tick() => {
                    let elapsed = started.elapsed();
                    self.tick(Utc::now(), elapsed);
                }
                _ = stats.tick() => self.log_stats(),
            }
        }

        info!("Shutdown initiated, cleaning up...");
        self.log_stats();
        self.server.dispose();
        info!("HDA historian shutdown complete");

        Ok(())
    }

    fn log_stats(&self) {
        let stats = self.server.stats();
        info!(
            variables = stats.historized_variables,
            recorded = stats.archive.values_recorded,
            evicted = stats.archive.values_evicted,
            skipped = stats.archive.values_skipped,
            online = stats.archive.current_values,
            continuation_points = stats.active_continuation_points,
            "Archive statistics"
        );
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for [`HistorianRuntime`].
#[derive(Debug, Default)]
pub struct RuntimeBuilder {
    config_path: Option<PathBuf>,
    config: Option<HdaConfig>,
    seed: Option<u64>,
}

impl RuntimeBuilder {
    /// Creates a new runtime builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration file path.
    pub fn config_path(mut self, path: impl AsRef<Path>) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the configuration file path if one is given.
    pub fn maybe_config_path(mut self, path: Option<&Path>) -> Self {
        self.config_path = path.map(Path::to_path_buf);
        self
    }

    /// Sets the configuration directly.
    pub fn config(mut self, config: HdaConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Seeds the value generator for reproducible output.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Builds the runtime. Without a config or path, built-in defaults apply.
    pub fn build(self) -> BinResult<HistorianRuntime> {
        let config = match (self.config, self.config_path) {
            (Some(config), _) => config,
            (None, Some(path)) => load_config(&path).map_err(|e| {
                BinError::from(e).with_context(format!("loading {}", path.display()))
            })?,
            (None, None) => {
                debug!("No configuration file given, using defaults");
                HdaConfig::default()
            }
        };

        match self.seed {
            Some(seed) => {
                let generator = SignalGenerator::with_seed(&config.simulation, seed);
                HistorianRuntime::with_generator(config, generator)
            }
            None => HistorianRuntime::new(config),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
