// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Historizing binding between a variable and its online archive.
//!
//! Installing a binding on a [`Variable`]:
//!
//! 1. adds the `HA Configuration` component (fails if one is present),
//! 2. sets `Historizing = true`,
//! 3. subscribes to value changes,
//! 4. seeds the archive with the variable's current value, if any.
//!
//! ```text
//! Variable::set_value ──► listener ──┬── Historizing = true  ──► archive.push
//!                                    └── Historizing = false ──► skipped
//! ```
//!
//! Turning `Historizing` off only gates new samples; values missed while it
//! was off are never captured retroactively.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use hda_archive::{ArchiveConfig, HistoricalArchive, HistorizedVariable};
//! use hda_core::types::{DataValue, NodeId};
//! use hda_core::variable::Variable;
//!
//! let variable = Arc::new(Variable::new(NodeId::string(2, "Flow"), "Flow"));
//! let historized = HistorizedVariable::install(&variable, ArchiveConfig::default()).unwrap();
//!
//! variable.set_value(DataValue::now(12.5));
//! assert_eq!(historized.archive().len(), 1);
//! ```

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use hda_core::error::ArchiveError;
use hda_core::listener::ListenerHandle;
use hda_core::types::{NodeId, Variant};
use hda_core::variable::{Component, Variable, HA_CONFIGURATION};

use crate::ring_buffer::RingBufferArchive;
use crate::traits::{ArchiveConfig, ArchiveStats, HistoricalArchive};

// =============================================================================
// HA Configuration Component
// =============================================================================

/// Property: timestamp of the oldest online value.
pub const START_OF_ONLINE_ARCHIVE: &str = "StartOfOnlineArchive";
/// Property: capacity of the online archive.
pub const MAX_ONLINE_VALUES: &str = "MaxOnlineValues";
/// Property: timestamp of the oldest value in any archive.
pub const START_OF_ARCHIVE: &str = "StartOfArchive";
/// Property: whether values are stepped rather than interpolated.
pub const STEPPED: &str = "Stepped";

/// The `HA Configuration` component of a historized variable.
///
/// Every property is computed from the archive at read time.
#[derive(Debug)]
pub struct HaConfiguration {
    archive: Arc<dyn HistoricalArchive>,
}

impl HaConfiguration {
    /// Creates the component over an archive.
    pub fn new(archive: Arc<dyn HistoricalArchive>) -> Self {
        Self { archive }
    }

    /// Returns the oldest online timestamp.
    pub fn start_of_online_archive(&self) -> Option<DateTime<Utc>> {
        self.archive.oldest_timestamp()
    }

    /// Returns the online capacity (`0` = unbounded).
    pub fn max_online_values(&self) -> usize {
        self.archive.config().max_online_values
    }
}

impl Component for HaConfiguration {
    fn browse_name(&self) -> &str {
        HA_CONFIGURATION
    }

    fn property_names(&self) -> Vec<&'static str> {
        vec![START_OF_ONLINE_ARCHIVE, MAX_ONLINE_VALUES, START_OF_ARCHIVE, STEPPED]
    }

    fn read_property(&self, name: &str) -> Option<Variant> {
        match name {
            // Only the online archive exists, so both starts coincide.
            START_OF_ONLINE_ARCHIVE | START_OF_ARCHIVE => Some(
                self.start_of_online_archive()
                    .map(Variant::DateTime)
                    .unwrap_or(Variant::Empty),
            ),
            MAX_ONLINE_VALUES => Some(Variant::UInt32(
                u32::try_from(self.max_online_values()).unwrap_or(u32::MAX),
            )),
            STEPPED => Some(Variant::Boolean(false)),
            _ => None,
        }
    }
}

// =============================================================================
// HistorizedVariable
// =============================================================================

/// A variable with an installed historizing binding.
pub struct HistorizedVariable {
    variable: Arc<Variable>,
    archive: Arc<dyn HistoricalArchive>,
    handle: ListenerHandle,
    disposed: AtomicBool,
}

impl HistorizedVariable {
    /// Installs a binding backed by a [`RingBufferArchive`].
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::AlreadyInstalled`] if the variable already
    /// carries an `HA Configuration` component.
    pub fn install(variable: &Arc<Variable>, config: ArchiveConfig) -> Result<Arc<Self>, ArchiveError> {
        Self::install_with_archive(variable, Arc::new(RingBufferArchive::new(config)))
    }

    /// Installs a binding backed by the given archive.
    pub fn install_with_archive(
        variable: &Arc<Variable>,
        archive: Arc<dyn HistoricalArchive>,
    ) -> Result<Arc<Self>, ArchiveError> {
        let component = Arc::new(HaConfiguration::new(Arc::clone(&archive)));
        if !variable.add_component(component) {
            return Err(ArchiveError::already_installed(variable.node_id().to_string()));
        }

        variable.set_historizing(true);

        let weak = Arc::downgrade(variable);
        let sink = Arc::clone(&archive);
        let handle = variable.on_value_change(move |value| {
            let Some(variable) = weak.upgrade() else {
                return;
            };
            if variable.is_historizing() {
                // Rejections are logged and counted by the archive.
                let _ = sink.push(value.clone());
            } else {
                sink.record_skipped();
            }
        });

        if archive.is_empty() {
            if let Some(initial) = variable.value() {
                debug!(node_id = %variable.node_id(), "Seeding archive with current value");
                let _ = archive.push(initial);
            }
        }

        info!(
            node_id = %variable.node_id(),
            max_online_values = archive.config().max_online_values,
            "Historizing binding installed"
        );

        Ok(Arc::new(Self {
            variable: Arc::clone(variable),
            archive,
            handle,
            disposed: AtomicBool::new(false),
        }))
    }

    /// Returns the variable.
    pub fn variable(&self) -> &Arc<Variable> {
        &self.variable
    }

    /// Returns the variable's node id.
    pub fn node_id(&self) -> &NodeId {
        self.variable.node_id()
    }

    /// Returns the archive.
    pub fn archive(&self) -> &Arc<dyn HistoricalArchive> {
        &self.archive
    }

    /// Returns the variable's `Historizing` attribute.
    pub fn is_historizing(&self) -> bool {
        self.variable.is_historizing()
    }

    /// Sets the variable's `Historizing` attribute.
    pub fn set_historizing(&self, enabled: bool) {
        self.variable.set_historizing(enabled);
    }

    /// Returns the oldest online timestamp.
    pub fn start_of_online_archive(&self) -> Option<DateTime<Utc>> {
        self.archive.oldest_timestamp()
    }

    /// Returns the online capacity.
    pub fn max_online_values(&self) -> usize {
        self.archive.config().max_online_values
    }

    /// Returns the archive statistics.
    pub fn stats(&self) -> ArchiveStats {
        self.archive.stats()
    }

    /// Returns `true` once [`dispose`](Self::dispose) has run.
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Unsubscribes, clears `Historizing`, removes the `HA Configuration`
    /// component and drops the archived values. Idempotent.
    ///
    /// Runs on drop, so a binding never outlives its last handle.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.handle.dispose();
        self.variable.set_historizing(false);
        self.variable.remove_component(HA_CONFIGURATION);
        self.archive.clear();
        info!(node_id = %self.variable.node_id(), "Historizing binding disposed");
    }
}

impl Drop for HistorizedVariable {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for HistorizedVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistorizedVariable")
            .field("node_id", self.variable.node_id())
            .field("historizing", &self.is_historizing())
            .field("values", &self.archive.len())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
