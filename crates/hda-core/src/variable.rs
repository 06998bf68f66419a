// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The variable node the historian attaches to.
//!
//! This is the narrow slice of an address-space variable that historical
//! access needs:
//!
//! - a current [`DataValue`] with change notification,
//! - the `Historizing` attribute,
//! - attribute read/write by [`AttributeId`],
//! - named child components (for example the `HA Configuration` object).
//!
//! # Attribute writes
//!
//! Writes are dispatched through a static table of
//! `(AttributeId, AttributeWriteHandler)` pairs. Attributes without a handler
//! are not writable.
//!
//! | Attribute     | Accepts     | Effect                          |
//! |---------------|-------------|---------------------------------|
//! | `Value`       | any variant | stores the value, notifies      |
//! | `Historizing` | `Boolean`   | flips recording on or off       |
//! | other         | -           | `BadNotWritable`                |
//!
//! # Examples
//!
//! ```
//! use hda_core::types::{AttributeId, DataValue, NodeId, StatusCode, Variant};
//! use hda_core::variable::Variable;
//!
//! let variable = Variable::new(NodeId::string(2, "Pump.Speed"), "Pump.Speed");
//! let status = variable.write_attribute(AttributeId::Historizing, DataValue::now(true));
//! assert_eq!(status, StatusCode::GOOD);
//! assert!(variable.is_historizing());
//!
//! let status = variable.write_attribute(AttributeId::Historizing, DataValue::now(1.0));
//! assert_eq!(status, StatusCode::BAD_TYPE_MISMATCH);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::debug;

use crate::listener::{ListenerHandle, ListenerRegistry};
use crate::types::{AttributeId, DataValue, NodeId, QualifiedName, StatusCode, Variant};

/// Browse name of the historical-access configuration component.
pub const HA_CONFIGURATION: &str = "HA Configuration";

// =============================================================================
// Component
// =============================================================================

/// A named child object of a variable exposing read-only properties.
///
/// Properties are computed on every read, so they always reflect live state.
pub trait Component: Send + Sync + fmt::Debug {
    /// Returns the component's browse name.
    fn browse_name(&self) -> &str;

    /// Returns the names of the exposed properties.
    fn property_names(&self) -> Vec<&'static str>;

    /// Reads a property. Returns `None` for unknown names.
    fn read_property(&self, name: &str) -> Option<Variant>;
}

// =============================================================================
// Variable
// =============================================================================

/// Handler for a writable attribute.
pub type AttributeWriteHandler = fn(&Variable, DataValue) -> StatusCode;

const WRITE_HANDLERS: &[(AttributeId, AttributeWriteHandler)] = &[
    (AttributeId::Value, write_value as AttributeWriteHandler),
    (AttributeId::Historizing, write_historizing as AttributeWriteHandler),
];

fn write_value(variable: &Variable, mut value: DataValue) -> StatusCode {
    if value.source_timestamp == DateTime::<Utc>::default() {
        value.source_timestamp = Utc::now();
    }
    variable.set_value(value.with_server_timestamp(Utc::now()));
    StatusCode::GOOD
}

fn write_historizing(variable: &Variable, value: DataValue) -> StatusCode {
    match value.value.as_bool() {
        Some(enabled) => {
            variable.set_historizing(enabled);
            StatusCode::GOOD
        }
        None => StatusCode::BAD_TYPE_MISMATCH,
    }
}

/// A variable node: current value, `Historizing` flag, listeners and
/// components.
pub struct Variable {
    node_id: NodeId,
    browse_name: QualifiedName,
    display_name: String,
    value: RwLock<Option<DataValue>>,
    historizing: AtomicBool,
    listeners: Arc<ListenerRegistry>,
    components: RwLock<HashMap<String, Arc<dyn Component>>>,
}

impl Variable {
    /// Creates a variable without a value. `Historizing` starts out `false`.
    pub fn new(node_id: NodeId, browse_name: impl Into<QualifiedName>) -> Self {
        let browse_name = browse_name.into();
        Self {
            node_id,
            display_name: browse_name.name.clone(),
            browse_name,
            value: RwLock::new(None),
            historizing: AtomicBool::new(false),
            listeners: Arc::new(ListenerRegistry::new()),
            components: RwLock::new(HashMap::new()),
        }
    }

    /// Sets the display name.
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    /// Sets the initial value without notifying.
    pub fn with_value(self, value: DataValue) -> Self {
        *self.value.write() = Some(value);
        self
    }

    /// Returns the node id.
    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    /// Returns the browse name.
    pub fn browse_name(&self) -> &QualifiedName {
        &self.browse_name
    }

    /// Returns the display name.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Returns the current value.
    pub fn value(&self) -> Option<DataValue> {
        self.value.read().clone()
    }

    /// Stores a new value and notifies listeners.
    ///
    /// Returns `false` without notifying when `value` equals the current
    /// value.
    pub fn set_value(&self, value: DataValue) -> bool {
        {
            let mut current = self.value.write();
            if current.as_ref() == Some(&value) {
                return false;
            }
            *current = Some(value.clone());
        }
        self.listeners.notify(&value);
        true
    }

    /// Returns the `Historizing` attribute.
    pub fn is_historizing(&self) -> bool {
        self.historizing.load(Ordering::Acquire)
    }

    /// Sets the `Historizing` attribute.
    pub fn set_historizing(&self, enabled: bool) {
        let previous = self.historizing.swap(enabled, Ordering::AcqRel);
        if previous != enabled {
            debug!(node_id = %self.node_id, historizing = enabled, "Historizing flag changed");
        }
    }

    /// Registers a value-change listener.
    pub fn on_value_change<F>(&self, callback: F) -> ListenerHandle
    where
        F: Fn(&DataValue) + Send + Sync + 'static,
    {
        self.listeners.subscribe(callback)
    }

    /// Returns the number of registered value-change listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    // -------------------------------------------------------------------------
    // Components
    // -------------------------------------------------------------------------

    /// Adds a component. Returns `false` if one with the same browse name
    /// already exists.
    pub fn add_component(&self, component: Arc<dyn Component>) -> bool {
        let mut components = self.components.write();
        let name = component.browse_name().to_string();
        if components.contains_key(&name) {
            return false;
        }
        components.insert(name, component);
        true
    }

    /// Looks up a component by browse name.
    pub fn component(&self, name: &str) -> Option<Arc<dyn Component>> {
        self.components.read().get(name).cloned()
    }

    /// Removes a component by browse name.
    pub fn remove_component(&self, name: &str) -> Option<Arc<dyn Component>> {
        self.components.write().remove(name)
    }

    /// Returns the browse names of all components.
    pub fn component_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.components.read().keys().cloned().collect();
        names.sort();
        names
    }

    // -------------------------------------------------------------------------
    // Attribute service
    // -------------------------------------------------------------------------

    /// Reads an attribute.
    ///
    /// Supports `NodeId`, `BrowseName`, `DisplayName`, `Value` and
    /// `Historizing`; other attributes yield `BadAttributeIdInvalid`.
    pub fn read_attribute(&self, attribute: AttributeId) -> DataValue {
        let now = Utc::now();
        match attribute {
            AttributeId::NodeId => DataValue::good(self.node_id.to_string(), now),
            AttributeId::BrowseName => DataValue::good(self.browse_name.to_string(), now),
            AttributeId::DisplayName => DataValue::good(self.display_name.clone(), now),
            AttributeId::Value => self
                .value()
                .unwrap_or_else(|| DataValue::good(Variant::Empty, now)),
            AttributeId::Historizing => DataValue::good(self.is_historizing(), now),
            _ => DataValue::new(Variant::Empty, StatusCode::BAD_ATTRIBUTE_ID_INVALID, now),
        }
    }

    /// Writes an attribute through the dispatch table.
    pub fn write_attribute(&self, attribute: AttributeId, value: DataValue) -> StatusCode {
        match WRITE_HANDLERS.iter().find(|(id, _)| *id == attribute) {
            Some((_, handler)) => handler(self, value),
            None => StatusCode::BAD_NOT_WRITABLE,
        }
    }
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Variable")
            .field("node_id", &self.node_id)
            .field("browse_name", &self.browse_name)
            .field("historizing", &self.is_historizing())
            .field("listeners", &self.listener_count())
            .field("components", &self.component_names())
            .finish()
    }
}
