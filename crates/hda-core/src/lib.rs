// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # hda-core
//!
//! Core types and the variable model for the HDA historian.
//!
//! This crate provides the foundation shared by all HDA components:
//!
//! - **Types**: `NodeId`, `AttributeId`, `Variant`, `StatusCode`, `DataValue`, `SessionId`
//! - **Error**: Unified error hierarchy
//! - **Listener**: Disposable value-change subscriptions
//! - **Variable**: The variable node a historizing binding attaches to
//!
//! ## Example
//!
//! ```rust
//! use hda_core::types::{DataValue, NodeId};
//! use hda_core::variable::Variable;
//! use std::sync::Arc;
//!
//! let variable = Arc::new(Variable::new(NodeId::string(2, "Boiler.Temperature"), "Temperature"));
//! let _handle = variable.on_value_change(|value| println!("changed: {}", value));
//! variable.set_value(DataValue::now(21.5));
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

// =============================================================================
// Core Modules
// =============================================================================

pub mod error;
pub mod types;

// =============================================================================
// Variable Model
// =============================================================================

pub mod listener;
pub mod variable;

// =============================================================================
// Re-exports for convenience
// =============================================================================

pub use error::*;
pub use types::*;

pub use listener::{ListenerHandle, ListenerId, ListenerRegistry, ValueChangeCallback};
pub use variable::{AttributeWriteHandler, Component, Variable, HA_CONFIGURATION};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
