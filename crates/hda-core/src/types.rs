// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Core OPC UA data types used by the historian.
//!
//! This module provides the value model shared by every HDA component:
//!
//! - **NodeId**: Node identifiers with the `ns=2;s=Name` text form
//! - **QualifiedName**: Namespace-qualified browse names and encodings
//! - **AttributeId**: The OPC UA attribute enumeration
//! - **Variant**: Scalar values carried by variables
//! - **StatusCode**: 32-bit OPC UA status codes with symbolic names
//! - **DataValue**: A value with its status and source timestamp
//! - **SessionId**: Identity of the session that owns server-side state
//!
//! # Examples
//!
//! ```
//! use hda_core::types::{DataValue, NodeId, StatusCode, Variant};
//! use chrono::Utc;
//!
//! let node: NodeId = "ns=2;s=Boiler.Temperature".parse().unwrap();
//! assert_eq!(node.namespace_index, 2);
//!
//! let value = DataValue::new(Variant::Double(21.5), StatusCode::GOOD, Utc::now());
//! assert!(value.status.is_good());
//! ```

use std::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ParseError;

// =============================================================================
// NodeId
// =============================================================================

/// OPC UA node identifier.
///
/// A node id is a namespace index plus a numeric, string, GUID or opaque
/// identifier.
///
/// # Examples
///
/// ```
/// use hda_core::types::NodeId;
///
/// let numeric = NodeId::numeric(2, 1001);
/// assert_eq!(numeric.to_string(), "ns=2;i=1001");
///
/// let parsed: NodeId = "ns=3;s=Line1.Pressure".parse().unwrap();
/// assert_eq!(parsed, NodeId::string(3, "Line1.Pressure"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId {
    /// Namespace index (0 = OPC UA standard namespace).
    pub namespace_index: u16,

    /// The node identifier.
    pub identifier: Identifier,
}

/// The identifier part of a [`NodeId`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Identifier {
    /// Numeric identifier (`i=`).
    Numeric(u32),
    /// String identifier (`s=`).
    String(String),
    /// GUID identifier (`g=`).
    Guid(Uuid),
    /// Opaque byte string identifier (`b=`, base64).
    Opaque(Vec<u8>),
}

impl NodeId {
    /// Creates a numeric node id.
    #[inline]
    pub fn numeric(namespace_index: u16, value: u32) -> Self {
        Self {
            namespace_index,
            identifier: Identifier::Numeric(value),
        }
    }

    /// Creates a string node id.
    #[inline]
    pub fn string(namespace_index: u16, value: impl Into<String>) -> Self {
        Self {
            namespace_index,
            identifier: Identifier::String(value.into()),
        }
    }

    /// Creates a GUID node id.
    #[inline]
    pub fn guid(namespace_index: u16, value: Uuid) -> Self {
        Self {
            namespace_index,
            identifier: Identifier::Guid(value),
        }
    }

    /// Creates an opaque node id.
    #[inline]
    pub fn opaque(namespace_index: u16, value: Vec<u8>) -> Self {
        Self {
            namespace_index,
            identifier: Identifier::Opaque(value),
        }
    }

    /// Returns the null node id (ns=0, i=0).
    #[inline]
    pub const fn null() -> Self {
        Self {
            namespace_index: 0,
            identifier: Identifier::Numeric(0),
        }
    }

    /// Returns `true` if this is the null node id.
    #[inline]
    pub fn is_null(&self) -> bool {
        self.namespace_index == 0 && matches!(self.identifier, Identifier::Numeric(0))
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::null()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace_index != 0 {
            write!(f, "ns={};", self.namespace_index)?;
        }
        match &self.identifier {
            Identifier::Numeric(v) => write!(f, "i={}", v),
            Identifier::String(v) => write!(f, "s={}", v),
            Identifier::Guid(v) => write!(f, "g={}", v),
            Identifier::Opaque(v) => write!(f, "b={}", BASE64.encode(v)),
        }
    }
}

impl FromStr for NodeId {
    type Err = ParseError;

    /// Parses `ns=<index>;<kind>=<value>` or `<kind>=<value>` (namespace 0).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        let (namespace_index, identifier_part) = match s.strip_prefix("ns=") {
            Some(rest) => {
                let (ns, id) = rest
                    .split_once(';')
                    .ok_or_else(|| ParseError::invalid_node_id(s, "missing identifier after namespace"))?;
                let ns: u16 = ns
                    .parse()
                    .map_err(|_| ParseError::invalid_node_id(s, "invalid namespace index"))?;
                (ns, id)
            }
            None => (0, s),
        };

        let identifier = if let Some(id) = identifier_part.strip_prefix("i=") {
            Identifier::Numeric(
                id.parse()
                    .map_err(|_| ParseError::invalid_node_id(s, "invalid numeric identifier"))?,
            )
        } else if let Some(id) = identifier_part.strip_prefix("s=") {
            if id.is_empty() {
                return Err(ParseError::invalid_node_id(s, "empty string identifier"));
            }
            Identifier::String(id.to_string())
        } else if let Some(id) = identifier_part.strip_prefix("g=") {
            Identifier::Guid(
                Uuid::parse_str(id)
                    .map_err(|e| ParseError::invalid_node_id(s, format!("invalid GUID: {}", e)))?,
            )
        } else if let Some(id) = identifier_part.strip_prefix("b=") {
            Identifier::Opaque(
                BASE64
                    .decode(id)
                    .map_err(|e| ParseError::invalid_node_id(s, format!("invalid base64: {}", e)))?,
            )
        } else {
            return Err(ParseError::invalid_node_id(
                s,
                "identifier must start with i=, s=, g= or b=",
            ));
        };

        Ok(Self {
            namespace_index,
            identifier,
        })
    }
}

// =============================================================================
// QualifiedName
// =============================================================================

/// A namespace-qualified name (browse names, data encodings).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct QualifiedName {
    /// Namespace index.
    pub namespace_index: u16,
    /// The name.
    pub name: String,
}

impl QualifiedName {
    /// Creates a qualified name.
    pub fn new(namespace_index: u16, name: impl Into<String>) -> Self {
        Self {
            namespace_index,
            name: name.into(),
        }
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace_index == 0 {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}:{}", self.namespace_index, self.name)
        }
    }
}

impl From<&str> for QualifiedName {
    fn from(name: &str) -> Self {
        Self::new(0, name)
    }
}

// =============================================================================
// AttributeId
// =============================================================================

/// OPC UA attribute ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AttributeId {
    /// Node ID attribute.
    NodeId,
    /// Node class attribute.
    NodeClass,
    /// Browse name attribute.
    BrowseName,
    /// Display name attribute.
    DisplayName,
    /// Description attribute.
    Description,
    /// Write mask attribute.
    WriteMask,
    /// User write mask attribute.
    UserWriteMask,
    /// Is abstract attribute.
    IsAbstract,
    /// Symmetric attribute.
    Symmetric,
    /// Inverse name attribute.
    InverseName,
    /// Contains no loops attribute.
    ContainsNoLoops,
    /// Event notifier attribute.
    EventNotifier,
    /// Value attribute.
    #[default]
    Value,
    /// Data type attribute.
    DataType,
    /// Value rank attribute.
    ValueRank,
    /// Array dimensions attribute.
    ArrayDimensions,
    /// Access level attribute.
    AccessLevel,
    /// User access level attribute.
    UserAccessLevel,
    /// Minimum sampling interval attribute.
    MinimumSamplingInterval,
    /// Historizing attribute.
    Historizing,
    /// Executable attribute.
    Executable,
    /// User executable attribute.
    UserExecutable,
}

impl AttributeId {
    const ALL: [AttributeId; 22] = [
        Self::NodeId,
        Self::NodeClass,
        Self::BrowseName,
        Self::DisplayName,
        Self::Description,
        Self::WriteMask,
        Self::UserWriteMask,
        Self::IsAbstract,
        Self::Symmetric,
        Self::InverseName,
        Self::ContainsNoLoops,
        Self::EventNotifier,
        Self::Value,
        Self::DataType,
        Self::ValueRank,
        Self::ArrayDimensions,
        Self::AccessLevel,
        Self::UserAccessLevel,
        Self::MinimumSamplingInterval,
        Self::Historizing,
        Self::Executable,
        Self::UserExecutable,
    ];

    /// Returns the OPC UA numeric value (1..=22).
    pub const fn value(&self) -> u32 {
        *self as u32 + 1
    }

    /// Looks up an attribute by its numeric value.
    pub fn from_value(value: u32) -> Result<Self, ParseError> {
        value
            .checked_sub(1)
            .and_then(|idx| Self::ALL.get(idx as usize).copied())
            .ok_or(ParseError::UnknownAttributeId { value })
    }
}

// =============================================================================
// Variant
// =============================================================================

/// A scalar value carried by a variable.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Variant {
    /// No value.
    #[default]
    Empty,
    /// Boolean value.
    Boolean(bool),
    /// Signed 32-bit integer.
    Int32(i32),
    /// Signed 64-bit integer.
    Int64(i64),
    /// Unsigned 32-bit integer.
    UInt32(u32),
    /// Unsigned 64-bit integer.
    UInt64(u64),
    /// 32-bit float.
    Float(f32),
    /// 64-bit float.
    Double(f64),
    /// UTF-8 string.
    String(String),
    /// Date and time.
    DateTime(DateTime<Utc>),
    /// Raw bytes.
    ByteString(Vec<u8>),
}

impl Variant {
    /// Returns the OPC UA type name of this variant.
    pub fn type_name(&self) -> &'static str {
        match self {
            Variant::Empty => "Null",
            Variant::Boolean(_) => "Boolean",
            Variant::Int32(_) => "Int32",
            Variant::Int64(_) => "Int64",
            Variant::UInt32(_) => "UInt32",
            Variant::UInt64(_) => "UInt64",
            Variant::Float(_) => "Float",
            Variant::Double(_) => "Double",
            Variant::String(_) => "String",
            Variant::DateTime(_) => "DateTime",
            Variant::ByteString(_) => "ByteString",
        }
    }

    /// Returns `true` if this is [`Variant::Empty`].
    #[inline]
    pub fn is_empty(&self) -> bool {
        matches!(self, Variant::Empty)
    }

    /// Returns the value as `bool` if it is a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Variant::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as `f64` if it is numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Variant::Int32(v) => Some(*v as f64),
            Variant::Int64(v) => Some(*v as f64),
            Variant::UInt32(v) => Some(*v as f64),
            Variant::UInt64(v) => Some(*v as f64),
            Variant::Float(v) => Some(*v as f64),
            Variant::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as a date time if it is one.
    pub fn as_date_time(&self) -> Option<DateTime<Utc>> {
        match self {
            Variant::DateTime(v) => Some(*v),
            _ => None,
        }
    }

    /// Converts to a JSON value for output.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Variant::Empty => serde_json::Value::Null,
            Variant::Boolean(v) => serde_json::Value::Bool(*v),
            Variant::Int32(v) => serde_json::json!(v),
            Variant::Int64(v) => serde_json::json!(v),
            Variant::UInt32(v) => serde_json::json!(v),
            Variant::UInt64(v) => serde_json::json!(v),
            Variant::Float(v) => serde_json::json!(v),
            Variant::Double(v) => serde_json::json!(v),
            Variant::String(v) => serde_json::Value::String(v.clone()),
            Variant::DateTime(v) => serde_json::Value::String(v.to_rfc3339()),
            Variant::ByteString(v) => serde_json::Value::String(BASE64.encode(v)),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Empty => write!(f, "null"),
            Variant::Boolean(v) => write!(f, "{}", v),
            Variant::Int32(v) => write!(f, "{}", v),
            Variant::Int64(v) => write!(f, "{}", v),
            Variant::UInt32(v) => write!(f, "{}", v),
            Variant::UInt64(v) => write!(f, "{}", v),
            Variant::Float(v) => write!(f, "{}", v),
            Variant::Double(v) => write!(f, "{}", v),
            Variant::String(v) => write!(f, "\"{}\"", v),
            Variant::DateTime(v) => write!(f, "{}", v.to_rfc3339()),
            Variant::ByteString(v) => write!(f, "<{} bytes>", v.len()),
        }
    }
}

macro_rules! impl_from_for_variant {
    ($variant:ident, $type:ty) => {
        impl From<$type> for Variant {
            fn from(v: $type) -> Self {
                Variant::$variant(v)
            }
        }
    };
}

impl_from_for_variant!(Boolean, bool);
impl_from_for_variant!(Int32, i32);
impl_from_for_variant!(Int64, i64);
impl_from_for_variant!(UInt32, u32);
impl_from_for_variant!(UInt64, u64);
impl_from_for_variant!(Float, f32);
impl_from_for_variant!(Double, f64);
impl_from_for_variant!(String, String);
impl_from_for_variant!(DateTime, DateTime<Utc>);

impl From<&str> for Variant {
    fn from(v: &str) -> Self {
        Variant::String(v.to_string())
    }
}

// =============================================================================
// StatusCode
// =============================================================================

/// A 32-bit OPC UA status code.
///
/// The two most significant bits carry the severity (`00` good, `01`
/// uncertain, `10` bad).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusCode(u32);

impl StatusCode {
    /// The operation succeeded.
    pub const GOOD: StatusCode = StatusCode(0x0000_0000);
    /// The value is uncertain.
    pub const UNCERTAIN: StatusCode = StatusCode(0x4000_0000);
    /// The value is bad.
    pub const BAD: StatusCode = StatusCode(0x8000_0000);
    /// The node id refers to a node that does not exist.
    pub const BAD_NODE_ID_UNKNOWN: StatusCode = StatusCode(0x8034_0000);
    /// The syntax of the node id is not valid.
    pub const BAD_NODE_ID_INVALID: StatusCode = StatusCode(0x8033_0000);
    /// The attribute is not supported for the specified node.
    pub const BAD_ATTRIBUTE_ID_INVALID: StatusCode = StatusCode(0x8035_0000);
    /// The access level does not allow writing to the node.
    pub const BAD_NOT_WRITABLE: StatusCode = StatusCode(0x803B_0000);
    /// The continuation point provided is no longer valid.
    pub const BAD_CONTINUATION_POINT_INVALID: StatusCode = StatusCode(0x804A_0000);
    /// The history details parameter is not valid.
    pub const BAD_HISTORY_OPERATION_INVALID: StatusCode = StatusCode(0x8071_0000);
    /// The server does not support the requested operation.
    pub const BAD_HISTORY_OPERATION_UNSUPPORTED: StatusCode = StatusCode(0x8072_0000);
    /// The value supplied for the attribute is not of the same type as the attribute's value.
    pub const BAD_TYPE_MISMATCH: StatusCode = StatusCode(0x8074_0000);

    const NAMES: [(StatusCode, &'static str); 11] = [
        (Self::GOOD, "Good"),
        (Self::UNCERTAIN, "Uncertain"),
        (Self::BAD, "Bad"),
        (Self::BAD_NODE_ID_UNKNOWN, "BadNodeIdUnknown"),
        (Self::BAD_NODE_ID_INVALID, "BadNodeIdInvalid"),
        (Self::BAD_ATTRIBUTE_ID_INVALID, "BadAttributeIdInvalid"),
        (Self::BAD_NOT_WRITABLE, "BadNotWritable"),
        (Self::BAD_CONTINUATION_POINT_INVALID, "BadContinuationPointInvalid"),
        (Self::BAD_HISTORY_OPERATION_INVALID, "BadHistoryOperationInvalid"),
        (Self::BAD_HISTORY_OPERATION_UNSUPPORTED, "BadHistoryOperationUnsupported"),
        (Self::BAD_TYPE_MISMATCH, "BadTypeMismatch"),
    ];

    /// Creates a status code from its raw value.
    #[inline]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Returns the raw value.
    #[inline]
    pub const fn bits(&self) -> u32 {
        self.0
    }

    /// Returns `true` if the severity is good.
    #[inline]
    pub const fn is_good(&self) -> bool {
        self.0 & 0xC000_0000 == 0
    }

    /// Returns `true` if the severity is uncertain.
    #[inline]
    pub const fn is_uncertain(&self) -> bool {
        self.0 & 0xC000_0000 == 0x4000_0000
    }

    /// Returns `true` if the severity is bad.
    #[inline]
    pub const fn is_bad(&self) -> bool {
        self.0 & 0x8000_0000 != 0
    }

    /// Returns the symbolic name, if this is a known code.
    pub fn name(&self) -> Option<&'static str> {
        Self::NAMES
            .iter()
            .find(|(code, _)| code == self)
            .map(|(_, name)| *name)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{}", name),
            None => write!(f, "0x{:08X}", self.0),
        }
    }
}

impl fmt::Debug for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StatusCode({} / 0x{:08X})", self, self.0)
    }
}

// =============================================================================
// DataValue
// =============================================================================

/// A value with status and timestamps, as recorded in history.
///
/// Ordering in the archive is by `source_timestamp`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataValue {
    /// The value.
    pub value: Variant,
    /// Status of the value.
    pub status: StatusCode,
    /// Time the value was produced by its source.
    pub source_timestamp: DateTime<Utc>,
    /// Time the server received the value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_timestamp: Option<DateTime<Utc>>,
}

impl DataValue {
    /// Creates a data value.
    pub fn new(value: impl Into<Variant>, status: StatusCode, source_timestamp: DateTime<Utc>) -> Self {
        Self {
            value: value.into(),
            status,
            source_timestamp,
            server_timestamp: None,
        }
    }

    /// Creates a good data value.
    pub fn good(value: impl Into<Variant>, source_timestamp: DateTime<Utc>) -> Self {
        Self::new(value, StatusCode::GOOD, source_timestamp)
    }

    /// Creates a good data value stamped with the current time.
    pub fn now(value: impl Into<Variant>) -> Self {
        Self::good(value, Utc::now())
    }

    /// Sets the server timestamp.
    pub fn with_server_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.server_timestamp = Some(timestamp);
        self
    }
}

impl fmt::Display for DataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] @ {}",
            self.value,
            self.status,
            self.source_timestamp.to_rfc3339()
        )
    }
}

// =============================================================================
// SessionId
// =============================================================================

/// Identity of a client session.
///
/// Server-side state such as continuation points is scoped to a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Creates a new random session id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID.
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Returns the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Tests
// =============================================================================
