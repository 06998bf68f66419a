// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Per-session continuation points.
//!
//! A paged HistoryRead that does not fit in one response parks the remaining
//! values in a [`ContinuationState`] and hands the client an opaque
//! [`ContinuationPoint`]. Presenting the token resumes the read.
//!
//! # Rules
//!
//! - Tokens are 16 random bytes (UUID v4), scoped to the issuing session.
//! - A token is consumed on first presentation ([`ContinuationPointManager::pop`]).
//! - A session holds at most `max_per_session` tokens; creating one more
//!   evicts that session's oldest token.
//! - Closing a session drops every token it holds.
//!
//! ```text
//! DashMap<SessionId, SessionContinuationPoints>
//!   session A ──► { order: [cp1, cp2], states: { cp1 → state, cp2 → state } }
//!   session B ──► { order: [cp3],      states: { cp3 → state } }
//! ```
//!
//! `pop` removes the state under the session's shard lock, so two concurrent
//! pops of one token yield exactly one success.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use hda_core::error::ContinuationError;
use hda_core::types::{DataValue, NodeId, SessionId};

/// Default limit of outstanding continuation points per session.
pub const DEFAULT_MAX_CONTINUATION_POINTS_PER_SESSION: usize = 100;

// =============================================================================
// ContinuationPoint
// =============================================================================

/// Opaque continuation point token.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContinuationPoint(Vec<u8>);

impl ContinuationPoint {
    /// Generates a fresh random token.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().as_bytes().to_vec())
    }

    /// Wraps raw bytes received from a client.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Returns the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for ContinuationPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", BASE64.encode(&self.0))
    }
}

impl fmt::Debug for ContinuationPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContinuationPoint({})", self)
    }
}

impl FromStr for ContinuationPoint {
    type Err = base64::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BASE64.decode(s.trim()).map(Self)
    }
}

// =============================================================================
// ContinuationState
// =============================================================================

/// Direction of a raw read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadDirection {
    /// Oldest to newest.
    Forward,
    /// Newest to oldest.
    Backward,
}

impl ReadDirection {
    /// Returns the direction as a string for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadDirection::Forward => "forward",
            ReadDirection::Backward => "backward",
        }
    }
}

/// Suspended state of a paged read.
#[derive(Debug, Clone)]
pub struct ContinuationState {
    /// Node the read was issued for.
    pub node_id: NodeId,
    /// Values not yet returned, in emission order.
    pub remaining: Vec<DataValue>,
    /// Direction of the read.
    pub direction: ReadDirection,
    /// Page size of the original request (`0` = unbounded).
    pub page_size: u32,
    /// When the state was parked.
    pub created_at: DateTime<Utc>,
}

impl ContinuationState {
    /// Creates a new state stamped with the current time.
    pub fn new(
        node_id: NodeId,
        remaining: Vec<DataValue>,
        direction: ReadDirection,
        page_size: u32,
    ) -> Self {
        Self {
            node_id,
            remaining,
            direction,
            page_size,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Default)]
struct SessionContinuationPoints {
    order: VecDeque<ContinuationPoint>,
    states: HashMap<ContinuationPoint, ContinuationState>,
}

impl SessionContinuationPoints {
    fn take(&mut self, token: &ContinuationPoint) -> Option<ContinuationState> {
        let state = self.states.remove(token)?;
        self.order.retain(|t| t != token);
        Some(state)
    }

    fn evict_oldest(&mut self) -> Option<ContinuationPoint> {
        let token = self.order.pop_front()?;
        self.states.remove(&token);
        Some(token)
    }
}

// =============================================================================
// ContinuationPointManager
// =============================================================================

/// Registry of continuation points, namespaced by session.
pub struct ContinuationPointManager {
    sessions: DashMap<SessionId, SessionContinuationPoints>,
    max_per_session: usize,
}

impl ContinuationPointManager {
    /// Creates a manager with a per-session limit (`0` = unbounded).
    pub fn new(max_per_session: usize) -> Self {
        Self {
            sessions: DashMap::new(),
            max_per_session,
        }
    }

    /// Returns the per-session limit.
    pub fn max_per_session(&self) -> usize {
        self.max_per_session
    }

    /// Parks `state` and returns a fresh token for it.
    pub fn create(&self, session: SessionId, state: ContinuationState) -> ContinuationPoint {
        let token = ContinuationPoint::generate();
        let remaining = state.remaining.len();

        let mut entry = self.sessions.entry(session).or_default();
        entry.order.push_back(token.clone());
        entry.states.insert(token.clone(), state);

        if self.max_per_session > 0 && entry.states.len() > self.max_per_session {
            if let Some(evicted) = entry.evict_oldest() {
                debug!(
                    session = %session,
                    continuation_point = %evicted,
                    max_per_session = self.max_per_session,
                    "Evicting oldest continuation point"
                );
            }
        }
        drop(entry);

        debug!(
            session = %session,
            continuation_point = %token,
            remaining = remaining,
            "Continuation point created"
        );
        token
    }

    /// Consumes a token.
    ///
    /// # Errors
    ///
    /// Returns [`ContinuationError::NotFound`] if the session holds no such
    /// token.
    pub fn pop(
        &self,
        session: SessionId,
        token: &ContinuationPoint,
    ) -> Result<ContinuationState, ContinuationError> {
        let state = self
            .sessions
            .get_mut(&session)
            .and_then(|mut points| points.take(token));

        self.sessions.remove_if(&session, |_, points| points.states.is_empty());

        match state {
            Some(state) => {
                debug!(session = %session, continuation_point = %token, "Continuation point consumed");
                Ok(state)
            }
            None => Err(ContinuationError::not_found(token.to_string())),
        }
    }

    /// Drops a token without resuming. Returns `true` if it existed.
    pub fn release(&self, session: SessionId, token: &ContinuationPoint) -> bool {
        self.pop(session, token).is_ok()
    }

    /// Drops every token of a session. Returns how many were dropped.
    pub fn close_session(&self, session: SessionId) -> usize {
        let dropped = self
            .sessions
            .remove(&session)
            .map(|(_, points)| points.states.len())
            .unwrap_or(0);
        if dropped > 0 {
            debug!(session = %session, dropped = dropped, "Session continuation points dropped");
        }
        dropped
    }

    /// Returns the number of tokens a session holds.
    pub fn session_len(&self, session: SessionId) -> usize {
        self.sessions
            .get(&session)
            .map(|points| points.states.len())
            .unwrap_or(0)
    }

    /// Returns the total number of outstanding tokens.
    pub fn len(&self) -> usize {
        self.sessions.iter().map(|points| points.states.len()).sum()
    }

    /// Returns `true` if no token is outstanding.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of sessions holding at least one token.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Drops every token of every session.
    pub fn clear(&self) {
        self.sessions.clear();
    }
}

impl Default for ContinuationPointManager {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONTINUATION_POINTS_PER_SESSION)
    }
}

impl fmt::Debug for ContinuationPointManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContinuationPointManager")
            .field("sessions", &self.session_count())
            .field("continuation_points", &self.len())
            .field("max_per_session", &self.max_per_session)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
