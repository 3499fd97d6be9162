//! Run event system.
//!
//! [`EventBus`] wraps a `tokio::sync::broadcast` channel with a bounded
//! ring-buffer of recent events so that late subscribers (the CLI summary,
//! tests) can still inspect what a run did and how long each stage took.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::ids::{ResourceId, RunId};
use crate::resource::ExecutionKind;

/// Maximum number of events retained in the ring buffer.
const MAX_RECENT_EVENTS: usize = 256;

// ---------------------------------------------------------------------------
// EventPayload
// ---------------------------------------------------------------------------

/// Payload describing what happened.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    // -- Run lifecycle -------------------------------------------------------
    RunStarted {
        run_id: RunId,
        resource_id: ResourceId,
        kind: ExecutionKind,
        stages: usize,
    },
    RunCompleted {
        run_id: RunId,
        content_id: String,
        artifacts: usize,
    },
    RunFailed {
        run_id: RunId,
        error: String,
    },

    // -- Stage lifecycle -----------------------------------------------------
    StageStarted {
        run_id: RunId,
        stage: String,
        index: usize,
    },
    StageFinished {
        run_id: RunId,
        stage: String,
        elapsed_ms: i64,
        outcome: String,
    },

    // -- Verification --------------------------------------------------------
    VerificationFinished {
        run_id: RunId,
        checked: usize,
        passed: bool,
    },
}

impl EventPayload {
    /// The run this event belongs to.
    pub fn run_id(&self) -> RunId {
        match self {
            Self::RunStarted { run_id, .. }
            | Self::RunCompleted { run_id, .. }
            | Self::RunFailed { run_id, .. }
            | Self::StageStarted { run_id, .. }
            | Self::StageFinished { run_id, .. }
            | Self::VerificationFinished { run_id, .. } => *run_id,
        }
    }
}

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

/// A timestamped event ready for broadcast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub payload: EventPayload,
}

impl Event {
    /// Create a new event with a fresh UUID and the current timestamp.
    pub fn new(payload: EventPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            payload,
        }
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Broadcast channel with a bounded ring buffer of recent events.
pub struct EventBus {
    tx: broadcast::Sender<Event>,
    recent: RwLock<VecDeque<Event>>,
}

impl EventBus {
    /// Create a new event bus.
    ///
    /// `capacity` controls the broadcast channel buffer size (not the ring
    /// buffer, which is always [`MAX_RECENT_EVENTS`]).
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            tx,
            recent: RwLock::new(VecDeque::with_capacity(MAX_RECENT_EVENTS)),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    /// Broadcast an event to all current subscribers and store it in the
    /// ring buffer.
    pub fn broadcast(&self, payload: EventPayload) {
        let event = Event::new(payload);

        {
            let mut recent = self.recent.write();
            if recent.len() >= MAX_RECENT_EVENTS {
                recent.pop_back();
            }
            recent.push_front(event.clone());
        }

        // No subscribers is fine.
        let _ = self.tx.send(event);
    }

    /// Return the `n` most recent events (newest first).
    pub fn recent_events(&self, n: usize) -> Vec<Event> {
        let recent = self.recent.read();
        recent.iter().take(n).cloned().collect()
    }

    /// All retained events for one run, oldest first.
    pub fn events_for_run(&self, run_id: RunId) -> Vec<Event> {
        let recent = self.recent.read();
        recent
            .iter()
            .rev()
            .filter(|e| e.payload.run_id() == run_id)
            .cloned()
            .collect()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
