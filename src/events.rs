//! Edit events
//!
//! Structured notifications emitted while staging and publishing. Observers
//! are injected; nothing here writes to a fixed output stream.

use crate::types::ObjectId;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::mpsc::{channel, Receiver, Sender};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EditEvent {
    /// An operation was appended to the session log
    Staged { operation: String },
    /// A tree entry was relocated by the move primitive
    Moved { from: String, to: String },
    /// A new commit was created and the reference advanced
    Published {
        commit: ObjectId,
        tree: ObjectId,
        operations: usize,
    },
    /// The batch produced the tree that was already current
    Unchanged { tree: ObjectId, operations: usize },
    /// The reference moved under the session; nothing was written
    Conflict { expected: ObjectId, actual: ObjectId },
    /// Staged operations were dropped
    Discarded { operations: usize },
}

/// Receiver of edit events
pub trait EditObserver: Send + Sync {
    fn notify(&self, event: &EditEvent);
}

/// Observer that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl EditObserver for NullObserver {
    fn notify(&self, _event: &EditEvent) {}
}

/// Observer that forwards events to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl EditObserver for TracingObserver {
    fn notify(&self, event: &EditEvent) {
        match event {
            EditEvent::Staged { operation } => info!(operation = %operation, "Staged"),
            EditEvent::Moved { from, to } => info!(from = %from, to = %to, "Moved"),
            EditEvent::Published {
                commit,
                tree,
                operations,
            } => info!(
                commit = %commit.short(),
                tree = %tree.short(),
                operations,
                "Published"
            ),
            EditEvent::Unchanged { tree, operations } => {
                info!(tree = %tree.short(), operations, "Nothing to publish")
            }
            EditEvent::Conflict { expected, actual } => warn!(
                expected = %expected.short(),
                actual = %actual.short(),
                "Publish rejected: head moved"
            ),
            EditEvent::Discarded { operations } => info!(operations, "Discarded staged operations"),
        }
    }
}

/// In-process event channel
pub struct EventBus {
    sender: Mutex<Sender<EditEvent>>,
}

impl EventBus {
    pub fn new_pair() -> (Self, Receiver<EditEvent>) {
        let (sender, receiver) = channel();
        (
            Self {
                sender: Mutex::new(sender),
            },
            receiver,
        )
    }
}

impl EditObserver for EventBus {
    fn notify(&self, event: &EditEvent) {
        // A dropped receiver just means nobody is listening anymore.
        let _ = self.sender.lock().send(event.clone());
    }
}
