//! Pending TTL choice for the next outgoing message.
//!
//! One `SelectionSlot` is created per plugin instance and cloned into both
//! the composer button and the before-send hook. Clones share state.
//!
//! States: `Empty` and `Pending(tag)`. `select` overwrites (last write
//! wins), `clear` discards, `consume_if_pending` hands the tag to exactly one
//! outgoing message and tells subscribers to reset.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;

/// Capacity of the notification channel. Composer views only care about the
/// latest event, so lagging receivers lose nothing important.
const EVENT_CAPACITY: usize = 16;

/// Notifications published by the slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionEvent {
    Selected(String),
    /// The user dropped the selection without sending.
    Cleared,
    /// The selection was attached to an outgoing message.
    Reset,
}

/// Shared holder of the pending duration tag.
#[derive(Clone)]
pub struct SelectionSlot {
    pending: Arc<Mutex<Option<String>>>,
    events: broadcast::Sender<SelectionEvent>,
}

impl SelectionSlot {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            pending: Arc::new(Mutex::new(None)),
            events,
        }
    }

    /// Set the pending tag, replacing any previous one.
    ///
    /// The tag is not validated; an invalid tag simply fails to parse later.
    pub fn select(&self, tag: impl Into<String>) {
        let tag = tag.into();
        *self.lock() = Some(tag.clone());
        self.notify(SelectionEvent::Selected(tag));
    }

    /// Drop the pending tag without consuming it. Idempotent.
    pub fn clear(&self) {
        *self.lock() = None;
        self.notify(SelectionEvent::Cleared);
    }

    /// Take the pending tag, leaving the slot empty.
    ///
    /// Called once per outgoing message. Emits [`SelectionEvent::Reset`]
    /// only when a tag was actually taken.
    pub fn consume_if_pending(&self) -> Option<String> {
        let tag = self.lock().take()?;
        tracing::debug!(duration = %tag, "selection consumed");
        self.notify(SelectionEvent::Reset);
        Some(tag)
    }

    /// The pending tag, if any, without consuming it.
    pub fn pending(&self) -> Option<String> {
        self.lock().clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SelectionEvent> {
        self.events.subscribe()
    }

    fn lock(&self) -> MutexGuard<'_, Option<String>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self, event: SelectionEvent) {
        // No subscribers is fine: nobody has a composer open.
        let _ = self.events.send(event);
    }
}

impl Default for SelectionSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SelectionSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectionSlot")
            .field("pending", &self.pending())
            .finish()
    }
}
