//! Deduplicating in-memory notification list.

use std::collections::HashSet;
use std::sync::Mutex;

use quartermaster_core::types::id::NotificationId;
use quartermaster_entity::notification::NotificationEvent;

#[derive(Debug, Default)]
struct Inner {
    /// Events in the order they were first seen.
    events: Vec<NotificationEvent>,
    /// Ids of everything in `events`.
    seen: HashSet<NotificationId>,
    /// Number of entries in `events` with `read == false`.
    unread: usize,
}

/// Process-local cache of the user's notifications.
///
/// An id enters the list at most once no matter how often the transport
/// redelivers it. Entries are only ever flipped to read; the list is
/// emptied as a whole when the session ends.
#[derive(Debug, Default)]
pub struct NotificationStore {
    inner: Mutex<Inner>,
}

impl NotificationStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `event` unless its id is already known.
    ///
    /// Returns `true` if the event was new.
    pub fn insert(&self, event: NotificationEvent) -> bool {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if !inner.seen.insert(event.id.clone()) {
            return false;
        }
        if event.is_unread() {
            inner.unread += 1;
        }
        inner.events.push(event);
        true
    }

    /// Replace the whole list with a server snapshot.
    ///
    /// Duplicate ids within the snapshot keep their first occurrence.
    pub fn replace_all(&self, events: impl IntoIterator<Item = NotificationEvent>) {
        let mut fresh = Inner::default();
        for event in events {
            if fresh.seen.insert(event.id.clone()) {
                if event.is_unread() {
                    fresh.unread += 1;
                }
                fresh.events.push(event);
            }
        }
        *self.inner.lock().unwrap_or_else(|e| e.into_inner()) = fresh;
    }

    /// Flip one event to read. Returns `true` if it was unread.
    pub fn mark_read(&self, id: &NotificationId) -> bool {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let flipped = match inner.events.iter_mut().find(|e| &e.id == id) {
            Some(event) if event.is_unread() => {
                event.read = true;
                true
            }
            _ => false,
        };
        if flipped {
            inner.unread -= 1;
        }
        flipped
    }

    /// Flip every event to read. Returns how many changed.
    pub fn mark_all_read(&self) -> usize {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let mut changed = 0;
        for event in inner.events.iter_mut().filter(|e| e.is_unread()) {
            event.read = true;
            changed += 1;
        }
        inner.unread = 0;
        changed
    }

    /// Drop everything. Called when the session ends.
    pub fn clear(&self) {
        *self.inner.lock().unwrap_or_else(|e| e.into_inner()) = Inner::default();
    }

    /// Number of unread events.
    pub fn unread_count(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).unread
    }

    /// Number of events held.
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .events
            .len()
    }

    /// Whether the store holds no events.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether an event with `id` is held.
    pub fn contains(&self, id: &NotificationId) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .seen
            .contains(id)
    }

    /// Copy of all events in arrival order.
    pub fn snapshot(&self) -> Vec<NotificationEvent> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .events
            .clone()
    }
}
