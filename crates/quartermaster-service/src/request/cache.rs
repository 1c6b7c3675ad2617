//! Process-local cache of requests.

use std::collections::HashMap;
use std::sync::Mutex;

use quartermaster_core::types::id::{RequestId, UserId};
use quartermaster_entity::request::{Request, RequestStatus, RequestType};

/// Cache key. New-item and repair requests live in separate id spaces.
type CacheKey = (RequestType, RequestId);

/// Last-known-good copy of the requests the user has seen.
///
/// Written only with server-confirmed state: after a successful fetch or a
/// committed transition. A failed call leaves the cache untouched.
#[derive(Debug, Default)]
pub struct RequestCache {
    entries: Mutex<HashMap<CacheKey, Request>>,
}

impl RequestCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace one request.
    pub fn upsert(&self, request: Request) {
        let key = (request.request_type, request.id.clone());
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key, request);
    }

    /// Replace every cached request of `request_type`.
    pub fn replace_type(&self, request_type: RequestType, requests: Vec<Request>) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.retain(|(t, _), _| *t != request_type);
        for request in requests {
            entries.insert((request.request_type, request.id.clone()), request);
        }
    }

    /// Look up one request.
    pub fn get(&self, request_type: RequestType, id: &RequestId) -> Option<Request> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&(request_type, id.clone()))
            .cloned()
    }

    /// Cached requests matching `filter`, newest first.
    fn select(&self, filter: impl Fn(&Request) -> bool) -> Vec<Request> {
        let mut selected: Vec<Request> = self
            .entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .filter(|r| filter(r))
            .cloned()
            .collect();
        selected.sort_by(|a, b| b.requested_at.cmp(&a.requested_at));
        selected
    }

    /// All cached requests of one type.
    pub fn by_type(&self, request_type: RequestType) -> Vec<Request> {
        self.select(|r| r.request_type == request_type)
    }

    /// All cached requests in `status`.
    pub fn by_status(&self, status: RequestStatus) -> Vec<Request> {
        self.select(|r| r.status == status)
    }

    /// Requests waiting for a decision.
    pub fn pending(&self) -> Vec<Request> {
        self.by_status(RequestStatus::Pending)
    }

    /// Requests created by `user`.
    pub fn requested_by(&self, user: &UserId) -> Vec<Request> {
        self.select(|r| &r.requested_by == user)
    }

    /// Number of cached requests.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop everything. Called when the session ends.
    pub fn clear(&self) {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}
