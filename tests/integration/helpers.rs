//! Shared test helpers for integration tests.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use futures::StreamExt;
use tokio::sync::watch;
use tokio::time::Instant;

use quartermaster_core::config::realtime::RealtimeConfig;
use quartermaster_core::types::id::{
    DamagedItemId, ItemId, NotificationId, RequestId, UserId,
};
use quartermaster_core::{AppError, AppResult};
use quartermaster_entity::notification::NotificationEvent;
use quartermaster_entity::request::{NewRequest, Request, RequestStatus, RequestType, Transition};
use quartermaster_entity::stock::{DamagedItem, StockItem};
use quartermaster_entity::user::UserRole;
use quartermaster_realtime::{
    AlertSink, ConnectionState, Connector, Frame, FrameStream, LiveChannel, Url,
};
use quartermaster_service::{
    ClientSession, NotificationApi, NotificationStore, RequestBackend, SessionContext,
    StockGateway,
};

pub const ADMIN: u64 = 1;
pub const OFFICER: u64 = 2;
pub const LEADER: u64 = 3;

/// A session for `user` acting as `role`.
pub fn session(role: UserRole, user: u64) -> SessionContext {
    SessionContext::new("test-token", UserId::from(user), role, format!("user-{user}"))
}

pub fn admin() -> SessionContext {
    session(UserRole::Admin, ADMIN)
}

pub fn officer() -> SessionContext {
    session(UserRole::LogisticsOfficer, OFFICER)
}

pub fn leader() -> SessionContext {
    session(UserRole::UnitLeader, LEADER)
}

/// A request owned by the unit leader.
pub fn request(id: u64, request_type: RequestType, item: u64, quantity: u32) -> Request {
    Request {
        id: RequestId::from(id),
        request_type,
        item: ItemId::from(item),
        item_name: Some("Radio".to_string()),
        quantity,
        requested_by: UserId::from(LEADER),
        requested_by_name: Some("Unit Leader".to_string()),
        requested_at: Utc::now(),
        status: RequestStatus::Pending,
        priority: Default::default(),
        purpose: None,
        description: None,
        issued_item: None,
        approved_by: None,
        approved_at: None,
        denied_by: None,
        denied_at: None,
        reason: None,
        issued_by: None,
        issued_at: None,
        updated_by: None,
        updated_at: None,
    }
}

pub fn stock_item(id: u64, quantity: u32) -> StockItem {
    StockItem {
        id: ItemId::from(id),
        name: "Radio".to_string(),
        serial_number: Some(format!("SN-{id}")),
        category: Some("Comms".to_string()),
        quantity,
        status: Default::default(),
        assigned_to: None,
        last_updated: None,
    }
}

pub fn notification(id: &str, read: bool) -> NotificationEvent {
    NotificationEvent {
        id: id.parse().expect("notification id"),
        message: format!("Notification {id}"),
        kind: "request_approved".into(),
        read,
        created_at: Utc::now(),
        recipient_id: UserId::from(LEADER),
        request_id: None,
    }
}

// ── Request backend ─────────────────────────────────────────────

/// Request storage held in memory.
#[derive(Default)]
pub struct MemoryBackend {
    requests: Mutex<HashMap<(RequestType, RequestId), Request>>,
    next_id: AtomicUsize,
    fail_commits: AtomicBool,
    pub fetches: AtomicUsize,
    pub creates: AtomicUsize,
    pub commits: AtomicUsize,
}

impl MemoryBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            next_id: AtomicUsize::new(100),
            ..Default::default()
        })
    }

    pub fn insert(&self, request: Request) {
        self.requests
            .lock()
            .unwrap()
            .insert((request.request_type, request.id.clone()), request);
    }

    pub fn get(&self, request_type: RequestType, id: u64) -> Request {
        self.requests
            .lock()
            .unwrap()
            .get(&(request_type, RequestId::from(id)))
            .cloned()
            .expect("request in backend")
    }

    pub fn status(&self, request_type: RequestType, id: u64) -> RequestStatus {
        self.get(request_type, id).status
    }

    /// Make every following commit fail with a network error.
    pub fn fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl RequestBackend for MemoryBackend {
    async fn list(&self, _ctx: &SessionContext, request_type: RequestType) -> AppResult<Vec<Request>> {
        Ok(self
            .requests
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.request_type == request_type)
            .cloned()
            .collect())
    }

    async fn fetch(
        &self,
        _ctx: &SessionContext,
        request_type: RequestType,
        id: &RequestId,
    ) -> AppResult<Request> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .unwrap()
            .get(&(request_type, id.clone()))
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("{request_type} request {id} not found")))
    }

    async fn create(&self, ctx: &SessionContext, new: &NewRequest) -> AppResult<Request> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) as u64;
        let mut created = request(id, new.request_type, 0, new.quantity);
        created.item = new.item.clone();
        created.item_name = None;
        created.requested_by = ctx.user_id.clone();
        created.priority = new.priority;
        created.purpose = new.purpose.clone();
        created.description = new.description.clone();
        created.issued_item = new.issued_item.clone();
        self.insert(created.clone());
        Ok(created)
    }

    async fn commit(
        &self,
        _ctx: &SessionContext,
        _current: &Request,
        _transition: &Transition,
        planned: &Request,
    ) -> AppResult<Request> {
        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(AppError::network("connection reset by peer"));
        }
        self.commits.fetch_add(1, Ordering::SeqCst);
        self.insert(planned.clone());
        Ok(planned.clone())
    }
}

// ── Stock ───────────────────────────────────────────────────────

/// Stock levels held in memory.
#[derive(Default)]
pub struct MemoryStock {
    items: Mutex<HashMap<ItemId, StockItem>>,
    fail_updates: AtomicBool,
    pub assignments: Mutex<Vec<(ItemId, UserId)>>,
    pub damages: Mutex<Vec<DamagedItem>>,
}

impl MemoryStock {
    pub fn with_items(items: Vec<StockItem>) -> Arc<Self> {
        let stock = Self::default();
        {
            let mut map = stock.items.lock().unwrap();
            for item in items {
                map.insert(item.id.clone(), item);
            }
        }
        Arc::new(stock)
    }

    pub fn quantity(&self, id: u64) -> u32 {
        self.items.lock().unwrap()[&ItemId::from(id)].quantity
    }

    /// Make every following decrement fail with a network error.
    pub fn fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    pub fn set_quantity(&self, id: u64, quantity: u32) {
        if let Some(item) = self.items.lock().unwrap().get_mut(&ItemId::from(id)) {
            item.quantity = quantity;
        }
    }
}

#[async_trait]
impl StockGateway for MemoryStock {
    async fn item(&self, _ctx: &SessionContext, id: &ItemId) -> AppResult<StockItem> {
        self.items
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("item {id} not found")))
    }

    async fn decrement(&self, _ctx: &SessionContext, id: &ItemId, quantity: u32) -> AppResult<u32> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(AppError::network("connection reset by peer"));
        }
        let mut items = self.items.lock().unwrap();
        let item = items
            .get_mut(id)
            .ok_or_else(|| AppError::not_found(format!("item {id} not found")))?;
        item.quantity = item.remaining_after(quantity)?;
        Ok(item.quantity)
    }

    async fn assign(&self, _ctx: &SessionContext, id: &ItemId, assignee: &UserId) -> AppResult<()> {
        self.assignments
            .lock()
            .unwrap()
            .push((id.clone(), assignee.clone()));
        Ok(())
    }

    async fn record_damage(
        &self,
        ctx: &SessionContext,
        request: &Request,
        description: &str,
    ) -> AppResult<DamagedItem> {
        let mut damages = self.damages.lock().unwrap();
        if damages.iter().any(|d| d.repair_request == request.id) {
            return Err(AppError::conflict(format!(
                "repair request {} already has a damaged-item record",
                request.id
            )));
        }
        let record = DamagedItem {
            id: DamagedItemId::from(damages.len() as u64 + 1),
            repair_request: request.id.clone(),
            issued_item: request.issued_item.clone(),
            damage_description: description.to_string(),
            reported_by: Some(ctx.user_id.clone()),
            reported_at: Utc::now(),
        };
        damages.push(record.clone());
        Ok(record)
    }
}

// ── Notifications ───────────────────────────────────────────────

/// Server-side notifications held in memory.
#[derive(Default)]
pub struct MemoryNotificationApi {
    pub persisted: Mutex<Vec<NotificationEvent>>,
    fail: AtomicBool,
}

impl MemoryNotificationApi {
    pub fn with(events: Vec<NotificationEvent>) -> Arc<Self> {
        Arc::new(Self {
            persisted: Mutex::new(events),
            fail: AtomicBool::new(false),
        })
    }

    /// Make every following call fail with a network error.
    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    fn check(&self) -> AppResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            Err(AppError::network("request timed out"))
        } else {
            Ok(())
        }
    }

    pub fn is_read(&self, id: &str) -> bool {
        let id: NotificationId = id.parse().unwrap();
        self.persisted
            .lock()
            .unwrap()
            .iter()
            .any(|e| e.id == id && e.read)
    }
}

#[async_trait]
impl NotificationApi for MemoryNotificationApi {
    async fn list(&self, _ctx: &SessionContext) -> AppResult<Vec<NotificationEvent>> {
        self.check()?;
        Ok(self.persisted.lock().unwrap().clone())
    }

    async fn mark_read(&self, _ctx: &SessionContext, id: &NotificationId) -> AppResult<()> {
        self.check()?;
        let mut persisted = self.persisted.lock().unwrap();
        let event = persisted
            .iter_mut()
            .find(|e| &e.id == id)
            .ok_or_else(|| AppError::not_found(format!("notification {id} not found")))?;
        event.read = true;
        Ok(())
    }

    async fn mark_all_read(&self, _ctx: &SessionContext) -> AppResult<()> {
        self.check()?;
        for event in self.persisted.lock().unwrap().iter_mut() {
            event.read = true;
        }
        Ok(())
    }
}

/// A session wired against the in-memory collaborators.
pub struct TestSession {
    pub session: ClientSession,
    pub backend: Arc<MemoryBackend>,
    pub stock: Arc<MemoryStock>,
    pub notifications: Arc<MemoryNotificationApi>,
}

impl TestSession {
    pub fn new(ctx: SessionContext, items: Vec<StockItem>) -> Self {
        let backend = MemoryBackend::new();
        let stock = MemoryStock::with_items(items);
        let notifications = MemoryNotificationApi::with(Vec::new());
        let session = ClientSession::new(
            ctx,
            notifications.clone(),
            backend.clone(),
            stock.clone(),
        );
        Self {
            session,
            backend,
            stock,
            notifications,
        }
    }
}

// ── Push transport ──────────────────────────────────────────────

/// What the next connection attempt does.
pub enum Script {
    /// The handshake fails.
    Fail(AppError),
    /// The handshake succeeds and the connection delivers `frames`; with
    /// `hold` it then stays open, otherwise it closes.
    Open { frames: Vec<Frame>, hold: bool },
}

/// Connector that plays back a script and records every attempt.
/// Once the script runs out every attempt is refused.
#[derive(Default)]
pub struct ScriptedConnector {
    script: Mutex<VecDeque<Script>>,
    attempts: Mutex<Vec<Instant>>,
    urls: Mutex<Vec<String>>,
}

impl ScriptedConnector {
    pub fn new(script: Vec<Script>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            ..Default::default()
        })
    }

    pub fn attempts(&self) -> usize {
        self.attempts.lock().unwrap().len()
    }

    pub fn attempt_times(&self) -> Vec<Instant> {
        self.attempts.lock().unwrap().clone()
    }

    pub fn last_url(&self) -> Option<String> {
        self.urls.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn connect(&self, url: &Url) -> AppResult<FrameStream> {
        self.attempts.lock().unwrap().push(Instant::now());
        self.urls.lock().unwrap().push(url.to_string());

        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Script::Open { frames, hold }) => {
                let frames = futures::stream::iter(frames.into_iter().map(Ok));
                if hold {
                    Ok(frames.chain(futures::stream::pending()).boxed())
                } else {
                    Ok(frames.boxed())
                }
            }
            Some(Script::Fail(e)) => Err(e),
            None => Err(AppError::network("connection refused")),
        }
    }
}

/// Alert sink that remembers every message.
#[derive(Default)]
pub struct RecordingAlerts {
    pub messages: Mutex<Vec<String>>,
}

impl AlertSink for RecordingAlerts {
    fn alert(&self, event: &NotificationEvent) {
        self.messages.lock().unwrap().push(event.message.clone());
    }
}

/// Push payload in the nested wire shape.
pub fn push(id: &str, message: &str) -> Frame {
    Frame::Text(
        serde_json::json!({
            "type": "send_notification",
            "message": message,
            "notification_type": "request_approved",
            "data": {"notification_id": id, "created_at": Utc::now().to_rfc3339()},
        })
        .to_string(),
    )
}

/// A channel over a scripted connector.
pub struct TestChannel {
    pub channel: LiveChannel,
    pub store: Arc<NotificationStore>,
    pub alerts: Arc<RecordingAlerts>,
    pub connector: Arc<ScriptedConnector>,
}

impl TestChannel {
    pub fn new(script: Vec<Script>) -> Self {
        Self::with_config(script, RealtimeConfig::default())
    }

    /// A channel that gives up after `max_attempts` failed attempts.
    pub fn with_max_attempts(script: Vec<Script>, max_attempts: u32) -> Self {
        Self::with_config(
            script,
            RealtimeConfig {
                max_attempts,
                ..RealtimeConfig::default()
            },
        )
    }

    fn with_config(script: Vec<Script>, config: RealtimeConfig) -> Self {
        let connector = ScriptedConnector::new(script);
        let store = Arc::new(NotificationStore::new());
        let alerts = Arc::new(RecordingAlerts::default());
        let config = RealtimeConfig {
            url: "ws://localhost:8000/ws/notifications/".to_string(),
            ..config
        };
        let channel = LiveChannel::new(&config, connector.clone(), store.clone(), alerts.clone())
            .expect("channel");
        Self {
            channel,
            store,
            alerts,
            connector,
        }
    }
}

/// Wait until the watched state satisfies `predicate`.
pub async fn wait_for_state(
    states: &mut watch::Receiver<ConnectionState>,
    predicate: impl FnMut(&ConnectionState) -> bool,
) -> ConnectionState {
    let state = tokio::time::timeout(Duration::from_secs(3600), states.wait_for(predicate))
        .await
        .expect("state not reached in time")
        .expect("state sender dropped");
    *state
}
