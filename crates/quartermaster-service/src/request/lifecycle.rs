//! Request lifecycle manager.
//!
//! Every status change goes through [`LifecycleManager::transition`]:
//!
//! 1. the acting role must hold the transition's permission,
//! 2. the request is re-fetched so the check runs against server state,
//! 3. the transition is planned (legality and inputs),
//! 4. preconditions run (`approve` and `issue` re-read stock, `mark_damaged`
//!    records the damaged item, treating an existing record as done),
//! 5. the transition is committed and the cache updated,
//! 6. `issue` then decrements stock and assigns the item.
//!
//! Any failure before step 5 completes leaves the cache as it was. A failure
//! in step 6 is reported, but the request is already `issued`, so a retry is
//! rejected instead of decrementing stock twice.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use quartermaster_core::events::DomainEvent;
use quartermaster_core::types::id::RequestId;
use quartermaster_core::{AppError, AppResult, ErrorKind};
use quartermaster_entity::request::{NewRequest, Request, RequestType, Transition};
use quartermaster_entity::user::Permission;

use crate::context::SessionContext;
use crate::stock::StockGateway;

use super::backend::RequestBackend;
use super::cache::RequestCache;

/// Enforces legal request transitions and their stock side effects.
#[derive(Clone)]
pub struct LifecycleManager {
    /// Where requests are persisted.
    backend: Arc<dyn RequestBackend>,
    /// Stock levels.
    stock: Arc<dyn StockGateway>,
    /// Last-known-good requests.
    cache: Arc<RequestCache>,
}

impl std::fmt::Debug for LifecycleManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleManager")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl LifecycleManager {
    /// Creates a new lifecycle manager.
    pub fn new(
        backend: Arc<dyn RequestBackend>,
        stock: Arc<dyn StockGateway>,
        cache: Arc<RequestCache>,
    ) -> Self {
        Self {
            backend,
            stock,
            cache,
        }
    }

    /// The request cache this manager writes to.
    pub fn cache(&self) -> &Arc<RequestCache> {
        &self.cache
    }

    /// Create a new-item or repair request.
    pub async fn submit(&self, ctx: &SessionContext, request: NewRequest) -> AppResult<Request> {
        let permission = match request.request_type {
            RequestType::New => Permission::RequestItems,
            RequestType::Repair => Permission::RequestRepairs,
        };
        ctx.require(permission)?;
        request.check()?;

        let created = self.backend.create(ctx, &request).await?;
        self.cache.upsert(created.clone());

        let event = DomainEvent::new(Some(ctx.user_id.clone()), created.event());
        info!(
            event_id = %event.id,
            request_id = %created.id,
            request_type = %created.request_type,
            user_id = %ctx.user_id,
            "{}",
            event.payload.summary()
        );
        Ok(created)
    }

    /// Reload all requests of one type from the server.
    pub async fn refresh(
        &self,
        ctx: &SessionContext,
        request_type: RequestType,
    ) -> AppResult<Vec<Request>> {
        ctx.ensure_authenticated()?;
        let requests = self.backend.list(ctx, request_type).await?;
        self.cache.replace_type(request_type, requests.clone());
        Ok(requests)
    }

    /// Approve a pending new-item request, optionally with a new quantity.
    pub async fn approve(
        &self,
        ctx: &SessionContext,
        id: &RequestId,
        quantity: Option<u32>,
    ) -> AppResult<Request> {
        self.transition(ctx, id, Transition::Approve { quantity })
            .await
    }

    /// Deny a pending new-item request.
    pub async fn deny(&self, ctx: &SessionContext, id: &RequestId, reason: &str) -> AppResult<Request> {
        self.transition(
            ctx,
            id,
            Transition::Deny {
                reason: reason.to_string(),
            },
        )
        .await
    }

    /// Issue an approved request's stock to the requester.
    pub async fn issue(&self, ctx: &SessionContext, id: &RequestId) -> AppResult<Request> {
        self.transition(ctx, id, Transition::Issue).await
    }

    /// Close out an issued request.
    pub async fn complete(&self, ctx: &SessionContext, id: &RequestId) -> AppResult<Request> {
        self.transition(ctx, id, Transition::Complete).await
    }

    /// Start work on a pending repair request.
    pub async fn mark_in_process(&self, ctx: &SessionContext, id: &RequestId) -> AppResult<Request> {
        self.transition(ctx, id, Transition::MarkInProcess).await
    }

    /// Finish work on a repair request.
    pub async fn mark_repaired(&self, ctx: &SessionContext, id: &RequestId) -> AppResult<Request> {
        self.transition(ctx, id, Transition::MarkRepaired).await
    }

    /// Write off the item of a pending repair request.
    pub async fn mark_damaged(
        &self,
        ctx: &SessionContext,
        id: &RequestId,
        description: &str,
    ) -> AppResult<Request> {
        self.transition(
            ctx,
            id,
            Transition::MarkDamaged {
                description: description.to_string(),
            },
        )
        .await
    }

    /// Apply `transition` to the request `id`.
    pub async fn transition(
        &self,
        ctx: &SessionContext,
        id: &RequestId,
        transition: Transition,
    ) -> AppResult<Request> {
        match self.run(ctx, id, &transition).await {
            Ok(request) => {
                self.cache.upsert(request.clone());
                let event = DomainEvent::new(Some(ctx.user_id.clone()), request.event());
                info!(
                    event_id = %event.id,
                    request_id = %request.id,
                    action = transition.name(),
                    status = %request.status,
                    actor = %ctx.user_id,
                    owner = %event.payload.request().owner,
                    notification_type = event.payload.notification_type(),
                    "{}",
                    event.payload.summary()
                );
                Ok(request)
            }
            Err(e) => {
                warn!(
                    request_id = %id,
                    action = transition.name(),
                    kind = %e.kind,
                    error = %e.message,
                    "Request transition failed"
                );
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        ctx: &SessionContext,
        id: &RequestId,
        transition: &Transition,
    ) -> AppResult<Request> {
        ctx.require(transition.required_permission())?;

        let current = self
            .backend
            .fetch(ctx, transition.request_type(), id)
            .await?;
        let planned = transition.apply(&current, &ctx.user_id, Utc::now())?;

        match transition {
            Transition::Approve { .. } | Transition::Issue => {
                self.ensure_stock(ctx, &current, transition.quantity_for(&current))
                    .await?;
            }
            Transition::MarkDamaged { description } => {
                self.record_damage(ctx, &current, description.trim()).await?;
            }
            Transition::Deny { .. }
            | Transition::Complete
            | Transition::MarkInProcess
            | Transition::MarkRepaired => {}
        }

        let committed = self
            .backend
            .commit(ctx, &current, transition, &planned)
            .await?;
        if committed.status != planned.status {
            warn!(
                request_id = %current.id,
                expected = %planned.status,
                actual = %committed.status,
                "Backend reported a different status after commit"
            );
        }
        let committed = reconcile(committed, &planned);

        if matches!(transition, Transition::Issue) {
            let quantity = transition.quantity_for(&current);
            if let Err(e) = self.hand_over(ctx, &current, quantity).await {
                self.cache.upsert(committed.clone());
                return Err(AppError::with_source(
                    e.kind,
                    format!(
                        "Request {} is issued but updating stock for {} failed: {}",
                        current.id,
                        current.item_label(),
                        e.message
                    ),
                    e,
                ));
            }
        }
        Ok(committed)
    }

    /// Take the issued quantity out of stock and assign the item to the requester.
    async fn hand_over(&self, ctx: &SessionContext, request: &Request, quantity: u32) -> AppResult<()> {
        self.stock.decrement(ctx, &request.item, quantity).await?;
        self.stock
            .assign(ctx, &request.item, &request.requested_by)
            .await
    }

    async fn record_damage(
        &self,
        ctx: &SessionContext,
        request: &Request,
        description: &str,
    ) -> AppResult<()> {
        match self.stock.record_damage(ctx, request, description).await {
            Ok(record) => {
                info!(
                    request_id = %request.id,
                    damaged_item_id = %record.id,
                    "Damaged item recorded"
                );
                Ok(())
            }
            // Left behind by an earlier attempt whose commit failed
            Err(e) if e.kind == ErrorKind::Conflict => {
                info!(
                    request_id = %request.id,
                    detail = %e.message,
                    "Damaged item already recorded"
                );
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn ensure_stock(
        &self,
        ctx: &SessionContext,
        request: &Request,
        quantity: u32,
    ) -> AppResult<()> {
        let available = self.stock.available(ctx, &request.item).await?;
        if available < quantity {
            return Err(AppError::stock_insufficient(format!(
                "{} has {available} on hand, {quantity} requested",
                request.item_label()
            )));
        }
        Ok(())
    }
}

/// Fill stamps the backend did not echo back from the planned version.
fn reconcile(mut committed: Request, planned: &Request) -> Request {
    fn fill<T: Clone>(slot: &mut Option<T>, planned: &Option<T>) {
        if slot.is_none() {
            slot.clone_from(planned);
        }
    }

    fill(&mut committed.item_name, &planned.item_name);
    fill(&mut committed.approved_by, &planned.approved_by);
    fill(&mut committed.approved_at, &planned.approved_at);
    fill(&mut committed.denied_by, &planned.denied_by);
    fill(&mut committed.denied_at, &planned.denied_at);
    fill(&mut committed.reason, &planned.reason);
    fill(&mut committed.issued_by, &planned.issued_by);
    fill(&mut committed.issued_at, &planned.issued_at);
    fill(&mut committed.updated_by, &planned.updated_by);
    fill(&mut committed.updated_at, &planned.updated_at);
    committed
}
