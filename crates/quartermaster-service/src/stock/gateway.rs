//! Read and write access to stock levels.

use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

use quartermaster_core::AppResult;
use quartermaster_core::types::id::{IssuedItemId, ItemId, RequestId, UserId};
use quartermaster_entity::request::Request;
use quartermaster_entity::stock::{DamagedItem, ItemStatus, StockItem};

use crate::context::SessionContext;
use crate::transport::ApiClient;

/// Stock operations the lifecycle manager depends on but does not own.
#[async_trait]
pub trait StockGateway: Send + Sync {
    /// Fetch the current state of a stock item.
    async fn item(&self, ctx: &SessionContext, id: &ItemId) -> AppResult<StockItem>;

    /// Current on-hand quantity of an item.
    async fn available(&self, ctx: &SessionContext, id: &ItemId) -> AppResult<u32> {
        Ok(self.item(ctx, id).await?.quantity)
    }

    /// Take `quantity` units out of stock. Returns the remaining quantity.
    ///
    /// Fails with `StockInsufficient` when fewer than `quantity` are on hand.
    async fn decrement(&self, ctx: &SessionContext, id: &ItemId, quantity: u32) -> AppResult<u32>;

    /// Mark the item as in use by `assignee`.
    async fn assign(&self, ctx: &SessionContext, id: &ItemId, assignee: &UserId) -> AppResult<()>;

    /// Create the damaged-item record for a repair request.
    ///
    /// Fails with `Conflict` when the request already has one.
    async fn record_damage(
        &self,
        ctx: &SessionContext,
        request: &Request,
        description: &str,
    ) -> AppResult<DamagedItem>;
}

#[derive(Debug, Serialize)]
struct QuantityPatch {
    quantity: u32,
}

#[derive(Debug, Serialize)]
struct AssignmentPatch<'a> {
    assigned_to: &'a UserId,
    status: ItemStatus,
}

#[derive(Debug, Serialize)]
struct NewDamagedItem<'a> {
    issued_item: Option<&'a IssuedItemId>,
    repair_request: &'a RequestId,
    damage_description: &'a str,
}

/// [`StockGateway`] backed by the `items/` and `damaged-items/` resources.
#[derive(Debug, Clone)]
pub struct HttpStockGateway {
    client: ApiClient,
}

impl HttpStockGateway {
    /// Creates a new stock gateway.
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StockGateway for HttpStockGateway {
    async fn item(&self, ctx: &SessionContext, id: &ItemId) -> AppResult<StockItem> {
        self.client.get(ctx, &format!("items/{id}/"), &[]).await
    }

    async fn decrement(&self, ctx: &SessionContext, id: &ItemId, quantity: u32) -> AppResult<u32> {
        let item = self.item(ctx, id).await?;
        let remaining = item.remaining_after(quantity)?;
        let updated: StockItem = self
            .client
            .patch(ctx, &format!("items/{id}/"), &QuantityPatch { quantity: remaining })
            .await?;
        info!(item_id = %id, taken = quantity, remaining = updated.quantity, "Stock decremented");
        Ok(updated.quantity)
    }

    async fn assign(&self, ctx: &SessionContext, id: &ItemId, assignee: &UserId) -> AppResult<()> {
        let _: StockItem = self
            .client
            .patch(
                ctx,
                &format!("items/{id}/"),
                &AssignmentPatch {
                    assigned_to: assignee,
                    status: ItemStatus::InUse,
                },
            )
            .await?;
        Ok(())
    }

    async fn record_damage(
        &self,
        ctx: &SessionContext,
        request: &Request,
        description: &str,
    ) -> AppResult<DamagedItem> {
        self.client
            .post(
                ctx,
                "damaged-items/",
                &NewDamagedItem {
                    issued_item: request.issued_item.as_ref(),
                    repair_request: &request.id,
                    damage_description: description,
                },
            )
            .await
    }
}
