//! Stock item and damaged-item models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use quartermaster_core::AppError;
use quartermaster_core::types::id::{DamagedItemId, IssuedItemId, ItemId, RequestId, UserId};

/// Availability of a stock item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ItemStatus {
    /// On the shelf.
    #[default]
    Available,
    /// Handed out.
    InUse,
    /// Under maintenance.
    Maintenance,
    /// No longer in service.
    Retired,
}

/// A stock item with its current on-hand quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockItem {
    /// Unique item identifier.
    pub id: ItemId,
    /// Item name.
    pub name: String,
    /// Manufacturer serial number.
    #[serde(default)]
    pub serial_number: Option<String>,
    /// Category label.
    #[serde(default)]
    pub category: Option<String>,
    /// Quantity currently on hand.
    pub quantity: u32,
    /// Availability.
    #[serde(default)]
    pub status: ItemStatus,
    /// User the item is assigned to.
    #[serde(default)]
    pub assigned_to: Option<UserId>,
    /// Last modification time.
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

impl StockItem {
    /// Check if the item can cover `quantity`.
    pub fn can_supply(&self, quantity: u32) -> bool {
        self.quantity >= quantity
    }

    /// Quantity left after handing out `quantity`, or `StockInsufficient`.
    pub fn remaining_after(&self, quantity: u32) -> Result<u32, AppError> {
        self.quantity.checked_sub(quantity).ok_or_else(|| {
            AppError::stock_insufficient(format!(
                "{} has {} on hand, {} requested",
                self.name, self.quantity, quantity
            ))
        })
    }
}

/// Record of an item written off during repair triage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamagedItem {
    /// Unique record identifier.
    pub id: DamagedItemId,
    /// The repair request that led here.
    pub repair_request: RequestId,
    /// The issued item that was damaged.
    #[serde(default)]
    pub issued_item: Option<IssuedItemId>,
    /// What is wrong with it.
    pub damage_description: String,
    /// Who reported it.
    #[serde(default)]
    pub reported_by: Option<UserId>,
    /// When it was reported.
    #[serde(default = "Utc::now")]
    pub reported_at: DateTime<Utc>,
}
