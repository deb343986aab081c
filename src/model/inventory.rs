//! Inventory items and their append-only transaction log.

use jiff::Timestamp;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A stocked input. `(name, unit)` is unique; `quantity` never drops below zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: Uuid,
    pub name: String,
    pub unit: String,
    pub quantity: Decimal,
    pub reorder_level: Decimal,
}

impl InventoryItem {
    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.reorder_level
    }
}

/// One stock change. Never mutated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryTransaction {
    pub id: Uuid,
    pub item_id: Uuid,
    pub task_id: Option<Uuid>,
    /// Signed: negative for debits.
    pub delta: Decimal,
    pub reason: String,
    pub recorded_by: String,
    pub recorded_at: Timestamp,
}
