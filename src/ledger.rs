//! Inventory ledger: stock levels and the append-only transaction log.
//!
//! Stock only moves through [`apply_adjustment`], which refuses any change
//! that would leave an item below zero and logs every change it makes.

use jiff::Timestamp;
use rusqlite::Connection;
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use crate::catalog::required_text;
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::identity::Actor;
use crate::model::{InventoryItem, InventoryTransaction};
use crate::storage;

#[derive(Debug, Clone)]
pub struct NewInventoryItem {
    pub name: String,
    pub unit: String,
    pub quantity: Decimal,
    pub reorder_level: Decimal,
}

impl Engine {
    /// Stocks a new input. `(name, unit)` must be unused.
    pub fn create_inventory_item(
        &self,
        actor: &Actor,
        new: NewInventoryItem,
    ) -> Result<InventoryItem> {
        let name = required_text("item name", &new.name)?;
        let unit = required_text("unit", &new.unit)?;
        if new.quantity < Decimal::ZERO {
            return Err(Error::InvalidArgument(format!(
                "initial quantity must not be negative, got {}",
                new.quantity
            )));
        }
        if new.reorder_level < Decimal::ZERO {
            return Err(Error::InvalidArgument(format!(
                "reorder level must not be negative, got {}",
                new.reorder_level
            )));
        }

        let item = InventoryItem {
            id: Uuid::new_v4(),
            name,
            unit,
            quantity: new.quantity,
            reorder_level: new.reorder_level,
        };
        let conn = self.storage.connect()?;
        storage::inventory::insert_item(&conn, &item).map_err(|e| {
            if e.is_constraint_violation() {
                Error::Conflict(format!(
                    "inventory item {} ({}) already exists",
                    item.name, item.unit
                ))
            } else {
                e.into()
            }
        })?;

        info!(id = %item.id, name = %item.name, unit = %item.unit, actor = %actor.name, "created inventory item");
        Ok(item)
    }

    /// Changes stock by a signed `delta` and returns the new quantity.
    ///
    /// Fails with [`Error::InsufficientStock`] if the result would be
    /// negative; the item is then left exactly as it was.
    pub fn adjust_inventory(
        &self,
        actor: &Actor,
        item_id: Uuid,
        delta: Decimal,
        reason: &str,
        task_id: Option<Uuid>,
    ) -> Result<Decimal> {
        if delta.is_zero() {
            return Err(Error::InvalidArgument("adjustment must not be zero".into()));
        }
        let reason = required_text("reason", reason)?;
        let now = self.clock.now();

        let quantity = self.storage.unit_of_work(|tx| {
            let item = storage::inventory::load_item(tx, item_id)?;
            if let Some(id) = task_id {
                storage::task::load_task(tx, id)?;
            }
            apply_adjustment(tx, &item, delta, &reason, task_id, &actor.name, now)
        })?;

        info!(item = %item_id, %delta, %quantity, actor = %actor.name, "adjusted inventory");
        Ok(quantity)
    }

    pub fn get_inventory_item(&self, id: Uuid) -> Result<InventoryItem> {
        let conn = self.storage.connect()?;
        Ok(storage::inventory::load_item(&conn, id)?)
    }

    pub fn list_inventory(&self) -> Result<Vec<InventoryItem>> {
        let conn = self.storage.connect()?;
        Ok(storage::inventory::list_items(&conn)?)
    }

    /// Items at or below their reorder level.
    pub fn list_low_stock_inventory(&self) -> Result<Vec<InventoryItem>> {
        Ok(self
            .list_inventory()?
            .into_iter()
            .filter(InventoryItem::is_low_stock)
            .collect())
    }

    /// Every stock change for `item_id`, oldest first.
    pub fn inventory_history(&self, item_id: Uuid) -> Result<Vec<InventoryTransaction>> {
        let conn = self.storage.connect()?;
        storage::inventory::load_item(&conn, item_id)?;
        Ok(storage::inventory::list_transactions(&conn, item_id)?)
    }
}

/// Applies `delta` to `item` and logs it. Must run inside a unit of work
/// that loaded `item`, so the quantity it checks is the one it writes over.
pub(crate) fn apply_adjustment(
    conn: &Connection,
    item: &InventoryItem,
    delta: Decimal,
    reason: &str,
    task_id: Option<Uuid>,
    recorded_by: &str,
    at: Timestamp,
) -> Result<Decimal> {
    let quantity = item.quantity.checked_add(delta).ok_or_else(|| {
        Error::InvalidArgument(format!("adjusting {} by {delta} overflows", item.name))
    })?;
    if quantity < Decimal::ZERO {
        return Err(Error::InsufficientStock {
            item: item.name.clone(),
            unit: item.unit.clone(),
            available: item.quantity,
            required: -delta,
        });
    }

    storage::inventory::set_quantity(conn, item.id, quantity)?;
    storage::inventory::insert_transaction(
        conn,
        &InventoryTransaction {
            id: Uuid::new_v4(),
            item_id: item.id,
            task_id,
            delta,
            reason: reason.to_string(),
            recorded_by: recorded_by.to_string(),
            recorded_at: at,
        },
    )?;
    Ok(quantity)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Barrier;
    use std::thread;

    use jiff::civil::date;

    use crate::engine::testing::{owner, test_engine};
    use crate::storage::Entity;

    fn water(engine: &Engine, quantity: i64) -> InventoryItem {
        engine
            .create_inventory_item(
                &owner(),
                NewInventoryItem {
                    name: "Water".into(),
                    unit: "ml".into(),
                    quantity: Decimal::new(quantity, 0),
                    reorder_level: Decimal::new(1000, 0),
                },
            )
            .unwrap()
    }

    #[test]
    fn debit_lowers_stock_and_logs_once() {
        let (_dir, engine) = test_engine(date(2025, 1, 1));
        let item = water(&engine, 10_000);

        let left = engine
            .adjust_inventory(&owner(), item.id, Decimal::new(-500, 0), "water task", None)
            .unwrap();

        assert_eq!(left, Decimal::new(9500, 0));
        assert_eq!(engine.get_inventory_item(item.id).unwrap().quantity, left);
        let history = engine.inventory_history(item.id).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].delta, Decimal::new(-500, 0));
        assert_eq!(history[0].reason, "water task");
        assert_eq!(history[0].recorded_by, "asha");
    }

    #[test]
    fn overdraw_is_rejected_without_effect() {
        let (_dir, engine) = test_engine(date(2025, 1, 1));
        let item = water(&engine, 300);

        let err = engine
            .adjust_inventory(&owner(), item.id, Decimal::new(-500, 0), "water task", None)
            .unwrap_err();

        assert!(matches!(
            err,
            Error::InsufficientStock { available, required, .. }
                if available == Decimal::new(300, 0) && required == Decimal::new(500, 0)
        ));
        assert_eq!(engine.get_inventory_item(item.id).unwrap().quantity, Decimal::new(300, 0));
        assert!(engine.inventory_history(item.id).unwrap().is_empty());
    }

    #[test]
    fn stock_can_be_drawn_to_exactly_zero() {
        let (_dir, engine) = test_engine(date(2025, 1, 1));
        let item = water(&engine, 500);

        let left = engine
            .adjust_inventory(&owner(), item.id, Decimal::new(-500, 0), "water task", None)
            .unwrap();
        assert_eq!(left, Decimal::ZERO);
    }

    #[test]
    fn sequences_never_go_negative() {
        let (_dir, engine) = test_engine(date(2025, 1, 1));
        let item = water(&engine, 1000);

        let mut expected = Decimal::new(1000, 0);
        for delta in [-400, -400, -400, 250, -600, -1, 10, -10] {
            let delta = Decimal::new(delta, 0);
            match engine.adjust_inventory(&owner(), item.id, delta, "sequence", None) {
                Ok(left) => {
                    expected += delta;
                    assert_eq!(left, expected);
                }
                Err(Error::InsufficientStock { .. }) => {}
                Err(e) => panic!("unexpected error: {e}"),
            }
            let now = engine.get_inventory_item(item.id).unwrap().quantity;
            assert_eq!(now, expected);
            assert!(now >= Decimal::ZERO);
        }
    }

    #[test]
    fn duplicate_name_and_unit_conflicts() {
        let (_dir, engine) = test_engine(date(2025, 1, 1));
        water(&engine, 100);

        let err = engine
            .create_inventory_item(
                &owner(),
                NewInventoryItem {
                    name: "Water".into(),
                    unit: "ml".into(),
                    quantity: Decimal::ZERO,
                    reorder_level: Decimal::ZERO,
                },
            )
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[test]
    fn negative_initial_values_are_invalid() {
        let (_dir, engine) = test_engine(date(2025, 1, 1));
        let err = engine
            .create_inventory_item(
                &owner(),
                NewInventoryItem {
                    name: "Cowpat".into(),
                    unit: "kg".into(),
                    quantity: Decimal::new(-1, 0),
                    reorder_level: Decimal::ZERO,
                },
            )
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn zero_delta_and_unknown_item_are_rejected() {
        let (_dir, engine) = test_engine(date(2025, 1, 1));
        let item = water(&engine, 100);

        assert!(matches!(
            engine.adjust_inventory(&owner(), item.id, Decimal::ZERO, "noop", None),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            engine.adjust_inventory(&owner(), Uuid::new_v4(), Decimal::ONE, "restock", None),
            Err(Error::NotFound { entity: Entity::InventoryItem, .. })
        ));
        assert!(matches!(
            engine.adjust_inventory(&owner(), item.id, Decimal::ONE, "restock", Some(Uuid::new_v4())),
            Err(Error::NotFound { entity: Entity::ScheduledTask, .. })
        ));
    }

    #[test]
    fn low_stock_is_at_or_below_reorder_level() {
        let (_dir, engine) = test_engine(date(2025, 1, 1));
        let low = water(&engine, 1000);
        engine
            .create_inventory_item(
                &owner(),
                NewInventoryItem {
                    name: "Cowpat".into(),
                    unit: "kg".into(),
                    quantity: Decimal::new(50, 0),
                    reorder_level: Decimal::new(10, 0),
                },
            )
            .unwrap();

        let flagged = engine.list_low_stock_inventory().unwrap();
        assert_eq!(flagged, vec![low]);
        assert_eq!(engine.list_inventory().unwrap().len(), 2);
    }

    #[test]
    fn concurrent_debits_cannot_overdraw() {
        let (_dir, engine) = test_engine(date(2025, 1, 1));
        let item = water(&engine, 700);
        let barrier = Barrier::new(2);

        let results: Vec<_> = thread::scope(|s| {
            let handles: Vec<_> = (0..2)
                .map(|_| {
                    let (barrier, engine, item_id) = (&barrier, &engine, item.id);
                    s.spawn(move || {
                        barrier.wait();
                        engine.adjust_inventory(&owner(), item_id, Decimal::new(-500, 0), "race", None)
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(Error::InsufficientStock { .. }))));
        assert_eq!(engine.get_inventory_item(item.id).unwrap().quantity, Decimal::new(200, 0));
    }
}
