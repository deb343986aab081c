//! Inventory storage: stocked items and their transaction log.

use rusqlite::{Connection, OptionalExtension, Row, params};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::model::{InventoryItem, InventoryTransaction};

use super::{
    Entity, Result, StorageError, parse_decimal, parse_opt_uuid, parse_timestamp, parse_uuid,
};

pub(crate) fn insert_item(conn: &Connection, item: &InventoryItem) -> Result<()> {
    conn.execute(
        "INSERT INTO inventory_items (id, name, unit, quantity, reorder_level)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            item.id.to_string(),
            &item.name,
            &item.unit,
            item.quantity.to_string(),
            item.reorder_level.to_string(),
        ],
    )?;
    Ok(())
}

pub(crate) fn load_item(conn: &Connection, id: Uuid) -> Result<InventoryItem> {
    let row = conn
        .query_row(
            "SELECT id, name, unit, quantity, reorder_level FROM inventory_items WHERE id = ?1",
            [id.to_string()],
            item_columns,
        )
        .optional()?
        .ok_or(StorageError::NotFound(Entity::InventoryItem, id))?;
    item_from_columns(row)
}

pub(crate) fn list_items(conn: &Connection) -> Result<Vec<InventoryItem>> {
    query_items(
        conn,
        "SELECT id, name, unit, quantity, reorder_level FROM inventory_items
         ORDER BY name, unit",
        [],
    )
}

/// Items stocked in `unit`, by name.
pub(crate) fn items_with_unit(conn: &Connection, unit: &str) -> Result<Vec<InventoryItem>> {
    query_items(
        conn,
        "SELECT id, name, unit, quantity, reorder_level FROM inventory_items
         WHERE unit = ?1
         ORDER BY name",
        [unit],
    )
}

/// Items whose name matches `name` ignoring ASCII case, stocked in `unit`.
pub(crate) fn items_named(conn: &Connection, name: &str, unit: &str) -> Result<Vec<InventoryItem>> {
    query_items(
        conn,
        "SELECT id, name, unit, quantity, reorder_level FROM inventory_items
         WHERE lower(name) = lower(?1) AND unit = ?2
         ORDER BY name",
        [name, unit],
    )
}

pub(crate) fn set_quantity(conn: &Connection, id: Uuid, quantity: Decimal) -> Result<()> {
    let n = conn.execute(
        "UPDATE inventory_items SET quantity = ?2 WHERE id = ?1",
        params![id.to_string(), quantity.to_string()],
    )?;
    if n == 0 {
        return Err(StorageError::NotFound(Entity::InventoryItem, id));
    }
    Ok(())
}

fn query_items<P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> Result<Vec<InventoryItem>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, item_columns)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    rows.into_iter().map(item_from_columns).collect()
}

type ItemColumns = (String, String, String, String, String);

fn item_columns(row: &Row<'_>) -> rusqlite::Result<ItemColumns> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
}

fn item_from_columns((id, name, unit, quantity, reorder_level): ItemColumns) -> Result<InventoryItem> {
    Ok(InventoryItem {
        id: parse_uuid(&id)?,
        name,
        unit,
        quantity: parse_decimal(&quantity)?,
        reorder_level: parse_decimal(&reorder_level)?,
    })
}

// ── Transactions ──

pub(crate) fn insert_transaction(conn: &Connection, txn: &InventoryTransaction) -> Result<()> {
    conn.execute(
        "INSERT INTO inventory_transactions
             (id, item_id, task_id, delta, reason, recorded_by, recorded_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            txn.id.to_string(),
            txn.item_id.to_string(),
            txn.task_id.map(|id| id.to_string()),
            txn.delta.to_string(),
            &txn.reason,
            &txn.recorded_by,
            txn.recorded_at.to_string(),
        ],
    )?;
    Ok(())
}

/// One item's transactions, oldest first.
pub(crate) fn list_transactions(conn: &Connection, item_id: Uuid) -> Result<Vec<InventoryTransaction>> {
    let mut stmt = conn.prepare(
        "SELECT id, item_id, task_id, delta, reason, recorded_by, recorded_at
         FROM inventory_transactions
         WHERE item_id = ?1
         ORDER BY rowid",
    )?;
    let rows = stmt
        .query_map([item_id.to_string()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, String>(6)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    rows.into_iter()
        .map(
            |(id, item_id, task_id, delta, reason, recorded_by, recorded_at)| -> Result<InventoryTransaction> {
                Ok(InventoryTransaction {
                    id: parse_uuid(&id)?,
                    item_id: parse_uuid(&item_id)?,
                    task_id: parse_opt_uuid(task_id.as_deref())?,
                    delta: parse_decimal(&delta)?,
                    reason,
                    recorded_by,
                    recorded_at: parse_timestamp(&recorded_at)?,
                })
            },
        )
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use jiff::Timestamp;

    use crate::storage::testing::test_storage;

    fn item(name: &str, unit: &str, quantity: i64) -> InventoryItem {
        InventoryItem {
            id: Uuid::new_v4(),
            name: name.into(),
            unit: unit.into(),
            quantity: Decimal::new(quantity, 0),
            reorder_level: Decimal::new(100, 0),
        }
    }

    #[test]
    fn name_and_unit_are_unique_together() {
        let (_dir, storage) = test_storage();
        let conn = storage.connect().unwrap();

        insert_item(&conn, &item("Water", "ml", 1000)).unwrap();
        insert_item(&conn, &item("Water", "l", 10)).unwrap();
        let err = insert_item(&conn, &item("Water", "ml", 5)).unwrap_err();
        assert!(err.is_constraint_violation());
    }

    #[test]
    fn lookups_by_unit_and_name() {
        let (_dir, storage) = test_storage();
        let conn = storage.connect().unwrap();
        let water = item("Water", "ml", 1000);
        insert_item(&conn, &water).unwrap();
        insert_item(&conn, &item("Buttermilk", "ml", 200)).unwrap();
        insert_item(&conn, &item("Cowpat", "kg", 20)).unwrap();

        assert_eq!(items_with_unit(&conn, "ml").unwrap().len(), 2);
        assert_eq!(items_named(&conn, "WATER", "ml").unwrap(), vec![water]);
        assert!(items_named(&conn, "water", "l").unwrap().is_empty());
        assert_eq!(list_items(&conn).unwrap().len(), 3);
    }

    #[test]
    fn quantity_updates_keep_precision() {
        let (_dir, storage) = test_storage();
        let conn = storage.connect().unwrap();
        let water = item("Water", "ml", 1000);
        insert_item(&conn, &water).unwrap();

        set_quantity(&conn, water.id, Decimal::new(2505, 1)).unwrap();
        assert_eq!(load_item(&conn, water.id).unwrap().quantity, Decimal::new(2505, 1));

        let err = set_quantity(&conn, Uuid::new_v4(), Decimal::ZERO).unwrap_err();
        assert!(matches!(err, StorageError::NotFound(Entity::InventoryItem, _)));
    }

    #[test]
    fn transactions_list_oldest_first() {
        let (_dir, storage) = test_storage();
        let conn = storage.connect().unwrap();
        let water = item("Water", "ml", 1000);
        insert_item(&conn, &water).unwrap();

        for delta in [-500, 250] {
            insert_transaction(
                &conn,
                &InventoryTransaction {
                    id: Uuid::new_v4(),
                    item_id: water.id,
                    task_id: None,
                    delta: Decimal::new(delta, 0),
                    reason: "manual".into(),
                    recorded_by: "asha".into(),
                    recorded_at: Timestamp::UNIX_EPOCH,
                },
            )
            .unwrap();
        }

        let deltas: Vec<_> = list_transactions(&conn, water.id)
            .unwrap()
            .into_iter()
            .map(|t| t.delta)
            .collect();
        assert_eq!(deltas, vec![Decimal::new(-500, 0), Decimal::new(250, 0)]);
    }
}
