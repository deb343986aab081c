//! Inventory commands: stock items, adjust, list, history.

use clap::Subcommand;
use rust_decimal::Decimal;

use crate::identity::Role;
use crate::ledger::NewInventoryItem;
use crate::model::InventoryItem;
use crate::storage::Entity;

use super::format::{format_quantity, short};
use super::{CliError, Context};

#[derive(Debug, Subcommand)]
pub enum InventoryCommand {
    /// Start stocking an input. Prints its id.
    New {
        name: String,

        /// Unit the input is counted in (e.g. `ml`, `kg`). Must match the
        /// unit tasks ask for.
        #[arg(long)]
        unit: String,

        #[arg(long, default_value_t = Decimal::ZERO)]
        quantity: Decimal,

        /// Flag the item as low stock at or below this level.
        #[arg(long, default_value_t = Decimal::ZERO)]
        reorder_level: Decimal,
    },

    /// List stock.
    List {
        /// Only items at or below their reorder level.
        #[arg(long)]
        low: bool,
    },

    /// Change stock by a signed amount. Prints the new quantity.
    Adjust {
        /// Item id or prefix.
        item: String,

        /// Amount to add; negative to draw down.
        #[arg(allow_negative_numbers = true)]
        delta: Decimal,

        /// Why the stock changed.
        #[arg(long)]
        reason: String,

        /// Related task id or prefix.
        #[arg(long)]
        task: Option<String>,
    },

    /// Show every stock change for an item, oldest first.
    History {
        /// Item id or prefix.
        item: String,
    },
}

pub(super) fn run(ctx: &Context, command: InventoryCommand) -> Result<(), CliError> {
    match command {
        InventoryCommand::New {
            name,
            unit,
            quantity,
            reorder_level,
        } => {
            let actor = ctx.actor(&[Role::Owner])?;
            let item = ctx.engine.create_inventory_item(
                &actor,
                NewInventoryItem {
                    name,
                    unit,
                    quantity,
                    reorder_level,
                },
            )?;
            ctx.emit(&item, |i| println!("{}", i.id))
        }
        InventoryCommand::List { low } => {
            let items = if low {
                ctx.engine.list_low_stock_inventory()?
            } else {
                ctx.engine.list_inventory()?
            };
            ctx.emit(&items, |items| {
                if items.is_empty() {
                    println!("No inventory items");
                }
                for i in items {
                    print_line(i);
                }
            })
        }
        InventoryCommand::Adjust {
            item,
            delta,
            reason,
            task,
        } => {
            let actor = ctx.actor(&[Role::Owner, Role::Farmer])?;
            let item_id = ctx.resolve(Entity::InventoryItem, &item)?;
            let task_id = task
                .map(|t| ctx.resolve(Entity::ScheduledTask, &t))
                .transpose()?;
            let quantity = ctx
                .engine
                .adjust_inventory(&actor, item_id, delta, &reason, task_id)?;
            ctx.emit(&quantity, |q| println!("{}", q.normalize()))
        }
        InventoryCommand::History { item } => {
            let id = ctx.resolve(Entity::InventoryItem, &item)?;
            let item = ctx.engine.get_inventory_item(id)?;
            let history = ctx.engine.inventory_history(id)?;
            ctx.emit(&history, |history| {
                if history.is_empty() {
                    println!("No stock changes for {}", item.name);
                }
                for t in history {
                    let task = t.task_id.map_or_else(String::new, |id| format!("  task {}", short(id)));
                    println!(
                        "{}  {:>12}  {}  [{}]{task}",
                        t.recorded_at,
                        format_quantity(t.delta, &item.unit),
                        t.reason,
                        t.recorded_by
                    );
                }
            })
        }
    }
}

fn print_line(item: &InventoryItem) {
    let flag = if item.is_low_stock() { "  LOW" } else { "" };
    println!(
        "{}  {}  {} (reorder at {}){flag}",
        short(item.id),
        item.name,
        format_quantity(item.quantity, &item.unit),
        item.reorder_level.normalize()
    );
}
