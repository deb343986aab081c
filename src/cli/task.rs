//! Task commands: list, due, show, complete, skip.

use clap::{Subcommand, ValueEnum};
use jiff::civil::Date;

use crate::completion::TaskFilter;
use crate::identity::Role;
use crate::model::{ScheduledTask, TaskStatus};
use crate::storage::Entity;

use super::format::{format_demand, format_quantity, short};
use super::{CliError, Context};

#[derive(Debug, Subcommand)]
pub enum TaskCommand {
    /// List scheduled tasks by date.
    List {
        /// Only tasks on this plot (id or prefix).
        #[arg(long)]
        plot: Option<String>,

        /// Only tasks for this planting (id or prefix).
        #[arg(long)]
        planting: Option<String>,

        #[arg(long, value_enum)]
        status: Option<StatusArg>,
    },

    /// List every task scheduled on a day.
    Due {
        /// The day (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        on: Option<Date>,
    },

    /// Show one task and who did it.
    Show {
        /// Task id or prefix.
        task: String,
    },

    /// Mark a task done, drawing its input from stock.
    Complete {
        /// Task id or prefix.
        task: String,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Mark a task skipped. Stock is untouched.
    Skip {
        /// Task id or prefix.
        task: String,

        #[arg(long)]
        reason: Option<String>,
    },
}

/// CLI-facing task status, mapped to the domain `TaskStatus`.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StatusArg {
    Pending,
    Done,
    Skipped,
}

impl StatusArg {
    fn to_domain(self) -> TaskStatus {
        match self {
            Self::Pending => TaskStatus::Pending,
            Self::Done => TaskStatus::Done,
            Self::Skipped => TaskStatus::Skipped,
        }
    }
}

pub(super) fn run(ctx: &Context, command: TaskCommand) -> Result<(), CliError> {
    match command {
        TaskCommand::List {
            plot,
            planting,
            status,
        } => {
            let filter = TaskFilter {
                plot: plot.map(|p| ctx.resolve(Entity::Plot, &p)).transpose()?,
                plant_instance: planting
                    .map(|p| ctx.resolve(Entity::PlantInstance, &p))
                    .transpose()?,
                status: status.map(StatusArg::to_domain),
            };
            let tasks = ctx.engine.list_scheduled_tasks(filter)?;
            ctx.emit(&tasks, |tasks| print_lines(tasks))
        }
        TaskCommand::Due { on } => {
            let on = on.unwrap_or_else(|| ctx.engine.today());
            let tasks = ctx.engine.list_tasks_due_on(on)?;
            ctx.emit(&tasks, |tasks| print_lines(tasks))
        }
        TaskCommand::Show { task } => {
            let id = ctx.resolve(Entity::ScheduledTask, &task)?;
            let record = ctx.engine.get_task(id)?;
            ctx.emit(&record, |r| {
                let t = &r.task;
                println!("Task:      {}", t.id);
                println!("Planting:  {}", short(t.plant_instance_id));
                println!("Type:      {} ({})", t.task_type, t.resource);
                println!("Scheduled: {}", t.scheduled_for);
                println!("Status:    {}", t.status);
                println!("Needs:     {}", format_demand(t.demand.as_ref()));
                if let Some(item) = t.inventory_item_id {
                    println!("Draws on:  {}", short(item));
                }
                if let Some(entry) = &r.checklist {
                    println!("Done by:   {} at {}", entry.performed_by, entry.performed_at);
                    if let Some(notes) = &entry.notes {
                        println!("Notes:     {notes}");
                    }
                }
            })
        }
        TaskCommand::Complete { task, notes } => {
            let actor = ctx.actor(&[Role::Owner, Role::Farmer])?;
            let id = ctx.resolve(Entity::ScheduledTask, &task)?;
            let completion = ctx.engine.complete_task(&actor, id, notes.as_deref())?;
            ctx.emit(&completion, |c| {
                eprintln!("Task {} done", short(c.task.id));
                if let Some(debit) = &c.debit {
                    eprintln!(
                        "Drew {} of {}, {} left",
                        format_quantity(debit.quantity, &debit.unit),
                        debit.item,
                        format_quantity(debit.remaining, &debit.unit)
                    );
                }
            })
        }
        TaskCommand::Skip { task, reason } => {
            let actor = ctx.actor(&[Role::Owner, Role::Farmer])?;
            let id = ctx.resolve(Entity::ScheduledTask, &task)?;
            let skipped = ctx.engine.skip_task(&actor, id, reason.as_deref())?;
            ctx.emit(&skipped, |t| eprintln!("Task {} skipped", short(t.id)))
        }
    }
}

fn print_lines(tasks: &[ScheduledTask]) {
    if tasks.is_empty() {
        println!("No tasks");
    }
    for t in tasks {
        println!(
            "{}  {}  [{}]  {:<10}  {:<12}  {}  planting {}",
            short(t.id),
            t.scheduled_for,
            t.status,
            t.task_type.as_str(),
            t.resource,
            format_demand(t.demand.as_ref()),
            short(t.plant_instance_id)
        );
    }
}
