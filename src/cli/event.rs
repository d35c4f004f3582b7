use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::ItemType;
use clap::Subcommand;
use rust_decimal::Decimal;
use tracing::info;

#[derive(Subcommand, Debug)]
pub enum EventAction {
    /// Create an event
    Add {
        name: String,
        /// Event date, e.g. 2025-03-01
        #[arg(long, default_value = "")]
        date: String,
        #[arg(long, default_value = "0")]
        budget: Decimal,
    },
    /// Delete an event and all of its items
    Remove {
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum ItemAction {
    /// Add an income or expense item to an event
    Add {
        /// Event id
        #[arg(long)]
        event: String,
        /// income or expense
        #[arg(long = "type")]
        type_: ItemType,
        /// e.g. tickets, sponsors, venue, catering
        #[arg(long)]
        category: String,
        #[arg(long)]
        amount: Decimal,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Remove an item from an event
    Remove {
        #[arg(long)]
        event: String,
        item: String,
    },
}

impl EventAction {
    pub async fn execute(&self) -> Result<()> {
        let config = Config::load()?;
        let (controller, dataset) = super::connected_controller(&config).await?;

        match self {
            EventAction::Add { name, date, budget } => {
                if name.trim().is_empty() {
                    return Err(AppError::Other(anyhow::anyhow!("Event name is required")));
                }
                let (next, id) = dataset.with_event(name, date, *budget);
                super::save_and_wait(&controller, next).await?;
                info!(id, "Created event");
            }
            EventAction::Remove { id, yes } => {
                let event = dataset
                    .event(id)
                    .ok_or_else(|| AppError::Other(anyhow::anyhow!("No event with id {}", id)))?;
                if !*yes && !super::confirm(&format!("Delete event '{}'?", event.name))? {
                    return Ok(());
                }
                let next = dataset
                    .without_event(id)
                    .ok_or_else(|| AppError::Other(anyhow::anyhow!("No event with id {}", id)))?;
                super::save_and_wait(&controller, next).await?;
                info!(id, "Deleted event");
            }
        }

        Ok(())
    }
}

impl ItemAction {
    pub async fn execute(&self) -> Result<()> {
        let config = Config::load()?;
        let (controller, dataset) = super::connected_controller(&config).await?;

        match self {
            ItemAction::Add {
                event,
                type_,
                category,
                amount,
                description,
            } => {
                if *amount <= Decimal::ZERO {
                    return Err(AppError::Other(anyhow::anyhow!("Amount must be positive")));
                }
                let (next, id) = dataset
                    .with_item(event, *type_, category, description, *amount)
                    .ok_or_else(|| {
                        AppError::Other(anyhow::anyhow!("No event with id {}", event))
                    })?;
                super::save_and_wait(&controller, next).await?;
                info!(id, %type_, %amount, "Added item");
            }
            ItemAction::Remove { event, item } => {
                let next = dataset.without_item(event, item).ok_or_else(|| {
                    AppError::Other(anyhow::anyhow!("No item {} in event {}", item, event))
                })?;
                super::save_and_wait(&controller, next).await?;
                info!(id = item, "Removed item");
            }
        }

        Ok(())
    }
}
