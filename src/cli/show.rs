use crate::config::Config;
use crate::credential::{CredentialStore, FileCredentialStore};
use crate::error::{AppError, Result};
use crate::models::{Dataset, Event, Totals};
use crate::sheets::SheetsClient;
use clap::Subcommand;
use tracing::info;

#[derive(Subcommand, Debug)]
pub enum ShowResource {
    /// Show configuration and data paths
    Paths,
    /// Show the connected spreadsheet without contacting it
    Connection,
    /// List events with their totals
    Events,
    /// Show one event and its items
    Event { id: String },
}

impl ShowResource {
    pub async fn execute(&self) -> Result<()> {
        match self {
            ShowResource::Paths => show_paths(),
            ShowResource::Connection => show_connection(),
            ShowResource::Events => {
                let (_, dataset) = super::connected_controller(&Config::load()?).await?;
                println!("{}", render_events(&dataset));
                Ok(())
            }
            ShowResource::Event { id } => {
                let (_, dataset) = super::connected_controller(&Config::load()?).await?;
                let event = dataset
                    .event(id)
                    .ok_or_else(|| AppError::Other(anyhow::anyhow!("No event with id {}", id)))?;
                println!("{}", render_event(event));
                Ok(())
            }
        }
    }
}

fn show_paths() -> Result<()> {
    let config_path = Config::config_file()?;
    let data_dir = Config::data_dir()?;
    let credentials = FileCredentialStore::default_location()?;

    info!(path = ?config_path, "Config path");
    info!(path = ?data_dir, "Data path");
    info!(path = ?credentials.path(), "Credential path");

    Ok(())
}

fn show_connection() -> Result<()> {
    let store = FileCredentialStore::default_location()?;
    match store.load()? {
        Some(credential) => info!(
            identity = credential.identity,
            url = SheetsClient::spreadsheet_url(&credential.document_id),
            "Connected"
        ),
        None => info!("Not connected"),
    }

    Ok(())
}

fn render_totals(totals: &Totals) -> String {
    format!(
        "income {}  expense {}  margin {} ({}%)",
        totals.income.round_dp(2).normalize(),
        totals.expense.round_dp(2).normalize(),
        totals.margin.round_dp(2).normalize(),
        totals.margin_pct().round_dp(1).normalize()
    )
}

fn render_events(dataset: &Dataset) -> String {
    if dataset.is_empty() {
        return "No events yet".to_string();
    }

    let mut lines: Vec<String> = dataset
        .events
        .iter()
        .map(|event| {
            format!(
                "{}  {}  {}\n    {}",
                event.id,
                event.name,
                event.date,
                render_totals(&event.totals())
            )
        })
        .collect();
    lines.push(format!("Total: {}", render_totals(&dataset.totals())));

    lines.join("\n")
}

fn render_event(event: &Event) -> String {
    let mut lines = vec![
        format!("{}  {}  {}", event.id, event.name, event.date),
        format!(
            "budget {} ({}% covered by income)",
            event.budget.round_dp(2).normalize(),
            event.budget_fill_pct().round_dp(1).normalize()
        ),
    ];
    lines.extend(event.items.iter().map(|item| {
        format!(
            "  {}  {:<7}  {:<10}  {:>12}  {}",
            item.id,
            item.type_,
            item.category,
            item.amount.round_dp(2).normalize(),
            item.description
        )
    }));
    lines.push(render_totals(&event.totals()));

    let by_category = event.expense_by_category();
    if !by_category.is_empty() {
        lines.push("expenses by category".to_string());
        lines.extend(by_category.iter().map(|(category, total)| {
            format!("  {:<10}  {:>12}", category, total.round_dp(2).normalize())
        }));
    }

    lines.join("\n")
}
