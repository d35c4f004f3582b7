mod auth;
mod event;
mod show;
mod sync;

use crate::config::Config;
use crate::credential::FileCredentialStore;
use crate::error::{AppError, Result};
use crate::models::Dataset;
use crate::sheets::{self, CachedTokenSource, SheetsClient, TokenIssuer};
use crate::sync::{SyncController, SyncState};
use clap::{Parser, Subcommand};
use dialoguer::Confirm;
use indicatif::ProgressStyle;
use tracing::{Span, info, instrument};
use tracing_indicatif::span_ext::IndicatifSpanExt;

pub use auth::ConnectArgs;
pub use event::{EventAction, ItemAction};
pub use show::ShowResource;

#[derive(Parser, Debug)]
#[command(name = "event-budget")]
#[command(about = "Track event income and expenses, synced to a Google Sheets cell", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub async fn run(&self) -> Result<()> {
        match &self.command {
            Commands::Connect(args) => args.execute().await,
            Commands::Disconnect { yes } => auth::disconnect(*yes).await,
            Commands::Sync => sync::execute().await,
            Commands::Event { action } => action.execute().await,
            Commands::Item { action } => action.execute().await,
            Commands::Show { resource } => resource.execute().await,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Verify a service account and store it
    Connect(ConnectArgs),
    /// Forget the stored service account
    Disconnect {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Fetch the dataset from the spreadsheet
    Sync,
    /// Create or delete events
    Event {
        #[command(subcommand)]
        action: EventAction,
    },
    /// Add or remove income and expense items
    Item {
        #[command(subcommand)]
        action: ItemAction,
    },
    /// Show paths, the connection, events or a single event
    Show {
        #[command(subcommand)]
        resource: ShowResource,
    },
}

pub(crate) type Controller =
    SyncController<CachedTokenSource<TokenIssuer>, SheetsClient, FileCredentialStore>;

pub(crate) fn controller(config: &Config) -> Result<Controller> {
    let http_client = sheets::http_client(&config.sync)?;
    let tokens = CachedTokenSource::new(
        TokenIssuer::new(&config.google, http_client.clone()),
        chrono::Duration::seconds(config.sync.token_refresh_buffer_secs),
    );
    let store = SheetsClient::new(&config.google, http_client);

    Ok(SyncController::new(
        tokens,
        store,
        FileCredentialStore::default_location()?,
    ))
}

/// Restore the stored connection and load the current dataset.
pub(crate) async fn connected_controller(config: &Config) -> Result<(Controller, Dataset)> {
    let controller = controller(config)?;
    let Some(dataset) = controller.init().await? else {
        return Err(AppError::Credential(
            "Not connected, run `event-budget connect` first".to_string(),
        ));
    };

    Ok((controller, dataset))
}

/// Save and wait for the write, turning a failed write into an error.
#[instrument(name = "Saving to Google Sheets", skip_all)]
pub(crate) async fn save_and_wait(controller: &Controller, dataset: Dataset) -> Result<()> {
    let span = Span::current();
    span.pb_set_style(
        &ProgressStyle::with_template("{spinner} {span_name} {wide_msg}")
            .map_err(|e| AppError::Other(e.into()))?,
    );

    let version = controller.save(dataset);
    span.pb_set_message(&format!("version {}", version));
    controller.flush().await;

    let status = controller.status();
    match status.state {
        SyncState::Error => Err(AppError::Transport(status.message)),
        _ => {
            info!(version, "{}", status);
            Ok(())
        }
    }
}

pub(crate) fn confirm(prompt: &str) -> Result<bool> {
    Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|e| AppError::Other(e.into()))
}
