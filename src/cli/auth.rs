use crate::config::Config;
use crate::credential::Credential;
use crate::error::{AppError, Result};
use crate::sheets::SheetsClient;
use clap::Args;
use std::fs;
use std::path::PathBuf;
use tracing::info;

#[derive(Args, Debug)]
pub struct ConnectArgs {
    /// Spreadsheet id, as found in the sheet's URL
    #[arg(long)]
    document_id: String,

    /// Service account JSON key file downloaded from Google Cloud
    #[arg(long, conflicts_with_all = ["identity", "key_file"])]
    service_account: Option<PathBuf>,

    /// Service account email
    #[arg(long, requires = "key_file")]
    identity: Option<String>,

    /// PEM encoded private key of the service account
    #[arg(long, requires = "identity")]
    key_file: Option<PathBuf>,
}

impl ConnectArgs {
    fn credential(&self) -> Result<Credential> {
        match (&self.service_account, &self.identity, &self.key_file) {
            (Some(path), _, _) => {
                let json = fs::read_to_string(path)?;
                Credential::from_service_account_json(&json, &self.document_id)
            }
            (None, Some(identity), Some(key_file)) => Ok(Credential::new(
                identity,
                fs::read_to_string(key_file)?,
                &self.document_id,
            )),
            _ => Err(AppError::Credential(
                "Pass --service-account, or --identity with --key-file".to_string(),
            )),
        }
    }

    pub async fn execute(&self) -> Result<()> {
        let credential = self.credential()?;
        let config = Config::load()?;
        let controller = super::controller(&config)?;

        let dataset = controller.connect(credential).await?;

        info!(
            url = SheetsClient::spreadsheet_url(&self.document_id),
            events = dataset.events.len(),
            "Connected to Google Sheets"
        );

        Ok(())
    }
}

pub async fn disconnect(yes: bool) -> Result<()> {
    if !yes && !super::confirm("Disconnect from Google Sheets?")? {
        return Ok(());
    }

    let config = Config::load()?;
    let controller = super::controller(&config)?;
    controller.disconnect().await?;

    info!("Disconnected, the spreadsheet itself was not changed");

    Ok(())
}
