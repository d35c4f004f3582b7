use super::types::ValueRange;
use super::{AccessToken, RemoteStore};
use crate::config::GoogleConfig;
use crate::credential::Credential;
use crate::error::{AppError, Result};
use crate::models::Dataset;
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

// Google Sheets rejects cells longer than this
const CELL_CHAR_LIMIT: usize = 50_000;

/// Reads and writes the dataset as JSON text in one fixed cell.
pub struct SheetsClient {
    http_client: reqwest::Client,
    api_base_url: String,
    range: String,
}

impl SheetsClient {
    pub fn new(config: &GoogleConfig, http_client: reqwest::Client) -> Self {
        Self {
            http_client,
            api_base_url: config.sheets_api_url.clone(),
            range: config.range.clone(),
        }
    }

    pub fn spreadsheet_url(document_id: &str) -> String {
        format!("https://docs.google.com/spreadsheets/d/{}", document_id)
    }

    /// `{api}/{document_id}/values/{range}`, with each segment escaped
    fn values_url(&self, document_id: &str) -> Result<Url> {
        let mut url = Url::parse(&self.api_base_url)
            .map_err(|e| AppError::Config(format!("Invalid Sheets API URL: {}", e)))?;

        url.path_segments_mut()
            .map_err(|_| {
                AppError::Config(format!("Invalid Sheets API URL: {}", self.api_base_url))
            })?
            .pop_if_empty()
            .push(document_id)
            .push("values")
            .push(&self.range);

        Ok(url)
    }

    fn parse_cell(&self, cell: Option<&Value>) -> Result<Dataset> {
        match cell {
            None => Ok(Dataset::default()),
            Some(Value::String(text)) if text.trim().is_empty() => Ok(Dataset::default()),
            Some(Value::String(text)) => serde_json::from_str(text).map_err(|e| {
                AppError::Data(format!("{} does not hold a valid dataset: {}", self.range, e))
            }),
            Some(other) => Err(AppError::Data(format!(
                "{} holds {} instead of JSON text",
                self.range, other
            ))),
        }
    }
}

#[async_trait]
impl RemoteStore for SheetsClient {
    #[instrument(name = "Reading remote document", skip_all, fields(document_id = %credential.document_id))]
    async fn read(&self, credential: &Credential, token: &AccessToken) -> Result<Dataset> {
        let url = self.values_url(&credential.document_id)?;

        let response = self
            .http_client
            .get(url)
            .bearer_auth(&token.value)
            .send()
            .await
            .map_err(|e| AppError::Transport(format!("Failed to read {}: {}", self.range, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Transport(format!(
                "Failed to read {}: {} - {}",
                self.range, status, body
            )));
        }

        let value_range: ValueRange = response
            .json()
            .await
            .map_err(|e| AppError::Transport(format!("Invalid values response: {}", e)))?;

        let dataset = self.parse_cell(value_range.first_cell())?;
        debug!(events = dataset.events.len(), "Read remote document");

        Ok(dataset)
    }

    #[instrument(name = "Writing remote document", skip_all, fields(document_id = %credential.document_id))]
    async fn write(
        &self,
        credential: &Credential,
        token: &AccessToken,
        dataset: &Dataset,
    ) -> Result<()> {
        let text = serde_json::to_string(dataset)?;
        let length = text.chars().count();
        if length > CELL_CHAR_LIMIT {
            return Err(AppError::Data(format!(
                "Dataset is {} characters, a single cell holds at most {}",
                length, CELL_CHAR_LIMIT
            )));
        }

        let url = self.values_url(&credential.document_id)?;
        let body = ValueRange::single_cell(&self.range, text);

        let response = self
            .http_client
            .put(url)
            .query(&[("valueInputOption", "RAW")])
            .bearer_auth(&token.value)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Transport(format!("Failed to write {}: {}", self.range, e)))?;

        // The body isn't inspected, only the status
        if !response.status().is_success() {
            return Err(AppError::Transport(format!(
                "Failed to write {}: {}",
                self.range,
                response.status()
            )));
        }
        debug!(length, "Wrote remote document");

        Ok(())
    }
}
