mod auth;
mod cache;
mod client;
mod types;

pub use auth::{AccessToken, TokenIssuer};
pub use cache::CachedTokenSource;
pub use client::SheetsClient;

use crate::config::SyncConfig;
use crate::credential::Credential;
use crate::error::{AppError, Result};
use crate::models::Dataset;
use async_trait::async_trait;

/// HTTP client shared by the token issuer and the Sheets client
pub fn http_client(config: &SyncConfig) -> Result<reqwest::Client> {
    let mut builder = reqwest::ClientBuilder::new();
    if let Some(timeout) = config.request_timeout() {
        builder = builder.timeout(timeout);
    }

    builder
        .build()
        .map_err(|e| AppError::Config(format!("Failed to build reqwest client: {}", e)))
}

#[async_trait]
pub trait TokenSource {
    async fn token(&self, credential: &Credential) -> Result<AccessToken>;

    /// Drop any token held for reuse
    async fn forget(&self) {}
}

#[async_trait]
pub trait RemoteStore {
    async fn read(&self, credential: &Credential, token: &AccessToken) -> Result<Dataset>;

    async fn write(
        &self,
        credential: &Credential,
        token: &AccessToken,
        dataset: &Dataset,
    ) -> Result<()>;
}
