use super::{AccessToken, TokenSource};
use crate::credential::Credential;
use crate::error::Result;
use async_trait::async_trait;
use chrono::Duration;
use tokio::sync::Mutex;
use tracing::debug;

struct CachedToken {
    identity: String,
    token: AccessToken,
}

/// Reuses an issued token until it is about to expire.
///
/// The lock is held across issuance, so concurrent callers wait for the one
/// in-flight request instead of issuing their own.
pub struct CachedTokenSource<T> {
    inner: T,
    refresh_buffer: Duration,
    cached: Mutex<Option<CachedToken>>,
}

impl<T> CachedTokenSource<T> {
    pub fn new(inner: T, refresh_buffer: Duration) -> Self {
        Self {
            inner,
            refresh_buffer,
            cached: Mutex::new(None),
        }
    }
}

#[async_trait]
impl<T> TokenSource for CachedTokenSource<T>
where
    T: TokenSource + Send + Sync,
{
    async fn token(&self, credential: &Credential) -> Result<AccessToken> {
        let mut cached = self.cached.lock().await;

        let reusable = cached.as_ref().filter(|entry| {
            entry.identity == credential.identity
                && !entry.token.expires_within(self.refresh_buffer)
        });
        if let Some(entry) = reusable {
            debug!("Using cached access token");
            return Ok(entry.token.clone());
        }

        let token = self.inner.token(credential).await?;
        *cached = Some(CachedToken {
            identity: credential.identity.clone(),
            token: token.clone(),
        });

        Ok(token)
    }

    async fn forget(&self) {
        *self.cached.lock().await = None;
        self.inner.forget().await;
    }
}
