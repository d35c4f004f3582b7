use super::status::SyncStatus;
use crate::credential::{Credential, CredentialStore};
use crate::error::{AppError, Result};
use crate::models::Dataset;
use crate::sheets::{RemoteStore, TokenSource};
use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, instrument, warn};

#[derive(Clone)]
struct PendingSave {
    version: u64,
    credential: Credential,
    dataset: Dataset,
}

struct Shared<T, S, C> {
    tokens: T,
    store: S,
    credentials: C,
    credential: RwLock<Option<Credential>>,
    dataset: RwLock<Dataset>,
    status: watch::Sender<SyncStatus>,
    /// Version of the most recent local save
    applied: AtomicU64,
    /// Highest version whose remote write has finished or been dropped
    settled: watch::Sender<u64>,
    /// Held for the duration of every remote read or write
    remote: Mutex<()>,
}

/// Keeps the local dataset and its remote copy in step.
///
/// Local state is the source of truth: `save` applies immediately and the
/// remote write follows in the background. Writes go through a single slot,
/// so at most one is in flight and only the newest pending dataset is
/// written next.
pub struct SyncController<T, S, C> {
    shared: Arc<Shared<T, S, C>>,
    saves: watch::Sender<Option<PendingSave>>,
}

impl<T, S, C> SyncController<T, S, C>
where
    T: TokenSource + Send + Sync + 'static,
    S: RemoteStore + Send + Sync + 'static,
    C: CredentialStore + Send + Sync + 'static,
{
    /// Must be called from within a tokio runtime.
    pub fn new(tokens: T, store: S, credentials: C) -> Self {
        let shared = Arc::new(Shared {
            tokens,
            store,
            credentials,
            credential: RwLock::new(None),
            dataset: RwLock::new(Dataset::default()),
            status: watch::Sender::new(SyncStatus::idle()),
            applied: AtomicU64::new(0),
            settled: watch::Sender::new(0),
            remote: Mutex::new(()),
        });

        let (saves, pending) = watch::channel(None);
        tokio::spawn(run_saves(shared.clone(), pending));

        Self { shared, saves }
    }

    pub fn status(&self) -> SyncStatus {
        self.shared.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.shared.status.subscribe()
    }

    pub fn dataset(&self) -> Dataset {
        self.shared.dataset.read().clone()
    }

    pub fn credential(&self) -> Option<Credential> {
        self.shared.credential.read().clone()
    }

    pub fn is_connected(&self) -> bool {
        self.shared.credential.read().is_some()
    }

    /// Restore the stored credential, if any, and load its dataset.
    #[instrument(name = "Restoring connection", skip_all)]
    pub async fn init(&self) -> Result<Option<Dataset>> {
        let Some(credential) = self.shared.credentials.load()? else {
            debug!("No stored credential");
            return Ok(None);
        };

        *self.shared.credential.write() = Some(credential);
        self.load().await.map(Some)
    }

    /// Verify a credential with a token and a read of its document, then persist it.
    ///
    /// Nothing is stored unless the read succeeds.
    #[instrument(name = "Connecting", skip_all, fields(identity = %credential.identity))]
    pub async fn connect(&self, credential: Credential) -> Result<Dataset> {
        let shared = &self.shared;
        self.flush().await;
        let version = shared.applied.load(Ordering::SeqCst);
        shared.set_status(SyncStatus::loading("Connecting..."));

        let result = async {
            credential.validate()?;
            // A cached token would skip verifying the signing key
            shared.tokens.forget().await;

            let _remote = shared.remote.lock().await;
            let token = shared.tokens.token(&credential).await?;
            let dataset = shared.store.read(&credential, &token).await?;
            shared.credentials.save(&credential)?;
            Ok::<_, AppError>(dataset)
        }
        .await;

        match result {
            Ok(dataset) => {
                *shared.credential.write() = Some(credential.clone());

                let mut local = shared.dataset.write();
                if shared.applied.load(Ordering::SeqCst) != version {
                    // Saved while connecting; push the newer local dataset instead
                    debug!("Local dataset changed during connect, writing it");
                    let newer = local.clone();
                    self.apply(&mut local, newer.clone(), Some(credential));
                    return Ok(newer);
                }
                *local = dataset.clone();
                drop(local);

                shared.set_status(SyncStatus::ok("Connected"));
                info!(events = dataset.events.len(), "Connected");
                Ok(dataset)
            }
            Err(e) => {
                warn!(error = %e, "Failed to connect");
                shared.set_status(SyncStatus::error(e.to_string()));
                Err(e)
            }
        }
    }

    /// Replace the local dataset with the remote one.
    ///
    /// On failure the local dataset is left as it was.
    #[instrument(name = "Loading", skip_all)]
    pub async fn load(&self) -> Result<Dataset> {
        let shared = &self.shared;
        let Some(credential) = self.credential() else {
            let e = AppError::Credential("Not connected".to_string());
            shared.set_status(SyncStatus::error(e.to_string()));
            return Err(e);
        };

        self.flush().await;
        let version = shared.applied.load(Ordering::SeqCst);
        shared.set_status(SyncStatus::loading("Syncing..."));

        let result = async {
            let _remote = shared.remote.lock().await;
            let token = shared.tokens.token(&credential).await?;
            shared.store.read(&credential, &token).await
        }
        .await;

        match result {
            Ok(dataset) => {
                let mut local = shared.dataset.write();
                if shared.applied.load(Ordering::SeqCst) != version {
                    // Saved while reading; the newer local dataset is on its way out
                    debug!("Local dataset changed during load, keeping it");
                    return Ok(local.clone());
                }
                *local = dataset.clone();
                drop(local);

                shared.set_status(SyncStatus::ok("Synced"));
                Ok(dataset)
            }
            Err(e) => {
                warn!(error = %e, "Failed to load");
                shared.set_status(SyncStatus::error(e.to_string()));
                Err(e)
            }
        }
    }

    /// Apply `dataset` locally and queue it for writing.
    ///
    /// Returns the local version assigned to this save. Failures are only
    /// reported through the status; the local dataset is never rolled back.
    #[instrument(name = "Saving", skip_all)]
    pub fn save(&self, dataset: Dataset) -> u64 {
        let credential = self.credential();

        // Versions, local state and the queue stay in the same order
        let mut local = self.shared.dataset.write();
        self.apply(&mut local, dataset, credential)
    }

    /// Assign the next version and queue the write. `local` must be the
    /// held dataset lock.
    fn apply(
        &self,
        local: &mut Dataset,
        dataset: Dataset,
        credential: Option<Credential>,
    ) -> u64 {
        let shared = &self.shared;
        let version = shared.applied.fetch_add(1, Ordering::SeqCst) + 1;
        *local = dataset.clone();

        let Some(credential) = credential else {
            debug!(version, "Not connected, saved locally only");
            shared.settle(version);
            return version;
        };

        shared.set_status(SyncStatus::loading("Saving...").with_version(version));
        self.saves.send_replace(Some(PendingSave {
            version,
            credential,
            dataset,
        }));

        debug!(version, "Queued save");
        version
    }

    /// Wait until every save made so far has been written or has failed.
    pub async fn flush(&self) {
        let target = self.shared.applied.load(Ordering::SeqCst);
        let mut settled = self.shared.settled.subscribe();
        // The sender lives in `shared`, so this can't observe a closed channel
        let _ = settled.wait_for(|version| *version >= target).await;
    }

    /// Forget the credential and reset local state. No remote calls are made.
    #[instrument(name = "Disconnecting", skip_all)]
    pub async fn disconnect(&self) -> Result<()> {
        let shared = &self.shared;
        // Nothing changes unless the stored credential is gone
        shared.credentials.clear()?;
        self.saves.send_replace(None);
        shared.tokens.forget().await;

        *shared.credential.write() = None;
        {
            let mut local = shared.dataset.write();
            *local = Dataset::default();
            shared.settle(shared.applied.load(Ordering::SeqCst));
        }
        shared.set_status(SyncStatus::idle());
        info!("Disconnected");

        Ok(())
    }
}

impl<T, S, C> Shared<T, S, C>
where
    T: TokenSource + Send + Sync,
    S: RemoteStore + Send + Sync,
{
    fn set_status(&self, status: SyncStatus) {
        debug!(state = ?status.state, message = %status.message, "Sync status");
        self.status.send_replace(status);
    }

    fn settle(&self, version: u64) {
        self.settled
            .send_modify(|settled| *settled = (*settled).max(version));
    }

    #[instrument(name = "Writing", skip_all, fields(version = save.version))]
    async fn write(&self, save: PendingSave) {
        let PendingSave {
            version,
            credential,
            dataset,
        } = save;
        self.set_status(SyncStatus::loading("Saving...").with_version(version));

        let result = async {
            let _remote = self.remote.lock().await;
            let token = self.tokens.token(&credential).await?;
            self.store.write(&credential, &token, &dataset).await
        }
        .await;

        // Disconnected or reconnected elsewhere while writing
        if self.credential.read().as_ref() != Some(&credential) {
            debug!("Credential changed during write, dropping status");
            self.settle(version);
            return;
        }

        let latest = self.applied.load(Ordering::SeqCst);
        match result {
            Ok(()) if version == latest => {
                self.set_status(SyncStatus::ok("Saved").with_version(version));
            }
            Ok(()) => debug!(latest, "Saved, newer version queued"),
            Err(e) => {
                // Write-side detail goes to the log only
                warn!(error = %e, "Failed to save");
                self.set_status(
                    SyncStatus::error(format!("Failed to save version {}", version))
                        .with_version(version),
                );
            }
        }

        self.settle(version);
    }
}

async fn run_saves<T, S, C>(
    shared: Arc<Shared<T, S, C>>,
    mut pending: watch::Receiver<Option<PendingSave>>,
) where
    T: TokenSource + Send + Sync,
    S: RemoteStore + Send + Sync,
{
    while pending.changed().await.is_ok() {
        let Some(save) = pending.borrow_and_update().clone() else {
            continue;
        };
        shared.write(save).await;
    }
}
