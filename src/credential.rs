use crate::config::Config;
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

const CREDENTIAL_FILE: &str = "credential.json";

/// Everything needed to reach one spreadsheet as a service account.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct Credential {
    /// Service account email, used as the assertion issuer
    pub identity: String,
    /// PEM encoded PKCS#8 private key
    pub signing_key: String,
    pub document_id: String,
}

// Keeps the private key out of logs.
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("identity", &self.identity)
            .field("signing_key", &"<redacted>")
            .field("document_id", &self.document_id)
            .finish()
    }
}

/// The subset of a downloaded Google service account key file we use.
#[derive(Debug, Deserialize)]
struct ServiceAccountKey {
    client_email: String,
    private_key: String,
}

impl Credential {
    pub fn new(
        identity: impl Into<String>,
        signing_key: impl Into<String>,
        document_id: impl Into<String>,
    ) -> Self {
        Self {
            identity: identity.into().trim().to_string(),
            signing_key: signing_key.into().trim().to_string(),
            document_id: document_id.into().trim().to_string(),
        }
    }

    /// Build a credential from the contents of a service account JSON key.
    pub fn from_service_account_json(json: &str, document_id: &str) -> Result<Self> {
        let key: ServiceAccountKey = serde_json::from_str(json).map_err(|e| {
            AppError::Credential(format!("Failed to parse service account key: {}", e))
        })?;

        Ok(Self::new(key.client_email, key.private_key, document_id))
    }

    /// All fields must be present before anything touches the network.
    pub fn validate(&self) -> Result<()> {
        let missing: Vec<&str> = [
            ("identity", &self.identity),
            ("signing key", &self.signing_key),
            ("document id", &self.document_id),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

        if !missing.is_empty() {
            return Err(AppError::Credential(format!(
                "Missing {}",
                missing.join(", ")
            )));
        }

        Ok(())
    }
}

/// Local persistence for the connected credential.
pub trait CredentialStore {
    fn load(&self) -> Result<Option<Credential>>;

    fn save(&self, credential: &Credential) -> Result<()>;

    fn clear(&self) -> Result<()>;
}

/// Stores the credential as JSON in a single owner-only file.
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store in the XDG data directory
    pub fn default_location() -> Result<Self> {
        Ok(Self::new(Config::data_file(CREDENTIAL_FILE)?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<Option<Credential>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.path)
            .map_err(|e| AppError::Credential(format!("Failed to read credential file: {}", e)))?;

        let credential: Credential = serde_json::from_str(&contents)
            .map_err(|e| AppError::Credential(format!("Failed to parse credential: {}", e)))?;

        Ok(Some(credential))
    }

    #[instrument(name = "Saving credential", skip_all)]
    fn save(&self, credential: &Credential) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                AppError::Credential(format!("Failed to create credential directory: {}", e))
            })?;
        }

        let contents = serde_json::to_string_pretty(credential)?;

        // Create file with owner-only permissions from the start to avoid race condition
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .mode(0o600)
            .open(&self.path)
            .map_err(|e| AppError::Credential(format!("Failed to create credential file: {}", e)))?;

        file.write_all(contents.as_bytes())
            .map_err(|e| AppError::Credential(format!("Failed to write credential file: {}", e)))?;
        debug!(path = ?self.path, "Saved credential");

        Ok(())
    }

    #[instrument(name = "Clearing credential", skip_all)]
    fn clear(&self) -> Result<()> {
        if !self.path.exists() {
            debug!("No credential to clear");
            return Ok(());
        }

        fs::remove_file(&self.path)
            .map_err(|e| AppError::Credential(format!("Failed to delete credential file: {}", e)))?;
        debug!("Cleared stored credential");

        Ok(())
    }
}
