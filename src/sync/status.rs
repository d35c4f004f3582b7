use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncState {
    #[default]
    Idle,
    Loading,
    Ok,
    Error,
}

/// Outcome of the most recent remote operation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SyncStatus {
    pub state: SyncState,
    pub message: String,
    /// Local version a save status refers to
    pub version: Option<u64>,
}

impl SyncStatus {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn loading(message: impl Into<String>) -> Self {
        Self::new(SyncState::Loading, message)
    }

    pub fn ok(message: impl Into<String>) -> Self {
        Self::new(SyncState::Ok, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(SyncState::Error, message)
    }

    pub fn with_version(mut self, version: u64) -> Self {
        self.version = Some(version);
        self
    }

    fn new(state: SyncState, message: impl Into<String>) -> Self {
        Self {
            state,
            message: message.into(),
            version: None,
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.state {
            SyncState::Idle => write!(f, "not connected"),
            SyncState::Loading => write!(f, "… {}", self.message),
            SyncState::Ok => write!(f, "☁ {}", self.message),
            SyncState::Error => write!(f, "⚠ {}", self.message),
        }
    }
}
