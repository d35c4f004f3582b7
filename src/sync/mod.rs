mod controller;
mod status;

pub use controller::SyncController;
pub use status::{SyncState, SyncStatus};
