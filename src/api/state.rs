use std::sync::Arc;

use tokio::sync::Mutex;

use crate::sync::SyncService;

#[derive(Clone)]
pub struct AppState {
    pub sync: SyncService,
    /// Serializes catalog writes made through this server
    pub write_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(sync: SyncService) -> Self {
        Self {
            sync,
            write_lock: Arc::new(Mutex::new(())),
        }
    }
}
