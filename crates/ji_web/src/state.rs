use std::sync::Arc;

use ji_scrapers::ScraperManager;
use tokio::sync::Mutex;

pub struct AppState {
    pub manager: Arc<ScraperManager>,
    /// Held for the duration of a refresh; a second trigger is rejected
    /// instead of queued.
    pub refresh_lock: Mutex<()>,
}

impl AppState {
    pub fn new(manager: Arc<ScraperManager>) -> Self {
        Self {
            manager,
            refresh_lock: Mutex::new(()),
        }
    }
}
