//! Shared state for the web UI

use crate::scoring::ScoreSheet;
use crate::session::ScoreStore;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Snapshot of the stored sheet
#[derive(Debug, Clone)]
pub struct LoadedSheet {
    pub sheet: ScoreSheet,
    pub loaded_at: DateTime<Utc>,
}

/// Application state shared across all handlers.
///
/// The UI never writes the score file; it re-reads it on request.
#[derive(Debug, Clone)]
pub struct AppState {
    pub store: ScoreStore,
    pub history_length: usize,
    pub html_dir: PathBuf,
    pub loaded: Arc<RwLock<LoadedSheet>>,
}

impl AppState {
    pub fn new(store: ScoreStore, history_length: usize, html_dir: PathBuf) -> Self {
        let loaded = LoadedSheet {
            sheet: ScoreSheet::new(history_length),
            loaded_at: Utc::now(),
        };
        Self {
            store,
            history_length,
            html_dir,
            loaded: Arc::new(RwLock::new(loaded)),
        }
    }

    /// Re-read the score file from disk
    pub async fn reload(&self) -> usize {
        let sheet = self.store.load(self.history_length);
        let count = sheet.len();
        debug!("Reloaded {} scores from {:?}", count, self.store.path());

        let mut loaded = self.loaded.write().await;
        *loaded = LoadedSheet {
            sheet,
            loaded_at: Utc::now(),
        };
        count
    }

    pub async fn snapshot(&self) -> LoadedSheet {
        self.loaded.read().await.clone()
    }
}
