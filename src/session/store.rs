//! On-disk persistence of the score sheet

use crate::codec;
use crate::scoring::ScoreSheet;
use anyhow::{Context, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Default file name of the persisted ledger, relative to the project root
pub const DEFAULT_SCORE_FILE: &str = ".pytest-score";

/// The persisted ledger file.
///
/// Reads never fail: a missing, unreadable or corrupt file yields an empty
/// sheet, so a damaged ledger only shows up as a reset history. The last
/// writer wins if another process touches the file in between.
#[derive(Debug, Clone)]
pub struct ScoreStore {
    path: PathBuf,
}

impl ScoreStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw file contents, or `None` if the file cannot be read
    pub fn read(&self) -> Option<Vec<u8>> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Some(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No score file at {:?}", self.path);
                None
            }
            Err(e) => {
                warn!("Failed to read score file {:?}: {}", self.path, e);
                None
            }
        }
    }

    /// Load the stored sheet without rotating it
    pub fn load(&self, history_length: usize) -> ScoreSheet {
        decode_or_empty(self.read().as_deref(), history_length)
    }

    pub fn save(&self, sheet: &ScoreSheet) -> Result<()> {
        let bytes = codec::to_vec(sheet).context("Failed to serialize score sheet")?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .context(format!("Failed to create directory {:?}", parent))?;
        }
        std::fs::write(&self.path, bytes)
            .context(format!("Failed to write score file: {:?}", self.path))?;
        info!("Saved {} scores to {:?}", sheet.len(), self.path);
        Ok(())
    }

    /// Delete the stored ledger. Returns whether a file was removed.
    pub fn wipe(&self) -> Result<bool> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                info!("Wiped score file {:?}", self.path);
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => {
                Err(e).context(format!("Failed to delete score file: {:?}", self.path))
            }
        }
    }
}

/// Decode persisted bytes, falling back to an empty sheet on any problem
pub fn decode_or_empty(bytes: Option<&[u8]>, history_length: usize) -> ScoreSheet {
    let Some(bytes) = bytes else {
        return ScoreSheet::new(history_length);
    };
    match codec::from_slice(bytes) {
        Ok(sheet) => sheet,
        Err(e) => {
            warn!("Discarding unreadable score data: {}", e);
            ScoreSheet::new(history_length)
        }
    }
}
