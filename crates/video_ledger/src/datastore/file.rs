use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use tokio::{fs::OpenOptions, io::AsyncWriteExt};

use crate::datastore::{HistorySet, Ledger, LedgerError};

/// Append-only ledger backed by a newline-delimited text file
#[derive(Debug, Clone)]
pub struct FileLedger {
    path: PathBuf,
}

impl FileLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileLedger { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> LedgerError {
        LedgerError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

impl Ledger for FileLedger {
    #[tracing::instrument(skip(self), fields(path = %self.path.display()))]
    async fn load_history(&self) -> Result<HistorySet, LedgerError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("Ledger does not exist yet, starting with empty history");
                return Ok(HistorySet::new());
            }
            Err(e) => {
                tracing::error!(error = ?e, "Failed to read ledger");
                return Err(self.io_error(e));
            }
        };

        let history = contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect::<HistorySet>();

        tracing::debug!(count = history.len(), "Loaded history");
        Ok(history)
    }

    #[tracing::instrument(skip(self), fields(path = %self.path.display()))]
    async fn append(&self, video_id: &str) -> Result<(), LedgerError> {
        // stored ids are compared verbatim against scanned ones
        if video_id.is_empty()
            || video_id != video_id.trim()
            || video_id.contains(['\n', '\r'])
        {
            return Err(LedgerError::InvalidId(video_id.to_string()));
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .inspect_err(|e| tracing::error!(error = ?e, "Failed to open ledger"))
            .map_err(|e| self.io_error(e))?;

        file.write_all(format!("{video_id}\n").as_bytes())
            .await
            .map_err(|e| self.io_error(e))?;
        // the append is the commit point, it has to survive a restart
        file.sync_data().await.map_err(|e| self.io_error(e))?;

        tracing::debug!("Recorded video as processed");
        Ok(())
    }
}
