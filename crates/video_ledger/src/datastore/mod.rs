use std::{collections::HashSet, future::Future};

pub mod file;

/// Identifiers of every video recorded as done
pub type HistorySet = HashSet<String>;

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("IO error on ledger {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid video id {0:?}: ids must be non-empty and fit on a single line")]
    InvalidId(String),
}

pub trait Ledger {
    /// Loads every recorded identifier. A ledger that does not exist yet is
    /// an empty history.
    fn load_history(&self) -> impl Future<Output = Result<HistorySet, LedgerError>> + Send;

    /// Records `video_id` as done. Must be durable once the future resolves.
    fn append(&self, video_id: &str) -> impl Future<Output = Result<(), LedgerError>> + Send;
}

impl<T: Ledger + Send + Sync> Ledger for &T {
    async fn load_history(&self) -> Result<HistorySet, LedgerError> {
        (**self).load_history().await
    }

    async fn append(&self, video_id: &str) -> Result<(), LedgerError> {
        (**self).append(video_id).await
    }
}
