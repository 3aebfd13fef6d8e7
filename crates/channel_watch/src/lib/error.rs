use video_ledger::LedgerError;

/// Errors that end an outer iteration or abort startup
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
    #[error("Invalid configuration: {0}")]
    Config(String),
}
