pub mod line;

use std::future::Future;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("HTTP error: {0}")]
    Request(#[from] reqwest_middleware::Error),
    #[error("Failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
}

/// Delivers a finished report to a fixed destination
pub trait Notifier {
    fn notify(&self, text: &str) -> impl Future<Output = Result<(), NotifyError>> + Send;
}
