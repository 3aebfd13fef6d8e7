pub mod gemini;

use std::{future::Future, path::Path, sync::LazyLock};

use regex::Regex;

/// Signatures of quota exhaustion, rate limiting or a forbidden key
static RATE_LIMIT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(429|403)\b|resource_?exhausted|quota|rate[ _-]?limit|too many requests")
        .unwrap()
});

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisError {
    /// The model provider refuses further requests for now
    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),
    /// Anything else: unusable media, refusals, network blips
    #[error("Analysis failed: {0}")]
    Content(String),
}

impl AnalysisError {
    /// Classifies a failure from its message
    pub fn classify(message: impl Into<String>) -> Self {
        let message = message.into();
        if RATE_LIMIT_RE.is_match(&message) {
            AnalysisError::QuotaExceeded(message)
        } else {
            AnalysisError::Content(message)
        }
    }

    /// Classifies a failed HTTP exchange, status first then body
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            403 | 429 => AnalysisError::QuotaExceeded(format!("{status} - {message}")),
            _ => Self::classify(format!("{status} - {message}")),
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, AnalysisError::QuotaExceeded(_))
    }
}

/// Turns an audio artifact into the finance brief body
pub trait ReportGenerator {
    fn analyze(
        &self,
        audio_path: &Path,
        title: &str,
    ) -> impl Future<Output = Result<String, AnalysisError>> + Send;
}
