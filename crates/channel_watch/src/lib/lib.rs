mod config;
mod error;
mod llm;
mod notify;
mod processor;
pub mod tracing;
pub mod yt;

pub use config::{parse_channels, Schedule, WatchConfig};
pub use error::Error;
pub use llm::gemini;
pub use llm::{AnalysisError, ReportGenerator};
pub use notify::{line, Notifier, NotifyError};
pub use processor::{
    builder::ChannelWatcherBuilder, compose_report, ChannelOutcome, ChannelWatcher,
    IterationReport, PipelineOutcome,
};
