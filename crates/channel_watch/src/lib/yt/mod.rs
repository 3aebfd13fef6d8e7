pub mod artifact;
pub mod audio_handler;
pub mod scanner;
pub mod ytdlp;

use std::{future::Future, path::PathBuf};

use video_ledger::VideoRecord;

/// Finds the most recent qualifying video of a channel.
///
/// Lookup failures are logged by the implementation and surface as `None`;
/// they never reach the watcher as errors.
pub trait ChannelScanner {
    fn scan(&self, channel: &str) -> impl Future<Output = Option<VideoRecord>> + Send;
}

/// Produces a local audio artifact for a video.
///
/// An artifact already present for `video_id` must be returned as is, without
/// downloading again. `None` means no artifact could be produced.
pub trait MediaFetcher {
    fn fetch(&self, url: &str, video_id: &str) -> impl Future<Output = Option<PathBuf>> + Send;
}
