use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};
use channel_watch::yt::ChannelScanner;
use tokio_util::sync::CancellationToken;
use video_ledger::VideoRecord;

/// Serves the latest video per channel; unknown channels have none
#[derive(Clone, Default)]
pub struct MockChannelScanner {
    pub latest: Arc<Mutex<HashMap<String, VideoRecord>>>,
    pub calls: Arc<Mutex<Vec<String>>>,
    pub panic_on: Option<String>,
    /// Fired while a scan is in flight, before it returns
    pub cancel_on_scan: Option<CancellationToken>,
}

impl MockChannelScanner {
    pub fn with_video(self, channel: &str, video_id: &str, title: &str) -> Self {
        self.publish(channel, video_id, title);
        self
    }

    /// Replaces the channel's latest upload, visible to clones as well
    pub fn publish(&self, channel: &str, video_id: &str, title: &str) {
        self.latest
            .lock()
            .unwrap()
            .insert(channel.to_string(), VideoRecord::new(video_id, title));
    }
}

impl ChannelScanner for MockChannelScanner {
    async fn scan(&self, channel: &str) -> Option<VideoRecord> {
        self.calls.lock().unwrap().push(channel.to_string());
        if self.panic_on.as_deref() == Some(channel) {
            panic!("scanner blew up on {channel}");
        }
        if let Some(token) = &self.cancel_on_scan {
            token.cancel();
        }
        self.latest.lock().unwrap().get(channel).cloned()
    }
}
