use serde::Deserialize;
use video_ledger::VideoRecord;

use crate::yt::{
    ytdlp::{YtDlp, YtDlpError},
    ChannelScanner,
};

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error(transparent)]
    YtDlp(#[from] YtDlpError),
    #[error("Failed to parse channel listing: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Flat channel listing as printed by `yt-dlp --dump-single-json`
#[derive(Debug, Deserialize)]
struct ChannelListing {
    #[serde(default)]
    entries: Vec<Option<ListingEntry>>,
}

#[derive(Debug, Deserialize)]
struct ListingEntry {
    id: Option<String>,
    title: Option<String>,
}

/// Picks the newest video out of a flat listing.
///
/// Channel pages can list their own tabs as entries; those carry the channel
/// id (`UC...`) and are skipped.
pub fn parse_latest_video(listing: &[u8]) -> Result<Option<VideoRecord>, ScanError> {
    let listing = serde_json::from_slice::<ChannelListing>(listing)?;

    let latest = listing
        .entries
        .into_iter()
        .flatten()
        .find_map(|ListingEntry { id, title }| match (id, title) {
            (Some(id), Some(title))
                if !id.is_empty() && !id.starts_with("UC") && !title.is_empty() =>
            {
                Some(VideoRecord::new(id, title))
            }
            _ => None,
        });

    Ok(latest)
}

/// Scans channels through yt-dlp's flat playlist extraction
#[derive(Debug, Clone, Default)]
pub struct YtDlpScanner {
    yt_dlp: YtDlp,
}

impl YtDlpScanner {
    /// Only the head of the listing is inspected
    const PLAYLIST_END: &str = "5";

    pub fn new(yt_dlp: YtDlp) -> Self {
        YtDlpScanner { yt_dlp }
    }

    pub async fn latest_video(&self, channel: &str) -> Result<Option<VideoRecord>, ScanError> {
        let listing = self
            .yt_dlp
            .run([
                "--flat-playlist",
                "--dump-single-json",
                "--playlist-end",
                Self::PLAYLIST_END,
                channel,
            ])
            .await?;

        parse_latest_video(&listing)
    }
}

impl ChannelScanner for YtDlpScanner {
    #[tracing::instrument(skip(self))]
    async fn scan(&self, channel: &str) -> Option<VideoRecord> {
        match self.latest_video(channel).await {
            Ok(Some(video)) => Some(video),
            Ok(None) => {
                tracing::info!("Channel listing contains no qualifying video");
                None
            }
            Err(e) => {
                tracing::error!(error = ?e, "Failed to read channel");
                None
            }
        }
    }
}
