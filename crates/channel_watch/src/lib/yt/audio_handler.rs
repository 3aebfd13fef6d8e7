use std::{ffi::OsStr, path::PathBuf};

use crate::yt::{
    artifact::ArtifactCache,
    ytdlp::{YtDlp, YtDlpError},
    MediaFetcher,
};

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Failed to prepare artifact directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to download audio: {0}")]
    Download(#[from] YtDlpError),
    #[error("yt-dlp did not produce an artifact in {0}")]
    MissingArtifact(String),
}

/// Downloads audio tracks with yt-dlp into an [`ArtifactCache`]
#[derive(Debug, Clone)]
pub struct YtDlpFetcher {
    yt_dlp: YtDlp,
    cache: ArtifactCache,
}

impl YtDlpFetcher {
    /// m4a first, anything audio-only otherwise
    const AUDIO_FORMAT: &str = "bestaudio[ext=m4a]/bestaudio";

    pub fn new(yt_dlp: YtDlp, cache: ArtifactCache) -> Self {
        YtDlpFetcher { yt_dlp, cache }
    }

    pub fn cache(&self) -> &ArtifactCache {
        &self.cache
    }

    pub async fn download(&self, url: &str, video_id: &str) -> Result<PathBuf, FetchError> {
        if let Some(existing) = self.cache.find(video_id).await {
            tracing::info!(path = %existing.display(), "Reusing existing artifact, skipping download");
            return Ok(existing);
        }

        self.cache.ensure_dir().await?;

        tracing::info!("Downloading audio");
        let template = self.cache.output_template(video_id);
        self.yt_dlp
            .run([
                OsStr::new("--no-playlist"),
                OsStr::new("-f"),
                OsStr::new(Self::AUDIO_FORMAT),
                OsStr::new("-o"),
                template.as_os_str(),
                OsStr::new(url),
            ])
            .await?;

        self.cache
            .find(video_id)
            .await
            .ok_or_else(|| FetchError::MissingArtifact(self.cache.dir().display().to_string()))
    }
}

impl MediaFetcher for YtDlpFetcher {
    #[tracing::instrument(skip(self))]
    async fn fetch(&self, url: &str, video_id: &str) -> Option<PathBuf> {
        self.download(url, video_id)
            .await
            .inspect_err(|e| tracing::error!(error = ?e, "Failed to fetch audio"))
            .ok()
    }
}
