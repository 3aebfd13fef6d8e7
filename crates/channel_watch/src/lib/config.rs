use std::{fmt, path::PathBuf, time::Duration};

use crate::error::Error;

/// Sleep intervals driving the outer loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    /// Sleep after an iteration without rate limiting
    pub poll_interval: Duration,
    /// Sleep after an iteration where the report generator was rate limited
    pub cooldown: Duration,
    /// Pause between two channel scans
    pub channel_delay: Duration,
}

impl Default for Schedule {
    fn default() -> Self {
        Schedule {
            poll_interval: Duration::from_secs(60),
            cooldown: Duration::from_secs(900),
            channel_delay: Duration::from_secs(2),
        }
    }
}

/// Immutable process configuration, built once at startup
#[derive(Clone)]
pub struct WatchConfig {
    pub google_api_key: String,
    pub line_token: String,
    pub line_user_id: String,
    pub channels: Vec<String>,
    pub workdir: PathBuf,
    pub history_file: PathBuf,
    pub schedule: Schedule,
    pub max_content_retries: Option<u32>,
    pub model: String,
    pub yt_dlp_bin: PathBuf,
    pub cookies_path: Option<PathBuf>,
}

impl WatchConfig {
    pub const HISTORY_FILE_NAME: &str = "processed_videos.txt";

    /// Rejects blank secrets, which the environment happily hands over as `""`
    pub fn validate(&self) -> Result<(), Error> {
        let secrets = [
            ("GOOGLE_API_KEY", &self.google_api_key),
            ("LINE_CHANNEL_ACCESS_TOKEN", &self.line_token),
            ("LINE_USER_ID", &self.line_user_id),
        ];

        if let Some((name, _)) = secrets.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(Error::Config(format!("{name} is empty")));
        }

        if self.schedule.poll_interval.is_zero() {
            return Err(Error::Config("poll interval must be positive".into()));
        }

        if self.channels.is_empty() {
            tracing::warn!("No channels configured, the watcher will idle");
        }

        Ok(())
    }
}

impl fmt::Debug for WatchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchConfig")
            .field("google_api_key", &"<redacted>")
            .field("line_token", &"<redacted>")
            .field("line_user_id", &"<redacted>")
            .field("channels", &self.channels)
            .field("workdir", &self.workdir)
            .field("history_file", &self.history_file)
            .field("schedule", &self.schedule)
            .field("max_content_retries", &self.max_content_retries)
            .field("model", &self.model)
            .field("yt_dlp_bin", &self.yt_dlp_bin)
            .field("cookies_path", &self.cookies_path)
            .finish()
    }
}

/// Splits a comma separated channel list, dropping blanks
pub fn parse_channels(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|channel| !channel.is_empty())
        .map(String::from)
        .collect()
}
