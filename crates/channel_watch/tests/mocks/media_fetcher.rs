use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};
use channel_watch::yt::MediaFetcher;
use tokio_util::sync::CancellationToken;

/// Writes `temp_<id>.m4a` into `dir`, reusing an existing file like the real
/// fetcher does
#[derive(Clone)]
pub struct MockMediaFetcher {
    pub dir: PathBuf,
    pub calls: Arc<Mutex<Vec<String>>>,
    pub downloads: Arc<Mutex<Vec<String>>>,
    pub fail: bool,
    /// Fired while a fetch is in flight, before it returns
    pub cancel_on_fetch: Option<CancellationToken>,
}

impl MockMediaFetcher {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            calls: Arc::new(Mutex::new(Vec::new())),
            downloads: Arc::new(Mutex::new(Vec::new())),
            fail: false,
            cancel_on_fetch: None,
        }
    }

    pub fn failing(dir: impl Into<PathBuf>) -> Self {
        Self {
            fail: true,
            ..Self::new(dir)
        }
    }

    pub fn artifact_path(&self, video_id: &str) -> PathBuf {
        self.dir.join(format!("temp_{video_id}.m4a"))
    }
}

impl MediaFetcher for MockMediaFetcher {
    async fn fetch(&self, _url: &str, video_id: &str) -> Option<PathBuf> {
        self.calls.lock().unwrap().push(video_id.to_string());
        if let Some(token) = &self.cancel_on_fetch {
            token.cancel();
        }

        let path = self.artifact_path(video_id);
        if path.exists() {
            return Some(path);
        }
        if self.fail {
            return None;
        }

        self.downloads.lock().unwrap().push(video_id.to_string());
        std::fs::write(&path, b"audio").unwrap();
        Some(path)
    }
}
