use std::path::{Path, PathBuf};

/// Audio artifacts on disk, keyed by video id.
///
/// An artifact lives at `<dir>/temp_<video_id>.<ext>`; the container is only
/// known once the download finishes, so lookups probe every known extension.
#[derive(Debug, Clone)]
pub struct ArtifactCache {
    dir: PathBuf,
}

impl ArtifactCache {
    pub const EXTENSIONS: [&str; 2] = ["m4a", "webm"];

    pub fn new(dir: impl Into<PathBuf>) -> Self {
        ArtifactCache { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn base_name(video_id: &str) -> String {
        format!("temp_{video_id}")
    }

    pub fn path_for(&self, video_id: &str, ext: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{ext}", Self::base_name(video_id)))
    }

    /// yt-dlp output template resolving to one of the cache paths
    pub fn output_template(&self, video_id: &str) -> PathBuf {
        self.path_for(video_id, "%(ext)s")
    }

    /// Returns the artifact of `video_id`, if one exists
    pub async fn find(&self, video_id: &str) -> Option<PathBuf> {
        for ext in Self::EXTENSIONS {
            let path = self.path_for(video_id, ext);
            if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                return Some(path);
            }
        }
        None
    }

    pub async fn ensure_dir(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await
    }
}

/// Mime type the analysis backend expects for an artifact
pub fn mime_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("webm") => "audio/webm",
        _ => "audio/mp4",
    }
}
