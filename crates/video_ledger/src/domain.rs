use std::fmt;

/// A video discovered on a channel. Never persisted as a whole, only its
/// `video_id` ends up in the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VideoRecord {
    pub video_id: String,
    pub title: String,
    pub url: String,
}

impl VideoRecord {
    pub const WATCH_BASE_URL: &str = "https://www.youtube.com/watch";

    /// Builds a record whose canonical url is derived from `video_id`.
    /// Surrounding whitespace is stripped from the id.
    pub fn new(video_id: impl Into<String>, title: impl Into<String>) -> Self {
        let mut video_id = video_id.into();
        if video_id.trim().len() != video_id.len() {
            video_id = video_id.trim().to_string();
        }
        let url = Self::watch_url(&video_id);

        VideoRecord {
            video_id,
            title: title.into(),
            url,
        }
    }

    pub fn watch_url(video_id: &str) -> String {
        format!("{}?v={}", Self::WATCH_BASE_URL, video_id)
    }
}

impl fmt::Display for VideoRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.title, self.video_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_is_derived_from_video_id() {
        let record = VideoRecord::new("QVlUUZMmJcQ", "Market open");
        assert_eq!(record.url, "https://www.youtube.com/watch?v=QVlUUZMmJcQ");
        assert_eq!(record.title, "Market open");
    }

    #[test]
    fn test_video_id_is_trimmed() {
        let record = VideoRecord::new(" v1\n", "X");
        assert_eq!(record.video_id, "v1");
        assert_eq!(record.url, "https://www.youtube.com/watch?v=v1");
    }

    #[test]
    fn test_display_includes_title_and_id() {
        let record = VideoRecord::new("v1", "X");
        assert_eq!(record.to_string(), "X (v1)");
    }
}
