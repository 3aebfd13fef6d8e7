use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
    process::Stdio,
};

use tokio::process::Command;

#[derive(Debug, thiserror::Error)]
pub enum YtDlpError {
    #[error("Failed to spawn {bin}: {source}")]
    Spawn {
        bin: String,
        #[source]
        source: std::io::Error,
    },
    #[error("yt-dlp exited with {status}: {stderr}")]
    Exit { status: String, stderr: String },
}

/// Thin async wrapper around the `yt-dlp` executable
#[derive(Debug, Clone)]
pub struct YtDlp {
    bin: PathBuf,
    cookies_path: Option<PathBuf>,
}

impl Default for YtDlp {
    fn default() -> Self {
        YtDlp::new("yt-dlp")
    }
}

impl YtDlp {
    pub fn new(bin: impl Into<PathBuf>) -> Self {
        YtDlp {
            bin: bin.into(),
            cookies_path: None,
        }
    }

    pub fn with_cookies(mut self, cookies_path: Option<PathBuf>) -> Self {
        self.cookies_path = cookies_path;
        self
    }

    pub fn bin(&self) -> &Path {
        &self.bin
    }

    /// Runs yt-dlp with `args` and returns its stdout
    #[tracing::instrument(skip_all, fields(bin = %self.bin.display()))]
    pub async fn run<I, S>(&self, args: I) -> Result<Vec<u8>, YtDlpError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut command = Command::new(&self.bin);
        command
            .args(["--quiet", "--no-warnings"])
            .stdin(Stdio::null())
            .kill_on_drop(true);

        if let Some(cookies_path) = &self.cookies_path {
            command.arg("--cookies").arg(cookies_path);
        }

        let output = command
            .args(args)
            .output()
            .await
            .map_err(|source| YtDlpError::Spawn {
                bin: self.bin.display().to_string(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::debug!(status = %output.status, %stderr, "yt-dlp failed");
            return Err(YtDlpError::Exit {
                status: output.status.to_string(),
                stderr,
            });
        }

        Ok(output.stdout)
    }
}
