use std::{path::Path, time::Duration};

use reqwest::{Client, Response};
use serde::Deserialize;

use crate::{
    llm::{AnalysisError, ReportGenerator},
    yt::artifact::mime_type_for,
};

/// Gemini client: uploads the artifact through the Files API and asks the
/// model for the finance brief.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    poll_interval: Duration,
    max_polls: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum GeminiError {
    #[error("HTTP error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("Upload session did not return an upload url")]
    MissingUploadUrl,
    #[error("Audio processing failed on the server for {0}")]
    FileProcessingFailed(String),
    #[error("Audio {0} still processing after {1} polls")]
    FileProcessingTimeout(String, u32),
    #[error("Model returned no text (reason: {0})")]
    EmptyResponse(String),
}

impl From<GeminiError> for AnalysisError {
    fn from(value: GeminiError) -> Self {
        match value {
            GeminiError::Api { status, message } => AnalysisError::from_status(status, message),
            other => AnalysisError::classify(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileState {
    Processing,
    Active,
    Failed,
    #[default]
    #[serde(other)]
    StateUnspecified,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiFile {
    pub name: String,
    pub uri: String,
    pub mime_type: Option<String>,
    #[serde(default)]
    pub state: FileState,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    file: GeminiFile,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<CandidateContent>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
pub struct ContentPart {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate
    pub fn text(&self) -> Option<String> {
        let text = self
            .candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect::<String>();

        (!text.trim().is_empty()).then_some(text)
    }

    fn empty_reason(&self) -> String {
        self.prompt_feedback
            .as_ref()
            .and_then(|feedback| feedback.block_reason.clone())
            .or_else(|| {
                self.candidates
                    .first()
                    .and_then(|candidate| candidate.finish_reason.clone())
            })
            .unwrap_or_else(|| "unknown".into())
    }
}

impl GeminiClient {
    const PROMPT_TEMPLATE: &str = include_str!("./prompts/finance_brief.txt");
    pub const DEFAULT_MODEL: &str = "gemini-flash-latest";

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: "https://generativelanguage.googleapis.com".into(),
            model: Self::DEFAULT_MODEL.into(),
            poll_interval: Duration::from_secs(2),
            max_polls: 300,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn build_prompt(title: &str) -> String {
        Self::PROMPT_TEMPLATE.replace("{title}", title)
    }

    async fn ensure_success(resp: Response) -> Result<Response, GeminiError> {
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(GeminiError::Api { status, message });
        }
        Ok(resp)
    }

    /// Resumable upload: open a session, then send the bytes and finalize
    #[tracing::instrument(skip(self))]
    pub async fn upload_file(&self, audio_path: &Path) -> Result<GeminiFile, GeminiError> {
        let bytes = tokio::fs::read(audio_path).await?;
        let mime_type = mime_type_for(audio_path);
        let display_name = audio_path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("audio");

        let resp = self
            .client
            .post(format!("{}/upload/v1beta/files", self.base_url))
            .header("x-goog-api-key", &self.api_key)
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", bytes.len().to_string())
            .header("X-Goog-Upload-Header-Content-Type", mime_type)
            .json(&serde_json::json!({ "file": { "display_name": display_name } }))
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to make http request"))?;
        let resp = Self::ensure_success(resp).await?;

        let upload_url = resp
            .headers()
            .get("x-goog-upload-url")
            .and_then(|value| value.to_str().ok())
            .ok_or(GeminiError::MissingUploadUrl)?
            .to_string();

        let resp = self
            .client
            .post(upload_url)
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .body(bytes)
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to make http request"))?;
        let resp = Self::ensure_success(resp).await?;

        Ok(resp.json::<UploadResponse>().await?.file)
    }

    pub async fn get_file(&self, name: &str) -> Result<GeminiFile, GeminiError> {
        let resp = self
            .client
            .get(format!("{}/v1beta/{}", self.base_url, name))
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await?;
        let resp = Self::ensure_success(resp).await?;

        Ok(resp.json::<GeminiFile>().await?)
    }

    /// Polls the uploaded file until the server is done processing it
    #[tracing::instrument(skip_all, fields(file = %file.name))]
    pub async fn wait_until_active(&self, mut file: GeminiFile) -> Result<GeminiFile, GeminiError> {
        for _ in 0..self.max_polls {
            match file.state {
                FileState::Active => return Ok(file),
                FileState::Failed => return Err(GeminiError::FileProcessingFailed(file.name)),
                FileState::Processing | FileState::StateUnspecified => {
                    tokio::time::sleep(self.poll_interval).await;
                    file = self.get_file(&file.name).await?;
                }
            }
        }

        match file.state {
            FileState::Active => Ok(file),
            FileState::Failed => Err(GeminiError::FileProcessingFailed(file.name)),
            _ => Err(GeminiError::FileProcessingTimeout(file.name, self.max_polls)),
        }
    }

    #[tracing::instrument(skip(self, file), fields(file = %file.name))]
    pub async fn generate_report(
        &self,
        file: &GeminiFile,
        title: &str,
    ) -> Result<String, GeminiError> {
        let mime_type = file.mime_type.as_deref().unwrap_or("audio/mp4");
        let body = serde_json::json!({
            "contents": [
                {
                    "parts": [
                        { "file_data": { "mime_type": mime_type, "file_uri": file.uri } },
                        { "text": Self::build_prompt(title) }
                    ]
                }
            ]
        });

        let resp = self
            .client
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.base_url, self.model
            ))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to make http request"))?;
        let resp = Self::ensure_success(resp).await?;

        let response = resp.json::<GenerateResponse>().await?;
        response
            .text()
            .ok_or_else(|| GeminiError::EmptyResponse(response.empty_reason()))
    }

    /// Uploaded files expire on their own; deleting early is a courtesy
    async fn delete_file(&self, name: &str) {
        let result = self
            .client
            .delete(format!("{}/v1beta/{}", self.base_url, name))
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await
            .map_err(GeminiError::from);

        let result = match result {
            Ok(resp) => Self::ensure_success(resp).await.map(|_| ()),
            Err(e) => Err(e),
        };

        if let Err(e) = result {
            tracing::warn!(error = %e, file = %name, "Failed to delete uploaded file");
        }
    }
}

impl ReportGenerator for GeminiClient {
    #[tracing::instrument(skip(self, audio_path), fields(audio = %audio_path.display()))]
    async fn analyze(&self, audio_path: &Path, title: &str) -> Result<String, AnalysisError> {
        tracing::info!("Analysing audio");
        let file = self
            .upload_file(audio_path)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to upload audio"))?;
        let name = file.name.clone();

        let result = match self.wait_until_active(file).await {
            Ok(file) => self.generate_report(&file, title).await,
            Err(e) => Err(e),
        };
        self.delete_file(&name).await;

        result
            .inspect_err(|e| tracing::error!(error = %e, "Failed to generate report"))
            .map_err(AnalysisError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server, ServerGuard};
    use tempfile::TempDir;

    const MODEL_PATH: &str = "/v1beta/models/gemini-flash-latest:generateContent";

    fn audio_file(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("temp_v1.m4a");
        std::fs::write(&path, b"not really audio").unwrap();
        path
    }

    fn client(server: &ServerGuard) -> GeminiClient {
        GeminiClient::new("test-key")
            .with_base_url(server.url())
            .with_poll_interval(Duration::ZERO)
    }

    async fn mock_upload(server: &mut ServerGuard, state: &str) -> Vec<mockito::Mock> {
        let start = server
            .mock("POST", "/upload/v1beta/files")
            .match_header("x-goog-api-key", "test-key")
            .match_header("x-goog-upload-command", "start")
            .match_header("x-goog-upload-header-content-type", "audio/mp4")
            .with_status(200)
            .with_header("x-goog-upload-url", &format!("{}/upload-session", server.url()))
            .create_async()
            .await;

        let finalize = server
            .mock("POST", "/upload-session")
            .match_header("x-goog-upload-command", "upload, finalize")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(format!(
                r#"{{"file": {{"name": "files/abc", "uri": "https://example.test/files/abc", "mimeType": "audio/mp4", "state": "{state}"}}}}"#
            ))
            .create_async()
            .await;

        let delete = server
            .mock("DELETE", "/v1beta/files/abc")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        vec![start, finalize, delete]
    }

    #[test]
    fn test_prompt_interpolates_title() {
        let prompt = GeminiClient::build_prompt("Fed decision recap");
        assert!(prompt.contains("\"Fed decision recap\""));
        assert!(!prompt.contains("{title}"));
    }

    #[tokio::test]
    async fn test_analyze_success() {
        let mut server = Server::new_async().await;
        let _upload = mock_upload(&mut server, "PROCESSING").await;

        let poll = server
            .mock("GET", "/v1beta/files/abc")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"name": "files/abc", "uri": "https://example.test/files/abc", "state": "ACTIVE"}"#)
            .create_async()
            .await;

        let generate = server
            .mock("POST", MODEL_PATH)
            .match_body(Matcher::Regex(
                r#""file_uri":"https://example.test/files/abc""#.into(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"candidates": [{"content": {"parts": [{"text": "📢 "}, {"text": "REPORT"}]}, "finishReason": "STOP"}]}"#)
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let report = client(&server)
            .analyze(&audio_file(&dir), "X")
            .await
            .unwrap();

        assert_eq!(report, "📢 REPORT");
        poll.assert_async().await;
        generate.assert_async().await;
    }

    #[tokio::test]
    async fn test_analyze_quota_exceeded() {
        let mut server = Server::new_async().await;
        let _upload = mock_upload(&mut server, "ACTIVE").await;

        let _generate = server
            .mock("POST", MODEL_PATH)
            .with_status(429)
            .with_body(r#"{"error": {"code": 429, "status": "RESOURCE_EXHAUSTED"}}"#)
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let result = client(&server).analyze(&audio_file(&dir), "X").await;

        assert!(
            matches!(result, Err(AnalysisError::QuotaExceeded(_))),
            "got {result:?}"
        );
    }

    #[tokio::test]
    async fn test_upload_forbidden_is_rate_limited() {
        let mut server = Server::new_async().await;
        let _start = server
            .mock("POST", "/upload/v1beta/files")
            .with_status(403)
            .with_body("PERMISSION_DENIED")
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let result = client(&server).analyze(&audio_file(&dir), "X").await;

        assert!(matches!(result, Err(AnalysisError::QuotaExceeded(_))));
    }

    #[tokio::test]
    async fn test_failed_processing_is_content_error() {
        let mut server = Server::new_async().await;
        let _upload = mock_upload(&mut server, "FAILED").await;

        let dir = TempDir::new().unwrap();
        let result = client(&server).analyze(&audio_file(&dir), "X").await;

        assert!(
            matches!(result, Err(AnalysisError::Content(_))),
            "got {result:?}"
        );
    }

    #[tokio::test]
    async fn test_blocked_prompt_is_content_error() {
        let mut server = Server::new_async().await;
        let _upload = mock_upload(&mut server, "ACTIVE").await;

        let _generate = server
            .mock("POST", MODEL_PATH)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"candidates": [], "promptFeedback": {"blockReason": "SAFETY"}}"#)
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let result = client(&server).analyze(&audio_file(&dir), "X").await;

        match result {
            Err(AnalysisError::Content(message)) => assert!(message.contains("SAFETY")),
            other => panic!("Expected content error, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_artifact_is_content_error() {
        let server = Server::new_async().await;
        let result = client(&server)
            .analyze(Path::new("/nonexistent/temp_v1.m4a"), "X")
            .await;

        assert!(matches!(result, Err(AnalysisError::Content(_))));
    }
}
