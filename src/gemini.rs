//! Gemini API client: file upload plus content generation.
//!
//! The transcription stage does not talk HTTP directly — it drives the
//! [`VisionModel`] port, which exposes exactly the two operations the
//! pipeline depends on:
//!
//! 1. `upload`   — exchange a local file path for a server-assigned handle
//! 2. `generate` — exchange `{handle, prompt, model id}` for free-form text
//!
//! [`GeminiClient`] is the production adapter. Tests substitute a
//! deterministic double instead of mocking HTTP in the pipeline itself.
//!
//! ## Wire protocol
//!
//! Upload uses the Files API resumable handshake: a `start` request carrying
//! the byte count returns an upload URL in the `x-goog-upload-url` header,
//! and a single `upload, finalize` request to that URL carries the bytes.
//! Fresh uploads may report state `PROCESSING`; we poll the handle until it
//! is `ACTIVE` before returning, because `generateContent` rejects files
//! that are still being ingested.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::TranslationConfig;
use crate::error::TranscriptionError;

/// MIME type of every staged source document.
const PDF_MIME_TYPE: &str = "application/pdf";

/// A server-assigned reference to an uploaded document.
///
/// Only valid for the remote service that issued it; discarded with the
/// pipeline run that created it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHandle {
    /// Resource name, e.g. `files/abc-123`.
    pub name: String,
    /// Canonical URI passed back in the generate call.
    pub uri: String,
    /// MIME type the service recorded for the upload.
    pub mime_type: String,
}

/// The two remote operations the transcription stage depends on.
#[async_trait]
pub trait VisionModel: Send + Sync {
    /// Upload the file at `path`, returning a service-side handle.
    async fn upload(
        &self,
        path: &Path,
        display_name: &str,
    ) -> Result<FileHandle, TranscriptionError>;

    /// Generate free-form text from an uploaded document and a prompt.
    async fn generate(
        &self,
        file: &FileHandle,
        prompt: &str,
        model: &str,
    ) -> Result<String, TranscriptionError>;
}

// ── Wire types (request) ─────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StartUploadRequest {
    file: UploadMetadata,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadMetadata {
    display_name: String,
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_data: Option<FileData>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileData {
    mime_type: String,
    file_uri: String,
}

// ── Wire types (response) ────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct UploadResponse {
    file: RemoteFile,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteFile {
    name: String,
    uri: Option<String>,
    state: Option<String>,
    mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Option<Vec<ResponsePart>>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

// ── Client ───────────────────────────────────────────────────────────────

/// Production [`VisionModel`] backed by the Gemini REST API.
pub struct GeminiClient {
    api_key: String,
    base_url: String,
    poll_interval: Duration,
    poll_limit: u32,
    client: reqwest::Client,
}

impl GeminiClient {
    /// Create a client with the given API key and default endpoints.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::from_config(api_key, &TranslationConfig::default())
    }

    /// Create a client taking endpoint and polling settings from `config`.
    pub fn from_config(api_key: impl Into<String>, config: &TranslationConfig) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: config.api_base_url.clone(),
            poll_interval: Duration::from_millis(config.upload_poll_interval_ms),
            poll_limit: config.upload_poll_limit,
            client: reqwest::Client::new(),
        }
    }

    fn start_upload_url(&self) -> String {
        format!(
            "{}/upload/v1beta/files?key={}",
            self.base_url, self.api_key
        )
    }

    fn file_url(&self, name: &str) -> String {
        format!("{}/v1beta/{}?key={}", self.base_url, name, self.api_key)
    }

    fn generate_url(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        )
    }

    /// Map a non-success HTTP response to a typed error, consuming the body.
    async fn status_error(response: reqwest::Response) -> TranscriptionError {
        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED
            || status == reqwest::StatusCode::FORBIDDEN
        {
            return TranscriptionError::InvalidApiKey {
                status: status.as_u16(),
            };
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return TranscriptionError::RateLimited;
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        TranscriptionError::ApiError {
            message: format!("HTTP {}: {}", status, body),
        }
    }

    /// Resumable-upload handshake: returns the session URL for the bytes.
    async fn begin_upload(
        &self,
        display_name: &str,
        byte_len: u64,
    ) -> Result<String, TranscriptionError> {
        let response = self
            .client
            .post(self.start_upload_url())
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", byte_len)
            .header("X-Goog-Upload-Header-Content-Type", PDF_MIME_TYPE)
            .json(&StartUploadRequest {
                file: UploadMetadata {
                    display_name: display_name.to_string(),
                },
            })
            .send()
            .await
            .map_err(|e| TranscriptionError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }

        response
            .headers()
            .get("x-goog-upload-url")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
            .ok_or_else(|| {
                TranscriptionError::ParseError(
                    "Upload handshake response is missing the x-goog-upload-url header".into(),
                )
            })
    }

    /// Send the document bytes and finalise the upload in one request.
    async fn finish_upload(
        &self,
        upload_url: &str,
        bytes: Vec<u8>,
    ) -> Result<RemoteFile, TranscriptionError> {
        let response = self
            .client
            .post(upload_url)
            .header("X-Goog-Upload-Offset", 0)
            .header("X-Goog-Upload-Command", "upload, finalize")
            .body(bytes)
            .send()
            .await
            .map_err(|e| TranscriptionError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }

        let parsed: UploadResponse = response
            .json()
            .await
            .map_err(|e| TranscriptionError::ParseError(e.to_string()))?;
        Ok(parsed.file)
    }

    /// Poll the file resource until the service reports it ACTIVE.
    async fn wait_until_active(&self, file: RemoteFile) -> Result<RemoteFile, TranscriptionError> {
        let mut file = file;
        let mut polls = 0;

        while file.state.as_deref() == Some("PROCESSING") {
            if polls >= self.poll_limit {
                return Err(TranscriptionError::FileNotReady {
                    name: file.name,
                    state: "PROCESSING".into(),
                });
            }
            polls += 1;
            tokio::time::sleep(self.poll_interval).await;
            debug!("Polling uploaded file {} (attempt {})", file.name, polls);

            let response = self
                .client
                .get(self.file_url(&file.name))
                .send()
                .await
                .map_err(|e| TranscriptionError::RequestFailed(e.to_string()))?;

            if !response.status().is_success() {
                return Err(Self::status_error(response).await);
            }

            file = response
                .json()
                .await
                .map_err(|e| TranscriptionError::ParseError(e.to_string()))?;
        }

        match file.state.as_deref() {
            // Some backends omit the state field once ingestion is done.
            Some("ACTIVE") | None => Ok(file),
            Some(other) => Err(TranscriptionError::FileNotReady {
                name: file.name.clone(),
                state: other.to_string(),
            }),
        }
    }

    /// Pull the concatenated text out of a generate response.
    fn extract_text(response: &GenerateContentResponse) -> Option<String> {
        let parts: Vec<&str> = response
            .candidates
            .as_ref()?
            .first()?
            .content
            .as_ref()?
            .parts
            .as_ref()?
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(""))
        }
    }
}

#[async_trait]
impl VisionModel for GeminiClient {
    async fn upload(
        &self,
        path: &Path,
        display_name: &str,
    ) -> Result<FileHandle, TranscriptionError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| TranscriptionError::Staging { source })?;
        let byte_len = bytes.len() as u64;
        info!("Uploading {} ({} bytes) to Gemini", display_name, byte_len);

        let upload_url = self.begin_upload(display_name, byte_len).await?;
        let file = self.finish_upload(&upload_url, bytes).await?;
        let file = self.wait_until_active(file).await?;

        let uri = file.uri.ok_or_else(|| {
            TranscriptionError::ParseError("Upload response is missing the file URI".into())
        })?;

        debug!("Upload complete: {} -> {}", display_name, file.name);
        Ok(FileHandle {
            name: file.name,
            uri,
            mime_type: file.mime_type.unwrap_or_else(|| PDF_MIME_TYPE.to_string()),
        })
    }

    async fn generate(
        &self,
        file: &FileHandle,
        prompt: &str,
        model: &str,
    ) -> Result<String, TranscriptionError> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![
                    Part {
                        text: None,
                        file_data: Some(FileData {
                            mime_type: file.mime_type.clone(),
                            file_uri: file.uri.clone(),
                        }),
                    },
                    Part {
                        text: Some(prompt.to_string()),
                        file_data: None,
                    },
                ],
            }],
        };

        info!("Requesting translation from {}", model);
        let response = self
            .client
            .post(self.generate_url(model))
            .json(&body)
            .send()
            .await
            .map_err(|e| TranscriptionError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::status_error(response).await);
        }

        let response: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| TranscriptionError::ParseError(e.to_string()))?;

        if let Some(error) = response.error {
            return Err(TranscriptionError::ApiError {
                message: error.message,
            });
        }

        let text = Self::extract_text(&response).ok_or(TranscriptionError::EmptyResponse)?;
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(TranscriptionError::EmptyResponse);
        }

        Ok(trimmed.to_string())
    }
}
