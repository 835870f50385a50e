//! Transcription-translation: stage the document, upload it, and ask the
//! model for the translated markdown.
//!
//! ## Staging file lifetime
//!
//! The Files API upload needs a path on disk, so the in-memory payload is
//! written to a [`tempfile::NamedTempFile`] first. `NamedTempFile` owns the
//! path and unlinks it on drop, which guarantees cleanup on every exit path
//! of this function — success, typed error from the remote call, or panic —
//! without an explicit cleanup block. Each call gets a fresh randomised
//! path, so concurrent invocations never collide.
//!
//! ## Single attempt
//!
//! The remote exchange is made exactly once and blocks until the service
//! responds or errors. No timeout override, no retry, no streamed partial
//! result: a failure is surfaced immediately and the user re-triggers the
//! whole pipeline if they want another go.

use std::io::Write;
use tracing::{debug, info};

use crate::config::TranslationConfig;
use crate::error::TranscriptionError;
use crate::gemini::VisionModel;
use crate::pipeline::intake::ValidatedRequest;

/// The structured-text (markdown) translation returned by the model.
///
/// Immutable once produced. No structural validation is applied: any
/// non-empty text the model returns is accepted verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptionResult {
    markdown: String,
}

impl TranscriptionResult {
    pub fn markdown(&self) -> &str {
        &self.markdown
    }

    pub fn into_markdown(self) -> String {
        self.markdown
    }
}

/// Run the remote transcription-translation exchange for one request.
///
/// # Errors
/// Any failure in staging, upload, or generation is returned as a
/// [`TranscriptionError`]; the staging file is removed in every case.
pub async fn transcribe(
    request: &ValidatedRequest<'_>,
    client: &dyn VisionModel,
    config: &TranslationConfig,
) -> Result<TranscriptionResult, TranscriptionError> {
    let staged = stage_document(request.document.bytes())?;
    debug!("Staged document at {}", staged.path().display());

    let handle = client
        .upload(staged.path(), request.document.display_name())
        .await?;

    let markdown = client
        .generate(&handle, config.effective_prompt(), &config.model)
        .await?;

    info!(
        "Translation received: {} bytes of markdown",
        markdown.len()
    );
    // `staged` drops here, unlinking the temp file.
    Ok(TranscriptionResult { markdown })
}

/// Write the payload to a fresh temp file the upload client can read.
fn stage_document(bytes: &[u8]) -> Result<tempfile::NamedTempFile, TranscriptionError> {
    let mut staged = tempfile::Builder::new()
        .prefix("notes2pdf-")
        .suffix(".pdf")
        .tempfile()
        .map_err(|source| TranscriptionError::Staging { source })?;
    staged
        .write_all(bytes)
        .map_err(|source| TranscriptionError::Staging { source })?;
    staged
        .flush()
        .map_err(|source| TranscriptionError::Staging { source })?;
    Ok(staged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gemini::FileHandle;
    use crate::pipeline::intake::intake;
    use async_trait::async_trait;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    /// Test double that records the staging path and answers from a script.
    struct ScriptedModel {
        seen_path: Mutex<Option<PathBuf>>,
        seen_bytes: Mutex<Option<Vec<u8>>>,
        upload_result: fn() -> Result<FileHandle, TranscriptionError>,
        generate_result: fn() -> Result<String, TranscriptionError>,
    }

    impl ScriptedModel {
        fn new(
            upload_result: fn() -> Result<FileHandle, TranscriptionError>,
            generate_result: fn() -> Result<String, TranscriptionError>,
        ) -> Self {
            Self {
                seen_path: Mutex::new(None),
                seen_bytes: Mutex::new(None),
                upload_result,
                generate_result,
            }
        }

        fn staging_path(&self) -> PathBuf {
            self.seen_path.lock().unwrap().clone().expect("upload was called")
        }
    }

    #[async_trait]
    impl VisionModel for ScriptedModel {
        async fn upload(
            &self,
            path: &Path,
            _display_name: &str,
        ) -> Result<FileHandle, TranscriptionError> {
            *self.seen_path.lock().unwrap() = Some(path.to_path_buf());
            *self.seen_bytes.lock().unwrap() = Some(std::fs::read(path).unwrap());
            (self.upload_result)()
        }

        async fn generate(
            &self,
            _file: &FileHandle,
            _prompt: &str,
            _model: &str,
        ) -> Result<String, TranscriptionError> {
            (self.generate_result)()
        }
    }

    fn ok_handle() -> Result<FileHandle, TranscriptionError> {
        Ok(FileHandle {
            name: "files/test".into(),
            uri: "https://example.test/files/test".into(),
            mime_type: "application/pdf".into(),
        })
    }

    #[tokio::test]
    async fn staged_bytes_match_payload_and_file_is_removed() {
        let model = ScriptedModel::new(ok_handle, || Ok("# Done".into()));
        let config = TranslationConfig::default();
        let payload = b"%PDF-1.4 fake".to_vec();
        let request = intake(&payload, "notes.pdf", "key").unwrap();

        let result = transcribe(&request, &model, &config).await.unwrap();
        assert_eq!(result.markdown(), "# Done");
        assert_eq!(
            model.seen_bytes.lock().unwrap().as_deref(),
            Some(payload.as_slice())
        );
        assert!(
            !model.staging_path().exists(),
            "staging file must be unlinked after a successful call"
        );
    }

    #[tokio::test]
    async fn staging_file_removed_when_upload_fails() {
        let model = ScriptedModel::new(
            || {
                Err(TranscriptionError::RequestFailed(
                    "connection reset".into(),
                ))
            },
            || Ok(String::new()),
        );
        let config = TranslationConfig::default();
        let payload = b"%PDF-1.4".to_vec();
        let request = intake(&payload, "notes.pdf", "key").unwrap();

        let err = transcribe(&request, &model, &config).await.unwrap_err();
        assert!(matches!(err, TranscriptionError::RequestFailed(_)));
        assert!(
            !model.staging_path().exists(),
            "staging file must be unlinked after an upload failure"
        );
    }

    #[tokio::test]
    async fn staging_file_removed_when_generate_fails() {
        let model = ScriptedModel::new(ok_handle, || {
            Err(TranscriptionError::ApiError {
                message: "quota exceeded".into(),
            })
        });
        let config = TranslationConfig::default();
        let payload = b"%PDF-1.4".to_vec();
        let request = intake(&payload, "notes.pdf", "key").unwrap();

        let err = transcribe(&request, &model, &config).await.unwrap_err();
        assert!(matches!(err, TranscriptionError::ApiError { .. }));
        assert!(!model.staging_path().exists());
    }

    #[tokio::test]
    async fn staging_file_removed_when_the_client_panics() {
        use std::sync::Arc;

        struct PanickingModel {
            seen_path: Mutex<Option<PathBuf>>,
        }

        #[async_trait]
        impl VisionModel for PanickingModel {
            async fn upload(
                &self,
                path: &Path,
                _display_name: &str,
            ) -> Result<FileHandle, TranscriptionError> {
                *self.seen_path.lock().unwrap() = Some(path.to_path_buf());
                panic!("simulated client fault");
            }

            async fn generate(
                &self,
                _file: &FileHandle,
                _prompt: &str,
                _model: &str,
            ) -> Result<String, TranscriptionError> {
                Ok(String::new())
            }
        }

        let model = Arc::new(PanickingModel {
            seen_path: Mutex::new(None),
        });

        // Run on a separate task so the panic unwinds the whole call
        // instead of aborting the test.
        let task_model = Arc::clone(&model);
        let join = tokio::spawn(async move {
            let config = TranslationConfig::default();
            let payload = b"%PDF-1.4".to_vec();
            let request = intake(&payload, "notes.pdf", "key").unwrap();
            transcribe(&request, task_model.as_ref(), &config).await
        })
        .await;

        assert!(join.expect_err("upload panics").is_panic());
        let staged = model
            .seen_path
            .lock()
            .unwrap()
            .clone()
            .expect("upload was called");
        assert!(
            !staged.exists(),
            "staging file must be unlinked when the call unwinds"
        );
    }

    #[tokio::test]
    async fn custom_prompt_is_forwarded() {
        struct PromptCapture(Mutex<Option<(String, String)>>);

        #[async_trait]
        impl VisionModel for PromptCapture {
            async fn upload(
                &self,
                _path: &Path,
                _display_name: &str,
            ) -> Result<FileHandle, TranscriptionError> {
                ok_handle()
            }

            async fn generate(
                &self,
                _file: &FileHandle,
                prompt: &str,
                model: &str,
            ) -> Result<String, TranscriptionError> {
                *self.0.lock().unwrap() = Some((prompt.to_string(), model.to_string()));
                Ok("text".into())
            }
        }

        let model = PromptCapture(Mutex::new(None));
        let config = TranslationConfig::builder()
            .prompt("Summarise in French")
            .model("gemini-test")
            .build()
            .unwrap();
        let payload = b"%PDF-1.4".to_vec();
        let request = intake(&payload, "notes.pdf", "key").unwrap();

        transcribe(&request, &model, &config).await.unwrap();
        let (prompt, model_id) = model.0.lock().unwrap().clone().unwrap();
        assert_eq!(prompt, "Summarise in French");
        assert_eq!(model_id, "gemini-test");
    }
}
