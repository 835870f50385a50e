//! Top-level translation entry points.
//!
//! One call runs the whole pipeline for one user action: validate inputs,
//! transcribe-translate via the remote model, render the styled PDF. Each
//! call starts from a clean slate — no state survives between invocations,
//! and a re-trigger after failure creates an entirely new request context.
//!
//! A render failure is deliberately not fatal at this level: the fetched
//! translation cost a remote call and remains useful, so the output keeps
//! the markdown and records the render error alongside it. Intake and
//! transcription failures, by contrast, leave nothing worth returning and
//! surface as `Err`.

use std::time::Instant;
use tracing::{info, warn};

use crate::config::TranslationConfig;
use crate::error::Notes2PdfError;
use crate::gemini::{GeminiClient, VisionModel};
use crate::output::{TranslationOutput, TranslationStats};
use crate::pipeline::rasterize::{HtmlRasterizer, PdfEngine};
use crate::pipeline::{intake, render, transcribe};

/// Translate a handwritten-notes PDF into a styled English PDF.
///
/// This is the primary entry point for the library. The production Gemini
/// client and printpdf engine are constructed from `config`; use
/// [`translate_with`] to substitute either collaborator.
///
/// # Arguments
/// * `payload`      — raw PDF bytes
/// * `display_name` — name shown to the remote service, e.g. `notes.pdf`
/// * `credential`   — Gemini API key, used for exactly this one action
/// * `config`       — model, prompt, and stylesheet settings
///
/// # Errors
/// `Err` for missing inputs and transcription failures. A render failure
/// returns `Ok` with [`TranslationOutput::render_error`] set and the
/// markdown preserved.
pub async fn translate(
    payload: &[u8],
    display_name: &str,
    credential: &str,
    config: &TranslationConfig,
) -> Result<TranslationOutput, Notes2PdfError> {
    let client = GeminiClient::from_config(credential, config);
    let engine = PdfEngine::new(config.style.clone());
    translate_with(payload, display_name, credential, config, &client, &engine).await
}

/// [`translate`] with caller-supplied collaborators (used by tests and by
/// embedders that wrap the client with middleware).
pub async fn translate_with(
    payload: &[u8],
    display_name: &str,
    credential: &str,
    config: &TranslationConfig,
    client: &dyn VisionModel,
    rasterizer: &dyn HtmlRasterizer,
) -> Result<TranslationOutput, Notes2PdfError> {
    let total_start = Instant::now();
    info!("Starting translation of {}", display_name);

    // ── Step 1: Intake ───────────────────────────────────────────────
    let request = intake::intake(payload, display_name, credential)?;

    // ── Step 2: Transcribe-translate ─────────────────────────────────
    let transcription_start = Instant::now();
    let transcription = transcribe::transcribe(&request, client, config).await?;
    let transcription_ms = transcription_start.elapsed().as_millis() as u64;

    // ── Step 3: Render ───────────────────────────────────────────────
    let render_start = Instant::now();
    let rendered = render::render(transcription.markdown(), &config.style, rasterizer);
    let render_ms = render_start.elapsed().as_millis() as u64;

    let (document, render_error) = match rendered {
        Ok(doc) => (Some(doc), None),
        Err(e) => {
            warn!("Rendering failed, keeping translation text: {}", e);
            (None, Some(e))
        }
    };

    let stats = TranslationStats {
        transcription_ms,
        render_ms,
        total_ms: total_start.elapsed().as_millis() as u64,
    };
    info!(
        "Translation complete in {}ms (transcription {}ms, render {}ms)",
        stats.total_ms, stats.transcription_ms, stats.render_ms
    );

    Ok(TranslationOutput {
        markdown: transcription.into_markdown(),
        document,
        render_error,
        stats,
    })
}

/// Synchronous wrapper around [`translate`].
///
/// Creates a temporary tokio runtime internally.
pub fn translate_sync(
    payload: &[u8],
    display_name: &str,
    credential: &str,
    config: &TranslationConfig,
) -> Result<TranslationOutput, Notes2PdfError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Notes2PdfError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(translate(payload, display_name, credential, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{IntakeError, RenderError, TranscriptionError};
    use crate::gemini::FileHandle;
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedModel {
        markdown: &'static str,
        calls: AtomicUsize,
    }

    impl FixedModel {
        fn new(markdown: &'static str) -> Self {
            Self {
                markdown,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl VisionModel for FixedModel {
        async fn upload(
            &self,
            _path: &Path,
            _display_name: &str,
        ) -> Result<FileHandle, TranscriptionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(FileHandle {
                name: "files/fixed".into(),
                uri: "https://example.test/files/fixed".into(),
                mime_type: "application/pdf".into(),
            })
        }

        async fn generate(
            &self,
            _file: &FileHandle,
            _prompt: &str,
            _model: &str,
        ) -> Result<String, TranscriptionError> {
            Ok(self.markdown.to_string())
        }
    }

    struct FailingRasterizer;

    impl HtmlRasterizer for FailingRasterizer {
        fn rasterize(&self, _html: &[u8]) -> Result<Vec<u8>, RenderError> {
            Err(RenderError::Rasterisation {
                detail: "engine error".into(),
            })
        }
    }

    #[tokio::test]
    async fn missing_payload_never_reaches_the_client() {
        let model = FixedModel::new("# T");
        let engine = PdfEngine::default();
        let config = TranslationConfig::default();

        let err = translate_with(b"", "notes.pdf", "key", &config, &model, &engine)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Notes2PdfError::Intake(IntakeError::MissingDocument)
        ));
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn full_run_produces_markdown_and_document() {
        let model = FixedModel::new("# Title\n## Section\n- item one\n- item two");
        let engine = PdfEngine::default();
        let config = TranslationConfig::default();

        let out = translate_with(b"%PDF-1.4", "notes.pdf", "key", &config, &model, &engine)
            .await
            .unwrap();
        assert!(out.markdown.starts_with("# Title"));
        let doc = out.document.expect("document should render");
        assert!(doc.bytes().starts_with(b"%PDF"));
        assert!(out.render_error.is_none());
    }

    #[tokio::test]
    async fn render_failure_keeps_the_translation() {
        let model = FixedModel::new("# Title");
        let config = TranslationConfig::default();

        let out = translate_with(
            b"%PDF-1.4",
            "notes.pdf",
            "key",
            &config,
            &model,
            &FailingRasterizer,
        )
        .await
        .unwrap();
        assert_eq!(out.markdown, "# Title");
        assert!(out.document.is_none());
        assert!(matches!(
            out.render_error,
            Some(RenderError::Rasterisation { .. })
        ));
    }
}
