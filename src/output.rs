//! Output types returned by the translation pipeline.

use crate::error::RenderError;
use serde::Serialize;

/// Download defaults for the terminal artifact.
const DOWNLOAD_FILE_NAME: &str = "Translated_Notes.pdf";
const DOWNLOAD_MIME_TYPE: &str = "application/pdf";

/// The styled PDF produced from a translation.
///
/// Immutable once produced; only ever constructed from a non-empty
/// transcription, never from partial rasteriser output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    bytes: Vec<u8>,
}

impl RenderedDocument {
    pub(crate) fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Suggested download filename.
    pub fn file_name(&self) -> &'static str {
        DOWNLOAD_FILE_NAME
    }

    /// MIME type of the artifact.
    pub fn mime_type(&self) -> &'static str {
        DOWNLOAD_MIME_TYPE
    }
}

/// Result of one full pipeline run.
///
/// The translation text is kept even when rendering fails: the caller can
/// still show the markdown to the user while reporting the render error.
#[derive(Debug)]
pub struct TranslationOutput {
    /// The translated markdown, exactly as the model returned it.
    pub markdown: String,
    /// The rendered PDF, if rendering succeeded.
    pub document: Option<RenderedDocument>,
    /// The render failure, if rendering did not succeed.
    pub render_error: Option<RenderError>,
    /// Timing stats for the run.
    pub stats: TranslationStats,
}

impl TranslationOutput {
    /// Treat a render failure as a hard error, discarding the markdown.
    pub fn into_result(self) -> Result<RenderedDocument, RenderError> {
        match (self.document, self.render_error) {
            (Some(doc), _) => Ok(doc),
            (None, Some(err)) => Err(err),
            (None, None) => Err(RenderError::Rasterisation {
                detail: "no document and no recorded error".into(),
            }),
        }
    }
}

/// Wall-clock timings for the stages of one run.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct TranslationStats {
    /// Time spent staging + uploading + generating, in milliseconds.
    pub transcription_ms: u64,
    /// Time spent converting and rasterising, in milliseconds.
    pub render_ms: u64,
    /// End-to-end duration, in milliseconds.
    pub total_ms: u64,
}
