//! Error types for the notes2pdf library.
//!
//! Three distinct error types reflect the three distinct failure domains:
//!
//! * [`IntakeError`] — a required input (document or credential) is absent.
//!   User-correctable; the pipeline does not proceed.
//!
//! * [`TranscriptionError`] — the remote Gemini call failed (network,
//!   authentication, quota, malformed response). Surfaced verbatim; the
//!   pipeline halts before rendering and nothing is retried.
//!
//! * [`RenderError`] — markdown-to-PDF conversion failed or had nothing to
//!   render. The already-fetched translation text stays available to the
//!   caller even though no downloadable file is produced.
//!
//! The separation lets callers distinguish "ask the user for input" from
//! "the API rejected us" from "the layout engine choked" programmatically,
//! instead of string-matching one flat error.

use thiserror::Error;

/// A required input is missing. Prompt the user; do not retry automatically.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntakeError {
    /// The PDF payload is empty (no file selected, or a zero-byte upload).
    #[error("No document provided: the PDF payload is empty")]
    MissingDocument,

    /// The API credential is empty.
    #[error("No API key provided: set GEMINI_API_KEY or pass --api-key")]
    MissingCredential,
}

/// The remote transcription/translation call failed.
///
/// One variant per way the single-attempt Gemini exchange can go wrong.
/// There is no retry: the first failure is surfaced immediately.
#[derive(Debug, Error)]
pub enum TranscriptionError {
    /// Could not write the staging file handed to the upload operation.
    #[error("Failed to stage document for upload: {source}")]
    Staging {
        #[source]
        source: std::io::Error,
    },

    /// The HTTP request itself failed (DNS, connect, TLS, timeout).
    #[error("Request to Gemini failed: {0}\nCheck your internet connection.")]
    RequestFailed(String),

    /// The API rejected the credential (HTTP 401/403).
    #[error("Gemini rejected the API key (HTTP {status})")]
    InvalidApiKey { status: u16 },

    /// HTTP 429 from the API. The caller may re-trigger the action later.
    #[error("Gemini rate limit exceeded — try again in a moment")]
    RateLimited,

    /// Any other non-success HTTP status or error payload from the API.
    #[error("Gemini API error: {message}")]
    ApiError { message: String },

    /// The response body was not the JSON shape we expect.
    #[error("Failed to parse Gemini response: {0}")]
    ParseError(String),

    /// The uploaded file never reached the ACTIVE state.
    #[error("Uploaded file '{name}' is not ready (state: {state})")]
    FileNotReady { name: String, state: String },

    /// The model returned no usable text.
    #[error("Gemini returned an empty response — the document may be unreadable")]
    EmptyResponse,
}

/// Markdown-to-PDF rendering failed. No partial byte stream is ever produced.
#[derive(Debug, Error)]
pub enum RenderError {
    /// There is no markdown to render; the rasteriser is never invoked.
    #[error("Nothing to render: the markdown text is empty")]
    EmptyMarkdown,

    /// The layout engine reported an internal error.
    #[error("PDF rasterisation failed: {detail}")]
    Rasterisation { detail: String },
}

/// Umbrella error for the top-level [`crate::translate`] entry points.
#[derive(Debug, Error)]
pub enum Notes2PdfError {
    #[error(transparent)]
    Intake(#[from] IntakeError),

    #[error(transparent)]
    Transcription(#[from] TranscriptionError),

    #[error(transparent)]
    Render(#[from] RenderError),

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unexpected internal error (runtime construction, task panic).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Notes2PdfError {
    /// True when the failure is user-correctable input, not a remote fault.
    pub fn is_user_input(&self) -> bool {
        matches!(self, Notes2PdfError::Intake(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intake_messages_name_the_missing_piece() {
        assert!(IntakeError::MissingDocument.to_string().contains("payload"));
        assert!(IntakeError::MissingCredential
            .to_string()
            .contains("GEMINI_API_KEY"));
    }

    #[test]
    fn invalid_key_display_carries_status() {
        let e = TranscriptionError::InvalidApiKey { status: 403 };
        assert!(e.to_string().contains("403"));
    }

    #[test]
    fn umbrella_preserves_domain() {
        let e: Notes2PdfError = IntakeError::MissingDocument.into();
        assert!(e.is_user_input());
        let e: Notes2PdfError = RenderError::EmptyMarkdown.into();
        assert!(!e.is_user_input());
        assert!(matches!(e, Notes2PdfError::Render(_)));
    }
}
