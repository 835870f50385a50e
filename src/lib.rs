//! # notes2pdf
//!
//! Translate a PDF of handwritten notes into a clean, styled English PDF
//! using Gemini.
//!
//! ## Why this crate?
//!
//! Traditional OCR falls apart on handwriting — cursive loops, crossed-out
//! words, margin diagrams. Instead this crate hands the whole document to a
//! multimodal model that reads it as a human would, translates it into
//! English, and returns structured Markdown, which is then typeset into a
//! downloadable PDF with a fixed, readable stylesheet.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF bytes
//!  │
//!  ├─ 1. Intake      validate payload and credential are present
//!  ├─ 2. Transcribe  stage to a temp file, upload, generateContent
//!  ├─ 3. Markdown    model output → HTML (tables, nl2br, fenced code)
//!  └─ 4. Render      styled template → deterministic PDF layout
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use notes2pdf::{translate, TranslationConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let payload = std::fs::read("notes.pdf")?;
//!     let api_key = std::env::var("GEMINI_API_KEY")?;
//!     let config = TranslationConfig::default();
//!
//!     let output = translate(&payload, "notes.pdf", &api_key, &config).await?;
//!     println!("{}", output.markdown);
//!     if let Some(doc) = output.document {
//!         std::fs::write(doc.file_name(), doc.bytes())?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `notes2pdf` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! notes2pdf = { version = "0.3", default-features = false }
//! ```
//!
//! ## Failure model
//!
//! Every error is typed by the stage that produced it: [`IntakeError`] for
//! missing inputs, [`TranscriptionError`] for the single-attempt remote
//! exchange, [`RenderError`] for typesetting. A render failure does not
//! discard the translation — see [`TranslationOutput`].

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod gemini;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod translate;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{StyleSheet, Tint, TranslationConfig, TranslationConfigBuilder, DEFAULT_MODEL};
pub use error::{IntakeError, Notes2PdfError, RenderError, TranscriptionError};
pub use gemini::{FileHandle, GeminiClient, VisionModel};
pub use output::{RenderedDocument, TranslationOutput, TranslationStats};
pub use pipeline::rasterize::{HtmlRasterizer, PdfEngine};
pub use translate::{translate, translate_sync, translate_with};
