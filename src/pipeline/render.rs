//! Rendering: translated markdown → styled, downloadable PDF.
//!
//! A thin stage that chains the two pure collaborators: the markdown
//! converter and the HTML rasteriser. The empty-input check lives here so
//! the rasteriser is never invoked when there is nothing to render, and a
//! rasteriser failure yields no partial byte stream — the document either
//! exists completely or not at all.

use tracing::info;

use crate::config::StyleSheet;
use crate::error::RenderError;
use crate::output::RenderedDocument;
use crate::pipeline::markdown::{to_html_fragment, wrap_document};
use crate::pipeline::rasterize::HtmlRasterizer;

/// Render markdown into a styled PDF using the given rasteriser.
///
/// # Errors
/// [`RenderError::EmptyMarkdown`] when `markdown` is empty or whitespace;
/// [`RenderError::Rasterisation`] when the layout engine reports a failure.
pub fn render(
    markdown: &str,
    style: &StyleSheet,
    rasterizer: &dyn HtmlRasterizer,
) -> Result<RenderedDocument, RenderError> {
    if markdown.trim().is_empty() {
        return Err(RenderError::EmptyMarkdown);
    }

    let html = wrap_document(&to_html_fragment(markdown), style);
    let bytes = rasterizer.rasterize(html.as_bytes())?;
    info!("Rendered translation into {} bytes of PDF", bytes.len());
    Ok(RenderedDocument::new(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Double that counts invocations and returns a canned byte stream.
    struct CountingRasterizer {
        calls: AtomicUsize,
    }

    impl CountingRasterizer {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl HtmlRasterizer for CountingRasterizer {
        fn rasterize(&self, _html: &[u8]) -> Result<Vec<u8>, RenderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(b"%PDF-stub".to_vec())
        }
    }

    struct FailingRasterizer;

    impl HtmlRasterizer for FailingRasterizer {
        fn rasterize(&self, _html: &[u8]) -> Result<Vec<u8>, RenderError> {
            Err(RenderError::Rasterisation {
                detail: "internal error flag".into(),
            })
        }
    }

    #[test]
    fn empty_markdown_never_reaches_the_rasterizer() {
        let double = CountingRasterizer::new();
        let style = StyleSheet::default();

        for input in ["", "   ", "\n\n\t"] {
            let err = render(input, &style, &double).unwrap_err();
            assert!(matches!(err, RenderError::EmptyMarkdown));
        }
        assert_eq!(double.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn non_empty_markdown_is_rendered_once() {
        let double = CountingRasterizer::new();
        let style = StyleSheet::default();

        let doc = render("# Title", &style, &double).unwrap();
        assert_eq!(doc.bytes(), b"%PDF-stub");
        assert_eq!(double.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn rasterizer_failure_produces_no_document() {
        let err = render("# Title", &StyleSheet::default(), &FailingRasterizer).unwrap_err();
        assert!(matches!(err, RenderError::Rasterisation { .. }));
    }

    #[test]
    fn download_defaults() {
        let doc = RenderedDocument::new(vec![1, 2, 3]);
        assert_eq!(doc.file_name(), "Translated_Notes.pdf");
        assert_eq!(doc.mime_type(), "application/pdf");
    }
}
