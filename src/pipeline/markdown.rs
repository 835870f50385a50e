//! Markdown → styled HTML document.
//!
//! Two steps, both pure functions:
//!
//! 1. [`to_html_fragment`] converts the model's markdown to an HTML body
//!    using pulldown-cmark with the permissive extensions (tables, fenced
//!    code, definition lists, strikethrough) plus nl2br: handwriting
//!    transcriptions often use single newlines as visual line breaks, so
//!    soft breaks are promoted to hard `<br>` breaks.
//!
//! 2. [`wrap_document`] embeds the fragment in the fixed document template.
//!    The template interpolates [`StyleSheet`] values rather than hard-coded
//!    CSS so the rasteriser and the stylesheet can never drift apart.

use pulldown_cmark::{html, Event, Options, Parser};

use crate::config::StyleSheet;

/// Convert markdown text to an HTML fragment.
pub fn to_html_fragment(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_DEFINITION_LIST);

    // nl2br: a lone newline inside a paragraph becomes a visible line break.
    let parser = Parser::new_ext(markdown, options).map(|event| match event {
        Event::SoftBreak => Event::HardBreak,
        other => other,
    });

    let mut body = String::new();
    html::push_html(&mut body, parser);
    body
}

/// Wrap an HTML fragment in the complete styled document.
pub fn wrap_document(body_html: &str, style: &StyleSheet) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <style>
        @page {{ size: {page_w}mm {page_h}mm; margin: {margin}mm; }}
        body {{ font-family: {body_font}; font-size: {body_size}pt; line-height: {line_height}; color: {body_color}; }}
        h1 {{ color: {h1_color}; background-color: {h1_banner}; padding: 15px; text-align: center; }}
        h2 {{ color: {h2_color}; border-bottom: 2px solid {h2_border}; padding-bottom: 5px; margin-top: 20px; }}
        h3 {{ color: {h3_color}; font-weight: bold; margin-top: 15px; }}
        ul, ol {{ margin-bottom: 12px; padding-left: 20px; }}
        li {{ margin-bottom: 6px; }}
        blockquote {{ background-color: {quote_bg}; border-left: 4px solid {quote_border}; margin: 15px 0; padding: 10px; font-style: italic; }}
        code {{ background-color: {code_bg}; padding: 2px 4px; font-family: Courier; }}
    </style>
</head>
<body>
{body_html}
</body>
</html>
"#,
        page_w = style.page_width_mm,
        page_h = style.page_height_mm,
        margin = style.margin_mm,
        body_font = style.body_font,
        body_size = style.body_size_pt,
        line_height = style.line_height,
        body_color = style.body_color.to_css(),
        h1_color = style.h1_color.to_css(),
        h1_banner = style.h1_banner.to_css(),
        h2_color = style.h2_color.to_css(),
        h2_border = style.h2_border.to_css(),
        h3_color = style.h3_color.to_css(),
        quote_bg = style.quote_bg.to_css(),
        quote_border = style.quote_border.to_css(),
        code_bg = style.code_bg.to_css(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headings_and_lists_convert() {
        let html = to_html_fragment("# Title\n\n## Section\n\n- item one\n- item two");
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<h2>Section</h2>"));
        assert!(html.contains("<li>item one</li>"));
        assert!(html.contains("<li>item two</li>"));
    }

    #[test]
    fn single_newline_becomes_line_break() {
        let html = to_html_fragment("line one\nline two");
        assert!(html.contains("<br"), "nl2br must promote soft breaks: {html}");
    }

    #[test]
    fn tables_are_enabled() {
        let html = to_html_fragment("| a | b |\n| --- | --- |\n| 1 | 2 |");
        assert!(html.contains("<table>"));
        assert!(html.contains("<td>1</td>"));
    }

    #[test]
    fn raw_angle_brackets_are_escaped() {
        let html = to_html_fragment("value `a < b` holds");
        assert!(html.contains("a &lt; b"));
    }

    #[test]
    fn template_interpolates_stylesheet() {
        let style = StyleSheet::default();
        let doc = wrap_document("<p>hi</p>", &style);
        assert!(doc.starts_with("<!DOCTYPE html>"));
        assert!(doc.contains("size: 210mm 297mm; margin: 20mm"));
        assert!(doc.contains("font-size: 11pt"));
        assert!(doc.contains("background-color: #2c3e50"));
        assert!(doc.contains("color: #2980b9"));
        assert!(doc.contains("color: #16a085"));
        assert!(doc.contains("border-left: 4px solid #bdc3c7"));
        assert!(doc.contains("<p>hi</p>"));
    }
}
