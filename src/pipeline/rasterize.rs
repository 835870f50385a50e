//! HTML → PDF rasterisation.
//!
//! The render stage drives the [`HtmlRasterizer`] port: a complete HTML
//! document goes in as UTF-8 bytes, a PDF byte stream comes out, and an
//! internal error yields no partial output. Tests substitute a counting or
//! failing double; [`PdfEngine`] is the production implementation.
//!
//! ## Layout model
//!
//! The engine is deterministic: no timestamps feed into pagination, no
//! system fonts are consulted. Text is set in the PDF base-14 faces
//! (Helvetica for body, Courier for code), so no font files ship with the
//! crate. Widths for line wrapping come from a small per-character factor
//! table — an approximation, but a stable one, and line breaks land in the
//! same place on every run. Geometry and colour both come from the
//! [`StyleSheet`], the same struct the CSS template interpolates.

use printpdf::path::PaintMode;
use printpdf::*;
use tracing::debug;

use crate::config::{StyleSheet, Tint};
use crate::error::RenderError;
use crate::pipeline::html::{parse_blocks, Block, Span, SpanStyle};

/// The rasterisation port: complete HTML document bytes in, PDF bytes out.
pub trait HtmlRasterizer: Send + Sync {
    fn rasterize(&self, html: &[u8]) -> Result<Vec<u8>, RenderError>;
}

/// Production rasteriser built on printpdf.
pub struct PdfEngine {
    style: StyleSheet,
}

impl PdfEngine {
    pub fn new(style: StyleSheet) -> Self {
        Self { style }
    }
}

impl Default for PdfEngine {
    fn default() -> Self {
        Self::new(StyleSheet::default())
    }
}

impl HtmlRasterizer for PdfEngine {
    fn rasterize(&self, html: &[u8]) -> Result<Vec<u8>, RenderError> {
        let text = std::str::from_utf8(html).map_err(|e| RenderError::Rasterisation {
            detail: format!("document is not valid UTF-8: {e}"),
        })?;

        let blocks = parse_blocks(text);
        debug!("Laying out {} blocks", blocks.len());

        let mut layout = Layout::new(&self.style)?;
        for block in &blocks {
            layout.place(block);
        }
        layout.finish()
    }
}

// ── Measurement ──────────────────────────────────────────────────────────

const PT_TO_MM: f64 = 0.352_778;
const PX_TO_MM: f64 = 0.264_583;

/// Approximate advance width of one character, as a fraction of the font
/// size. Courier is exactly 0.6 em; the Helvetica factors are rounded AFM
/// buckets, close enough for stable greedy wrapping.
fn char_factor(c: char, style: SpanStyle) -> f64 {
    if style.code {
        return 0.6;
    }
    let base = match c {
        'i' | 'l' | 'j' | '!' | '|' | '\'' | '.' | ',' | ':' | ';' => 0.28,
        'f' | 't' | 'r' | 'I' | '(' | ')' | '[' | ']' | '-' | ' ' => 0.35,
        'm' | 'w' | '@' => 0.85,
        'M' | 'W' => 0.94,
        c if c.is_ascii_uppercase() => 0.70,
        c if c.is_ascii_digit() => 0.56,
        _ => 0.54,
    };
    if style.bold {
        base * 1.06
    } else {
        base
    }
}

fn text_width_mm(text: &str, size_pt: f64, style: SpanStyle) -> f64 {
    text.chars().map(|c| char_factor(c, style)).sum::<f64>() * size_pt * PT_TO_MM
}

// ── Line building ────────────────────────────────────────────────────────

/// A measured run of uniformly styled text within one laid-out line.
#[derive(Debug, Clone)]
struct Frag {
    text: String,
    style: SpanStyle,
    width_mm: f64,
}

type Line = Vec<Frag>;

fn line_width(line: &Line) -> f64 {
    line.iter().map(|f| f.width_mm).sum()
}

/// Split into wrap units: each non-space run keeps its trailing spaces.
fn split_words(s: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut in_space = false;
    for (i, c) in s.char_indices() {
        let is_space = c == ' ';
        if in_space && !is_space {
            out.push(&s[start..i]);
            start = i;
        }
        in_space = is_space;
    }
    if start < s.len() {
        out.push(&s[start..]);
    }
    out
}

/// Longest prefix of `text` that fits within `max_mm`, in bytes (≥ 1 char).
fn fit_prefix(text: &str, size_pt: f64, style: SpanStyle, max_mm: f64) -> usize {
    let mut width = 0.0;
    for (i, c) in text.char_indices() {
        width += char_factor(c, style) * size_pt * PT_TO_MM;
        if width > max_mm && i > 0 {
            return i;
        }
    }
    text.len()
}

/// Greedy word wrap of styled spans into lines of at most `max_mm`.
/// `\n` inside a span forces a break.
fn wrap_spans(spans: &[Span], size_pt: f64, max_mm: f64) -> Vec<Line> {
    let mut lines: Vec<Line> = Vec::new();
    let mut current: Line = Vec::new();
    let mut width = 0.0;

    let mut push_frag = |current: &mut Line, text: &str, style: SpanStyle, w: f64| {
        match current.last_mut() {
            Some(last) if last.style == style => {
                last.text.push_str(text);
                last.width_mm += w;
            }
            _ => current.push(Frag {
                text: text.to_string(),
                style,
                width_mm: w,
            }),
        }
    };

    for span in spans {
        for (i, segment) in span.text.split('\n').enumerate() {
            if i > 0 {
                lines.push(std::mem::take(&mut current));
                width = 0.0;
            }
            for word in split_words(segment) {
                let mut word = word;
                let mut w = text_width_mm(word, size_pt, span.style);
                if width + w > max_mm && width > 0.0 {
                    lines.push(std::mem::take(&mut current));
                    width = 0.0;
                    word = word.trim_start();
                    w = text_width_mm(word, size_pt, span.style);
                }
                // A single word wider than the column is hard-split.
                while w > max_mm && width == 0.0 {
                    let cut = fit_prefix(word, size_pt, span.style, max_mm);
                    let (head, tail) = word.split_at(cut);
                    if tail.is_empty() {
                        break;
                    }
                    push_frag(
                        &mut current,
                        head,
                        span.style,
                        text_width_mm(head, size_pt, span.style),
                    );
                    lines.push(std::mem::take(&mut current));
                    word = tail;
                    w = text_width_mm(word, size_pt, span.style);
                }
                if !word.is_empty() {
                    push_frag(&mut current, word, span.style, w);
                    width += w;
                }
            }
        }
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

// ── Layout engine ────────────────────────────────────────────────────────

struct Faces {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    italic: IndirectFontRef,
    bold_italic: IndirectFontRef,
    mono: IndirectFontRef,
}

impl Faces {
    fn pick(&self, style: SpanStyle) -> &IndirectFontRef {
        if style.code {
            &self.mono
        } else {
            match (style.bold, style.italic) {
                (true, true) => &self.bold_italic,
                (true, false) => &self.bold,
                (false, true) => &self.italic,
                (false, false) => &self.regular,
            }
        }
    }
}

struct Layout<'a> {
    style: &'a StyleSheet,
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    faces: Faces,
    /// Distance from the page bottom to the top of the next line.
    cursor: f64,
}

impl<'a> Layout<'a> {
    fn new(style: &'a StyleSheet) -> Result<Self, RenderError> {
        let (doc, page, layer) = PdfDocument::new(
            "Translated Notes",
            Mm(style.page_width_mm),
            Mm(style.page_height_mm),
            "Layer 1",
        );
        let err = |e: printpdf::Error| RenderError::Rasterisation {
            detail: e.to_string(),
        };
        let faces = Faces {
            regular: doc.add_builtin_font(BuiltinFont::Helvetica).map_err(err)?,
            bold: doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(err)?,
            italic: doc
                .add_builtin_font(BuiltinFont::HelveticaOblique)
                .map_err(err)?,
            bold_italic: doc
                .add_builtin_font(BuiltinFont::HelveticaBoldOblique)
                .map_err(err)?,
            mono: doc.add_builtin_font(BuiltinFont::Courier).map_err(err)?,
        };
        let layer = doc.get_page(page).get_layer(layer);
        let cursor = style.page_height_mm - style.margin_mm;

        Ok(Self {
            style,
            doc,
            layer,
            faces,
            cursor,
        })
    }

    fn finish(self) -> Result<Vec<u8>, RenderError> {
        self.doc
            .save_to_bytes()
            .map_err(|e| RenderError::Rasterisation {
                detail: e.to_string(),
            })
    }

    // ── Geometry helpers ─────────────────────────────────────────────

    fn content_width(&self) -> f64 {
        self.style.content_width_mm()
    }

    fn line_advance(&self, size_pt: f64) -> f64 {
        size_pt * self.style.line_height * PT_TO_MM
    }

    /// Vertical capacity of an empty page.
    fn capacity(&self) -> f64 {
        self.style.page_height_mm - 2.0 * self.style.margin_mm
    }

    fn new_page(&mut self) {
        let (page, layer) = self.doc.add_page(
            Mm(self.style.page_width_mm),
            Mm(self.style.page_height_mm),
            "Layer 1",
        );
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.cursor = self.style.page_height_mm - self.style.margin_mm;
    }

    /// Start a new page unless `needed` millimetres still fit on this one.
    fn ensure_room(&mut self, needed: f64) {
        let needed = needed.min(self.capacity());
        if self.cursor - needed < self.style.margin_mm {
            self.new_page();
        }
    }

    fn set_fill(&self, tint: Tint) {
        self.layer.set_fill_color(Color::Rgb(Rgb::new(
            tint.r as _,
            tint.g as _,
            tint.b as _,
            None,
        )));
    }

    fn fill_rect(&self, x: f64, y: f64, w: f64, h: f64, tint: Tint) {
        self.set_fill(tint);
        let rect = Rect::new(Mm(x), Mm(y), Mm(x + w), Mm(y + h)).with_mode(PaintMode::Fill);
        self.layer.add_rect(rect);
    }

    /// Draw one wrapped line with its baseline derived from the cursor and
    /// advance the cursor. Does not paginate; callers call `ensure_room`.
    fn draw_line(&mut self, line: &Line, size_pt: f64, color: Tint, x: f64, center: bool) {
        let advance = self.line_advance(size_pt);
        let size_mm = size_pt * PT_TO_MM;
        let baseline = self.cursor - 0.78 * advance;
        let mut x = if center {
            x + (self.content_width() - line_width(line)).max(0.0) / 2.0
        } else {
            x
        };

        for frag in line {
            if frag.style.code {
                self.fill_rect(
                    x - 0.3,
                    baseline - 0.28 * size_mm,
                    frag.width_mm + 0.6,
                    1.25 * size_mm,
                    self.style.code_bg,
                );
            }
            self.set_fill(color);
            self.layer.use_text(
                frag.text.clone(),
                size_pt as _,
                Mm(x),
                Mm(baseline),
                self.faces.pick(frag.style),
            );
            x += frag.width_mm;
        }
        self.cursor -= advance;
    }

    /// Draw wrapped lines with per-line pagination.
    fn draw_lines(&mut self, lines: &[Line], size_pt: f64, color: Tint, x: f64, center: bool) {
        for line in lines {
            self.ensure_room(self.line_advance(size_pt));
            self.draw_line(line, size_pt, color, x, center);
        }
    }

    fn gap(&mut self, mm: f64) {
        // Inter-block spacing never starts a fresh page on its own.
        self.cursor = (self.cursor - mm).max(self.style.margin_mm);
    }

    // ── Blocks ───────────────────────────────────────────────────────

    fn place(&mut self, block: &Block) {
        match block {
            Block::Heading { level, spans } => self.heading(*level, spans),
            Block::Paragraph(spans) => self.paragraph(spans),
            Block::ListItem {
                depth,
                marker,
                spans,
            } => self.list_item(*depth, marker, spans),
            Block::Quote(spans) => self.quote(spans),
            Block::CodeBlock(lines) => self.code_block(lines),
            Block::TableRow { header, cells } => self.table_row(*header, cells),
            Block::Rule => self.rule(),
        }
    }

    fn embolden(spans: &[Span]) -> Vec<Span> {
        spans
            .iter()
            .cloned()
            .map(|mut s| {
                s.style.bold = true;
                s
            })
            .collect()
    }

    fn heading(&mut self, level: u8, spans: &[Span]) {
        let base = self.style.body_size_pt;
        match level {
            1 => self.banner_heading(spans),
            2 => {
                let size = base * 1.5;
                let lines = wrap_spans(&Self::embolden(spans), size, self.content_width());
                self.gap(20.0 * PX_TO_MM);
                self.ensure_room(lines.len() as f64 * self.line_advance(size) + 2.0);
                self.draw_lines(&lines, size, self.style.h2_color, self.style.margin_mm, false);
                // Bottom border, per the 2px solid rule.
                self.fill_rect(
                    self.style.margin_mm,
                    self.cursor - 0.2,
                    self.content_width(),
                    2.0 * PX_TO_MM,
                    self.style.h2_border,
                );
                self.gap(5.0 * PX_TO_MM + 2.0);
            }
            3 => {
                let size = base * 1.17;
                let lines = wrap_spans(&Self::embolden(spans), size, self.content_width());
                self.gap(15.0 * PX_TO_MM);
                self.draw_lines(&lines, size, self.style.h3_color, self.style.margin_mm, false);
                self.gap(1.5);
            }
            _ => {
                let lines = wrap_spans(&Self::embolden(spans), base, self.content_width());
                self.gap(2.5);
                self.draw_lines(&lines, base, self.style.body_color, self.style.margin_mm, false);
                self.gap(1.5);
            }
        }
    }

    /// H1: white text centred on the dark banner.
    fn banner_heading(&mut self, spans: &[Span]) {
        let size = self.style.body_size_pt * 2.0;
        let pad = 15.0 * PX_TO_MM;
        let lines = wrap_spans(&Self::embolden(spans), size, self.content_width() - 2.0 * pad);
        let banner_h = lines.len() as f64 * self.line_advance(size) + 2.0 * pad;

        self.ensure_room(banner_h);
        self.fill_rect(
            self.style.margin_mm,
            self.cursor - banner_h,
            self.content_width(),
            banner_h,
            self.style.h1_banner,
        );

        self.cursor -= pad;
        for line in &lines {
            self.draw_line(line, size, self.style.h1_color, self.style.margin_mm, true);
        }
        self.cursor -= pad;
        self.gap(4.0);
    }

    fn paragraph(&mut self, spans: &[Span]) {
        let size = self.style.body_size_pt;
        let lines = wrap_spans(spans, size, self.content_width());
        self.draw_lines(&lines, size, self.style.body_color, self.style.margin_mm, false);
        self.gap(2.2);
    }

    fn list_item(&mut self, depth: usize, marker: &str, spans: &[Span]) {
        let size = self.style.body_size_pt;
        // 20px list padding plus 6mm per nesting level of hanging indent.
        let indent = self.style.margin_mm + 20.0 * PX_TO_MM + depth as f64 * 6.0;
        let text_x = indent + 4.5;
        let lines = wrap_spans(spans, size, self.content_width() - (text_x - self.style.margin_mm));

        self.ensure_room(self.line_advance(size));
        if !marker.is_empty() {
            let marker_line: Line = vec![Frag {
                text: marker.to_string(),
                style: SpanStyle::default(),
                width_mm: text_width_mm(marker, size, SpanStyle::default()),
            }];
            // Draw marker without advancing, then the first line of text.
            let saved = self.cursor;
            self.draw_line(&marker_line, size, self.style.body_color, indent, false);
            self.cursor = saved;
        }
        self.draw_lines(&lines, size, self.style.body_color, text_x, false);
        self.gap(6.0 * PX_TO_MM);
    }

    fn quote(&mut self, spans: &[Span]) {
        let size = self.style.body_size_pt;
        let pad = 10.0 * PX_TO_MM;
        let accent_w = 4.0 * PX_TO_MM;
        let text_x = self.style.margin_mm + accent_w + pad;
        let lines = wrap_spans(spans, size, self.content_width() - accent_w - 2.0 * pad);
        let quote_h = lines.len() as f64 * self.line_advance(size) + 2.0 * pad;

        self.gap(2.0);
        self.ensure_room(quote_h);
        self.fill_rect(
            self.style.margin_mm,
            self.cursor - quote_h,
            self.content_width(),
            quote_h,
            self.style.quote_bg,
        );
        self.fill_rect(
            self.style.margin_mm,
            self.cursor - quote_h,
            accent_w,
            quote_h,
            self.style.quote_border,
        );

        self.cursor -= pad;
        for line in &lines {
            self.draw_line(line, size, self.style.body_color, text_x, false);
        }
        self.cursor -= pad;
        self.gap(2.0);
    }

    fn code_block(&mut self, raw_lines: &[String]) {
        let size = self.style.body_size_pt;
        let style = SpanStyle {
            code: true,
            ..SpanStyle::default()
        };
        let pad = 1.5;
        let advance = self.line_advance(size);

        self.gap(2.0);
        for raw in raw_lines {
            self.ensure_room(advance);
            self.fill_rect(
                self.style.margin_mm,
                self.cursor - advance,
                self.content_width(),
                advance,
                self.style.code_bg,
            );
            let spans = [Span {
                text: raw.clone(),
                style,
            }];
            let lines = wrap_spans(&spans, size, self.content_width() - 2.0 * pad);
            // Overlong code lines wrap; each continuation gets its own band.
            for (i, line) in lines.iter().enumerate() {
                if i > 0 {
                    self.ensure_room(advance);
                    self.fill_rect(
                        self.style.margin_mm,
                        self.cursor - advance,
                        self.content_width(),
                        advance,
                        self.style.code_bg,
                    );
                }
                // The band above doubles as the inline-code background.
                let stripped: Line = line
                    .iter()
                    .map(|f| Frag {
                        style: SpanStyle {
                            code: false,
                            ..f.style
                        },
                        ..f.clone()
                    })
                    .collect();
                let mut x = self.style.margin_mm + pad;
                let baseline = self.cursor - 0.78 * advance;
                self.set_fill(self.style.body_color);
                for frag in &stripped {
                    self.layer.use_text(
                        frag.text.clone(),
                        size as _,
                        Mm(x),
                        Mm(baseline),
                        &self.faces.mono,
                    );
                    x += frag.width_mm;
                }
                self.cursor -= advance;
            }
        }
        self.gap(2.0);
    }

    fn table_row(&mut self, header: bool, cells: &[Vec<Span>]) {
        if cells.is_empty() {
            return;
        }
        let size = self.style.body_size_pt;
        let cols = cells.len();
        let col_w = self.content_width() / cols as f64;
        let advance = self.line_advance(size);

        let wrapped: Vec<Vec<Line>> = cells
            .iter()
            .map(|cell| {
                let cell = if header {
                    Self::embolden(cell)
                } else {
                    cell.clone()
                };
                wrap_spans(&cell, size, col_w - 2.0)
            })
            .collect();
        let row_lines = wrapped.iter().map(|c| c.len()).max().unwrap_or(1);
        let row_h = row_lines as f64 * advance + 0.8;

        self.ensure_room(row_h);
        let top = self.cursor;
        for (col, cell_lines) in wrapped.iter().enumerate() {
            self.cursor = top;
            let x = self.style.margin_mm + col as f64 * col_w;
            for line in cell_lines {
                self.draw_line(line, size, self.style.body_color, x, false);
            }
        }
        self.cursor = top - row_h;

        if header {
            self.fill_rect(
                self.style.margin_mm,
                self.cursor,
                self.content_width(),
                0.3,
                self.style.h2_border,
            );
            self.gap(0.8);
        }
    }

    fn rule(&mut self) {
        self.gap(2.5);
        self.ensure_room(1.0);
        self.fill_rect(
            self.style.margin_mm,
            self.cursor - 0.4,
            self.content_width(),
            0.4,
            self.style.quote_border,
        );
        self.gap(2.5);
    }
}
