//! Minimal HTML reader for the rasteriser.
//!
//! The rasteriser consumes complete HTML documents produced by
//! [`crate::pipeline::markdown`], so the element vocabulary is closed:
//! pulldown-cmark emits headings, paragraphs, lists, blockquotes, pre/code,
//! tables, rules, and the inline emphasis tags. This module flattens that
//! markup into a sequence of styled [`Block`]s the layout engine can place,
//! decoding entities with the `html-escape` crate. Unknown tags are skipped
//! rather than rejected, matching the permissive contract of the pipeline.
//!
//! This is deliberately not a general HTML parser — no error recovery for
//! misnested tags, no scripting, no CSS cascade. The stylesheet is applied
//! by the layout engine from [`crate::config::StyleSheet`], not parsed from
//! the `<style>` element (which is skipped entirely).

/// Inline styling flags carried by a run of text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpanStyle {
    pub bold: bool,
    pub italic: bool,
    pub code: bool,
}

/// A run of text with uniform inline styling. `\n` inside the text is a
/// forced line break (from `<br>`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub style: SpanStyle,
}

/// One block-level element, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading { level: u8, spans: Vec<Span> },
    Paragraph(Vec<Span>),
    ListItem { depth: usize, marker: String, spans: Vec<Span> },
    Quote(Vec<Span>),
    CodeBlock(Vec<String>),
    TableRow { header: bool, cells: Vec<Vec<Span>> },
    Rule,
}

#[derive(Debug, Clone, Copy)]
struct ListContext {
    ordered: bool,
    next_index: u32,
}

/// Where accumulated text currently belongs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Idle,
    Heading(u8),
    Paragraph,
    ListItem,
    Quote,
    Pre,
    Cell,
    Skip, // inside <style> / <head>
}

struct Reader {
    blocks: Vec<Block>,
    mode: Mode,
    spans: Vec<Span>,
    bold: u32,
    italic: u32,
    code: u32,
    in_quote: bool,
    lists: Vec<ListContext>,
    item_marker: String,
    item_depth: usize,
    pre_text: String,
    row_cells: Vec<Vec<Span>>,
    row_is_header: bool,
}

/// Parse the `<body>` of a generated document (or a bare fragment) into blocks.
pub fn parse_blocks(html: &str) -> Vec<Block> {
    let body = match (html.find("<body>"), html.find("</body>")) {
        (Some(start), Some(end)) if start + 6 <= end => &html[start + 6..end],
        _ => html,
    };

    let mut reader = Reader {
        blocks: Vec::new(),
        mode: Mode::Idle,
        spans: Vec::new(),
        bold: 0,
        italic: 0,
        code: 0,
        in_quote: false,
        lists: Vec::new(),
        item_marker: String::new(),
        item_depth: 0,
        pre_text: String::new(),
        row_cells: Vec::new(),
        row_is_header: false,
    };

    let mut rest = body;
    while let Some(lt) = rest.find('<') {
        let (text, tail) = rest.split_at(lt);
        reader.text(text);
        match tail.find('>') {
            Some(gt) => {
                reader.tag(&tail[1..gt]);
                rest = &tail[gt + 1..];
            }
            None => {
                // Unterminated tag: treat the remainder as text and stop.
                reader.text(tail);
                rest = "";
            }
        }
    }
    reader.text(rest);
    reader.flush();
    reader.blocks
}

impl Reader {
    fn style(&self) -> SpanStyle {
        SpanStyle {
            bold: self.bold > 0,
            italic: self.italic > 0 || self.in_quote,
            code: self.code > 0,
        }
    }

    fn text(&mut self, raw: &str) {
        if raw.is_empty() {
            return;
        }
        if self.mode == Mode::Pre {
            self.pre_text
                .push_str(&html_escape::decode_html_entities(raw));
            return;
        }
        if self.mode == Mode::Idle || self.mode == Mode::Skip {
            // Whitespace between blocks carries no content.
            return;
        }
        let decoded = html_escape::decode_html_entities(raw).replace('\n', " ");
        if decoded.trim().is_empty() && self.spans.is_empty() {
            return;
        }
        let style = self.style();
        match self.spans.last_mut() {
            Some(last) if last.style == style => last.text.push_str(&decoded),
            _ => self.spans.push(Span {
                text: decoded,
                style,
            }),
        }
    }

    fn push_break(&mut self) {
        if matches!(self.mode, Mode::Idle | Mode::Skip | Mode::Pre) {
            return;
        }
        let style = self.style();
        self.spans.push(Span {
            text: "\n".to_string(),
            style,
        });
    }

    /// Close whatever block is being accumulated.
    fn flush(&mut self) {
        let spans = std::mem::take(&mut self.spans);
        let spans = trim_spans(spans);
        match self.mode {
            Mode::Heading(level) => {
                if !spans.is_empty() {
                    self.blocks.push(Block::Heading { level, spans });
                }
            }
            Mode::Paragraph => {
                if !spans.is_empty() {
                    self.blocks.push(Block::Paragraph(spans));
                }
            }
            Mode::ListItem => {
                if !spans.is_empty() {
                    self.blocks.push(Block::ListItem {
                        depth: self.item_depth,
                        marker: self.item_marker.clone(),
                        spans,
                    });
                }
            }
            Mode::Quote => {
                if !spans.is_empty() {
                    self.blocks.push(Block::Quote(spans));
                }
            }
            Mode::Cell => {
                self.row_cells.push(spans);
            }
            Mode::Pre | Mode::Idle | Mode::Skip => {}
        }
        if self.mode != Mode::Skip {
            self.mode = Mode::Idle;
        }
    }

    fn begin_list_item(&mut self) {
        self.flush();
        let depth = self.lists.len().saturating_sub(1);
        let marker = match self.lists.last_mut() {
            Some(ctx) if ctx.ordered => {
                let m = format!("{}.", ctx.next_index);
                ctx.next_index += 1;
                m
            }
            _ => "\u{2022}".to_string(),
        };
        self.item_depth = depth;
        self.item_marker = marker;
        self.mode = Mode::ListItem;
    }

    fn tag(&mut self, raw: &str) {
        let raw = raw.trim().trim_end_matches('/').trim();
        let (name, attrs) = match raw.split_once(char::is_whitespace) {
            Some((n, a)) => (n, a),
            None => (raw, ""),
        };
        let name = name.to_ascii_lowercase();

        match name.as_str() {
            "style" | "head" | "script" => {
                self.flush();
                self.mode = Mode::Skip;
            }
            "/style" | "/head" | "/script" => self.mode = Mode::Idle,

            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                self.flush();
                let level = name.as_bytes()[1] - b'0';
                self.mode = Mode::Heading(level);
            }
            "/h1" | "/h2" | "/h3" | "/h4" | "/h5" | "/h6" => self.flush(),

            "p" => {
                self.flush();
                self.mode = if self.in_quote {
                    Mode::Quote
                } else {
                    Mode::Paragraph
                };
            }
            "/p" => self.flush(),

            "ul" | "ol" => {
                self.flush();
                let ordered = name == "ol";
                let next_index = attr_value(attrs, "start")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(1);
                self.lists.push(ListContext {
                    ordered,
                    next_index,
                });
            }
            "/ul" | "/ol" => {
                self.flush();
                self.lists.pop();
            }
            "li" => self.begin_list_item(),
            "/li" => self.flush(),

            // Definition lists: terms as bold paragraphs, details indented.
            "dt" => {
                self.flush();
                self.mode = Mode::Paragraph;
                self.bold += 1;
            }
            "/dt" => {
                self.flush();
                self.bold = self.bold.saturating_sub(1);
            }
            "dd" => {
                self.flush();
                self.item_depth = 0;
                self.item_marker = String::new();
                self.mode = Mode::ListItem;
            }
            "/dd" => self.flush(),

            "blockquote" => {
                self.flush();
                self.in_quote = true;
                self.mode = Mode::Quote;
            }
            "/blockquote" => {
                self.flush();
                self.in_quote = false;
            }

            "pre" => {
                self.flush();
                self.mode = Mode::Pre;
                self.pre_text.clear();
            }
            "/pre" => {
                let text = std::mem::take(&mut self.pre_text);
                let lines: Vec<String> = text
                    .trim_end_matches('\n')
                    .trim_start_matches('\n')
                    .lines()
                    .map(|l| l.to_string())
                    .collect();
                self.blocks.push(Block::CodeBlock(lines));
                self.mode = Mode::Idle;
            }

            "code" => {
                if self.mode != Mode::Pre {
                    self.code += 1;
                }
            }
            "/code" => {
                if self.mode != Mode::Pre {
                    self.code = self.code.saturating_sub(1);
                }
            }
            "strong" | "b" => self.bold += 1,
            "/strong" | "/b" => self.bold = self.bold.saturating_sub(1),
            "em" | "i" => self.italic += 1,
            "/em" | "/i" => self.italic = self.italic.saturating_sub(1),

            "br" => self.push_break(),
            "hr" => {
                self.flush();
                self.blocks.push(Block::Rule);
            }

            "table" | "/table" | "thead" | "/thead" | "tbody" | "/tbody" => self.flush(),
            "tr" => {
                self.flush();
                self.row_cells.clear();
                self.row_is_header = false;
            }
            "/tr" => {
                self.flush();
                if !self.row_cells.is_empty() {
                    self.blocks.push(Block::TableRow {
                        header: self.row_is_header,
                        cells: std::mem::take(&mut self.row_cells),
                    });
                }
            }
            "th" | "td" => {
                self.flush();
                if name == "th" {
                    self.row_is_header = true;
                }
                self.mode = Mode::Cell;
            }
            "/th" | "/td" => self.flush(),

            // Links, strikethrough, images and anything else: keep inner
            // text, ignore the tag itself.
            _ => {}
        }
    }
}

/// Trim outer whitespace and drop spans that ended up empty.
fn trim_spans(mut spans: Vec<Span>) -> Vec<Span> {
    if let Some(first) = spans.first_mut() {
        first.text = first.text.trim_start().to_string();
    }
    if let Some(last) = spans.last_mut() {
        last.text = last.text.trim_end().to_string();
    }
    spans.retain(|s| !s.text.is_empty());
    spans
}

fn attr_value<'a>(attrs: &'a str, key: &str) -> Option<&'a str> {
    let idx = attrs.find(key)?;
    let rest = &attrs[idx + key.len()..];
    let rest = rest.strip_prefix('=')?;
    let rest = rest.trim_start_matches('"');
    let end = rest.find('"').unwrap_or(rest.len());
    Some(&rest[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::markdown::to_html_fragment;

    fn plain(spans: &[Span]) -> String {
        spans.iter().map(|s| s.text.as_str()).collect()
    }

    #[test]
    fn heading_paragraph_and_list() {
        let html = to_html_fragment("# Title\n\n## Section\n\n- item one\n- item two\n\ntail");
        let blocks = parse_blocks(&html);

        assert!(matches!(&blocks[0], Block::Heading { level: 1, spans } if plain(spans) == "Title"));
        assert!(matches!(&blocks[1], Block::Heading { level: 2, spans } if plain(spans) == "Section"));
        assert!(
            matches!(&blocks[2], Block::ListItem { depth: 0, marker, spans } if marker == "\u{2022}" && plain(spans) == "item one")
        );
        assert!(
            matches!(&blocks[3], Block::ListItem { spans, .. } if plain(spans) == "item two")
        );
        assert!(matches!(&blocks[4], Block::Paragraph(spans) if plain(spans) == "tail"));
    }

    #[test]
    fn ordered_list_numbering_and_nesting() {
        let html = to_html_fragment("1. first\n2. second\n   - inner");
        let blocks = parse_blocks(&html);

        let markers: Vec<(usize, String)> = blocks
            .iter()
            .filter_map(|b| match b {
                Block::ListItem { depth, marker, .. } => Some((*depth, marker.clone())),
                _ => None,
            })
            .collect();
        assert_eq!(
            markers,
            vec![
                (0, "1.".to_string()),
                (0, "2.".to_string()),
                (1, "\u{2022}".to_string())
            ]
        );
    }

    #[test]
    fn inline_styles_are_tracked() {
        let html = to_html_fragment("mix of **bold** and *italic* and `code` text");
        let blocks = parse_blocks(&html);
        let Block::Paragraph(spans) = &blocks[0] else {
            panic!("expected paragraph, got {:?}", blocks);
        };

        let bold: Vec<_> = spans.iter().filter(|s| s.style.bold).collect();
        assert_eq!(bold.len(), 1);
        assert_eq!(bold[0].text, "bold");
        assert!(spans.iter().any(|s| s.style.italic && s.text == "italic"));
        assert!(spans.iter().any(|s| s.style.code && s.text == "code"));
    }

    #[test]
    fn blockquote_is_italic_quote_block() {
        let html = to_html_fragment("> wise words");
        let blocks = parse_blocks(&html);
        let Block::Quote(spans) = &blocks[0] else {
            panic!("expected quote, got {:?}", blocks);
        };
        assert_eq!(plain(spans), "wise words");
        assert!(spans.iter().all(|s| s.style.italic));
    }

    #[test]
    fn fenced_code_keeps_lines_verbatim() {
        let html = to_html_fragment("```\nlet x = 1;\nlet y = x < 2;\n```");
        let blocks = parse_blocks(&html);
        assert_eq!(
            blocks[0],
            Block::CodeBlock(vec!["let x = 1;".to_string(), "let y = x < 2;".to_string()])
        );
    }

    #[test]
    fn table_rows_with_header() {
        let html = to_html_fragment("| a | b |\n| --- | --- |\n| 1 | 2 |");
        let blocks = parse_blocks(&html);

        let Block::TableRow { header, cells } = &blocks[0] else {
            panic!("expected header row, got {:?}", blocks);
        };
        assert!(*header);
        assert_eq!(cells.len(), 2);
        assert_eq!(plain(&cells[0]), "a");

        let Block::TableRow { header, cells } = &blocks[1] else {
            panic!("expected body row");
        };
        assert!(!*header);
        assert_eq!(plain(&cells[1]), "2");
    }

    #[test]
    fn hard_break_becomes_forced_newline() {
        let html = to_html_fragment("line one\nline two");
        let blocks = parse_blocks(&html);
        let Block::Paragraph(spans) = &blocks[0] else {
            panic!("expected paragraph");
        };
        assert!(plain(spans).contains('\n'));
    }

    #[test]
    fn entities_are_decoded() {
        let blocks = parse_blocks("<p>a &lt; b &amp;&amp; c</p>");
        let Block::Paragraph(spans) = &blocks[0] else {
            panic!("expected paragraph");
        };
        assert_eq!(plain(spans), "a < b && c");
    }

    #[test]
    fn full_document_skips_style_element() {
        let doc = crate::pipeline::markdown::wrap_document(
            "<h1>Title</h1>",
            &crate::config::StyleSheet::default(),
        );
        let blocks = parse_blocks(&doc);
        assert_eq!(blocks.len(), 1);
        assert!(matches!(&blocks[0], Block::Heading { level: 1, .. }));
    }
}
