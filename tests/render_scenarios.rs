//! Rendering scenarios through the public API: markdown in, PDF bytes out.

use notes2pdf::pipeline::render::render;
use notes2pdf::{PdfEngine, RenderError, StyleSheet};

const NOTES: &str = "\
# Lecture Notes

## Thermodynamics

The first law states that energy is conserved.

- Heat flows from hot to cold
- Work can be extracted from a gradient
  - Carnot gives the upper bound

> Entropy never decreases in an isolated system.

| Symbol | Meaning |
| --- | --- |
| Q | heat |
| W | work |
";

fn engine() -> PdfEngine {
    PdfEngine::new(StyleSheet::default())
}

/// Count pages by scanning for page objects in the uncompressed body.
fn count_pages(pdf: &[u8]) -> usize {
    let text = String::from_utf8_lossy(pdf);
    text.match_indices("/Type /Page")
        .filter(|(i, _)| text[i + "/Type /Page".len()..].chars().next() != Some('s'))
        .count()
}

#[test]
fn short_notes_fit_on_one_page() {
    let engine = engine();
    let doc = render(NOTES, &StyleSheet::default(), &engine).expect("render succeeds");
    assert!(doc.bytes().starts_with(b"%PDF"));
    assert_eq!(count_pages(doc.bytes()), 1);
}

#[test]
fn long_notes_paginate() {
    let engine = engine();
    let mut markdown = String::from("# Long Notes\n\n");
    for i in 0..120 {
        markdown.push_str(&format!("Paragraph number {i} with enough words to wrap.\n\n"));
    }
    let doc = render(&markdown, &StyleSheet::default(), &engine).expect("render succeeds");
    assert!(count_pages(doc.bytes()) > 1);
}

#[test]
fn empty_markdown_is_rejected_before_layout() {
    let engine = engine();
    let err = render("   \n\t  ", &StyleSheet::default(), &engine).expect_err("must fail");
    assert!(matches!(err, RenderError::EmptyMarkdown));
}

#[test]
fn rendering_is_deterministic_for_equal_input() {
    let engine = engine();
    let a = render(NOTES, &StyleSheet::default(), &engine).expect("first render");
    let b = render(NOTES, &StyleSheet::default(), &engine).expect("second render");
    assert_eq!(count_pages(a.bytes()), count_pages(b.bytes()));
    assert_eq!(a.bytes().len(), b.bytes().len());
}
