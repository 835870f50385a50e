//! The instructional prompt sent with every translation request.
//!
//! Centralising the prompt here serves two purposes:
//!
//! 1. **Single source of truth** — changing how the model is instructed to
//!    read, translate, or format requires editing exactly one place.
//!
//! 2. **Testability** — unit tests can inspect the prompt directly without
//!    spinning up a real model, making prompt regressions easy to catch.
//!
//! Callers can override the default via
//! [`crate::config::TranslationConfig::prompt`]; the constant here is used
//! only when no override is provided.

/// Default prompt for translating a handwritten-notes PDF into English markdown.
///
/// Used when `TranslationConfig::prompt` is `None`.
pub const DEFAULT_TRANSLATION_PROMPT: &str = r#"You are an expert translator. The document contains handwritten notes (likely in Gujarati).

1. READ
   - Read the handwriting carefully, page by page.

2. TRANSLATE
   - Translate the content directly into English.
   - Do NOT include the original text, only English.

3. FORMAT
   - Start with a Level 1 Header (# Title) for the main topic.
   - Use Level 2 Headers (##) for sub-sections.
   - Use bullet points for lists.
   - Convert diagrams into nested lists.

4. OUTPUT
   - Output ONLY the Markdown content.
   - Do NOT add commentary or explanations."#;
