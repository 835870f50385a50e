//! Configuration types for note translation.
//!
//! All pipeline behaviour is controlled through [`TranslationConfig`], built
//! via its [`TranslationConfigBuilder`]. Keeping every knob in one struct
//! makes it trivial to share a config across calls and to diff two runs to
//! understand why their outputs differ.
//!
//! The fixed prompt and the fixed stylesheet are configuration constants,
//! not runtime-computed state: tests override them here without touching
//! pipeline logic.

use crate::error::Notes2PdfError;

/// Default Gemini model used for reading and translating handwriting.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Default Gemini API base URL. Overridable for tests against a mock server.
pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Configuration for one translation pipeline.
///
/// Built via [`TranslationConfig::builder()`] or [`TranslationConfig::default()`].
///
/// # Example
/// ```rust
/// use notes2pdf::TranslationConfig;
///
/// let config = TranslationConfig::builder()
///     .model("gemini-2.5-flash")
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct TranslationConfig {
    /// Model identifier sent with the generate call. Default: [`DEFAULT_MODEL`].
    pub model: String,

    /// Custom instructional prompt. If None, uses
    /// [`crate::prompts::DEFAULT_TRANSLATION_PROMPT`].
    pub prompt: Option<String>,

    /// Gemini API base URL. Default: [`DEFAULT_API_BASE_URL`].
    ///
    /// Tests point this at a wiremock server; production callers never touch it.
    pub api_base_url: String,

    /// Interval between polls of the uploaded file's state. Default: 500 ms.
    ///
    /// The Files API marks a fresh upload PROCESSING until the backend has
    /// ingested it; a PDF of a few pages is typically ACTIVE on the first poll.
    pub upload_poll_interval_ms: u64,

    /// Maximum number of state polls before giving up. Default: 60.
    ///
    /// This bounds how long one user action can hang on a stuck upload; it is
    /// not a retry policy — the generate call itself is attempted exactly once.
    pub upload_poll_limit: u32,

    /// Stylesheet applied when rendering the translated markdown.
    pub style: StyleSheet,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            prompt: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            upload_poll_interval_ms: 500,
            upload_poll_limit: 60,
            style: StyleSheet::default(),
        }
    }
}

impl TranslationConfig {
    /// Create a new builder for `TranslationConfig`.
    pub fn builder() -> TranslationConfigBuilder {
        TranslationConfigBuilder {
            config: Self::default(),
        }
    }

    /// The prompt that will actually be sent: the override, or the default.
    pub fn effective_prompt(&self) -> &str {
        self.prompt
            .as_deref()
            .unwrap_or(crate::prompts::DEFAULT_TRANSLATION_PROMPT)
    }
}

/// Builder for [`TranslationConfig`].
#[derive(Debug)]
pub struct TranslationConfigBuilder {
    config: TranslationConfig,
}

impl TranslationConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.prompt = Some(prompt.into());
        self
    }

    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        let mut url = url.into();
        while url.ends_with('/') {
            url.pop();
        }
        self.config.api_base_url = url;
        self
    }

    pub fn upload_poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.upload_poll_interval_ms = ms;
        self
    }

    pub fn upload_poll_limit(mut self, n: u32) -> Self {
        self.config.upload_poll_limit = n.max(1);
        self
    }

    pub fn style(mut self, style: StyleSheet) -> Self {
        self.config.style = style;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<TranslationConfig, Notes2PdfError> {
        let c = &self.config;
        if c.model.trim().is_empty() {
            return Err(Notes2PdfError::InvalidConfig(
                "Model identifier must not be empty".into(),
            ));
        }
        if c.api_base_url.trim().is_empty() {
            return Err(Notes2PdfError::InvalidConfig(
                "API base URL must not be empty".into(),
            ));
        }
        self.config.style.validate()?;
        Ok(self.config)
    }
}

// ── Stylesheet ───────────────────────────────────────────────────────────

/// An RGB colour in the 0.0–1.0 range, usable both in the CSS template and
/// by the rasteriser.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tint {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Tint {
    /// Construct from 8-bit channel values.
    pub const fn rgb8(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f64 / 255.0,
            g: g as f64 / 255.0,
            b: b as f64 / 255.0,
        }
    }

    /// `#rrggbb` form for embedding in the CSS template.
    pub fn to_css(self) -> String {
        format!(
            "#{:02x}{:02x}{:02x}",
            (self.r * 255.0).round() as u8,
            (self.g * 255.0).round() as u8,
            (self.b * 255.0).round() as u8
        )
    }
}

/// The fixed document styling applied to every rendered translation.
///
/// Field values mirror the CSS template in [`crate::pipeline::markdown`]:
/// the template interpolates them, and the rasteriser reads the same struct
/// so HTML and PDF agree on geometry and colour.
#[derive(Debug, Clone)]
pub struct StyleSheet {
    /// Physical page width in millimetres. Default: 210 (A4).
    pub page_width_mm: f64,
    /// Physical page height in millimetres. Default: 297 (A4).
    pub page_height_mm: f64,
    /// Uniform page margin in millimetres. Default: 20 (2 cm).
    pub margin_mm: f64,
    /// Body font family declared in the template. The rasteriser maps this to
    /// the closest PDF base-14 face (Helvetica).
    pub body_font: String,
    /// Body font size in points. Default: 11.
    pub body_size_pt: f64,
    /// Body line height multiplier. Default: 1.6.
    pub line_height: f64,
    /// Body text colour (#333).
    pub body_color: Tint,
    /// H1 text colour (white) on the banner.
    pub h1_color: Tint,
    /// H1 banner background (#2c3e50, dark blue-grey).
    pub h1_banner: Tint,
    /// H2 text colour (#2980b9, blue).
    pub h2_color: Tint,
    /// H2 bottom border colour (#ecf0f1).
    pub h2_border: Tint,
    /// H3 text colour (#16a085, teal). Always bold.
    pub h3_color: Tint,
    /// Blockquote background (#f9f9f9).
    pub quote_bg: Tint,
    /// Blockquote left accent border (#bdc3c7).
    pub quote_border: Tint,
    /// Inline/block code background (#f4f4f4).
    pub code_bg: Tint,
}

impl Default for StyleSheet {
    fn default() -> Self {
        Self {
            page_width_mm: 210.0,
            page_height_mm: 297.0,
            margin_mm: 20.0,
            body_font: "Helvetica, sans-serif".to_string(),
            body_size_pt: 11.0,
            line_height: 1.6,
            body_color: Tint::rgb8(0x33, 0x33, 0x33),
            h1_color: Tint::rgb8(0xff, 0xff, 0xff),
            h1_banner: Tint::rgb8(0x2c, 0x3e, 0x50),
            h2_color: Tint::rgb8(0x29, 0x80, 0xb9),
            h2_border: Tint::rgb8(0xec, 0xf0, 0xf1),
            h3_color: Tint::rgb8(0x16, 0xa0, 0x85),
            quote_bg: Tint::rgb8(0xf9, 0xf9, 0xf9),
            quote_border: Tint::rgb8(0xbd, 0xc3, 0xc7),
            code_bg: Tint::rgb8(0xf4, 0xf4, 0xf4),
        }
    }
}

impl StyleSheet {
    /// Usable content width between the margins, in millimetres.
    pub fn content_width_mm(&self) -> f64 {
        self.page_width_mm - 2.0 * self.margin_mm
    }

    pub(crate) fn validate(&self) -> Result<(), Notes2PdfError> {
        if self.page_width_mm <= 0.0 || self.page_height_mm <= 0.0 {
            return Err(Notes2PdfError::InvalidConfig(
                "Page dimensions must be positive".into(),
            ));
        }
        if 2.0 * self.margin_mm >= self.page_width_mm.min(self.page_height_mm) {
            return Err(Notes2PdfError::InvalidConfig(format!(
                "Margin {}mm leaves no printable area on a {}x{}mm page",
                self.margin_mm, self.page_width_mm, self.page_height_mm
            )));
        }
        if self.body_size_pt <= 0.0 || self.line_height <= 0.0 {
            return Err(Notes2PdfError::InvalidConfig(
                "Font size and line height must be positive".into(),
            ));
        }
        Ok(())
    }
}
