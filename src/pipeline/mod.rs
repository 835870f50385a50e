//! Pipeline stages for note translation.
//!
//! Each submodule implements exactly one transformation step. Keeping
//! stages separate makes each independently testable and lets us swap
//! implementations (a different model client, a different layout backend)
//! without touching the other stages.
//!
//! ## Data Flow
//!
//! ```text
//! intake ──▶ transcribe ──▶ markdown ──▶ html ──▶ rasterize
//! (bytes+key) (Gemini)      (→ HTML)    (→ blocks) (→ PDF bytes)
//! ```
//!
//! 1. [`intake`]     — validate the payload and credential are present
//! 2. [`transcribe`] — stage to a temp file, upload, generate markdown;
//!    the only stage with network I/O
//! 3. [`markdown`]   — markdown → HTML fragment, wrapped in the fixed
//!    styled document template
//! 4. [`html`]       — flatten the generated document into layout blocks
//! 5. [`rasterize`]  — deterministic block layout into PDF bytes
//! 6. [`render`]     — ties 3–5 together behind one fallible call

pub mod html;
pub mod intake;
pub mod markdown;
pub mod rasterize;
pub mod render;
pub mod transcribe;
