//! Pipeline stages for PDF-to-Markdown conversion.
//!
//! Each submodule implements exactly one transformation step.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ encode ──▶ query ──▶ llm ──▶ extract
//! (path)    (pdfium)   (base64)   (JSON)    (VLM)   (fallback chain)
//! ```
//!
//! 1. [`input`]   — validate the user-supplied path, derive the `.md` path
//! 2. [`render`]  — count pages and rasterise one page at a time
//! 3. [`encode`]  — PNG-encode and base64-wrap the page image
//! 4. [`query`]   — assemble the chat-completions request for the page
//! 5. [`llm`]     — send it to the model; the only stage with network I/O
//! 6. [`extract`] — recover plain text from the completion

pub mod encode;
pub mod extract;
pub mod input;
pub mod llm;
pub mod query;
pub mod render;
