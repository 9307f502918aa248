//! # olmocr-md
//!
//! Convert PDF documents to Markdown with an olmOCR vision-language model.
//!
//! Each page is rasterised with pdfium, sent as an image to a chat-completions
//! endpoint (by default LM Studio on `localhost:1234` serving
//! `allenai/olmocr-2-7b`), and the model's answer is reduced to plain text.
//! Page texts are joined with a blank line and written to a `.md` file next
//! to the PDF.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input    validate path, derive <name>.md
//!  ├─ 2. Load     count pages via pdfium
//!  │   for each page, strictly in order:
//!  ├─ 3. Render   rasterise to 1024 px longest edge (spawn_blocking)
//!  ├─ 4. Query    PNG → base64 data URI + olmOCR prompt
//!  ├─ 5. Infer    POST /chat/completions (or an edgequake-llm provider)
//!  ├─ 6. Extract  natural_text JSON → JSON text → front-matter body → raw
//!  └─ 7. Output   join with "\n\n", atomic write
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use olmocr_md::{convert_to_file, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::default();
//!     let stats = convert_to_file("paper.pdf", "paper.md", &config).await?;
//!     eprintln!("{} pages in {}ms", stats.total_pages, stats.total_duration_ms);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `olmocr-md` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! pdfium itself is loaded at run time: set `PDFIUM_LIB_PATH`, drop the
//! library in the working directory, or install it system-wide.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod confirm;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder};
pub use confirm::{decide_output, AssumeYes, OutputDecision, OverwriteConfirm, PromptConfirm};
pub use convert::{convert, convert_pdf, convert_sync, convert_to_file, write_markdown};
pub use error::Pdf2MdError;
pub use output::{assemble_markdown, ConversionOutput, ConversionStats, PageOutput};
pub use pipeline::extract::{extract_text, Extraction, ExtractionKind};
pub use pipeline::input::{markdown_output_path, validate_input};
pub use pipeline::llm::{
    ChatCompletionsClient, Completion, InferenceBackend, InferenceClient, ProviderClient,
};
pub use pipeline::query::{build_page_query, PageQuery};
pub use pipeline::render::{PageSource, PdfiumPageSource};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use stream::convert_stream;
