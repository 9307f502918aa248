//! Error type for the olmocr-md library.
//!
//! Every failure in this crate is fatal for the run: a page that cannot be
//! rendered or answered by the model aborts the whole conversion, and nothing
//! is written. Variants are grouped by where they originate so the binary can
//! tell a usage mistake (bad path, wrong extension) from a failure deep in the
//! pipeline (see [`Pdf2MdError::is_usage_error`]).
//!
//! Ambiguous model output is *not* an error: the extractor in
//! [`crate::pipeline::extract`] always yields some text.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the olmocr-md library.
#[derive(Debug, Error)]
pub enum Pdf2MdError {
    // ── Usage errors ──────────────────────────────────────────────────────
    /// No input path was given.
    #[error("Please provide a PDF file path")]
    MissingInput,

    /// The input path does not carry a `.pdf` extension.
    #[error("File is not a PDF: '{path}'")]
    NotAPdf { path: PathBuf },

    // ── File access errors ────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// Requested page does not exist in the document.
    #[error("Page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: usize, total: usize },

    /// pdfium-render or the PNG encoder failed for a specific page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Install libpdfium for your platform, then either:\n\
  • place it in the current directory, or\n\
  • make it visible to the system loader, or\n\
  • set PDFIUM_LIB_PATH=/path/to/libpdfium.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Inference errors ──────────────────────────────────────────────────
    /// The endpoint could not be reached or the request failed in transit.
    #[error("Inference request for page {page} failed: {detail}")]
    Inference { page: usize, detail: String },

    /// The inference call exceeded the configured request timeout.
    #[error("Inference request for page {page} timed out after {secs}s")]
    InferenceTimeout { page: usize, secs: u64 },

    /// The endpoint answered with a non-success HTTP status.
    #[error("Inference endpoint returned HTTP {status} for page {page}: {body}")]
    InferenceStatus { page: usize, status: u16, body: String },

    /// The endpoint answered, but not with a usable chat completion.
    #[error("Malformed completion for page {page}: {detail}")]
    MalformedResponse { page: usize, detail: String },

    /// A named provider could not be created (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output Markdown file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Pdf2MdError {
    /// `true` for problems with what the user typed rather than with the
    /// document or the model: missing argument, wrong extension, a path that
    /// does not exist or cannot be read.
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            Pdf2MdError::MissingInput
                | Pdf2MdError::NotAPdf { .. }
                | Pdf2MdError::FileNotFound { .. }
                | Pdf2MdError::PermissionDenied { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_errors_are_classified() {
        assert!(Pdf2MdError::MissingInput.is_usage_error());
        assert!(Pdf2MdError::NotAPdf {
            path: "notes.txt".into()
        }
        .is_usage_error());
        assert!(Pdf2MdError::FileNotFound {
            path: "/nope.pdf".into()
        }
        .is_usage_error());
        assert!(!Pdf2MdError::Inference {
            page: 1,
            detail: "connection refused".into()
        }
        .is_usage_error());
    }

    #[test]
    fn not_a_pdf_display() {
        let e = Pdf2MdError::NotAPdf {
            path: "notes.txt".into(),
        };
        assert_eq!(e.to_string(), "File is not a PDF: 'notes.txt'");
    }

    #[test]
    fn inference_status_display() {
        let e = Pdf2MdError::InferenceStatus {
            page: 2,
            status: 503,
            body: "model not loaded".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("503"), "got: {msg}");
        assert!(msg.contains("page 2"), "got: {msg}");
        assert!(msg.contains("model not loaded"), "got: {msg}");
    }

    #[test]
    fn inference_timeout_display() {
        let e = Pdf2MdError::InferenceTimeout { page: 3, secs: 600 };
        assert!(e.to_string().contains("600s"));
        assert!(e.to_string().contains("page 3"));
    }

    #[test]
    fn provider_not_configured_display() {
        let e = Pdf2MdError::ProviderNotConfigured {
            provider: "anthropic".into(),
            hint: "ANTHROPIC_API_KEY is not set".into(),
        };
        assert!(e.to_string().contains("anthropic"));
        assert!(e.to_string().contains("ANTHROPIC_API_KEY"));
    }
}
