//! Input validation and output-path derivation.
//!
//! Checks run in the order a user would fix them: was a path given at all,
//! does it exist, is it a `.pdf`. Contents are not inspected here; that is
//! [`crate::pipeline::render::PdfiumPageSource::open`]'s job.

use crate::error::Pdf2MdError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Extension of accepted inputs, compared case-insensitively.
pub const PDF_EXTENSION: &str = "pdf";

/// Extension given to the derived output file.
pub const MARKDOWN_EXTENSION: &str = "md";

/// Validate the CLI input argument and return it as a path.
pub fn validate_input(input: Option<&Path>) -> Result<PathBuf, Pdf2MdError> {
    let path = input.ok_or(Pdf2MdError::MissingInput)?.to_path_buf();

    if !path.exists() {
        return Err(Pdf2MdError::FileNotFound { path });
    }

    if !has_pdf_extension(&path) {
        return Err(Pdf2MdError::NotAPdf { path });
    }

    debug!("Validated input PDF: {}", path.display());
    Ok(path)
}

/// `true` when the final extension is `pdf` in any letter case.
pub fn has_pdf_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(PDF_EXTENSION))
}

/// Same directory and base name as `input`, with the extension replaced by `.md`.
pub fn markdown_output_path(input: &Path) -> PathBuf {
    input.with_extension(MARKDOWN_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_argument() {
        assert!(matches!(validate_input(None), Err(Pdf2MdError::MissingInput)));
    }

    #[test]
    fn nonexistent_file() {
        let err = validate_input(Some(Path::new("/definitely/not/a/real/file.pdf"))).unwrap_err();
        assert!(matches!(err, Pdf2MdError::FileNotFound { .. }));
    }

    #[test]
    fn wrong_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "hello").unwrap();
        let err = validate_input(Some(&path)).unwrap_err();
        assert!(matches!(err, Pdf2MdError::NotAPdf { .. }));
    }

    #[test]
    fn uppercase_extension_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("SCAN.PDF");
        std::fs::write(&path, b"%PDF-1.4").unwrap();
        assert_eq!(validate_input(Some(&path)).unwrap(), path);
    }

    #[test]
    fn extension_check() {
        assert!(has_pdf_extension(Path::new("a/b/report.pdf")));
        assert!(has_pdf_extension(Path::new("report.Pdf")));
        assert!(!has_pdf_extension(Path::new("report.pdf.bak")));
        assert!(!has_pdf_extension(Path::new("report")));
    }

    #[test]
    fn output_path_replaces_extension() {
        assert_eq!(
            markdown_output_path(Path::new("/docs/paper.pdf")),
            PathBuf::from("/docs/paper.md")
        );
        assert_eq!(
            markdown_output_path(Path::new("scans/v1.2.PDF")),
            PathBuf::from("scans/v1.2.md")
        );
    }
}
