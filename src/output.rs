//! Result types produced by a conversion.

use crate::pipeline::extract::ExtractionKind;
use serde::{Deserialize, Serialize};

/// Separator placed between consecutive page texts in the assembled document.
pub const PAGE_SEPARATOR: &str = "\n\n";

/// The text recovered from one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageOutput {
    /// 1-indexed page number.
    pub page_num: usize,
    /// Extracted plain text for the page.
    pub text: String,
    /// Which extraction tier produced `text`.
    pub kind: ExtractionKind,
    /// Prompt tokens reported by the endpoint (0 when not reported).
    pub input_tokens: usize,
    /// Completion tokens reported by the endpoint (0 when not reported).
    pub output_tokens: usize,
    /// Wall-clock time spent rendering and encoding the page.
    pub render_duration_ms: u64,
    /// Wall-clock time spent waiting on the inference call.
    pub inference_duration_ms: u64,
}

/// Statistics for a finished run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversionStats {
    pub total_pages: usize,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub total_duration_ms: u64,
    pub render_duration_ms: u64,
    pub inference_duration_ms: u64,
}

/// The assembled document plus per-page detail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// All page texts joined by [`PAGE_SEPARATOR`], in page order.
    pub markdown: String,
    pub pages: Vec<PageOutput>,
    pub stats: ConversionStats,
}

/// Join page texts in order with a blank line between each.
pub fn assemble_markdown(pages: &[PageOutput]) -> String {
    pages
        .iter()
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join(PAGE_SEPARATOR)
}
