//! Instruction prompt sent with every page image.
//!
//! olmOCR models are fine-tuned on one specific instruction; changing the
//! wording noticeably degrades their output. The text below is the one the
//! olmOCR 2 checkpoints expect. It asks for Markdown with a YAML front-matter
//! block on top, which is why [`crate::pipeline::extract`] knows how to strip
//! a `---…---` header.
//!
//! Callers can override it via [`crate::config::ConversionConfig::prompt`]
//! when driving a general-purpose VLM instead.

/// Default page prompt for olmOCR-style models.
pub const DEFAULT_PAGE_PROMPT: &str = "Attached is one page of a document that you must process. \
Just return the plain text representation of this document as if you were reading it naturally. \
Convert equations to LateX and tables to HTML.\n\
If there are any figures or charts, label them with the following markdown syntax \
![Alt text describing the contents of the figure](page_startx_starty_width_height.png)\n\
Return your output as markdown, with a front matter section on top specifying values for the \
primary_language, is_rotation_valid, rotation_correction, is_table, and is_diagram parameters.";

/// The prompt in effect for `config`.
pub fn page_prompt(config: &crate::config::ConversionConfig) -> &str {
    config.prompt.as_deref().unwrap_or(DEFAULT_PAGE_PROMPT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConversionConfig;

    #[test]
    fn default_prompt_requests_front_matter() {
        assert!(DEFAULT_PAGE_PROMPT.contains("front matter"));
        assert!(DEFAULT_PAGE_PROMPT.contains("primary_language"));
    }

    #[test]
    fn override_takes_precedence() {
        let config = ConversionConfig::builder()
            .prompt("Transcribe this page.")
            .build()
            .unwrap();
        assert_eq!(page_prompt(&config), "Transcribe this page.");
        assert_eq!(page_prompt(&ConversionConfig::default()), DEFAULT_PAGE_PROMPT);
    }
}
