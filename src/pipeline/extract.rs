//! Response extraction: recover page text from whatever the model returned.
//!
//! olmOCR checkpoints do not agree on an output format. Older ones answer with
//! a JSON object carrying a `natural_text` field; newer ones emit Markdown
//! behind a YAML front-matter header; general-purpose VLMs just answer in
//! prose. [`extract_text`] tries each shape in a fixed order and always
//! produces exactly one text fragment:
//!
//! 1. JSON object with `natural_text` → that value
//! 2. any other valid JSON → a string rendering of the parsed value
//! 3. `---<metadata>---<body>` → the trimmed body
//! 4. anything else → the raw completion, untouched

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Key under which JSON-speaking models return the page text.
pub const NATURAL_TEXT_KEY: &str = "natural_text";

static RE_FRONT_MATTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)---.*?---(.*)").expect("front-matter regex is valid"));

/// Which rule produced a page's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionKind {
    NaturalText,
    JsonRendered,
    FrontMatterBody,
    Raw,
}

/// Page text tagged with the rule that recovered it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// JSON object carrying [`NATURAL_TEXT_KEY`].
    NaturalText(String),
    /// Valid JSON without the key, rendered back to text.
    JsonRendered(String),
    /// Body following a `---…---` header.
    FrontMatterBody(String),
    /// The completion as received.
    Raw(String),
}

impl Extraction {
    pub fn kind(&self) -> ExtractionKind {
        match self {
            Extraction::NaturalText(_) => ExtractionKind::NaturalText,
            Extraction::JsonRendered(_) => ExtractionKind::JsonRendered,
            Extraction::FrontMatterBody(_) => ExtractionKind::FrontMatterBody,
            Extraction::Raw(_) => ExtractionKind::Raw,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Extraction::NaturalText(s)
            | Extraction::JsonRendered(s)
            | Extraction::FrontMatterBody(s)
            | Extraction::Raw(s) => s,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Extraction::NaturalText(s)
            | Extraction::JsonRendered(s)
            | Extraction::FrontMatterBody(s)
            | Extraction::Raw(s) => s,
        }
    }
}

/// Apply the fallback chain to one raw completion.
pub fn extract_text(raw: &str) -> Extraction {
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => from_json(value),
        Err(_) => front_matter_body(raw)
            .map(Extraction::FrontMatterBody)
            .unwrap_or_else(|| Extraction::Raw(raw.to_string())),
    }
}

fn from_json(value: Value) -> Extraction {
    match value {
        Value::Object(mut map) => match map.remove(NATURAL_TEXT_KEY) {
            Some(text) => Extraction::NaturalText(render_value(text)),
            None => Extraction::JsonRendered(Value::Object(map).to_string()),
        },
        other => Extraction::JsonRendered(render_value(other)),
    }
}

/// Strings render as their contents; everything else as compact JSON.
fn render_value(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

fn front_matter_body(raw: &str) -> Option<String> {
    RE_FRONT_MATTER
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|body| body.as_str().trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_with_natural_text() {
        let e = extract_text(r#"{"natural_text": "Page 1 content"}"#);
        assert_eq!(e, Extraction::NaturalText("Page 1 content".into()));
    }

    #[test]
    fn json_with_natural_text_and_metadata() {
        let raw = r#"{"primary_language":"en","is_rotation_valid":true,"natural_text":"Hello\nworld"}"#;
        let e = extract_text(raw);
        assert_eq!(e.kind(), ExtractionKind::NaturalText);
        assert_eq!(e.text(), "Hello\nworld");
    }

    #[test]
    fn json_natural_text_non_string_is_rendered() {
        let e = extract_text(r#"{"natural_text": null}"#);
        assert_eq!(e, Extraction::NaturalText("null".into()));
    }

    #[test]
    fn json_without_key_is_rendered_not_raw() {
        let raw = r#"{ "primary_language": "en",  "is_table": false }"#;
        let e = extract_text(raw);
        assert_eq!(e.kind(), ExtractionKind::JsonRendered);
        assert_ne!(e.text(), raw);
        let reparsed: Value = serde_json::from_str(e.text()).unwrap();
        assert_eq!(reparsed["primary_language"], "en");
        assert_eq!(reparsed["is_table"], false);
    }

    #[test]
    fn json_scalars_are_rendered() {
        assert_eq!(extract_text("42"), Extraction::JsonRendered("42".into()));
        assert_eq!(
            extract_text(r#""just a string""#),
            Extraction::JsonRendered("just a string".into())
        );
        assert_eq!(extract_text("[1, 2]"), Extraction::JsonRendered("[1,2]".into()));
    }

    #[test]
    fn front_matter_body_is_trimmed() {
        let raw = "---\nprimary_language: en\nis_rotation_valid: True\nrotation_correction: 0\nis_table: False\nis_diagram: False\n---\n# Title\n\nBody text.\n\n";
        let e = extract_text(raw);
        assert_eq!(e, Extraction::FrontMatterBody("# Title\n\nBody text.".into()));
    }

    #[test]
    fn front_matter_anywhere_in_text() {
        let e = extract_text("preamble --- meta --- the body ");
        assert_eq!(e, Extraction::FrontMatterBody("the body".into()));
    }

    #[test]
    fn body_may_contain_more_dashes() {
        let e = extract_text("---\nk: v\n---\nabove\n---\nbelow");
        assert_eq!(e.text(), "above\n---\nbelow");
    }

    #[test]
    fn empty_body_after_front_matter() {
        let e = extract_text("---\nprimary_language: null\n---\n");
        assert_eq!(e, Extraction::FrontMatterBody(String::new()));
    }

    #[test]
    fn plain_text_is_returned_unmodified() {
        let raw = "  # Heading\n\nJust markdown, no header.\n";
        assert_eq!(extract_text(raw), Extraction::Raw(raw.into()));
    }

    #[test]
    fn single_fence_is_not_front_matter() {
        let raw = "Intro\n---\nno closing fence";
        assert_eq!(extract_text(raw), Extraction::Raw(raw.into()));
    }

    #[test]
    fn empty_completion_is_raw() {
        assert_eq!(extract_text(""), Extraction::Raw(String::new()));
    }

    #[test]
    fn into_text_returns_payload() {
        assert_eq!(extract_text("plain").into_text(), "plain");
    }
}
