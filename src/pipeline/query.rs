//! Page queries: the chat-completions request body for one page.
//!
//! A [`PageQuery`] serialises to exactly the JSON an OpenAI-compatible server
//! expects, so [`crate::pipeline::llm::ChatCompletionsClient`] can post it
//! as-is:
//!
//! ```json
//! {
//!   "model": "allenai/olmocr-2-7b@q4_k_m",
//!   "messages": [{
//!     "role": "user",
//!     "content": [
//!       { "type": "text", "text": "Attached is one page of a document…" },
//!       { "type": "image_url", "image_url": { "url": "data:image/png;base64,…" } }
//!     ]
//!   }],
//!   "max_tokens": 8000,
//!   "temperature": 0.1
//! }
//! ```

use crate::config::ConversionConfig;
use crate::error::Pdf2MdError;
use crate::pipeline::encode;
use crate::prompts;
use image::DynamicImage;
use serde::Serialize;

/// Request payload for one page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageQuery {
    /// 1-indexed source page; not sent to the server.
    #[serde(skip)]
    pub page_num: usize,
    pub model: String,
    pub messages: Vec<QueryMessage>,
    pub max_tokens: usize,
    pub temperature: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryMessage {
    pub role: String,
    pub content: Vec<ContentPart>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageUrl {
    pub url: String,
}

impl PageQuery {
    /// First text part of the first message.
    pub fn prompt_text(&self) -> Option<&str> {
        self.parts().find_map(|part| match part {
            ContentPart::Text { text } => Some(text.as_str()),
            _ => None,
        })
    }

    /// Base64 payload of the first image part, without the data-URI prefix.
    pub fn image_base64(&self) -> Option<&str> {
        self.parts().find_map(|part| match part {
            ContentPart::ImageUrl { image_url } => image_url
                .url
                .split_once(";base64,")
                .map(|(_, data)| data),
            _ => None,
        })
    }

    fn parts(&self) -> impl Iterator<Item = &ContentPart> {
        self.messages.iter().flat_map(|m| m.content.iter())
    }
}

/// Build the query for a rendered page.
pub fn build_page_query(
    image: &DynamicImage,
    page_num: usize,
    config: &ConversionConfig,
) -> Result<PageQuery, Pdf2MdError> {
    let b64 = encode::encode_page(image).map_err(|e| Pdf2MdError::RasterisationFailed {
        page: page_num,
        detail: format!("Image encoding failed: {e}"),
    })?;

    Ok(PageQuery {
        page_num,
        model: config.model.clone(),
        messages: vec![QueryMessage {
            role: "user".to_string(),
            content: vec![
                ContentPart::Text {
                    text: prompts::page_prompt(config).to_string(),
                },
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: encode::data_url(&b64),
                    },
                },
            ],
        }],
        max_tokens: config.max_tokens,
        temperature: config.temperature,
    })
}
