//! Inference: send a [`PageQuery`] to a model and return its completion.
//!
//! Two backends implement [`InferenceClient`]:
//!
//! * [`ChatCompletionsClient`] posts the query verbatim to an OpenAI-compatible
//!   `/chat/completions` endpoint (LM Studio, vLLM, llama.cpp server, …).
//!   This is the default and the only one that needs no API key.
//! * [`ProviderClient`] hands the prompt and page image to any
//!   `edgequake-llm` provider selected by name.
//!
//! [`InferenceBackend`] picks one at run time from the configuration.
//!
//! No call is retried. The first failure surfaces as a [`Pdf2MdError`] and
//! ends the conversion.

use crate::config::ConversionConfig;
use crate::error::Pdf2MdError;
use crate::pipeline::encode::PAGE_IMAGE_MIME;
use crate::pipeline::query::PageQuery;
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider, ProviderFactory};
use serde::Deserialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Longest slice of an error body kept in [`Pdf2MdError::InferenceStatus`].
const MAX_ERROR_BODY: usize = 512;

/// Text of the first choice, plus usage when the server reports it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    pub content: String,
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
}

/// Something that can answer a page query.
pub trait InferenceClient {
    fn complete(
        &self,
        query: &PageQuery,
    ) -> impl Future<Output = Result<Completion, Pdf2MdError>> + Send;
}

// ── OpenAI-compatible HTTP endpoint ──────────────────────────────────────────

/// Client for an OpenAI-compatible chat-completions endpoint.
#[derive(Debug, Clone)]
pub struct ChatCompletionsClient {
    http: reqwest::Client,
    url: String,
    api_key: String,
    timeout_secs: u64,
}

impl ChatCompletionsClient {
    pub fn new(config: &ConversionConfig) -> Result<Self, Pdf2MdError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| Pdf2MdError::Internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            url: config.chat_completions_url(),
            api_key: config.api_key.clone(),
            timeout_secs: config.request_timeout_secs,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl InferenceClient for ChatCompletionsClient {
    async fn complete(&self, query: &PageQuery) -> Result<Completion, Pdf2MdError> {
        let page = query.page_num;
        debug!("Page {}: POST {}", page, self.url);

        let response = self
            .http
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(query)
            .send()
            .await
            .map_err(|e| self.transport_error(page, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(page, e))?;

        if !status.is_success() {
            return Err(Pdf2MdError::InferenceStatus {
                page,
                status: status.as_u16(),
                body: truncate(&body, MAX_ERROR_BODY),
            });
        }

        parse_completion(page, &body)
    }
}

impl ChatCompletionsClient {
    fn transport_error(&self, page: usize, e: reqwest::Error) -> Pdf2MdError {
        if e.is_timeout() {
            Pdf2MdError::InferenceTimeout {
                page,
                secs: self.timeout_secs,
            }
        } else {
            Pdf2MdError::Inference {
                page,
                detail: e.to_string(),
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: usize,
    #[serde(default)]
    completion_tokens: usize,
}

/// Decode a chat-completions response body and take the first choice.
pub fn parse_completion(page: usize, body: &str) -> Result<Completion, Pdf2MdError> {
    let parsed: ChatCompletionResponse =
        serde_json::from_str(body).map_err(|e| Pdf2MdError::MalformedResponse {
            page,
            detail: format!("response is not a chat completion: {e}"),
        })?;

    let content = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| Pdf2MdError::MalformedResponse {
            page,
            detail: "response has no choices".to_string(),
        })?
        .message
        .content
        .ok_or_else(|| Pdf2MdError::MalformedResponse {
            page,
            detail: "first choice has no message content".to_string(),
        })?;

    let (prompt_tokens, completion_tokens) = parsed
        .usage
        .map(|u| (u.prompt_tokens, u.completion_tokens))
        .unwrap_or((0, 0));

    Ok(Completion {
        content,
        prompt_tokens,
        completion_tokens,
    })
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &s[..end])
}

// ── edgequake-llm provider ───────────────────────────────────────────────────

/// Client that routes queries through an `edgequake-llm` provider.
#[derive(Clone)]
pub struct ProviderClient {
    provider: Arc<dyn LLMProvider>,
}

impl ProviderClient {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self { provider }
    }

    /// Create the provider named `name` (reads its API key from the
    /// environment) serving `model`.
    pub fn from_name(name: &str, model: &str) -> Result<Self, Pdf2MdError> {
        let provider = ProviderFactory::create_llm_provider(name, model).map_err(|e| {
            Pdf2MdError::ProviderNotConfigured {
                provider: name.to_string(),
                hint: format!("{e}"),
            }
        })?;
        Ok(Self::new(provider))
    }
}

impl std::fmt::Debug for ProviderClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderClient")
            .field("provider", &"<dyn LLMProvider>")
            .finish()
    }
}

impl InferenceClient for ProviderClient {
    async fn complete(&self, query: &PageQuery) -> Result<Completion, Pdf2MdError> {
        let page = query.page_num;
        let (messages, options) = provider_request(query)?;

        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| Pdf2MdError::Inference {
                page,
                detail: format!("{e}"),
            })?;

        Ok(Completion {
            content: response.content,
            prompt_tokens: response.prompt_tokens as usize,
            completion_tokens: response.completion_tokens as usize,
        })
    }
}

/// Translate a page query into provider messages and options.
fn provider_request(query: &PageQuery) -> Result<(Vec<ChatMessage>, CompletionOptions), Pdf2MdError> {
    let page = query.page_num;
    let image = query
        .image_base64()
        .ok_or_else(|| Pdf2MdError::Internal(format!("page {page} query has no image part")))?;
    let prompt = query.prompt_text().unwrap_or_default();

    let messages = vec![ChatMessage::user_with_images(
        prompt,
        vec![ImageData::new(image.to_string(), PAGE_IMAGE_MIME)],
    )];
    let options = CompletionOptions {
        temperature: Some(query.temperature),
        max_tokens: Some(query.max_tokens),
        ..Default::default()
    };
    Ok((messages, options))
}

// ── Runtime selection ────────────────────────────────────────────────────────

/// The backend chosen by [`InferenceBackend::from_config`].
#[derive(Debug, Clone)]
pub enum InferenceBackend {
    Endpoint(ChatCompletionsClient),
    Provider(ProviderClient),
}

impl InferenceBackend {
    /// A named provider when `provider_name` is set, the HTTP endpoint otherwise.
    pub fn from_config(config: &ConversionConfig) -> Result<Self, Pdf2MdError> {
        match config.provider_name.as_deref() {
            Some(name) => Ok(Self::Provider(ProviderClient::from_name(name, &config.model)?)),
            None => Ok(Self::Endpoint(ChatCompletionsClient::new(config)?)),
        }
    }
}

impl InferenceClient for InferenceBackend {
    async fn complete(&self, query: &PageQuery) -> Result<Completion, Pdf2MdError> {
        match self {
            InferenceBackend::Endpoint(client) => client.complete(query).await,
            InferenceBackend::Provider(client) => client.complete(query).await,
        }
    }
}
