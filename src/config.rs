//! Configuration types for PDF-to-Markdown conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. The endpoint address and credential
//! live here as plain values and are handed to the inference client when it
//! is constructed; nothing is kept in process-wide state.
//!
//! The defaults reproduce a stock local setup: LM Studio listening on
//! `localhost:1234`, serving the quantised olmOCR 2 model.

use crate::error::Pdf2MdError;
use crate::progress::ProgressCallback;
use std::fmt;

/// Base URL of the local OpenAI-compatible server (LM Studio's default port).
pub const DEFAULT_ENDPOINT: &str = "http://localhost:1234/v1";

/// Placeholder credential; LM Studio accepts any non-empty key.
pub const DEFAULT_API_KEY: &str = "lm-studio";

/// Vision model served by the endpoint.
pub const DEFAULT_MODEL: &str = "allenai/olmocr-2-7b@q4_k_m";

/// Longest edge of the rendered page image, in pixels.
pub const DEFAULT_TARGET_LONGEST_IMAGE_DIM: u32 = 1024;

/// Configuration for a PDF-to-Markdown conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use olmocr_md::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .endpoint("http://127.0.0.1:8000/v1")
///     .model("allenai/olmOCR-2-7B-1025-FP8")
///     .target_longest_image_dim(1288)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Base URL of the chat-completions API, without the `/chat/completions`
    /// suffix. Default: [`DEFAULT_ENDPOINT`].
    pub endpoint: String,

    /// Bearer credential sent to the endpoint. Default: [`DEFAULT_API_KEY`].
    pub api_key: String,

    /// Model identifier placed in every page query. Default: [`DEFAULT_MODEL`].
    pub model: String,

    /// Route queries through a named `edgequake-llm` provider (e.g. "openai",
    /// "ollama") instead of `endpoint`. Default: None.
    pub provider_name: Option<String>,

    /// Longest edge of the rendered page image in pixels. Range: 64–4096.
    /// Default: 1024.
    ///
    /// olmOCR was trained on 1024 px renders; larger values cost more image
    /// tokens without improving recognition on that model.
    pub target_longest_image_dim: u32,

    /// Maximum tokens the model may generate per page. Default: 8000.
    ///
    /// Dense pages rendered as HTML tables run long; a low cap silently
    /// truncates the page text.
    pub max_tokens: usize,

    /// Sampling temperature. Default: 0.1.
    pub temperature: f32,

    /// Per-request timeout for the inference call in seconds. Default: 600.
    ///
    /// A 7B model on a laptop GPU can take minutes on a dense page.
    pub request_timeout_secs: u64,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Custom instruction prompt. If None, uses
    /// [`crate::prompts::DEFAULT_PAGE_PROMPT`].
    pub prompt: Option<String>,

    /// Optional per-page progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: DEFAULT_API_KEY.to_string(),
            model: DEFAULT_MODEL.to_string(),
            provider_name: None,
            target_longest_image_dim: DEFAULT_TARGET_LONGEST_IMAGE_DIM,
            max_tokens: 8000,
            temperature: 0.1,
            request_timeout_secs: 600,
            password: None,
            prompt: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("target_longest_image_dim", &self.target_longest_image_dim)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("prompt", &self.prompt.as_ref().map(|p| p.len()))
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// `{endpoint}/chat/completions`, tolerating a trailing slash on the base.
    pub fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.endpoint.trim_end_matches('/'))
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.endpoint = url.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn target_longest_image_dim(mut self, px: u32) -> Self {
        self.config.target_longest_image_dim = px.clamp(64, 4096);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.prompt = Some(prompt.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Pdf2MdError> {
        let c = &self.config;
        if c.provider_name.is_none()
            && !(c.endpoint.starts_with("http://") || c.endpoint.starts_with("https://"))
        {
            return Err(Pdf2MdError::InvalidConfig(format!(
                "endpoint must be an http:// or https:// URL, got '{}'",
                c.endpoint
            )));
        }
        if c.model.trim().is_empty() {
            return Err(Pdf2MdError::InvalidConfig("model must not be empty".into()));
        }
        if c.max_tokens == 0 {
            return Err(Pdf2MdError::InvalidConfig("max_tokens must be ≥ 1".into()));
        }
        if c.request_timeout_secs == 0 {
            return Err(Pdf2MdError::InvalidConfig(
                "request timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_local_lm_studio() {
        let c = ConversionConfig::default();
        assert_eq!(c.endpoint, "http://localhost:1234/v1");
        assert_eq!(c.api_key, "lm-studio");
        assert_eq!(c.model, "allenai/olmocr-2-7b@q4_k_m");
        assert_eq!(c.target_longest_image_dim, 1024);
        assert!(c.provider_name.is_none());
    }

    #[test]
    fn chat_completions_url_handles_trailing_slash() {
        let a = ConversionConfig::builder()
            .endpoint("http://localhost:1234/v1/")
            .build()
            .unwrap();
        let b = ConversionConfig::default();
        assert_eq!(a.chat_completions_url(), "http://localhost:1234/v1/chat/completions");
        assert_eq!(a.chat_completions_url(), b.chat_completions_url());
    }

    #[test]
    fn builder_clamps_ranges() {
        let c = ConversionConfig::builder()
            .target_longest_image_dim(10)
            .temperature(5.0)
            .build()
            .unwrap();
        assert_eq!(c.target_longest_image_dim, 64);
        assert_eq!(c.temperature, 2.0);
    }

    #[test]
    fn builder_rejects_non_http_endpoint() {
        let err = ConversionConfig::builder()
            .endpoint("localhost:1234")
            .build()
            .unwrap_err();
        assert!(matches!(err, Pdf2MdError::InvalidConfig(_)));
    }

    #[test]
    fn named_provider_skips_endpoint_check() {
        let c = ConversionConfig::builder()
            .endpoint("")
            .provider_name("ollama")
            .build();
        assert!(c.is_ok());
    }

    #[test]
    fn builder_rejects_zero_timeout() {
        assert!(ConversionConfig::builder()
            .request_timeout_secs(0)
            .build()
            .is_err());
    }

    #[test]
    fn debug_redacts_secrets() {
        let c = ConversionConfig::builder()
            .api_key("sk-secret")
            .password("hunter2")
            .build()
            .unwrap();
        let s = format!("{c:?}");
        assert!(!s.contains("sk-secret"));
        assert!(!s.contains("hunter2"));
    }
}
