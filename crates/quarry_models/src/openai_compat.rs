//! Client for OpenAI-compatible chat-completions endpoints.

use crate::{ChatMessage, ChatRequest, ChatResponse, ChatRole};
use async_trait::async_trait;
use quarry_core::{NluConfig, NluRequest};
use quarry_error::{ConfigError, NluError, NluErrorKind, QuarryResult};
use quarry_interface::NluDriver;
use reqwest::Client;
use std::time::Duration;
use tokio_retry2::{Retry, RetryError, strategy::ExponentialBackoff, strategy::jitter};
use tracing::{debug, instrument, warn};

const INITIAL_BACKOFF_MS: u64 = 100;
const MAX_BACKOFF_SECS: u64 = 10;

/// Chat-completions client (SiliconFlow, OpenAI, vLLM, ...).
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleClient {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
    max_retries: u32,
}

impl OpenAiCompatibleClient {
    /// Creates a client from config, reading the key from `config.api_key_env`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the key variable is unset or the
    /// HTTP client cannot be built.
    #[instrument(skip_all, fields(model = %config.model()))]
    pub fn from_config(config: &NluConfig) -> QuarryResult<Self> {
        let api_key = std::env::var(config.api_key_env()).map_err(|e| {
            ConfigError::new(format!("{} not set: {}", config.api_key_env(), e))
        })?;
        Self::with_api_key(api_key, config)
    }

    /// Creates a client with an explicit API key.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the HTTP client cannot be built.
    #[instrument(skip(api_key, config), fields(model = %config.model()))]
    pub fn with_api_key(api_key: impl Into<String>, config: &NluConfig) -> QuarryResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(*config.timeout_secs()))
            .build()
            .map_err(|e| ConfigError::new(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            endpoint: format!("{}/chat/completions", config.base_url().trim_end_matches('/')),
            model: config.model().clone(),
            max_retries: *config.max_retries(),
        })
    }

    fn chat_request(&self, request: &NluRequest) -> Result<ChatRequest, NluError> {
        ChatRequest::builder()
            .model(self.model.clone())
            .messages(vec![
                ChatMessage::new(ChatRole::System, request.system_prompt().as_str()),
                ChatMessage::new(ChatRole::User, request.user_prompt().as_str()),
            ])
            .temperature(Some(*request.temperature()))
            .max_tokens(Some(*request.max_tokens()))
            .build()
            .map_err(|e| NluError::new(NluErrorKind::Request(format!("Invalid request: {}", e))))
    }

    async fn send(&self, body: &ChatRequest) -> Result<String, NluError> {
        debug!(endpoint = %self.endpoint, "Sending chat completion request");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| NluError::new(NluErrorKind::Request(format!("Request failed: {}", e))))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(NluError::new(NluErrorKind::Api { status, message }));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            NluError::new(NluErrorKind::Parse(format!("Failed to parse response: {}", e)))
        })?;

        parsed
            .first_text()
            .map(str::to_string)
            .ok_or_else(|| NluError::new(NluErrorKind::EmptyResponse))
    }
}

#[async_trait]
impl NluDriver for OpenAiCompatibleClient {
    #[instrument(skip(self, request), fields(provider = "openai-compatible", model = %self.model))]
    async fn invoke(&self, request: &NluRequest) -> QuarryResult<String> {
        let body = self.chat_request(request)?;

        let retry_strategy = ExponentialBackoff::from_millis(INITIAL_BACKOFF_MS)
            .factor(2)
            .max_delay(Duration::from_secs(MAX_BACKOFF_SECS))
            .map(jitter)
            .take(self.max_retries as usize);

        let this = self;
        let body = &body;
        let text = Retry::spawn(retry_strategy, move || async move {
            match this.send(body).await {
                Ok(text) => Ok(text),
                Err(e) if e.kind.is_retryable() => {
                    warn!(error = %e, "Chat completion failed, will retry");
                    Err(RetryError::Transient {
                        err: e,
                        retry_after: None,
                    })
                }
                Err(e) => {
                    warn!(error = %e, "Permanent chat completion error, failing immediately");
                    Err(RetryError::Permanent(e))
                }
            }
        })
        .await?;

        debug!(chars = text.len(), "Chat completion received");
        Ok(text)
    }

    fn provider_name(&self) -> &'static str {
        "openai-compatible"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
