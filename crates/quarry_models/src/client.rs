//! Closed set of NLU drivers.

use crate::{OfflineNlu, OpenAiCompatibleClient};
use async_trait::async_trait;
use quarry_core::{NluConfig, NluRequest};
use quarry_error::QuarryResult;
use quarry_interface::NluDriver;

/// The NLU driver selected at startup.
#[derive(Debug, Clone)]
pub enum NluClient {
    /// Hosted chat-completions model
    OpenAiCompatible(OpenAiCompatibleClient),
    /// No model; rule-based analysis only
    Offline(OfflineNlu),
}

impl NluClient {
    /// Hosted client built from config.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the API key is missing.
    pub fn from_config(config: &NluConfig) -> QuarryResult<Self> {
        Ok(NluClient::OpenAiCompatible(
            OpenAiCompatibleClient::from_config(config)?,
        ))
    }

    /// Client that never consults a model.
    pub fn offline() -> Self {
        NluClient::Offline(OfflineNlu)
    }
}

#[async_trait]
impl NluDriver for NluClient {
    async fn invoke(&self, request: &NluRequest) -> QuarryResult<String> {
        match self {
            NluClient::OpenAiCompatible(client) => client.invoke(request).await,
            NluClient::Offline(client) => client.invoke(request).await,
        }
    }

    fn provider_name(&self) -> &'static str {
        match self {
            NluClient::OpenAiCompatible(client) => client.provider_name(),
            NluClient::Offline(client) => client.provider_name(),
        }
    }

    fn model_name(&self) -> &str {
        match self {
            NluClient::OpenAiCompatible(client) => client.model_name(),
            NluClient::Offline(client) => client.model_name(),
        }
    }
}
