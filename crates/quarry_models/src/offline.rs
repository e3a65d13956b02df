//! Driver used when no language model is configured.

use async_trait::async_trait;
use quarry_core::NluRequest;
use quarry_error::{NluError, NluErrorKind, QuarryResult};
use quarry_interface::NluDriver;
use tracing::debug;

/// Always fails, which makes the compiler use its rule-based fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineNlu;

#[async_trait]
impl NluDriver for OfflineNlu {
    async fn invoke(&self, _request: &NluRequest) -> QuarryResult<String> {
        debug!("Offline NLU invoked, no model consulted");
        Err(NluError::new(NluErrorKind::Disabled).into())
    }

    fn provider_name(&self) -> &'static str {
        "offline"
    }

    fn model_name(&self) -> &str {
        "none"
    }
}
