//! Shared test doubles.

#![allow(dead_code)]

use async_trait::async_trait;
use quarry_core::NluRequest;
use quarry_error::{NluError, NluErrorKind, QuarryResult};
use quarry_interface::NluDriver;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Canned language-model driver.
pub struct MockNlu {
    reply: Option<String>,
    calls: AtomicUsize,
    last_request: Mutex<Option<NluRequest>>,
}

impl MockNlu {
    /// Always answer with `reply`.
    pub fn replying(reply: impl Into<String>) -> Self {
        Self {
            reply: Some(reply.into()),
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Always fail with a transport error.
    pub fn failing() -> Self {
        Self {
            reply: None,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<NluRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl NluDriver for MockNlu {
    async fn invoke(&self, request: &NluRequest) -> QuarryResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());
        match &self.reply {
            Some(reply) => Ok(reply.clone()),
            None => Err(NluError::new(NluErrorKind::Request("connection refused".into())).into()),
        }
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}
