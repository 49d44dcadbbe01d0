//! Scripted `ModelBackend` for tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::{LlmError, ModelBackend, ModelRequest};

/// Replies with fixed text (or a fixed API error) after an optional delay.
pub struct StubBackend {
    reply: Result<String, String>,
    delay: Duration,
    calls: AtomicUsize,
    last_request: Mutex<Option<ModelRequest>>,
}

impl StubBackend {
    fn new(reply: Result<String, String>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            reply,
            delay,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        })
    }

    pub fn replying(text: &str) -> Arc<Self> {
        Self::new(Ok(text.to_string()), Duration::ZERO)
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Self::new(Err(message.to_string()), Duration::ZERO)
    }

    pub fn slow(delay: Duration) -> Arc<Self> {
        Self::new(Ok("{}".to_string()), delay)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<ModelRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelBackend for StubBackend {
    async fn generate(&self, request: &ModelRequest) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());
        tokio::time::sleep(self.delay).await;
        self.reply.clone().map_err(|message| LlmError::Api {
            status: 429,
            message,
        })
    }
}
