use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::TransportError;
use crate::state::ChatMessage;

/// One chat-completion exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub api_key: String,
    pub system: String,
    /// Trailing history, oldest first, not including `message`.
    pub context: Vec<ChatMessage>,
    pub message: String,
}

/// Sends a conversation to a language-model provider.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Provider name for logs.
    fn name(&self) -> &str;

    async fn complete(&self, req: ChatRequest) -> Result<String, TransportError>;
}

/// Pre-scripted transport. Each call pops the next outcome from the front of
/// the queue; an exhausted script answers with a network error.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    outcomes: Arc<Mutex<VecDeque<Result<String, TransportError>>>>,
    /// Every request seen, in order, so tests can inspect what was sent.
    pub requests: Arc<Mutex<Vec<ChatRequest>>>,
}

impl ScriptedTransport {
    pub fn new(outcomes: Vec<Result<String, TransportError>>) -> Self {
        Self {
            outcomes: Arc::new(Mutex::new(outcomes.into())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn always_text(reply: impl Into<String>) -> Self {
        Self::new(vec![Ok(reply.into())])
    }

    pub fn last_request(&self) -> Option<ChatRequest> {
        self.requests.lock().unwrap().last().cloned()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, req: ChatRequest) -> Result<String, TransportError> {
        self.requests.lock().unwrap().push(req);
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Network("no scripted response left".into())))
    }
}
