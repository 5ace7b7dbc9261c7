//! Conversation lifecycle: one explicit session object per chat.
//!
//! Two histories are kept. `history` is the role/content conversation sent to
//! the model as context and persisted through the [`Store`]; `transcript` is
//! what was displayed, kept in memory for redisplay only.

use tracing::{debug, info, warn};

use crate::error::{ChatError, TransportError};
use crate::intent::classify;
use crate::render::RenderableMessage;
use crate::state::{context_window, ChatMessage, ChatRole, Sender, TranscriptEntry};
use crate::store::Store;
use crate::transport::{ChatRequest, Transport};
use crate::view::{Reaction, ViewEvent};

pub const DEFAULT_CONTEXT_WINDOW: usize = 10;

pub const GREETING: &str =
    "Hello! I'm your AI Construction Project Manager. How can I assist you today?";

pub const SYSTEM_PROMPT: &str = "You are an AI Construction Project Manager assistant. Format your responses for easy scanning:
- Use bullet points for lists
- Break information into clear sections with headers
- Keep paragraphs short (2-3 sentences max)
- Use bold for important terms
- Include line breaks between sections
- If providing steps, number them
- If mentioning costs or metrics, display them clearly
- Use tables for structured data (format: |header1|header2|\\n|data1|data2|)
- Use checklists for tasks (format: [ ] Task or [x] Completed task)
- Present numerical data in clear, tabular format
- Reference previous conversations when relevant";

const CLEARED: &str = "# Chat History Cleared
- All previous messages have been removed
- Conversation context has been reset
- Starting fresh conversation

How can I assist you today?";

pub struct Session<T: Transport, S: Store> {
    transport: T,
    store: S,
    api_key: Option<String>,
    history: Vec<ChatMessage>,
    transcript: Vec<TranscriptEntry>,
    context_window: usize,
}

impl<T: Transport, S: Store> Session<T, S> {
    pub fn new(transport: T, store: S) -> Self {
        Self {
            transport,
            store,
            api_key: None,
            history: Vec::new(),
            transcript: Vec::new(),
            context_window: DEFAULT_CONTEXT_WINDOW,
        }
    }

    pub fn with_context_window(mut self, limit: usize) -> Self {
        self.context_window = limit;
        self
    }

    /// Use this credential without persisting it (e.g. from the environment).
    pub fn with_api_key(mut self, key: Option<String>) -> Self {
        if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
            self.api_key = Some(key);
        }
        self
    }

    /// Load the credential and conversation history from the store. Missing
    /// values leave the session empty; unreadable history is discarded.
    pub fn restore(&mut self) {
        if self.api_key.is_none() {
            match self.store.api_key() {
                Ok(key) => self.api_key = key.filter(|k| !k.trim().is_empty()),
                Err(e) => warn!(error = %e, "failed to load API key"),
            }
        }

        match self.store.load_history() {
            Ok(Some(history)) => {
                debug!(messages = history.len(), "restored conversation history");
                self.history = history;
            }
            Ok(None) => {}
            Err(e) => {
                warn!(error = %e, "failed to load conversation history");
                self.history.clear();
            }
        }
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Record and return the opening message.
    pub fn greet(&mut self) -> RenderableMessage {
        let message = RenderableMessage::plain(GREETING);
        self.record(Sender::Bot, message.clone());
        message
    }

    pub fn set_api_key(&mut self, key: &str) -> RenderableMessage {
        let key = key.trim();
        let message = if key.is_empty() {
            RenderableMessage::plain(
                "Warning: API key is required for functionality. Reset the API key to try again.",
            )
        } else {
            if let Err(e) = self.store.set_api_key(key) {
                warn!(error = %e, "failed to persist API key");
            }
            self.api_key = Some(key.to_string());
            info!("API key set");
            RenderableMessage::plain("API key has been set successfully.")
        };
        self.record(Sender::Bot, message.clone());
        message
    }

    pub fn reset_api_key(&mut self) -> RenderableMessage {
        self.invalidate_credential();
        let message =
            RenderableMessage::plain("API key has been reset. Please provide a new API key.");
        self.record(Sender::Bot, message.clone());
        message
    }

    /// Send a user message and return the reply to display.
    ///
    /// The user turn is kept in history even when the exchange fails, so it
    /// can be retried; no assistant turn is added on failure.
    pub async fn send_message(&mut self, text: &str) -> RenderableMessage {
        let text = text.trim();
        self.record(Sender::User, RenderableMessage::plain(text));
        debug!(intent = %classify(text), "user message");

        let index = self.begin_turn(text);
        self.exchange(index).await
    }

    /// Re-send the most recent user message. An unanswered message is sent
    /// again in place; an answered one starts a new turn with the same text.
    pub async fn retry_last(&mut self) -> Option<RenderableMessage> {
        let index = self.history.iter().rposition(|m| m.role == ChatRole::User)?;

        if index + 1 == self.history.len() {
            debug!("retrying unanswered message");
            Some(self.exchange(index).await)
        } else {
            let text = self.history[index].content.clone();
            debug!("retrying answered message as a new turn");
            let index = self.begin_turn(&text);
            Some(self.exchange(index).await)
        }
    }

    /// Forget the conversation, in memory and in the store. The returned
    /// confirmation is the only transcript entry left afterwards.
    pub fn clear(&mut self) -> RenderableMessage {
        self.history.clear();
        self.transcript.clear();
        if let Err(e) = self.store.remove_history() {
            warn!(error = %e, "failed to remove stored history");
        }
        info!("conversation cleared");

        let message = RenderableMessage::formatted(CLEARED);
        self.record(Sender::Bot, message.clone());
        message
    }

    /// Raw reply text behind a formatted transcript entry.
    pub fn copy_text(&self, index: usize) -> Option<&str> {
        match self.transcript.get(index) {
            Some(TranscriptEntry {
                message: RenderableMessage::Formatted { source, .. },
                ..
            }) => Some(source),
            _ => None,
        }
    }

    pub async fn handle(&mut self, event: ViewEvent) -> Reaction {
        match event {
            ViewEvent::Submit(text) => {
                if text.trim().is_empty() {
                    return Reaction::Nothing;
                }
                let reply = self.send_message(&text).await;
                Reaction::Show(vec![
                    (Sender::User, RenderableMessage::plain(text.trim())),
                    (Sender::Bot, reply),
                ])
            }
            ViewEvent::Retry => match self.retry_last().await {
                Some(reply) => Reaction::Show(vec![(Sender::Bot, reply)]),
                None => Reaction::Nothing,
            },
            ViewEvent::Copy(index) => match self.copy_text(index) {
                Some(text) => Reaction::Clipboard(text.to_string()),
                None => Reaction::Nothing,
            },
            ViewEvent::Clear => Reaction::Reset(self.clear()),
            ViewEvent::SetApiKey(key) => {
                Reaction::Show(vec![(Sender::Bot, self.set_api_key(&key))])
            }
            ViewEvent::ResetApiKey => {
                Reaction::Show(vec![(Sender::Bot, self.reset_api_key())])
            }
        }
    }

    fn begin_turn(&mut self, text: &str) -> usize {
        self.history.push(ChatMessage::user(text));
        self.persist_history();
        self.history.len() - 1
    }

    /// Resolve the user message at `index` and record the outcome.
    async fn exchange(&mut self, index: usize) -> RenderableMessage {
        let message = match self.request(index).await {
            Ok(reply) => {
                self.history.push(ChatMessage::assistant(reply.as_str()));
                self.persist_history();
                RenderableMessage::formatted(reply)
            }
            Err(e) => {
                warn!(error = %e, "chat exchange failed");
                RenderableMessage::error(e.to_string())
            }
        };
        self.record(Sender::Bot, message.clone());
        message
    }

    async fn request(&mut self, index: usize) -> Result<String, ChatError> {
        let api_key = self.api_key.clone().ok_or(ChatError::MissingCredential)?;

        let req = ChatRequest {
            api_key,
            system: SYSTEM_PROMPT.to_string(),
            context: context_window(&self.history[..index], self.context_window).to_vec(),
            message: self.history[index].content.clone(),
        };
        debug!(
            transport = self.transport.name(),
            context = req.context.len(),
            "requesting completion"
        );

        match self.transport.complete(req).await {
            Ok(reply) => Ok(reply),
            Err(TransportError::Unauthorized) => {
                self.invalidate_credential();
                Err(ChatError::AuthInvalid)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn invalidate_credential(&mut self) {
        self.api_key = None;
        if let Err(e) = self.store.remove_api_key() {
            warn!(error = %e, "failed to remove stored API key");
        }
    }

    fn persist_history(&mut self) {
        if let Err(e) = self.store.save_history(&self.history) {
            warn!(error = %e, "failed to save conversation history");
        }
    }

    fn record(&mut self, sender: Sender, message: RenderableMessage) {
        self.transcript.push(TranscriptEntry::new(sender, message));
    }
}
