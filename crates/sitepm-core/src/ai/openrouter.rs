use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::TransportError;
use crate::state::ChatMessage;
use crate::transport::{ChatRequest, Transport};

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MODEL: &str = "meta-llama/llama-3.1-70b-instruct:free";

static IMAGE_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)https?://\S+\.(jpg|jpeg|png|gif|webp)").unwrap());

#[derive(Serialize)]
struct OpenRouterMessage {
    role: String,
    content: MessageContent,
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, PartialEq, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Serialize)]
struct OpenRouterRequest {
    model: String,
    messages: Vec<OpenRouterMessage>,
}

#[derive(Deserialize)]
struct OpenRouterChoice {
    message: Option<OpenRouterResponseMessage>,
}

#[derive(Deserialize)]
struct OpenRouterResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct OpenRouterResponse {
    #[serde(default)]
    choices: Vec<OpenRouterChoice>,
}

/// Split a user message into content parts, lifting the first image URL
/// into its own part.
fn user_content(input: &str) -> MessageContent {
    match IMAGE_URL_RE.find(input) {
        Some(m) => MessageContent::Parts(vec![
            ContentPart::Text {
                text: input.replacen(m.as_str(), "", 1).trim().to_string(),
            },
            ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: m.as_str().to_string(),
                },
            },
        ]),
        None => MessageContent::Parts(vec![ContentPart::Text {
            text: input.to_string(),
        }]),
    }
}

/// Chat-completions client for OpenRouter (or any compatible endpoint).
#[derive(Clone)]
pub struct OpenRouterClient {
    client: Client,
    base_url: String,
    model: String,
    site_url: String,
    site_name: String,
}

impl OpenRouterClient {
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            site_url: "http://localhost".to_string(),
            site_name: "AI Construction PM".to_string(),
        }
    }

    /// Attribution headers OpenRouter shows on its dashboards.
    pub fn with_site(mut self, site_url: &str, site_name: &str) -> Self {
        self.site_url = site_url.to_string();
        self.site_name = site_name.to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request(&self, req: &ChatRequest) -> OpenRouterRequest {
        let mut messages = Vec::with_capacity(req.context.len() + 2);
        let system = ChatMessage::system(req.system.as_str());
        for msg in std::iter::once(&system).chain(&req.context) {
            messages.push(OpenRouterMessage {
                role: msg.role.as_str().to_string(),
                content: MessageContent::Text(msg.content.clone()),
            });
        }
        messages.push(OpenRouterMessage {
            role: "user".to_string(),
            content: user_content(&req.message),
        });

        OpenRouterRequest {
            model: self.model.clone(),
            messages,
        }
    }
}

#[async_trait]
impl Transport for OpenRouterClient {
    fn name(&self) -> &str {
        "openrouter"
    }

    async fn complete(&self, req: ChatRequest) -> Result<String, TransportError> {
        let request = self.build_request(&req);
        debug!(
            model = %self.model,
            context = req.context.len(),
            "sending chat completion"
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", req.api_key))
            .header("HTTP-Referer", &self.site_url)
            .header("X-Title", &self.site_name)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(TransportError::Unauthorized);
        }
        if !status.is_success() {
            return Err(TransportError::Status {
                code: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let body: OpenRouterResponse = response
            .json()
            .await
            .map_err(|e| TransportError::Malformed(format!("Invalid response body: {}", e)))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .ok_or_else(|| TransportError::Malformed("Invalid response format from API".to_string()))
    }
}
