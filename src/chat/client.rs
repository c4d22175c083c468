//! Client for the hosted generative-language endpoint.
//!
//! Behaviour:
//! - Build the system prompt for the optional element context.
//! - Map prior turns to wire messages, append the new user message.
//! - Perform exactly one non-streaming `generateContent` call; no retries.
//! - Return `candidates[0].content.parts[0].text` or a typed error.
//!
//! The caller owns the conversation; this client never mutates it, and callers
//! must not issue a second send for the same conversation while one is pending.

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::catalog::ElementRecord;
use crate::config::{ApiKey, ConfigError, SystemPromptPlacement, UshaConfig};

use super::error::{ChatError, ChatResult};
use super::prompt::build_system_prompt;
use super::turn::ChatTurn;
use super::wire::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Part,
    SystemInstruction,
};

/// Header carrying the credential.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Anything able to answer a chat message.
#[async_trait]
pub trait ChatService: Send + Sync {
    /// Send `text` with the prior conversation and optional element context,
    /// returning the assistant's reply.
    ///
    /// # Errors
    /// `UpstreamUnavailable` on transport or HTTP failure, `MalformedResponse`
    /// when the success body lacks the reply text.
    async fn send_message(
        &self,
        text: &str,
        prior_turns: &[ChatTurn],
        context: Option<&ElementRecord>,
    ) -> ChatResult<String>;
}

/// HTTP client for `models/{model}:generateContent`.
pub struct GeminiClient {
    client: Client,
    endpoint: Url,
    api_key: ApiKey,
    placement: SystemPromptPlacement,
}

impl GeminiClient {
    /// Build a client from validated configuration.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or the HTTP client cannot be built.
    pub fn new(config: &UshaConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint()?,
            api_key: config.api_key.clone(),
            placement: config.system_prompt_placement,
        })
    }

    /// Configured system prompt placement.
    #[must_use]
    pub const fn placement(&self) -> SystemPromptPlacement {
        self.placement
    }

    /// Assemble the request body without sending it.
    #[must_use]
    pub fn build_request(
        &self,
        text: &str,
        prior_turns: &[ChatTurn],
        context: Option<&ElementRecord>,
    ) -> GenerateContentRequest {
        let system_prompt = build_system_prompt(context);
        let mut contents = Vec::with_capacity(prior_turns.len() + 2);

        let system_instruction = match self.placement {
            SystemPromptPlacement::SystemInstruction => Some(SystemInstruction {
                parts: vec![Part {
                    text: system_prompt,
                }],
            }),
            SystemPromptPlacement::LeadingUserMessage => {
                contents.push(Content::user_text(system_prompt));
                None
            }
        };

        contents.extend(prior_turns.iter().map(Content::from));
        contents.push(Content::user_text(text));

        GenerateContentRequest {
            contents,
            system_instruction,
            generation_config: GenerationConfig::default(),
        }
    }
}

#[async_trait]
impl ChatService for GeminiClient {
    async fn send_message(
        &self,
        text: &str,
        prior_turns: &[ChatTurn],
        context: Option<&ElementRecord>,
    ) -> ChatResult<String> {
        let request = self.build_request(text, prior_turns, context);

        tracing::info!(
            history = prior_turns.len(),
            element = context.map(|e| e.name.as_str()),
            placement = ?self.placement,
            "Sending chat message upstream"
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .header(API_KEY_HEADER, self.api_key.expose())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Upstream transport error: {e}");
                ChatError::from(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), %body, "Upstream API error");
            return Err(ChatError::UpstreamUnavailable {
                status: Some(status.as_u16()),
                message: format!("API error: {status}"),
            });
        }

        let body = response.text().await.map_err(|e| {
            tracing::error!("Upstream body read failed: {e}");
            ChatError::from(e)
        })?;

        let parsed: GenerateContentResponse = serde_json::from_str(&body).map_err(|e| {
            tracing::warn!(%body, "Malformed upstream response: not JSON ({e})");
            ChatError::MalformedResponse(e.to_string())
        })?;

        parsed.first_text().ok_or_else(|| {
            tracing::warn!(%body, "Malformed upstream response: no candidate text");
            ChatError::MalformedResponse(
                "missing candidates[0].content.parts[0].text".to_string(),
            )
        })
    }
}
