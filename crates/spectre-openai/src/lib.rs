// SPDX-FileCopyrightText: 2026 Spectre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI-compatible collaborators for Spectre.
//!
//! [`OpenAiProvider`] answers model requests and [`OpenAiCaptioner`]
//! describes images, both over the Chat Completions API. Any server that
//! speaks that API (OpenAI, vLLM, Ollama's compatibility layer) works.

pub mod client;
pub mod images;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use spectre_config::model::{CaptionerConfig, ProviderConfig};
use spectre_core::{ImageCaptioner, ModelProvider, ModelRequest, SpectreError};
use tracing::{debug, warn};

pub use client::OpenAiClient;

use crate::images::image_url_for;
use crate::types::{ChatMessage, ChatRequest, ContentPart, ImageUrl, MessageContent};

/// Model provider backed by a Chat Completions endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    client: OpenAiClient,
}

impl OpenAiProvider {
    pub fn new(client: OpenAiClient) -> Self {
        Self { client }
    }

    pub fn from_config(config: &ProviderConfig) -> Result<Self, SpectreError> {
        let client = OpenAiClient::new(
            &config.base_url,
            config.api_key.as_deref(),
            config.model.clone(),
            Duration::from_secs(config.timeout_secs),
        )?
        .with_max_retries(config.max_retries);
        Ok(Self::new(client))
    }

    /// Encode `request` as Chat Completions messages: system prompt, seed
    /// turns, then the user prompt with any images attached.
    pub async fn messages_for(request: &ModelRequest) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(request.contexts.len() + 2);
        if !request.system_prompt.is_empty() {
            messages.push(ChatMessage::text("system", &request.system_prompt));
        }
        for turn in &request.contexts {
            messages.push(ChatMessage::text(turn.role.to_string(), &turn.content));
        }

        let mut parts = Vec::new();
        for reference in &request.image_urls {
            if let Some(url) = image_url_for(reference).await {
                parts.push(ContentPart::ImageUrl {
                    image_url: ImageUrl { url },
                });
            }
        }
        let content = if parts.is_empty() {
            MessageContent::Text(request.prompt.clone())
        } else {
            parts.insert(
                0,
                ContentPart::Text {
                    text: request.prompt.clone(),
                },
            );
            MessageContent::Parts(parts)
        };
        messages.push(ChatMessage {
            role: "user".into(),
            content,
        });
        messages
    }
}

#[async_trait]
impl ModelProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn invoke(&self, request: ModelRequest) -> Result<String, SpectreError> {
        if request.use_tools {
            debug!("tool use requested; this provider sends no tool definitions");
        }
        let body = ChatRequest {
            model: self.client.model().to_string(),
            messages: Self::messages_for(&request).await,
            max_tokens: None,
        };
        let response = self.client.complete(&body).await?;
        response
            .first_text()
            .map(str::to_string)
            .ok_or_else(|| SpectreError::Provider {
                message: "response contained no text".into(),
                source: None,
            })
    }
}

/// Image captioner backed by a vision-capable Chat Completions model.
#[derive(Debug, Clone)]
pub struct OpenAiCaptioner {
    client: OpenAiClient,
    system_prompt: String,
}

impl OpenAiCaptioner {
    pub fn new(client: OpenAiClient, system_prompt: impl Into<String>) -> Self {
        Self {
            client,
            system_prompt: system_prompt.into(),
        }
    }

    /// Endpoint and key fall back to the provider's when not set.
    pub fn from_config(
        config: &CaptionerConfig,
        provider: &ProviderConfig,
    ) -> Result<Self, SpectreError> {
        let base_url = config.base_url.as_deref().unwrap_or(&provider.base_url);
        let api_key = config.api_key.as_deref().or(provider.api_key.as_deref());
        let client = OpenAiClient::new(
            base_url,
            api_key,
            config.model.clone(),
            Duration::from_secs(config.timeout_secs),
        )?;
        Ok(Self::new(client, config.system_prompt.clone()))
    }
}

#[async_trait]
impl ImageCaptioner for OpenAiCaptioner {
    async fn caption(&self, image: &str) -> Result<Option<String>, SpectreError> {
        let Some(url) = image_url_for(image).await else {
            return Ok(None);
        };
        let body = ChatRequest {
            model: self.client.model().to_string(),
            messages: vec![
                ChatMessage::text("system", &self.system_prompt),
                ChatMessage {
                    role: "user".into(),
                    content: MessageContent::Parts(vec![ContentPart::ImageUrl {
                        image_url: ImageUrl { url },
                    }]),
                },
            ],
            max_tokens: Some(300),
        };

        let response = self.client.complete(&body).await.map_err(|e| {
            warn!(error = %e, "caption request failed");
            SpectreError::Captioner {
                message: e.to_string(),
                source: Some(Box::new(e)),
            }
        })?;
        Ok(response
            .first_text()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string))
    }
}
