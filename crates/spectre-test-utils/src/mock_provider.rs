// SPDX-FileCopyrightText: 2026 Spectre Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock model provider and captioner.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use spectre_core::{ImageCaptioner, ModelProvider, ModelRequest, SpectreError};
use tokio::sync::{Mutex, Notify};

/// A model provider that returns pre-configured responses.
///
/// Responses are popped from a FIFO queue. When the queue is empty a
/// default "mock response" text is returned. Every request is recorded.
pub struct MockProvider {
    responses: Arc<Mutex<VecDeque<Result<String, String>>>>,
    requests: Arc<Mutex<Vec<ModelRequest>>>,
    gate: Option<Arc<Notify>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            gate: None,
        }
    }

    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into_iter().map(Ok).collect())),
            ..Self::new()
        }
    }

    /// Hold every call until `gate` is notified.
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub async fn add_response(&self, text: impl Into<String>) {
        self.responses.lock().await.push_back(Ok(text.into()));
    }

    /// Queue a failure for the next call.
    pub async fn add_failure(&self, message: impl Into<String>) {
        self.responses.lock().await.push_back(Err(message.into()));
    }

    /// Requests received so far, oldest first.
    pub async fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.requests.lock().await.len()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModelProvider for MockProvider {
    fn name(&self) -> &str {
        "mock-provider"
    }

    async fn invoke(&self, request: ModelRequest) -> Result<String, SpectreError> {
        self.requests.lock().await.push(request);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        match self.responses.lock().await.pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(SpectreError::Provider {
                message,
                source: None,
            }),
            None => Ok("mock response".to_string()),
        }
    }
}

/// A captioner answering from a fixed table. Unknown images fail.
#[derive(Default)]
pub struct MockCaptioner {
    captions: HashMap<String, String>,
}

impl MockCaptioner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_caption(mut self, image: impl Into<String>, caption: impl Into<String>) -> Self {
        self.captions.insert(image.into(), caption.into());
        self
    }
}

#[async_trait]
impl ImageCaptioner for MockCaptioner {
    async fn caption(&self, image: &str) -> Result<Option<String>, SpectreError> {
        match self.captions.get(image) {
            Some(caption) => Ok(Some(caption.clone())),
            None => Err(SpectreError::Captioner {
                message: format!("no caption for {image}"),
                source: None,
            }),
        }
    }
}
