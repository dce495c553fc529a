use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::models::tier::{GenerationParams, TierConfig};

/// One network round trip to the generation provider. Returns the raw status
/// and body; classification happens in the dispatcher.
#[async_trait]
pub trait CompletionTransport: Send + Sync {
    async fn send(&self, payload: &CompletionPayload, metadata: &RequestMetadata) -> Result<TransportResponse>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Correlation data for one logical request. Stable across retries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestMetadata {
    pub user_id: Option<String>,
    pub request_id: String,
    /// Wall-clock milliseconds at the first attempt.
    pub start_time: i64,
}

impl RequestMetadata {
    pub fn new(user_id: Option<String>) -> Self {
        Self {
            user_id,
            request_id: Uuid::new_v4().to_string(),
            start_time: Utc::now().timestamp_millis(),
        }
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }

    pub fn elapsed_ms(&self) -> i64 {
        (Utc::now().timestamp_millis() - self.start_time).max(0)
    }

    pub fn user_label(&self) -> &str {
        self.user_id.as_deref().unwrap_or("unknown")
    }
}

/// Strict structured-output descriptor the provider must conform to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseSchema {
    pub name: String,
    pub strict: bool,
    pub schema: serde_json::Value,
}

impl ResponseSchema {
    pub fn strict(name: impl Into<String>, schema: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            strict: true,
            schema,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope<T> {
    pub model: String,
    pub content: T,
    pub usage: TokenUsage,
}

// Chat-completion request body
#[derive(Debug, Clone, Serialize)]
pub struct CompletionPayload {
    pub model: String,
    pub messages: Vec<PayloadMessage>,
    pub stream: bool,
    #[serde(flatten)]
    pub params: GenerationParams,
    pub response_format: ResponseFormat,
}

impl CompletionPayload {
    pub fn new(tier: &TierConfig, sanitized_prompt: String, schema: &ResponseSchema) -> Self {
        Self {
            model: tier.model.clone(),
            messages: vec![PayloadMessage {
                role: "user".to_string(),
                content: sanitized_prompt,
            }],
            stream: false,
            params: tier.params.clone(),
            response_format: ResponseFormat {
                kind: "json_schema".to_string(),
                json_schema: schema.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PayloadMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub kind: String,
    pub json_schema: ResponseSchema,
}
