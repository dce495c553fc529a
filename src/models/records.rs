use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Error, ErrorKind};
use crate::models::provider::{RequestMetadata, ResponseEnvelope, TokenUsage};
use crate::models::tier::TierConfig;

/// What the caller persists after a successful logical request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRecord {
    pub request_id: String,
    pub user_id: Option<String>,
    pub model: String,
    pub duration_ms: i64,
    pub usage: TokenUsage,
    pub estimated_cost: Decimal,
    pub created_at: DateTime<Utc>,
}

impl GenerationRecord {
    pub fn from_envelope<T>(envelope: &ResponseEnvelope<T>, metadata: &RequestMetadata, tier: &TierConfig) -> Self {
        Self {
            request_id: metadata.request_id.clone(),
            user_id: metadata.user_id.clone(),
            model: envelope.model.clone(),
            duration_ms: metadata.elapsed_ms(),
            usage: envelope.usage.clone(),
            estimated_cost: tier.estimate_cost(&envelope.usage),
            created_at: Utc::now(),
        }
    }
}

/// What the caller persists after a failed logical request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorLogRecord {
    pub request_id: String,
    pub user_id: Option<String>,
    pub kind: ErrorKind,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl ErrorLogRecord {
    pub fn from_error(error: &Error, metadata: &RequestMetadata) -> Self {
        Self {
            request_id: metadata.request_id.clone(),
            user_id: metadata.user_id.clone(),
            kind: error.kind(),
            message: error.to_string(),
            timestamp: Utc::now(),
        }
    }
}
