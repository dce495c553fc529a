pub mod provider;
pub mod openai;
pub mod tier;
pub mod sanitize;
pub mod response;
pub mod dispatcher;
pub mod records;

pub use provider::{
    CompletionTransport, CompletionPayload, TransportResponse, RequestMetadata,
    ResponseSchema, ResponseEnvelope, TokenUsage
};
pub use tier::{select_model_tier, Complexity, ModelTier, ModelTierTable, Priority, TierConfig, GenerationParams};
pub use sanitize::Sanitizer;
pub use dispatcher::{backoff_delay, DispatcherConfig, RequestDispatcher};
pub use records::{ErrorLogRecord, GenerationRecord};
pub use openai::HttpTransport;
