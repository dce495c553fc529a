use tracing::{info, warn};
use validator::Validate;

use crate::error::{Error, Result};
use crate::flashcards::types::{flashcard_response_schema, FlashcardRequest, FlashcardSet};
use crate::models::openai::HttpTransport;
use crate::models::provider::{CompletionTransport, RequestMetadata, ResponseEnvelope, ResponseSchema};
use crate::models::records::{ErrorLogRecord, GenerationRecord};
use crate::models::dispatcher::RequestDispatcher;
use crate::models::tier::select_model_tier;

/// Result of one flashcard generation, with the record the caller persists.
#[derive(Debug, Clone)]
pub struct FlashcardGeneration {
    pub envelope: ResponseEnvelope<FlashcardSet>,
    pub record: GenerationRecord,
}

/// Turns source text into validated flashcards through the dispatcher.
pub struct FlashcardService<T = HttpTransport> {
    dispatcher: RequestDispatcher<T>,
    schema: ResponseSchema,
}

impl<T: CompletionTransport> FlashcardService<T> {
    pub fn new(dispatcher: RequestDispatcher<T>) -> Self {
        Self {
            dispatcher,
            schema: flashcard_response_schema(),
        }
    }

    pub fn dispatcher(&self) -> &RequestDispatcher<T> {
        &self.dispatcher
    }

    pub async fn generate(&self, request: &FlashcardRequest) -> Result<FlashcardGeneration> {
        let metadata = RequestMetadata::new(request.user_id.clone());
        self.generate_with_metadata(request, &metadata).await
    }

    pub async fn generate_with_metadata(
        &self,
        request: &FlashcardRequest,
        metadata: &RequestMetadata,
    ) -> Result<FlashcardGeneration> {
        request
            .validate()
            .map_err(|e| Error::validation(format!("Invalid flashcard request: {}", e)))?;

        let tier = request.tier.unwrap_or_else(|| {
            select_model_tier(request.source_text.chars().count(), request.complexity, request.priority)
        });

        info!(
            request_id = %metadata.request_id,
            tier = %tier,
            max_cards = request.max_cards,
            "Generating flashcards"
        );

        let prompt = request.build_prompt();
        let envelope: ResponseEnvelope<FlashcardSet> = self
            .dispatcher
            .dispatch(&prompt, &self.schema, metadata, Some(tier))
            .await?;

        envelope
            .content
            .validate()
            .map_err(|e| Error::parsing(format!("Generated flashcards failed validation: {}", e)))?;

        if envelope.content.flashcards.len() > request.max_cards as usize {
            warn!(
                request_id = %metadata.request_id,
                requested = request.max_cards,
                received = envelope.content.flashcards.len(),
                "Provider returned more flashcards than requested"
            );
        }

        // A downgrade side-attempt may have served the request, so price it
        // by the model that actually answered.
        let tier_config = match self.dispatcher.tier_for_model(&envelope.model) {
            Some(config) => config,
            None => self.dispatcher.get_model_config(Some(tier))?,
        };
        let record = GenerationRecord::from_envelope(&envelope, metadata, tier_config);

        Ok(FlashcardGeneration { envelope, record })
    }

    /// Error-log record for a failed generation.
    pub fn error_record(&self, error: &Error, metadata: &RequestMetadata) -> ErrorLogRecord {
        ErrorLogRecord::from_error(error, metadata)
    }
}
