pub mod types;
pub mod service;

pub use types::{flashcard_response_schema, CefrLevel, Flashcard, FlashcardRequest, FlashcardSet};
pub use service::{FlashcardGeneration, FlashcardService};
