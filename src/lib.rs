pub mod app;
pub mod flashcards;
pub mod models;
pub mod platform;
pub mod error;

pub use error::{Error, ErrorKind, Result};
pub use models::{RequestDispatcher, DispatcherConfig, ResponseEnvelope, ResponseSchema, RequestMetadata, ModelTier};
