use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::Validate;

use crate::error::{Error, Result};
use crate::models::provider::ResponseSchema;
use crate::models::tier::{Complexity, ModelTier, Priority};

pub const FLASHCARD_SCHEMA_NAME: &str = "flashcards";

/// Common European Framework of Reference proficiency level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CefrLevel {
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
}

impl CefrLevel {
    pub const ALL: [CefrLevel; 6] = [
        CefrLevel::A1,
        CefrLevel::A2,
        CefrLevel::B1,
        CefrLevel::B2,
        CefrLevel::C1,
        CefrLevel::C2,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CefrLevel::A1 => "A1",
            CefrLevel::A2 => "A2",
            CefrLevel::B1 => "B1",
            CefrLevel::B2 => "B2",
            CefrLevel::C1 => "C1",
            CefrLevel::C2 => "C2",
        }
    }
}

impl fmt::Display for CefrLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CefrLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        CefrLevel::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::validation(format!("Unknown CEFR level: {}", s)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Flashcard {
    #[validate(length(min = 1, max = 500))]
    pub front_content: String,
    #[validate(length(min = 1, max = 2000))]
    pub back_content: String,
    pub cefr_level: CefrLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct FlashcardSet {
    #[validate(length(min = 1), nested)]
    pub flashcards: Vec<Flashcard>,
}

/// Strict response schema for a [`FlashcardSet`].
pub fn flashcard_response_schema() -> ResponseSchema {
    let levels: Vec<&str> = CefrLevel::ALL.iter().map(|level| level.as_str()).collect();

    ResponseSchema::strict(
        FLASHCARD_SCHEMA_NAME,
        json!({
            "type": "object",
            "properties": {
                "flashcards": {
                    "type": "array",
                    "minItems": 1,
                    "items": {
                        "type": "object",
                        "properties": {
                            "front_content": { "type": "string" },
                            "back_content": { "type": "string" },
                            "cefr_level": { "type": "string", "enum": levels }
                        },
                        "required": ["front_content", "back_content", "cefr_level"],
                        "additionalProperties": false
                    }
                }
            },
            "required": ["flashcards"],
            "additionalProperties": false
        }),
    )
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FlashcardRequest {
    #[validate(length(min = 1))]
    pub source_text: String,
    pub target_language: Option<String>,
    #[validate(range(min = 1, max = 50))]
    pub max_cards: u32,
    pub priority: Option<Priority>,
    pub complexity: Option<Complexity>,
    pub tier: Option<ModelTier>,
    pub user_id: Option<String>,
}

impl FlashcardRequest {
    pub fn new(source_text: impl Into<String>) -> Self {
        Self {
            source_text: source_text.into(),
            target_language: None,
            max_cards: 10,
            priority: None,
            complexity: None,
            tier: None,
            user_id: None,
        }
    }

    pub fn with_target_language(mut self, language: impl Into<String>) -> Self {
        self.target_language = Some(language.into());
        self
    }

    pub fn with_max_cards(mut self, max_cards: u32) -> Self {
        self.max_cards = max_cards;
        self
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn build_prompt(&self) -> String {
        let back = match &self.target_language {
            Some(language) => format!("its translation into {}", language),
            None => "a short definition in the same language".to_string(),
        };

        format!(
            "Create up to {max} flashcards from the text below.\n\
             For each flashcard:\n\
             - front_content: a word or phrase taken from the text\n\
             - back_content: {back}\n\
             - cefr_level: the CEFR level (A1, A2, B1, B2, C1 or C2) of the front content\n\
             Respond only with JSON matching the flashcards schema.\n\n\
             Text:\n{text}",
            max = self.max_cards,
            back = back,
            text = self.source_text.trim(),
        )
    }
}
