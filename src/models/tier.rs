use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::provider::TokenUsage;

/// Inputs shorter than this never justify more than the economy tier.
pub const SMALL_INPUT_CHARS: usize = 500;
/// Inputs longer than this always go to the premium tier for its context ceiling.
pub const LARGE_INPUT_CHARS: usize = 10_000;

/// Cost/quality preset, ordered by capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    Economy,
    #[default]
    Balanced,
    Premium,
}

impl ModelTier {
    pub const ALL: [ModelTier; 3] = [ModelTier::Economy, ModelTier::Balanced, ModelTier::Premium];

    pub fn as_str(self) -> &'static str {
        match self {
            ModelTier::Economy => "economy",
            ModelTier::Balanced => "balanced",
            ModelTier::Premium => "premium",
        }
    }
}

impl fmt::Display for ModelTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelTier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "economy" => Ok(ModelTier::Economy),
            "balanced" => Ok(ModelTier::Balanced),
            "premium" => Ok(ModelTier::Premium),
            other => Err(Error::validation(format!("Unknown model tier: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Low,
    #[default]
    Medium,
    High,
}

impl FromStr for Complexity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Complexity::Low),
            "medium" => Ok(Complexity::Medium),
            "high" => Ok(Complexity::High),
            other => Err(Error::validation(format!("Unknown complexity: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Speed,
    Cost,
    #[default]
    Quality,
}

impl FromStr for Priority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "speed" => Ok(Priority::Speed),
            "cost" => Ok(Priority::Cost),
            "quality" => Ok(Priority::Quality),
            other => Err(Error::validation(format!("Unknown priority: {}", other))),
        }
    }
}

/// Pick a tier from input size and caller hints. Total over all inputs.
pub fn select_model_tier(
    text_length: usize,
    complexity: Option<Complexity>,
    priority: Option<Priority>,
) -> ModelTier {
    if text_length < SMALL_INPUT_CHARS {
        return ModelTier::Economy;
    }
    if text_length > LARGE_INPUT_CHARS {
        return ModelTier::Premium;
    }

    let high = complexity.unwrap_or_default() == Complexity::High;
    match priority.unwrap_or_default() {
        Priority::Speed => ModelTier::Economy,
        Priority::Cost if high => ModelTier::Balanced,
        Priority::Cost => ModelTier::Economy,
        Priority::Quality if high => ModelTier::Premium,
        Priority::Quality => ModelTier::Balanced,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierConfig {
    pub tier: ModelTier,
    pub model: String,
    pub context_length: usize,
    pub params: GenerationParams,
    pub input_price_per_1k_tokens: Decimal,
    pub output_price_per_1k_tokens: Decimal,
}

impl TierConfig {
    pub fn estimate_cost(&self, usage: &TokenUsage) -> Decimal {
        let input_cost = Decimal::from(usage.prompt_tokens) * self.input_price_per_1k_tokens / Decimal::from(1000);
        let output_cost = Decimal::from(usage.completion_tokens) * self.output_price_per_1k_tokens / Decimal::from(1000);
        input_cost + output_cost
    }
}

/// Immutable tier table. Built once per dispatcher.
#[derive(Debug, Clone)]
pub struct ModelTierTable {
    entries: BTreeMap<ModelTier, TierConfig>,
}

impl ModelTierTable {
    pub fn standard() -> Self {
        let entries = [
            TierConfig {
                tier: ModelTier::Economy,
                model: "gpt-4o-mini".to_string(),
                context_length: 128_000,
                params: GenerationParams {
                    temperature: 0.3,
                    max_tokens: 2000,
                    top_p: 0.9,
                },
                input_price_per_1k_tokens: Decimal::new(15, 5),
                output_price_per_1k_tokens: Decimal::new(6, 4),
            },
            TierConfig {
                tier: ModelTier::Balanced,
                model: "gpt-4o".to_string(),
                context_length: 128_000,
                params: GenerationParams {
                    temperature: 0.5,
                    max_tokens: 4000,
                    top_p: 0.95,
                },
                input_price_per_1k_tokens: Decimal::new(25, 4),
                output_price_per_1k_tokens: Decimal::new(1, 2),
            },
            TierConfig {
                tier: ModelTier::Premium,
                model: "gpt-4.1".to_string(),
                context_length: 1_000_000,
                params: GenerationParams {
                    temperature: 0.7,
                    max_tokens: 8000,
                    top_p: 1.0,
                },
                input_price_per_1k_tokens: Decimal::new(2, 3),
                output_price_per_1k_tokens: Decimal::new(8, 3),
            },
        ]
        .into_iter()
        .map(|config| (config.tier, config))
        .collect();

        Self { entries }
    }

    /// Standard table with provider model ids replaced per tier.
    pub fn with_overrides(overrides: &BTreeMap<ModelTier, String>) -> Result<Self> {
        let mut table = Self::standard();
        for (tier, model) in overrides {
            if model.trim().is_empty() {
                return Err(Error::validation(format!("Model override for tier {} is empty", tier)));
            }
            let entry = table
                .entries
                .get_mut(tier)
                .ok_or_else(|| Error::configuration(format!("No tier table entry for {}", tier)))?;
            entry.model = model.trim().to_string();
        }
        Ok(table)
    }

    pub fn get(&self, tier: ModelTier) -> Result<&TierConfig> {
        self.entries
            .get(&tier)
            .ok_or_else(|| Error::configuration(format!("No tier table entry for {}", tier)))
    }

    pub fn iter(&self) -> impl Iterator<Item = &TierConfig> {
        self.entries.values()
    }
}

impl Default for ModelTierTable {
    fn default() -> Self {
        Self::standard()
    }
}
