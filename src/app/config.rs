use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tokio::fs;
use tracing::info;

use crate::error::{Error, Result};
use crate::models::dispatcher::DispatcherConfig;
use crate::models::openai::DEFAULT_BASE_URL;
use crate::models::tier::ModelTier;
use crate::platform::SecureStorageManager;

pub const ENV_PREFIX: &str = "CARDGEN";
pub const API_KEY_PROVIDER: &str = "openai";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub dispatcher: DispatcherSettings,
    pub logging: LoggingConfig,
    pub flashcards: FlashcardDefaults,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherSettings {
    /// Prefer the OS keyring; this is mainly for `CARDGEN_DISPATCHER__API_KEY`.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub default_model_tier: ModelTier,
    pub timeout_ms: u64,
    pub max_retries: u32,
    pub base_retry_delay_ms: u64,
    pub base_url: String,
    pub model_overrides: BTreeMap<ModelTier, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FlashcardDefaults {
    pub max_cards: u32,
    pub target_language: Option<String>,
}

impl Default for DispatcherSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            default_model_tier: ModelTier::Balanced,
            timeout_ms: 60_000,
            max_retries: 3,
            base_retry_delay_ms: 1000,
            base_url: DEFAULT_BASE_URL.to_string(),
            model_overrides: BTreeMap::new(),
        }
    }
}

impl std::fmt::Debug for DispatcherSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatcherSettings")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("default_model_tier", &self.default_model_tier)
            .field("timeout_ms", &self.timeout_ms)
            .field("max_retries", &self.max_retries)
            .field("base_retry_delay_ms", &self.base_retry_delay_ms)
            .field("base_url", &self.base_url)
            .field("model_overrides", &self.model_overrides)
            .finish()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_logging: true,
        }
    }
}

impl Default for FlashcardDefaults {
    fn default() -> Self {
        Self {
            max_cards: 10,
            target_language: None,
        }
    }
}

impl AppConfig {
    /// Layered load: defaults, then the TOML file if present, then the
    /// environment (or `env` when given, for tests).
    pub fn load_from(config_file: &Path, env: Option<HashMap<String, String>>) -> Result<Self> {
        let environment = config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .source(env);

        let config: AppConfig = config::Config::builder()
            .add_source(config::File::from(config_file).format(config::FileFormat::Toml).required(false))
            .add_source(environment)
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    pub async fn save(&self, config_file: &Path) -> Result<()> {
        info!("Saving configuration to: {:?}", config_file);

        let config_content = toml::to_string_pretty(self)
            .map_err(|e| Error::configuration(format!("Failed to serialize configuration: {}", e)))?;

        fs::write(config_file, config_content).await?;

        info!("Configuration saved successfully");
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let dispatcher = &self.dispatcher;
        if dispatcher.timeout_ms == 0 {
            return Err(Error::validation("dispatcher.timeout_ms must be greater than zero"));
        }
        if dispatcher.max_retries > 10 {
            return Err(Error::validation("dispatcher.max_retries must be at most 10"));
        }
        if dispatcher.base_retry_delay_ms > 60_000 {
            return Err(Error::validation("dispatcher.base_retry_delay_ms must be at most 60000"));
        }
        url::Url::parse(&dispatcher.base_url)
            .map_err(|e| Error::validation(format!("dispatcher.base_url is invalid: {}", e)))?;

        if self.flashcards.max_cards == 0 || self.flashcards.max_cards > 50 {
            return Err(Error::validation("flashcards.max_cards must be between 1 and 50"));
        }

        Ok(())
    }

    /// Builds the dispatcher configuration, taking the API key from the
    /// settings first and the OS keyring second.
    pub async fn to_dispatcher_config(&self, secure_storage: Option<&SecureStorageManager>) -> Result<DispatcherConfig> {
        let settings = &self.dispatcher;

        let configured = settings.api_key.clone().filter(|key| !key.trim().is_empty());
        let api_key = match (configured, secure_storage) {
            (Some(key), _) => key,
            (None, Some(storage)) => storage.retrieve_api_key(API_KEY_PROVIDER).await?.ok_or_else(|| {
                Error::validation("No API key configured; run `cardgen api-key --set <KEY>`")
            })?,
            (None, None) => return Err(Error::validation("No API key configured")),
        };

        let config = DispatcherConfig {
            api_key,
            default_model_tier: settings.default_model_tier,
            timeout_ms: settings.timeout_ms,
            max_retries: settings.max_retries,
            base_retry_delay_ms: settings.base_retry_delay_ms,
            base_url: settings.base_url.clone(),
            model_overrides: settings.model_overrides.clone(),
        };
        config.validate()?;
        Ok(config)
    }
}
