mod cli;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, error, info};

use cardgen::app::config::API_KEY_PROVIDER;
use cardgen::app::{init_logging, AppConfig};
use cardgen::flashcards::{FlashcardRequest, FlashcardService};
use cardgen::models::{select_model_tier, Complexity, ModelTier, Priority, RequestDispatcher, RequestMetadata, Sanitizer};
use cardgen::platform::{AppPaths, SecureStorageManager};

use crate::cli::{Cli, Commands};

fn parse_opt<T: std::str::FromStr<Err = cardgen::Error>>(value: Option<&str>) -> anyhow::Result<Option<T>> {
    value.map(str::parse).transpose().map_err(anyhow::Error::from)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let paths = AppPaths::new()?;
    paths.ensure_dirs_exist()?;

    let config_file = cli.config_file(paths.config_file());
    let config = AppConfig::load_from(&config_file, None)?;

    let _log_guard = init_logging(&config.logging, Some(&paths.logs_dir()), cli.debug)?;
    info!("Starting cardgen {}", env!("CARGO_PKG_VERSION"));
    if config_file.exists() {
        info!("Loaded configuration from: {:?}", config_file);
    } else {
        debug!("Config file {:?} not found, using defaults", config_file);
    }

    match cli.command {
        Commands::Generate {
            text,
            file,
            language,
            max_cards,
            tier,
            priority,
            complexity,
            user,
        } => {
            let source_text = match (text, file) {
                (Some(text), _) => text,
                (None, Some(path)) => tokio::fs::read_to_string(&path)
                    .await
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                (None, None) => anyhow::bail!("Provide --text or --file"),
            };

            let storage = SecureStorageManager::new()?;
            let dispatcher_config = config.to_dispatcher_config(Some(&storage)).await?;
            let service = FlashcardService::new(RequestDispatcher::new(dispatcher_config)?);

            let mut request = FlashcardRequest::new(source_text)
                .with_max_cards(max_cards.unwrap_or(config.flashcards.max_cards));
            request.target_language = language.or_else(|| config.flashcards.target_language.clone());
            request.tier = parse_opt::<ModelTier>(tier.as_deref())?;
            request.priority = parse_opt::<Priority>(priority.as_deref())?;
            request.complexity = parse_opt::<Complexity>(complexity.as_deref())?;
            request.user_id = user;

            let metadata = RequestMetadata::new(request.user_id.clone());
            match service.generate_with_metadata(&request, &metadata).await {
                Ok(generation) => {
                    println!("{}", serde_json::to_string_pretty(&generation.envelope.content)?);
                    info!(
                        model = %generation.record.model,
                        total_tokens = generation.record.usage.total_tokens,
                        estimated_cost = %generation.record.estimated_cost,
                        "Generated {} flashcards",
                        generation.envelope.content.flashcards.len()
                    );
                }
                Err(e) => {
                    let record = service.error_record(&e, &metadata);
                    error!(kind = %record.kind, request_id = %record.request_id, "Generation failed");
                    anyhow::bail!("{}: {}", record.kind, record.message);
                }
            }
        }

        Commands::Tier {
            length,
            priority,
            complexity,
        } => {
            let tier = select_model_tier(
                length,
                parse_opt::<Complexity>(complexity.as_deref())?,
                parse_opt::<Priority>(priority.as_deref())?,
            );
            println!("{}", tier);
        }

        Commands::Redact { text } => {
            let sanitizer = Sanitizer::new()?;
            println!("{}", sanitizer.sanitize(&text));
        }

        Commands::ApiKey { set, remove } => {
            let storage = SecureStorageManager::new()?;
            if let Some(key) = set {
                storage.store_api_key(API_KEY_PROVIDER, &key).await?;
                println!("API key stored");
            } else if remove {
                storage.delete_api_key(API_KEY_PROVIDER).await?;
                println!("API key removed");
            } else {
                let status = match storage.retrieve_api_key(API_KEY_PROVIDER).await? {
                    Some(_) => "configured",
                    None => "not configured",
                };
                println!("API key: {}", status);
            }
        }

        Commands::InitConfig { force } => {
            if config_file.exists() && !force {
                anyhow::bail!("{} already exists (use --force to overwrite)", config_file.display());
            }
            AppConfig::default().save(&config_file).await?;
            println!("Wrote {}", config_file.display());
        }
    }

    Ok(())
}
