//! Structural validation of chat-completion envelopes and decoding of the
//! structured message content.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::provider::{ResponseEnvelope, ResponseSchema, TokenUsage};

/// Compiled form of a caller's response schema.
pub struct SchemaValidator {
    name: String,
    validator: Option<jsonschema::Validator>,
}

impl SchemaValidator {
    /// Compiles the schema when it is strict. A schema that does not compile
    /// is a caller error, not a provider one.
    pub fn compile(schema: &ResponseSchema) -> Result<Self> {
        if schema.name.trim().is_empty() {
            return Err(Error::validation("Response schema name must not be empty"));
        }

        let validator = if schema.strict {
            let compiled = jsonschema::validator_for(&schema.schema).map_err(|e| {
                Error::validation(format!("Response schema '{}' is not a valid JSON schema: {}", schema.name, e))
            })?;
            Some(compiled)
        } else {
            None
        };

        Ok(Self {
            name: schema.name.clone(),
            validator,
        })
    }

    fn check(&self, content: &Value) -> Result<()> {
        let Some(validator) = &self.validator else {
            return Ok(());
        };

        let violations: Vec<String> = validator.iter_errors(content).map(|e| e.to_string()).collect();
        if violations.is_empty() {
            Ok(())
        } else {
            Err(Error::parsing(format!(
                "Content does not match schema '{}': {}",
                self.name,
                violations.join("; ")
            )))
        }
    }
}

/// Validates the envelope shape of a 2xx body and decodes its content into `T`.
pub fn parse_completion<T: DeserializeOwned>(
    body: &str,
    requested_model: &str,
    schema: &SchemaValidator,
) -> Result<ResponseEnvelope<T>> {
    let envelope: Value = serde_json::from_str(body)
        .map_err(|e| Error::parsing(format!("Response body is not JSON: {}", e)))?;

    let content = extract_content(&envelope)?;
    let usage = extract_usage(&envelope)?;
    let model = envelope
        .get("model")
        .and_then(Value::as_str)
        .unwrap_or(requested_model)
        .to_string();

    let value: Value = serde_json::from_str(content)
        .map_err(|e| Error::parsing(format!("Message content is not valid JSON: {}", e)))?;
    schema.check(&value)?;

    let content: T = serde_json::from_value(value)
        .map_err(|e| Error::parsing(format!("Message content has unexpected shape: {}", e)))?;

    debug!(model = %model, total_tokens = usage.total_tokens, "Decoded completion envelope");

    Ok(ResponseEnvelope { model, content, usage })
}

fn extract_content(envelope: &Value) -> Result<&str> {
    let choices = envelope
        .get("choices")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::parsing("Response has no choices array"))?;

    let first = choices.first().ok_or_else(|| Error::parsing("Response choices array is empty"))?;

    first
        .get("message")
        .and_then(|message| message.get("content"))
        .and_then(Value::as_str)
        .ok_or_else(|| Error::parsing("Response message content is not a string"))
}

fn extract_usage(envelope: &Value) -> Result<TokenUsage> {
    let usage = envelope
        .get("usage")
        .filter(|usage| usage.is_object())
        .ok_or_else(|| Error::parsing("Response has no usage object"))?;

    let count = |field: &str| {
        usage
            .get(field)
            .and_then(Value::as_u64)
            .ok_or_else(|| Error::parsing(format!("Response usage.{} is missing or not a number", field)))
    };

    Ok(TokenUsage {
        prompt_tokens: count("prompt_tokens")?,
        completion_tokens: count("completion_tokens")?,
        total_tokens: count("total_tokens")?,
    })
}
