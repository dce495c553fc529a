use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use chrono::Utc;
use rand::Rng;
use serde::de::DeserializeOwned;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::models::openai::{HttpTransport, DEFAULT_BASE_URL};
use crate::models::provider::{
    CompletionPayload, CompletionTransport, RequestMetadata, ResponseEnvelope, ResponseSchema,
};
use crate::models::response::{parse_completion, SchemaValidator};
use crate::models::sanitize::Sanitizer;
use crate::models::tier::{self, Complexity, ModelTier, ModelTierTable, Priority, TierConfig};

/// Rough characters-per-token ratio used for the context ceiling check.
const CHARS_PER_TOKEN: usize = 4;
const JITTER_MIN: f64 = 0.8;
const JITTER_MAX: f64 = 1.2;

#[derive(Clone)]
pub struct DispatcherConfig {
    pub api_key: String,
    pub default_model_tier: ModelTier,
    pub timeout_ms: u64,
    pub max_retries: u32,
    pub base_retry_delay_ms: u64,
    pub base_url: String,
    pub model_overrides: BTreeMap<ModelTier, String>,
}

impl DispatcherConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            default_model_tier: ModelTier::Balanced,
            timeout_ms: 60_000,
            max_retries: 3,
            base_retry_delay_ms: 1000,
            base_url: DEFAULT_BASE_URL.to_string(),
            model_overrides: BTreeMap::new(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(Error::validation("API key is required"));
        }
        if self.timeout_ms == 0 {
            return Err(Error::validation("timeout_ms must be greater than zero"));
        }

        let url = url::Url::parse(&self.base_url)
            .map_err(|e| Error::validation(format!("Invalid base URL '{}': {}", self.base_url, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::validation(format!("Base URL must be http or https: {}", self.base_url)));
        }

        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl fmt::Debug for DispatcherConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatcherConfig")
            .field("api_key", &"<redacted>")
            .field("default_model_tier", &self.default_model_tier)
            .field("timeout_ms", &self.timeout_ms)
            .field("max_retries", &self.max_retries)
            .field("base_retry_delay_ms", &self.base_retry_delay_ms)
            .field("base_url", &self.base_url)
            .field("model_overrides", &self.model_overrides)
            .finish()
    }
}

/// Delay before attempt `attempt + 1`: `base_ms * 2^attempt * jitter`, jitter in [0.8, 1.2).
pub fn backoff_delay<R: Rng + ?Sized>(base_ms: u64, attempt: u32, rng: &mut R) -> Duration {
    let jitter: f64 = rng.gen_range(JITTER_MIN..JITTER_MAX);
    let exponential = base_ms as f64 * 2f64.powi(attempt.min(30) as i32);
    Duration::from_secs_f64(exponential * jitter / 1000.0)
}

pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(CHARS_PER_TOKEN)
}

enum AttemptState<T> {
    Attempting(u32),
    Succeeded(ResponseEnvelope<T>),
    FailedPermanently(Error),
}

/// Turns a (prompt, schema) pair into validated structured content.
///
/// Holds no mutable state, so one dispatcher can serve any number of
/// concurrent logical requests.
pub struct RequestDispatcher<T = HttpTransport> {
    config: DispatcherConfig,
    tiers: ModelTierTable,
    sanitizer: Sanitizer,
    transport: T,
}

impl RequestDispatcher<HttpTransport> {
    pub fn new(config: DispatcherConfig) -> Result<Self> {
        config.validate()?;
        let transport = HttpTransport::with_base_url(config.api_key.clone(), config.base_url.clone())?;
        Self::with_transport(config, transport)
    }
}

impl<T: CompletionTransport> RequestDispatcher<T> {
    pub fn with_transport(config: DispatcherConfig, transport: T) -> Result<Self> {
        config.validate()?;
        let tiers = ModelTierTable::with_overrides(&config.model_overrides)?;
        let sanitizer = Sanitizer::new()?;

        info!(
            default_tier = %config.default_model_tier,
            max_retries = config.max_retries,
            timeout_ms = config.timeout_ms,
            "Request dispatcher created"
        );

        Ok(Self {
            config,
            tiers,
            sanitizer,
            transport,
        })
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn select_model_tier(
        text_length: usize,
        complexity: Option<Complexity>,
        priority: Option<Priority>,
    ) -> ModelTier {
        tier::select_model_tier(text_length, complexity, priority)
    }

    pub fn get_model_config(&self, tier: Option<ModelTier>) -> Result<&TierConfig> {
        self.tiers.get(tier.unwrap_or(self.config.default_model_tier))
    }

    /// Tier table entry whose provider model id matches `model`.
    pub fn tier_for_model(&self, model: &str) -> Option<&TierConfig> {
        self.tiers.iter().find(|config| config.model == model)
    }

    pub fn sanitize(&self, text: &str) -> String {
        self.sanitizer.sanitize(text)
    }

    /// Retrying entry point. Attempts are strictly sequential; the last error
    /// is returned unchanged once the retry budget is spent.
    pub async fn dispatch<R: DeserializeOwned>(
        &self,
        prompt: &str,
        schema: &ResponseSchema,
        metadata: &RequestMetadata,
        tier_hint: Option<ModelTier>,
    ) -> Result<ResponseEnvelope<R>> {
        let tier = tier_hint.unwrap_or(self.config.default_model_tier);
        let mut state = AttemptState::Attempting(0);

        loop {
            state = match state {
                AttemptState::Attempting(attempt) => {
                    match self.execute_single_attempt(prompt, schema, metadata, Some(tier)).await {
                        Ok(envelope) => AttemptState::Succeeded(envelope),
                        Err(err) => self.on_attempt_failure(attempt, tier, err, prompt, schema, metadata).await,
                    }
                }
                AttemptState::Succeeded(envelope) => {
                    info!(
                        request_id = %metadata.request_id,
                        model = %envelope.model,
                        total_tokens = envelope.usage.total_tokens,
                        duration_ms = metadata.elapsed_ms(),
                        "Generation request succeeded"
                    );
                    return Ok(envelope);
                }
                AttemptState::FailedPermanently(err) => {
                    self.log_terminal_failure(&err, metadata);
                    return Err(err);
                }
            };
        }
    }

    async fn on_attempt_failure<R: DeserializeOwned>(
        &self,
        attempt: u32,
        tier: ModelTier,
        err: Error,
        prompt: &str,
        schema: &ResponseSchema,
        metadata: &RequestMetadata,
    ) -> AttemptState<R> {
        if !err.is_retryable() {
            return AttemptState::FailedPermanently(err);
        }

        if matches!(err, Error::RateLimit(_)) && tier == ModelTier::Premium {
            info!(
                request_id = %metadata.request_id,
                "Rate limited at premium tier, trying balanced tier"
            );
            match self
                .execute_single_attempt(prompt, schema, metadata, Some(ModelTier::Balanced))
                .await
            {
                Ok(envelope) => return AttemptState::Succeeded(envelope),
                Err(side_err) => warn!(
                    request_id = %metadata.request_id,
                    error_kind = %side_err.kind(),
                    "Balanced-tier side attempt failed, continuing with retry: {}",
                    side_err
                ),
            }
        }

        if attempt >= self.config.max_retries {
            return AttemptState::FailedPermanently(err);
        }

        let delay = backoff_delay(self.config.base_retry_delay_ms, attempt, &mut rand::thread_rng());
        warn!(
            request_id = %metadata.request_id,
            attempt = attempt + 1,
            max_retries = self.config.max_retries,
            error_kind = %err.kind(),
            delay_ms = delay.as_millis() as u64,
            "Attempt failed, retrying: {}",
            err
        );
        sleep(delay).await;

        AttemptState::Attempting(attempt + 1)
    }

    /// One network round trip, no retry logic.
    pub async fn execute_single_attempt<R: DeserializeOwned>(
        &self,
        prompt: &str,
        schema: &ResponseSchema,
        metadata: &RequestMetadata,
        tier: Option<ModelTier>,
    ) -> Result<ResponseEnvelope<R>> {
        let tier_config = self.get_model_config(tier)?;

        if prompt.trim().is_empty() {
            return Err(Error::validation("Prompt must not be empty"));
        }
        let validator = SchemaValidator::compile(schema)?;

        let sanitized = self.sanitizer.sanitize(prompt);
        let estimated = estimate_tokens(&sanitized);
        if estimated > tier_config.context_length {
            return Err(Error::context_limit(estimated, tier_config.context_length, &tier_config.model));
        }

        let payload = CompletionPayload::new(tier_config, sanitized, schema);

        debug!(
            request_id = %metadata.request_id,
            tier = %tier_config.tier,
            model = %tier_config.model,
            estimated_tokens = estimated,
            "Executing attempt"
        );

        // Dropping the send future on expiry aborts the in-flight call; the
        // timer lives inside `timeout` and is released on every path.
        let response = match timeout(self.config.timeout(), self.transport.send(&payload, metadata)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(Error::network(format!(
                    "Request timed out after {}ms",
                    self.config.timeout_ms
                )))
            }
        };

        if !response.is_success() {
            debug!(
                request_id = %metadata.request_id,
                status = response.status,
                body = %response.body,
                "Provider returned error status"
            );
            return Err(match response.status {
                401 => Error::authentication("Provider rejected the API key"),
                429 => Error::rate_limit(format!("Provider rate limited model {}", tier_config.model)),
                status => Error::network(format!("Provider returned HTTP {}", status)),
            });
        }

        parse_completion(&response.body, &tier_config.model, &validator)
    }

    fn log_terminal_failure(&self, err: &Error, metadata: &RequestMetadata) {
        let default_model = self
            .get_model_config(None)
            .map(|config| config.model.as_str())
            .unwrap_or("unknown");

        error!(
            error_kind = %err.kind(),
            error_message = %err,
            timestamp = %Utc::now().to_rfc3339(),
            user_id = %metadata.user_label(),
            request_id = %metadata.request_id,
            model = %default_model,
            elapsed_ms = metadata.elapsed_ms(),
            "Generation request failed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::models::provider::TransportResponse;
    use async_trait::async_trait;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::{json, Value};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays scripted responses and records the model of every call.
    struct ScriptedTransport {
        responses: Mutex<VecDeque<Result<TransportResponse>>>,
        fallback: Option<TransportResponse>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedTransport {
        fn new(responses: Vec<Result<TransportResponse>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                fallback: None,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn always(response: TransportResponse) -> Self {
            Self {
                responses: Mutex::new(VecDeque::new()),
                fallback: Some(response),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CompletionTransport for ScriptedTransport {
        async fn send(&self, payload: &CompletionPayload, _metadata: &RequestMetadata) -> Result<TransportResponse> {
            self.calls.lock().unwrap().push(payload.model.clone());
            let next = self.responses.lock().unwrap().pop_front();
            match next {
                Some(result) => result,
                None => Ok(self.fallback.clone().expect("script exhausted")),
            }
        }
    }

    struct SlowTransport;

    #[async_trait]
    impl CompletionTransport for SlowTransport {
        async fn send(&self, _payload: &CompletionPayload, _metadata: &RequestMetadata) -> Result<TransportResponse> {
            sleep(Duration::from_secs(5)).await;
            Ok(TransportResponse::new(200, ""))
        }
    }

    fn test_config() -> DispatcherConfig {
        let mut config = DispatcherConfig::new("test-key");
        config.base_retry_delay_ms = 1;
        config
    }

    fn schema() -> ResponseSchema {
        ResponseSchema::strict(
            "answer",
            json!({
                "type": "object",
                "properties": { "answer": { "type": "string" } },
                "required": ["answer"],
                "additionalProperties": false
            }),
        )
    }

    fn ok_body(model: &str) -> TransportResponse {
        TransportResponse::new(
            200,
            json!({
                "model": model,
                "choices": [{ "message": { "role": "assistant", "content": r#"{"answer":"chat"}"# } }],
                "usage": { "prompt_tokens": 3, "completion_tokens": 4, "total_tokens": 7 }
            })
            .to_string(),
        )
    }

    fn status(code: u16) -> TransportResponse {
        TransportResponse::new(code, r#"{"error":{"message":"nope"}}"#)
    }

    fn dispatcher(transport: ScriptedTransport) -> RequestDispatcher<ScriptedTransport> {
        RequestDispatcher::with_transport(test_config(), transport).unwrap()
    }

    #[test]
    fn test_config_defaults() {
        let config = DispatcherConfig::new("k");
        assert_eq!(config.default_model_tier, ModelTier::Balanced);
        assert_eq!(config.timeout_ms, 60_000);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.base_retry_delay_ms, 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        assert_eq!(DispatcherConfig::new("  ").validate().unwrap_err().kind(), ErrorKind::Validation);

        let mut config = DispatcherConfig::new("k");
        config.base_url = "not a url".to_string();
        assert!(config.validate().is_err());

        config.base_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_hides_api_key() {
        let config = DispatcherConfig::new("sk-super-secret-value");
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("sk-super-secret-value"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_backoff_delay_within_jitter_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        for base in [1u64, 3, 1000, 1001] {
            for attempt in 0..5u32 {
                let nominal = base as f64 * 2f64.powi(attempt as i32);
                for _ in 0..200 {
                    let delay_ms = backoff_delay(base, attempt, &mut rng).as_secs_f64() * 1000.0;
                    // Duration keeps nanosecond precision.
                    assert!(
                        delay_ms >= nominal * 0.8 - 1e-5,
                        "delay {}ms below bound for base {} attempt {}",
                        delay_ms,
                        base,
                        attempt
                    );
                    assert!(
                        delay_ms < nominal * 1.2 + 1e-5,
                        "delay {}ms above bound for base {} attempt {}",
                        delay_ms,
                        base,
                        attempt
                    );
                }
            }
        }
    }

    #[test]
    fn test_backoff_delay_sub_millisecond_base_is_not_zero() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..1000 {
            assert!(backoff_delay(1, 0, &mut rng) >= Duration::from_micros(799));
        }
    }

    #[test]
    fn test_get_model_config_uses_default_tier() {
        let d = dispatcher(ScriptedTransport::new(vec![]));
        assert_eq!(d.get_model_config(None).unwrap().tier, ModelTier::Balanced);
        for tier in ModelTier::ALL {
            assert_eq!(d.get_model_config(Some(tier)).unwrap().tier, tier);
        }
    }

    #[tokio::test]
    async fn test_authentication_error_short_circuits() {
        let d = dispatcher(ScriptedTransport::always(status(401)));
        let metadata = RequestMetadata::new(None);

        let err = d.dispatch::<Value>("hello", &schema(), &metadata, None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authentication);
        assert_eq!(d.transport().calls().len(), 1);
    }

    #[tokio::test]
    async fn test_persistent_network_failure_exhausts_retries() {
        let d = dispatcher(ScriptedTransport::always(status(503)));
        let metadata = RequestMetadata::new(Some("u1".to_string()));

        let err = d.dispatch::<Value>("hello", &schema(), &metadata, None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);
        assert_eq!(d.transport().calls().len(), 4);
    }

    #[tokio::test]
    async fn test_transport_error_is_retried_then_succeeds() {
        let transport = ScriptedTransport::new(vec![
            Err(Error::network("connection reset")),
            Ok(status(500)),
            Ok(ok_body("gpt-4o")),
        ]);
        let d = dispatcher(transport);
        let metadata = RequestMetadata::new(None);

        let envelope = d.dispatch::<Value>("hello", &schema(), &metadata, None).await.unwrap();
        assert_eq!(envelope.content["answer"], "chat");
        assert_eq!(d.transport().calls().len(), 3);
    }

    #[tokio::test]
    async fn test_malformed_response_is_retried() {
        let transport = ScriptedTransport::new(vec![
            Ok(TransportResponse::new(200, r#"{"choices":[]}"#)),
            Ok(ok_body("gpt-4o")),
        ]);
        let d = dispatcher(transport);
        let metadata = RequestMetadata::new(None);

        let envelope = d.dispatch::<Value>("hello", &schema(), &metadata, None).await.unwrap();
        assert_eq!(envelope.usage.total_tokens, 7);
        assert_eq!(d.transport().calls().len(), 2);
    }

    #[tokio::test]
    async fn test_premium_rate_limit_downgrades_to_balanced() {
        let transport = ScriptedTransport::new(vec![Ok(status(429)), Ok(ok_body("gpt-4o"))]);
        let d = dispatcher(transport);
        let metadata = RequestMetadata::new(None);

        let envelope = d
            .dispatch::<Value>("hello", &schema(), &metadata, Some(ModelTier::Premium))
            .await
            .unwrap();

        assert_eq!(envelope.model, "gpt-4o");
        assert_eq!(d.transport().calls(), vec!["gpt-4.1".to_string(), "gpt-4o".to_string()]);
    }

    #[tokio::test]
    async fn test_failed_side_attempt_falls_through_to_retry() {
        let transport = ScriptedTransport::new(vec![
            Ok(status(429)),
            Ok(status(503)),
            Ok(ok_body("gpt-4.1")),
        ]);
        let d = dispatcher(transport);
        let metadata = RequestMetadata::new(None);

        let envelope = d
            .dispatch::<Value>("hello", &schema(), &metadata, Some(ModelTier::Premium))
            .await
            .unwrap();

        assert_eq!(envelope.model, "gpt-4.1");
        assert_eq!(
            d.transport().calls(),
            vec!["gpt-4.1".to_string(), "gpt-4o".to_string(), "gpt-4.1".to_string()]
        );
    }

    #[tokio::test]
    async fn test_side_attempt_does_not_consume_retry_budget() {
        let transport = ScriptedTransport::new(vec![Ok(status(429)), Ok(ok_body("gpt-4o"))]);
        let mut config = test_config();
        config.max_retries = 0;
        let d = RequestDispatcher::with_transport(config, transport).unwrap();
        let metadata = RequestMetadata::new(None);

        let envelope = d
            .dispatch::<Value>("hello", &schema(), &metadata, Some(ModelTier::Premium))
            .await
            .unwrap();

        assert_eq!(envelope.model, "gpt-4o");
        assert_eq!(d.transport().calls(), vec!["gpt-4.1".to_string(), "gpt-4o".to_string()]);
    }

    #[tokio::test]
    async fn test_failed_side_attempt_keeps_original_rate_limit_error() {
        let transport = ScriptedTransport::new(vec![Ok(status(429)), Ok(status(503))]);
        let mut config = test_config();
        config.max_retries = 0;
        let d = RequestDispatcher::with_transport(config, transport).unwrap();
        let metadata = RequestMetadata::new(None);

        let err = d
            .dispatch::<Value>("hello", &schema(), &metadata, Some(ModelTier::Premium))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::RateLimit);
        assert_eq!(d.transport().calls(), vec!["gpt-4.1".to_string(), "gpt-4o".to_string()]);
    }

    #[tokio::test]
    async fn test_rate_limit_below_premium_has_no_side_attempt() {
        let transport = ScriptedTransport::new(vec![Ok(status(429)), Ok(ok_body("gpt-4o"))]);
        let d = dispatcher(transport);
        let metadata = RequestMetadata::new(None);

        d.dispatch::<Value>("hello", &schema(), &metadata, Some(ModelTier::Balanced))
            .await
            .unwrap();
        assert_eq!(d.transport().calls(), vec!["gpt-4o".to_string(), "gpt-4o".to_string()]);
    }

    #[tokio::test]
    async fn test_exhausted_rate_limit_returns_last_rate_limit_error() {
        let d = dispatcher(ScriptedTransport::always(status(429)));
        let metadata = RequestMetadata::new(None);

        let err = d
            .dispatch::<Value>("hello", &schema(), &metadata, Some(ModelTier::Premium))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RateLimit);
        // Four premium attempts, each followed by one balanced side attempt.
        assert_eq!(d.transport().calls().len(), 8);
    }

    #[tokio::test]
    async fn test_empty_prompt_is_validation_error_without_network() {
        let d = dispatcher(ScriptedTransport::always(ok_body("gpt-4o")));
        let metadata = RequestMetadata::new(None);

        let err = d.dispatch::<Value>("   ", &schema(), &metadata, None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(d.transport().calls().is_empty());
    }

    #[tokio::test]
    async fn test_context_limit_is_not_retried() {
        let d = dispatcher(ScriptedTransport::always(ok_body("gpt-4o")));
        let metadata = RequestMetadata::new(None);
        let prompt = "a".repeat(128_000 * 4 + 8);

        let err = d
            .dispatch::<Value>(&prompt, &schema(), &metadata, Some(ModelTier::Economy))
            .await
            .unwrap_err();
        match err {
            Error::ContextLimit { tokens, limit, .. } => {
                assert_eq!(limit, 128_000);
                assert!(tokens > limit);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(d.transport().calls().is_empty());
    }

    #[tokio::test]
    async fn test_prompt_is_sanitized_before_sending() {
        struct CapturingTransport(Mutex<Option<String>>);

        #[async_trait]
        impl CompletionTransport for CapturingTransport {
            async fn send(&self, payload: &CompletionPayload, _metadata: &RequestMetadata) -> Result<TransportResponse> {
                *self.0.lock().unwrap() = Some(payload.messages[0].content.clone());
                Ok(ok_body("gpt-4o"))
            }
        }

        let d = RequestDispatcher::with_transport(test_config(), CapturingTransport(Mutex::new(None))).unwrap();
        let metadata = RequestMetadata::new(None);
        d.dispatch::<Value>("Translate for jane@example.com", &schema(), &metadata, None)
            .await
            .unwrap();

        let sent = d.transport().0.lock().unwrap().clone().unwrap();
        assert_eq!(sent, "Translate for [REDACTED]");
    }

    #[tokio::test]
    async fn test_timeout_raises_network_error() {
        let mut config = test_config();
        config.timeout_ms = 20;
        let d = RequestDispatcher::with_transport(config, SlowTransport).unwrap();
        let metadata = RequestMetadata::new(None);

        let err = d
            .execute_single_attempt::<Value>("hello", &schema(), &metadata, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);
    }

    #[tokio::test]
    async fn test_single_attempt_status_mapping() {
        let cases = [(401, ErrorKind::Authentication), (429, ErrorKind::RateLimit), (500, ErrorKind::Network), (404, ErrorKind::Network)];
        for (code, kind) in cases {
            let d = dispatcher(ScriptedTransport::always(status(code)));
            let metadata = RequestMetadata::new(None);
            let err = d
                .execute_single_attempt::<Value>("hello", &schema(), &metadata, None)
                .await
                .unwrap_err();
            assert_eq!(err.kind(), kind, "status {}", code);
            assert!(!err.to_string().contains("nope"));
        }
    }
}
