use async_trait::async_trait;
use reqwest::{Client, header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE}};
use std::time::Instant;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::provider::{CompletionPayload, CompletionTransport, RequestMetadata, TransportResponse};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// OpenAI-compatible chat-completion transport over reqwest.
pub struct HttpTransport {
    client: Client,
    api_key: String,
    base_url: String,
}

impl HttpTransport {
    pub fn new(api_key: String) -> Result<Self> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL.to_string())
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Result<Self> {
        // The dispatcher enforces the per-attempt timeout.
        let client = Client::builder()
            .build()
            .map_err(|e| Error::configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn create_headers(&self, metadata: &RequestMetadata) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();

        let mut auth_value = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|_| Error::validation("API key contains characters not allowed in a header"))?;
        auth_value.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_value);

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let request_id = HeaderValue::from_str(&metadata.request_id)
            .map_err(|_| Error::validation(format!("Request id {:?} is not a valid header value", metadata.request_id)))?;
        headers.insert(HeaderName::from_static(REQUEST_ID_HEADER), request_id);

        Ok(headers)
    }
}

#[async_trait]
impl CompletionTransport for HttpTransport {
    async fn send(&self, payload: &CompletionPayload, metadata: &RequestMetadata) -> Result<TransportResponse> {
        let headers = self.create_headers(metadata)?;

        debug!(
            request_id = %metadata.request_id,
            model = %payload.model,
            "Sending chat completion request"
        );

        let start_time = Instant::now();

        let response = self.client
            .post(self.endpoint())
            .headers(headers)
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                warn!(request_id = %metadata.request_id, "HTTP request failed: {}", e);
                Error::network(format!("HTTP request failed: {}", e.without_url()))
            })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| Error::network(format!("Failed to read response body: {}", e.without_url())))?;

        debug!(
            request_id = %metadata.request_id,
            status,
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "Chat completion request completed"
        );

        Ok(TransportResponse { status, body })
    }
}
