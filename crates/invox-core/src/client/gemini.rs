//! Google Gemini `generateContent` backend.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use super::{ExtractionBackend, parse_invoice_text};
use crate::error::{ConfigError, ExtractionError, Result};
use crate::models::config::ApiConfig;
use crate::models::invoice::InvoiceData;
use crate::request::ExtractionRequest;
use crate::settings::Settings;

/// Extraction backend calling the Gemini REST API.
pub struct GeminiClient {
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

impl GeminiClient {
    /// Create a client from API configuration.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(ExtractionError::from)?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
        })
    }

    fn url_for(&self, request: &ExtractionRequest) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, request.model.id())
    }
}

#[async_trait]
impl ExtractionBackend for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn extract(
        &self,
        request: &ExtractionRequest,
        settings: &Settings,
    ) -> Result<InvoiceData> {
        let key = settings.credential().ok_or(ConfigError::MissingCredential)?;
        let url = self.url_for(request);

        debug!(
            "Sending {} ({} base64 bytes) to {}",
            request.payload.mime_type,
            request.payload.data.len(),
            request.model
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", key)
            .json(&request.to_body())
            .send()
            .await
            .map_err(ExtractionError::from)?;

        let status = response.status();
        let body = response.text().await.map_err(ExtractionError::from)?;

        if !status.is_success() {
            return Err(ExtractionError::Api {
                status: status.as_u16(),
                message: api_error_message(&body),
            }
            .into());
        }

        let envelope: GenerateContentResponse =
            serde_json::from_str(&body).map_err(|e| ExtractionError::Api {
                status: status.as_u16(),
                message: format!("unexpected response envelope: {}", e),
            })?;

        let text = candidate_text(envelope, status.as_u16())?;
        info!("Received {} characters from {}", text.len(), request.model);

        Ok(parse_invoice_text(&text)?)
    }
}

/// Pull the error message out of an API error body.
fn api_error_message(body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => parsed.error.message,
        Err(_) if body.trim().is_empty() => "empty response body".to_string(),
        Err(_) => body.trim().to_string(),
    }
}

/// Concatenate the text parts of the first candidate.
fn candidate_text(
    response: GenerateContentResponse,
    status: u16,
) -> std::result::Result<String, ExtractionError> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(ExtractionError::Api {
            status,
            message: format!("request blocked by the model: {}", reason),
        });
    }

    let Some(candidate) = response.candidates.into_iter().next() else {
        return Err(ExtractionError::Api {
            status,
            message: "model returned no content".to_string(),
        });
    };

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        let reason = candidate.finish_reason.unwrap_or_else(|| "unknown".to_string());
        return Err(ExtractionError::Api {
            status,
            message: format!("model returned no content (finish reason: {})", reason),
        });
    }

    Ok(text)
}
