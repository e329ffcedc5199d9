use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info};

use crate::error::{AnalystError, Result};
use crate::qa::CompletionService;
use crate::settings::Settings;

pub struct GeminiClient {
    http: reqwest::blocking::Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
}

/// Read the API key named by `settings.api_key_env`. Absent or blank keys are
/// a configuration error.
pub fn api_key(settings: &Settings) -> Result<String> {
    match std::env::var(&settings.api_key_env) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(AnalystError::Config(format!(
            "{} não encontrada no ambiente ou no arquivo .env",
            settings.api_key_env
        ))),
    }
}

impl GeminiClient {
    pub fn new(api_key: String, settings: &Settings) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| AnalystError::Config(format!("cannot build HTTP client: {e}")))?;
        Ok(Self {
            http,
            api_key,
            base_url: settings.api_base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            temperature: settings.temperature,
        })
    }

    pub fn from_env(settings: &Settings) -> Result<Self> {
        Self::new(api_key(settings)?, settings)
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }
}

/// Extract the answer text from a `generateContent` response body.
pub fn extract_text(body: &Value) -> Result<String> {
    if let Some(error) = body.get("error") {
        let msg = error
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Err(AnalystError::Remote(msg));
    }
    if let Some(reason) = body
        .pointer("/promptFeedback/blockReason")
        .and_then(|r| r.as_str())
    {
        return Err(AnalystError::Remote(format!("prompt blocked: {reason}")));
    }

    let candidate = body
        .get("candidates")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .ok_or_else(|| AnalystError::Remote(format!("no candidates in response: {body}")))?;

    let text: String = candidate
        .pointer("/content/parts")
        .and_then(|p| p.as_array())
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
                .collect()
        })
        .unwrap_or_default();

    if text.is_empty() {
        let reason = candidate
            .get("finishReason")
            .and_then(|r| r.as_str())
            .unwrap_or("unknown");
        return Err(AnalystError::Remote(format!(
            "empty answer (finish reason: {reason})"
        )));
    }
    Ok(text)
}

impl CompletionService for GeminiClient {
    fn complete(&self, prompt: &str) -> Result<String> {
        let body = serde_json::json!({
            "contents": [{"role": "user", "parts": [{"text": prompt}]}],
            "generationConfig": {"temperature": self.temperature},
        });

        info!(model = %self.model, "calling completion endpoint");
        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .map_err(|e| AnalystError::Remote(format!("request failed: {e}")))?;

        let status = response.status();
        debug!(%status, "completion response");
        if !status.is_success() {
            let error_text = response
                .text()
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AnalystError::Remote(format!("API error ({status}): {error_text}")));
        }

        let json: Value = response
            .json()
            .map_err(|e| AnalystError::Remote(format!("invalid response body: {e}")))?;
        extract_text(&json)
    }
}
