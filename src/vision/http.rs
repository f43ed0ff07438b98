//! HTTP transports for hosted vision models.

use reqwest::blocking::{Client, RequestBuilder};
use serde_json::{json, Value};
use std::time::Duration;

use super::{ImageDescriber, ImageDescription};
use crate::error::{Error, Result};

const DESCRIBE_PROMPT: &str = "Describe this image in detail for a document search index. \
Focus on the main content, any visible text, charts or diagrams, and key information. \
Answer in 2-3 concise sentences.";

const ANTHROPIC_ENDPOINT: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const ANTHROPIC_MODEL: &str = "claude-3-5-sonnet-20241022";
const ANTHROPIC_MAX_TOKENS: u32 = 500;
const ANTHROPIC_COST: f64 = 0.003;

const OPENAI_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
const OPENAI_MODEL: &str = "gpt-4o";
const OPENAI_MAX_TOKENS: u32 = 300;
const OPENAI_COST: f64 = 0.01;

fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| Error::Vision(format!("Failed to create HTTP client: {}", e)))
}

fn post_json(request: RequestBuilder, body: &Value) -> Result<Value> {
    let response = request
        .json(body)
        .send()
        .map_err(|e| Error::Vision(format!("HTTP request failed: {}", e)))?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(Error::Vision(format!("Request failed ({}): {}", status, body)));
    }

    response
        .json()
        .map_err(|e| Error::Vision(format!("Failed to parse response: {}", e)))
}

fn answer_text(value: Option<&Value>) -> Result<String> {
    value
        .and_then(Value::as_str)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or_else(|| Error::Vision("Response contained no description".to_string()))
}

/// Anthropic Messages API describer.
#[derive(Debug, Clone)]
pub struct AnthropicDescriber {
    client: Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl AnthropicDescriber {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            api_key: api_key.into(),
            model: ANTHROPIC_MODEL.to_string(),
            endpoint: ANTHROPIC_ENDPOINT.to_string(),
        })
    }

    /// Override the model identifier.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the API endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

impl ImageDescriber for AnthropicDescriber {
    fn name(&self) -> &str {
        "claude"
    }

    fn describe(&self, image_base64: &str, mime_type: &str) -> Result<ImageDescription> {
        let body = json!({
            "model": self.model,
            "max_tokens": ANTHROPIC_MAX_TOKENS,
            "messages": [{
                "role": "user",
                "content": [
                    {
                        "type": "image",
                        "source": {
                            "type": "base64",
                            "media_type": mime_type,
                            "data": image_base64,
                        }
                    },
                    { "type": "text", "text": DESCRIBE_PROMPT }
                ]
            }]
        });

        let request = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION);
        let response = post_json(request, &body)?;

        Ok(ImageDescription {
            description: answer_text(response.pointer("/content/0/text"))?,
            model: self.model.clone(),
            cost_estimate: ANTHROPIC_COST,
            cached: false,
            error: None,
        })
    }
}

/// OpenAI chat completions describer.
#[derive(Debug, Clone)]
pub struct OpenAiDescriber {
    client: Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl OpenAiDescriber {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            api_key: api_key.into(),
            model: OPENAI_MODEL.to_string(),
            endpoint: OPENAI_ENDPOINT.to_string(),
        })
    }

    /// Override the model identifier.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the API endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

impl ImageDescriber for OpenAiDescriber {
    fn name(&self) -> &str {
        "gpt4"
    }

    fn describe(&self, image_base64: &str, mime_type: &str) -> Result<ImageDescription> {
        let body = json!({
            "model": self.model,
            "max_tokens": OPENAI_MAX_TOKENS,
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text", "text": DESCRIBE_PROMPT },
                    {
                        "type": "image_url",
                        "image_url": {
                            "url": format!("data:{};base64,{}", mime_type, image_base64)
                        }
                    }
                ]
            }]
        });

        let request = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key);
        let response = post_json(request, &body)?;

        Ok(ImageDescription {
            description: answer_text(response.pointer("/choices/0/message/content"))?,
            model: self.model.clone(),
            cost_estimate: OPENAI_COST,
            cached: false,
            error: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answer_text() {
        let response = json!({"content": [{"type": "text", "text": "  A bar chart.  "}]});
        assert_eq!(
            answer_text(response.pointer("/content/0/text")).unwrap(),
            "A bar chart."
        );
        assert!(answer_text(json!({"content": []}).pointer("/content/0/text")).is_err());
    }

    #[test]
    fn test_unreachable_endpoint_is_error() {
        let describer = AnthropicDescriber::new("key", Duration::from_millis(200))
            .unwrap()
            .with_endpoint("http://127.0.0.1:9/v1/messages");
        let err = describer.describe("aGk=", "image/png").unwrap_err();
        assert!(matches!(err, Error::Vision(_)));
    }
}
