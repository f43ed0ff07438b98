//! Natural-language image descriptions from an external vision service.
//!
//! Every request is bounded by a timeout and can be cancelled. Errors,
//! timeouts and cancellations all degrade to a placeholder description, so
//! callers always receive an [`ImageDescription`].

mod cancel;
#[cfg(feature = "vision-http")]
mod http;

pub use cancel::CancelToken;
#[cfg(feature = "vision-http")]
pub use http::{AnthropicDescriber, OpenAiDescriber};

use crossbeam_channel::{after, bounded, select};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::error::{Error, Result};

/// Environment variable holding the Anthropic API key.
pub const ANTHROPIC_KEY_VAR: &str = "ANTHROPIC_API_KEY";
/// Environment variable holding the OpenAI API key.
pub const OPENAI_KEY_VAR: &str = "OPENAI_API_KEY";
/// Environment variable holding the Google API key.
pub const GOOGLE_KEY_VAR: &str = "GOOGLE_API_KEY";

/// Model identifier recorded for placeholder descriptions.
pub const FALLBACK_MODEL: &str = "fallback";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Vision service selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisionProvider {
    /// Pick the first provider with credentials in the environment
    #[default]
    Auto,
    Claude,
    Gpt4,
    Gemini,
    /// Placeholder descriptions only
    Local,
}

impl VisionProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            VisionProvider::Auto => "auto",
            VisionProvider::Claude => "claude",
            VisionProvider::Gpt4 => "gpt4",
            VisionProvider::Gemini => "gemini",
            VisionProvider::Local => "local",
        }
    }

    /// Resolve `Auto` against the process environment.
    pub fn resolve(self) -> VisionProvider {
        self.resolve_with(|key| std::env::var(key).ok())
    }

    /// Resolve `Auto` with a custom variable lookup.
    ///
    /// Anthropic credentials win over OpenAI, which win over Google. With no
    /// credentials the local placeholder provider is used.
    pub fn resolve_with<F>(self, lookup: F) -> VisionProvider
    where
        F: Fn(&str) -> Option<String>,
    {
        if self != VisionProvider::Auto {
            return self;
        }
        let has = |key: &str| lookup(key).is_some_and(|v| !v.trim().is_empty());
        if has(ANTHROPIC_KEY_VAR) {
            VisionProvider::Claude
        } else if has(OPENAI_KEY_VAR) {
            VisionProvider::Gpt4
        } else if has(GOOGLE_KEY_VAR) {
            VisionProvider::Gemini
        } else {
            VisionProvider::Local
        }
    }
}

impl fmt::Display for VisionProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VisionProvider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(VisionProvider::Auto),
            "claude" | "anthropic" => Ok(VisionProvider::Claude),
            "gpt4" | "gpt-4" | "openai" => Ok(VisionProvider::Gpt4),
            "gemini" | "google" => Ok(VisionProvider::Gemini),
            "local" | "none" => Ok(VisionProvider::Local),
            other => Err(Error::Vision(format!("Unknown vision provider: {}", other))),
        }
    }
}

/// Vision service options.
#[derive(Debug, Clone)]
pub struct VisionOptions {
    pub provider: VisionProvider,

    /// Upper bound on one description request
    pub timeout: Duration,

    /// Override of the provider's default model
    pub model: Option<String>,
}

impl VisionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the provider.
    pub fn with_provider(mut self, provider: VisionProvider) -> Self {
        self.provider = provider;
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the model identifier.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

impl Default for VisionOptions {
    fn default() -> Self {
        Self {
            provider: VisionProvider::Auto,
            timeout: DEFAULT_TIMEOUT,
            model: None,
        }
    }
}

/// Result of one description request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageDescription {
    pub description: String,

    /// Model identifier, [`FALLBACK_MODEL`] for placeholders
    pub model: String,

    /// Estimated cost in USD
    pub cost_estimate: f64,

    pub cached: bool,

    /// Why the placeholder was used, if it was
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ImageDescription {
    /// Placeholder description for an image of the given MIME type.
    pub fn placeholder(mime_type: &str) -> Self {
        Self {
            description: format!("Image element (type: {})", mime_type),
            model: FALLBACK_MODEL.to_string(),
            cost_estimate: 0.0,
            cached: false,
            error: None,
        }
    }

    /// Placeholder carrying the failure that caused it.
    pub fn placeholder_after(mime_type: &str, error: &Error) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::placeholder(mime_type)
        }
    }

    /// Check if this is a placeholder rather than a service answer.
    pub fn is_placeholder(&self) -> bool {
        self.model == FALLBACK_MODEL
    }
}

/// A service that turns an image into a text description.
pub trait ImageDescriber: Send + Sync {
    /// Short provider name used in logs.
    fn name(&self) -> &str;

    /// Describe a base64-encoded image.
    fn describe(&self, image_base64: &str, mime_type: &str) -> Result<ImageDescription>;
}

/// Describer that never calls out and always yields the placeholder.
#[derive(Debug, Clone, Default)]
pub struct LocalDescriber;

impl ImageDescriber for LocalDescriber {
    fn name(&self) -> &str {
        "local"
    }

    fn describe(&self, _image_base64: &str, mime_type: &str) -> Result<ImageDescription> {
        Ok(ImageDescription::placeholder(mime_type))
    }
}

/// Run a describer on a worker thread, bounded by a timeout and a cancel token.
///
/// A worker that outlives the timeout is detached; its late result is dropped.
pub fn describe_with_timeout(
    describer: Arc<dyn ImageDescriber>,
    image_base64: &str,
    mime_type: &str,
    timeout: Duration,
    cancel: &CancelToken,
) -> Result<ImageDescription> {
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }

    let (tx, rx) = bounded(1);
    let data = image_base64.to_string();
    let mime = mime_type.to_string();
    thread::Builder::new()
        .name(format!("vision-{}", describer.name()))
        .spawn(move || {
            let _ = tx.send(describer.describe(&data, &mime));
        })?;

    select! {
        recv(rx) -> result => match result {
            Ok(result) => result,
            Err(_) => Err(Error::Vision("vision worker exited without a result".to_string())),
        },
        recv(cancel.signal()) -> _ => Err(Error::Cancelled),
        recv(after(timeout)) -> _ => Err(Error::Timeout(timeout.as_millis() as u64)),
    }
}

/// Vision client used by the exporters.
#[derive(Clone)]
pub struct VisionClient {
    describer: Arc<dyn ImageDescriber>,
    timeout: Duration,
    cancel: CancelToken,
}

impl VisionClient {
    /// Wrap an arbitrary describer.
    pub fn new(describer: Arc<dyn ImageDescriber>, timeout: Duration) -> Self {
        Self {
            describer,
            timeout,
            cancel: CancelToken::new(),
        }
    }

    /// Client that only produces placeholders.
    pub fn local() -> Self {
        Self::new(Arc::new(LocalDescriber), DEFAULT_TIMEOUT)
    }

    /// Build a client for the configured provider, reading credentials from
    /// the environment.
    ///
    /// Providers without credentials or without a transport fall back to the
    /// local placeholder describer.
    pub fn from_options(options: &VisionOptions) -> Self {
        let provider = options.provider.resolve();
        debug!("Vision provider resolved to {}", provider);
        let describer = Self::describer_for(provider, options).unwrap_or_else(|e| {
            warn!("Vision provider {} unavailable: {}", provider, e);
            Arc::new(LocalDescriber)
        });
        Self::new(describer, options.timeout)
    }

    #[cfg(feature = "vision-http")]
    fn describer_for(
        provider: VisionProvider,
        options: &VisionOptions,
    ) -> Result<Arc<dyn ImageDescriber>> {
        let key = |var: &str| {
            std::env::var(var)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| Error::Unavailable(format!("{} is not set", var)))
        };
        match provider {
            VisionProvider::Claude => {
                let mut describer = AnthropicDescriber::new(key(ANTHROPIC_KEY_VAR)?, options.timeout)?;
                if let Some(model) = &options.model {
                    describer = describer.with_model(model.clone());
                }
                Ok(Arc::new(describer))
            }
            VisionProvider::Gpt4 => {
                let mut describer = OpenAiDescriber::new(key(OPENAI_KEY_VAR)?, options.timeout)?;
                if let Some(model) = &options.model {
                    describer = describer.with_model(model.clone());
                }
                Ok(Arc::new(describer))
            }
            VisionProvider::Gemini => Err(Error::Unavailable(
                "no Gemini transport is available".to_string(),
            )),
            VisionProvider::Auto | VisionProvider::Local => Ok(Arc::new(LocalDescriber)),
        }
    }

    #[cfg(not(feature = "vision-http"))]
    fn describer_for(
        provider: VisionProvider,
        _options: &VisionOptions,
    ) -> Result<Arc<dyn ImageDescriber>> {
        match provider {
            VisionProvider::Auto | VisionProvider::Local => Ok(Arc::new(LocalDescriber)),
            other => Err(Error::Unavailable(format!(
                "{} requires the vision-http feature",
                other
            ))),
        }
    }

    /// Share a cancel token with this client.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Token that cancels this client's pending and future requests.
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Name of the underlying describer.
    pub fn provider_name(&self) -> &str {
        self.describer.name()
    }

    /// Describe an image. Failures yield the placeholder description.
    pub fn describe(&self, image_base64: &str, mime_type: &str) -> ImageDescription {
        match describe_with_timeout(
            Arc::clone(&self.describer),
            image_base64,
            mime_type,
            self.timeout,
            &self.cancel,
        ) {
            Ok(description) => description,
            Err(e) => {
                warn!("Image description via {} failed: {}", self.describer.name(), e);
                ImageDescription::placeholder_after(mime_type, &e)
            }
        }
    }
}

impl fmt::Debug for VisionClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VisionClient")
            .field("describer", &self.describer.name())
            .field("timeout", &self.timeout)
            .finish()
    }
}
