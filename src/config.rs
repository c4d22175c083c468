//! Runtime configuration for the Usha service.
//!
//! Values come from environment variables. The upstream credential is
//! mandatory: without it the service refuses to start instead of sending
//! unauthenticated requests.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Primary credential variable.
pub const API_KEY_ENV: &str = "USHA_GEMINI_API_KEY";
/// Fallback credential variable.
pub const API_KEY_FALLBACK_ENV: &str = "GEMINI_API_KEY";
/// Base URL override.
pub const BASE_URL_ENV: &str = "USHA_GEMINI_BASE_URL";
/// Model override.
pub const MODEL_ENV: &str = "USHA_GEMINI_MODEL";
/// System prompt placement override.
pub const PLACEMENT_ENV: &str = "USHA_SYSTEM_PROMPT_PLACEMENT";
/// Request timeout in seconds.
pub const TIMEOUT_ENV: &str = "USHA_REQUEST_TIMEOUT_SECS";
/// Listening port.
pub const PORT_ENV: &str = "USHA_PORT";
/// Front-end asset directory.
pub const STATIC_DIR_ENV: &str = "USHA_STATIC_DIR";
/// Live session cap.
pub const MAX_SESSIONS_ENV: &str = "USHA_MAX_SESSIONS";

/// Default upstream base URL.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
/// Default upstream model.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
/// Default server port.
pub const DEFAULT_PORT: u16 = 3000;

/// Configuration errors. All of them are fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No upstream credential configured.
    #[error("USHA_GEMINI_API_KEY is not set; refusing to start without an API key")]
    MissingApiKey,
    /// Base URL does not parse.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The HTTP client could not be built from these settings.
    #[error("HTTP client error: {0}")]
    HttpClient(String),
    /// A variable holds an unusable value.
    #[error("invalid value {value:?} for {key}")]
    InvalidValue {
        /// Variable name.
        key: String,
        /// Offending value.
        value: String,
    },
}

/// Convenience result alias for configuration.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Where the system prompt travels in the request body.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemPromptPlacement {
    /// Dedicated `systemInstruction` field.
    #[default]
    SystemInstruction,
    /// Synthetic first `user` message in `contents`.
    LeadingUserMessage,
}

impl FromStr for SystemPromptPlacement {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "system_instruction" => Ok(Self::SystemInstruction),
            "leading_user_message" => Ok(Self::LeadingUserMessage),
            other => Err(other.to_string()),
        }
    }
}

/// Upstream credential. Never printed.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap a raw key.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Raw key for the request header.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// True when blank.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Service configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UshaConfig {
    /// Upstream credential.
    #[serde(skip)]
    pub api_key: ApiKey,
    /// Upstream base URL (`.../v1beta`).
    pub base_url: String,
    /// Upstream model name.
    pub model: String,
    /// System prompt placement.
    pub system_prompt_placement: SystemPromptPlacement,
    /// Whole-request timeout.
    #[serde(with = "duration_serde")]
    pub request_timeout: Duration,
    /// Connection timeout.
    #[serde(with = "duration_serde")]
    pub connect_timeout: Duration,
    /// Listening port.
    pub port: u16,
    /// Front-end asset directory.
    pub static_dir: PathBuf,
    /// Maximum live chat sessions.
    pub max_sessions: usize,
}

impl Default for UshaConfig {
    fn default() -> Self {
        Self {
            api_key: ApiKey::default(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            system_prompt_placement: SystemPromptPlacement::default(),
            request_timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
            port: DEFAULT_PORT,
            static_dir: PathBuf::from("static"),
            max_sessions: 1024,
        }
    }
}

impl UshaConfig {
    /// Create a config with defaults and the given credential.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: ApiKey::new(api_key),
            ..Self::default()
        }
    }

    /// Load from the process environment.
    ///
    /// # Errors
    /// Returns an error if the credential is missing or any value is invalid.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary variable source.
    ///
    /// # Errors
    /// Returns an error if the credential is missing or any value is invalid.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(API_KEY_ENV)
            .filter(|k| !k.trim().is_empty())
            .or_else(|| lookup(API_KEY_FALLBACK_ENV))
            .ok_or(ConfigError::MissingApiKey)?;

        let mut config = Self::new(api_key);

        if let Some(base_url) = lookup(BASE_URL_ENV) {
            config.base_url = base_url;
        }
        if let Some(model) = lookup(MODEL_ENV) {
            config.model = model;
        }
        if let Some(placement) = lookup(PLACEMENT_ENV) {
            config.system_prompt_placement = parse_var(PLACEMENT_ENV, &placement)?;
        }
        if let Some(secs) = lookup(TIMEOUT_ENV) {
            config.request_timeout = Duration::from_secs(parse_var(TIMEOUT_ENV, &secs)?);
        }
        if let Some(port) = lookup(PORT_ENV) {
            config.port = parse_var(PORT_ENV, &port)?;
        }
        if let Some(dir) = lookup(STATIC_DIR_ENV) {
            config.static_dir = PathBuf::from(dir);
        }
        if let Some(max) = lookup(MAX_SESSIONS_ENV) {
            config.max_sessions = parse_var(MAX_SESSIONS_ENV, &max)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Set the base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the system prompt placement.
    #[must_use]
    pub const fn with_placement(mut self, placement: SystemPromptPlacement) -> Self {
        self.system_prompt_placement = placement;
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Validate invariants.
    ///
    /// # Errors
    /// Returns an error for a blank credential, an unparsable URL, or zero limits.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.api_key.is_blank() {
            return Err(ConfigError::MissingApiKey);
        }
        self.endpoint()?;
        if self.model.trim().is_empty() {
            return Err(invalid(MODEL_ENV, &self.model));
        }
        if self.request_timeout.is_zero() {
            return Err(invalid(TIMEOUT_ENV, "0"));
        }
        if self.max_sessions == 0 {
            return Err(invalid(MAX_SESSIONS_ENV, "0"));
        }
        Ok(())
    }

    /// Full `generateContent` URL for the configured model.
    ///
    /// # Errors
    /// Returns an error if the base URL does not parse.
    pub fn endpoint(&self) -> ConfigResult<Url> {
        let base = Url::parse(self.base_url.trim_end_matches('/'))?;
        let full = format!(
            "{}/models/{}:generateContent",
            base.as_str().trim_end_matches('/'),
            self.model
        );
        Ok(Url::parse(&full)?)
    }
}

fn parse_var<T: FromStr>(key: &str, value: &str) -> ConfigResult<T> {
    value.trim().parse().map_err(|_| invalid(key, value))
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

/// Serde module for Duration serialization.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
