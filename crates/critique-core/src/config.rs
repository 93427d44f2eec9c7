use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CritiqueError;
use crate::types::Category;

/// Environment variable that overrides `api.api_key`.
pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

/// Top-level configuration loaded from `.critique.toml`.
///
/// Resolution order: env vars > config file > defaults.
///
/// # Examples
///
/// ```
/// use critique_core::CritiqueConfig;
///
/// let config = CritiqueConfig::default();
/// assert_eq!(config.review.file_extensions, vec![".java".to_string()]);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CritiqueConfig {
    /// Which files to review and how to pace the batch.
    #[serde(default)]
    pub review: ReviewConfig,
    /// Remote API settings.
    #[serde(default)]
    pub api: ApiConfig,
}

impl CritiqueConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`CritiqueError::Config`] if the file cannot be read, or
    /// [`CritiqueError::Toml`] if the content is not valid TOML.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use critique_core::CritiqueConfig;
    /// use std::path::Path;
    ///
    /// let config = CritiqueConfig::from_file(Path::new(".critique.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, CritiqueError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CritiqueError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`CritiqueError::Toml`] if parsing fails, or
    /// [`CritiqueError::Config`] if `review.aspects` is empty or repeats an
    /// aspect.
    ///
    /// # Examples
    ///
    /// ```
    /// use critique_core::CritiqueConfig;
    ///
    /// let toml = r#"
    /// [review]
    /// max_file_size = 2000
    /// "#;
    /// let config = CritiqueConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.review.max_file_size, 2000);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, CritiqueError> {
        let config: Self = toml::from_str(content)?;
        config.review.validate()?;
        Ok(config)
    }

    /// Apply environment overrides on top of file values.
    ///
    /// Currently only [`API_KEY_ENV`] is consulted.
    pub fn with_env_overrides(self) -> Self {
        self.with_api_key_from(std::env::var(API_KEY_ENV).ok())
    }

    fn with_api_key_from(mut self, key: Option<String>) -> Self {
        if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
            self.api.api_key = Some(key);
        }
        self
    }
}

/// Review behavior configuration.
///
/// # Examples
///
/// ```
/// use critique_core::ReviewConfig;
///
/// let config = ReviewConfig::default();
/// assert_eq!(config.max_file_size, 100_000);
/// assert_eq!(config.aspects.len(), 4);
/// assert_eq!(config.request_delay_ms, 1000);
/// assert_eq!(config.max_retries, 0);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewConfig {
    /// File name suffixes accepted for review, leading dot included.
    #[serde(default = "default_file_extensions")]
    pub file_extensions: Vec<String>,
    /// Maximum characters sent per file; longer files are truncated.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: usize,
    /// Review aspects listed in the prompt, in order.
    #[serde(default = "default_aspects")]
    pub aspects: Vec<Category>,
    /// Delay between successive API calls in a batch, in milliseconds.
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
    /// Extra attempts for rate-limited, overloaded, or unreachable calls.
    #[serde(default)]
    pub max_retries: u32,
    /// Initial retry backoff in milliseconds; doubles on each attempt.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    /// Honor `.gitignore` and skip hidden files while walking directories.
    #[serde(default)]
    pub respect_ignore_files: bool,
}

fn default_file_extensions() -> Vec<String> {
    vec![".java".into()]
}

fn default_max_file_size() -> usize {
    100_000
}

fn default_aspects() -> Vec<Category> {
    Category::ALL.to_vec()
}

fn default_request_delay_ms() -> u64 {
    1000
}

fn default_retry_backoff_ms() -> u64 {
    2000
}

impl ReviewConfig {
    /// Whether `name` ends with one of the accepted extensions.
    ///
    /// # Examples
    ///
    /// ```
    /// use critique_core::ReviewConfig;
    ///
    /// let config = ReviewConfig::default();
    /// assert!(config.accepts("Foo.java"));
    /// assert!(!config.accepts("Foo.kt"));
    /// ```
    pub fn accepts(&self, name: &str) -> bool {
        self.file_extensions.iter().any(|ext| name.ends_with(ext.as_str()))
    }

    /// Check invariants serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`CritiqueError::Config`] if `aspects` is empty or lists an
    /// aspect twice.
    pub fn validate(&self) -> Result<(), CritiqueError> {
        if self.aspects.is_empty() {
            return Err(CritiqueError::Config(
                "review.aspects must list at least one aspect".into(),
            ));
        }
        for (i, aspect) in self.aspects.iter().enumerate() {
            if self.aspects[..i].contains(aspect) {
                return Err(CritiqueError::Config(format!(
                    "review.aspects lists {aspect} more than once"
                )));
            }
        }
        Ok(())
    }

    /// The pause between successive API calls.
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            file_extensions: default_file_extensions(),
            max_file_size: default_max_file_size(),
            aspects: default_aspects(),
            request_delay_ms: default_request_delay_ms(),
            max_retries: 0,
            retry_backoff_ms: default_retry_backoff_ms(),
            respect_ignore_files: false,
        }
    }
}

/// Remote Messages API configuration.
///
/// # Examples
///
/// ```
/// use critique_core::ApiConfig;
///
/// let config = ApiConfig::default();
/// assert_eq!(config.version, "2023-06-01");
/// assert!(config.api_key.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Full endpoint URL requests are POSTed to.
    #[serde(default = "default_url")]
    pub url: String,
    /// API key; usually supplied through [`API_KEY_ENV`].
    pub api_key: Option<String>,
    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,
    /// Value of the `anthropic-version` header.
    #[serde(default = "default_version")]
    pub version: String,
    /// Upper bound on generated tokens.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_read_timeout_secs")]
    pub read_timeout_secs: u64,
    /// Bound on the whole request, upload included.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_url() -> String {
    "https://api.anthropic.com/v1/messages".into()
}

fn default_model() -> String {
    "claude-sonnet-4-20250514".into()
}

fn default_version() -> String {
    "2023-06-01".into()
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_connect_timeout_secs() -> u64 {
    30
}

fn default_read_timeout_secs() -> u64 {
    60
}

fn default_request_timeout_secs() -> u64 {
    120
}

impl ApiConfig {
    /// Return the API key, or a configuration error when it is missing or blank.
    ///
    /// # Examples
    ///
    /// ```
    /// use critique_core::ApiConfig;
    ///
    /// assert!(ApiConfig::default().require_api_key().is_err());
    ///
    /// let config = ApiConfig {
    ///     api_key: Some("sk-test".into()),
    ///     ..ApiConfig::default()
    /// };
    /// assert_eq!(config.require_api_key().unwrap(), "sk-test");
    /// ```
    pub fn require_api_key(&self) -> Result<&str, CritiqueError> {
        match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(CritiqueError::Config(format!(
                "{API_KEY_ENV} is not set. Please set it as an environment variable:\n\
                 export {API_KEY_ENV}=\"your-key-here\""
            ))),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            api_key: None,
            model: default_model(),
            version: default_version(),
            max_tokens: default_max_tokens(),
            connect_timeout_secs: default_connect_timeout_secs(),
            read_timeout_secs: default_read_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}
