//! TOML configuration for the gate, retry policy and providers.
//!
//! Both `config.toml` and `secrets.toml` are searched in `~/.huginn/` and
//! then `/etc/huginn/`; `--config` overrides the former. A secrets file
//! readable by group or others is refused. Keys absent from it are read
//! from `GROQ_API_KEY`, `OPENROUTER_API_KEY` or `HF_API_KEY`.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::gate::ResponseGateBuilder;
use crate::limiter::{DEFAULT_MAX_REQUESTS, DEFAULT_RATE_WINDOW};
use crate::providers::{
    ChatCompletionsClient, FallbackGenerator, ReplyGenerator, RetryConfig, RetryingGenerator,
};
use crate::{HuginnError, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub gate: GateConfig,
    #[serde(default)]
    pub retry: RetrySettings,
    #[serde(default)]
    pub providers: ProvidersConfig,
}

/// Cache and rate-limit settings.
#[derive(Debug, Clone, Deserialize)]
pub struct GateConfig {
    /// Maximum cached replies (default: 100).
    #[serde(default = "default_max_cache_entries")]
    pub max_cache_entries: usize,
    /// Optional cache TTL in seconds (default: none).
    #[serde(default)]
    pub cache_ttl_secs: Option<u64>,
    /// Rate-limit window in milliseconds (default: 20000).
    #[serde(default = "default_rate_window_ms")]
    pub rate_window_ms: u64,
    /// Generator calls per requester per window (default: 3).
    #[serde(default = "default_max_requests")]
    pub max_requests_per_window: u32,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            max_cache_entries: default_max_cache_entries(),
            cache_ttl_secs: None,
            rate_window_ms: default_rate_window_ms(),
            max_requests_per_window: default_max_requests(),
        }
    }
}

fn default_max_cache_entries() -> usize {
    crate::cache::DEFAULT_MAX_ENTRIES
}

fn default_rate_window_ms() -> u64 {
    DEFAULT_RATE_WINDOW.as_millis() as u64
}

fn default_max_requests() -> u32 {
    DEFAULT_MAX_REQUESTS
}

/// Retry settings applied to every provider.
#[derive(Debug, Clone, Deserialize)]
pub struct RetrySettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

fn default_max_attempts() -> u32 {
    RetryConfig::default().max_attempts
}

fn default_initial_delay_ms() -> u64 {
    RetryConfig::default().initial_delay.as_millis() as u64
}

fn default_max_delay_ms() -> u64 {
    RetryConfig::default().max_delay.as_millis() as u64
}

/// Provider configurations. Providers are tried in the order
/// groq, openrouter, huggingface.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub groq: Option<ProviderConfig>,
    #[serde(default)]
    pub openrouter: Option<ProviderConfig>,
    #[serde(default)]
    pub huggingface: Option<ProviderConfig>,
}

/// A single chat-completions provider.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderConfig {
    /// Model to use when the request has no override.
    #[serde(default)]
    pub default_model: Option<String>,
    /// Override the provider's base URL.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Request timeout in seconds.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Secrets configuration (API keys).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Secrets {
    #[serde(default)]
    pub groq: Option<ApiKeySecret>,
    #[serde(default)]
    pub openrouter: Option<ApiKeySecret>,
    #[serde(default)]
    pub huggingface: Option<ApiKeySecret>,
}

/// A single API key secret.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiKeySecret {
    pub api_key: String,
}

/// Provider name → environment variable name mapping.
const PROVIDER_ENV_VARS: &[(&str, &str)] = &[
    ("groq", "GROQ_API_KEY"),
    ("openrouter", "OPENROUTER_API_KEY"),
    ("huggingface", "HF_API_KEY"),
];

const CONFIG_FILE: &str = "config.toml";
const SECRETS_FILE: &str = "secrets.toml";
const SYSTEM_DIR: &str = "/etc/huginn";

/// `~/.huginn/<file>` then `/etc/huginn/<file>`.
fn find_in_search_path(file: &str) -> Option<PathBuf> {
    let user = dirs::home_dir().map(|home| home.join(".huginn").join(file));
    let system = Some(Path::new(SYSTEM_DIR).join(file));
    [user, system].into_iter().flatten().find(|path| path.exists())
}

impl Config {
    /// Load configuration from `explicit_path`, or the first file found by
    /// the module-level search order.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let path = match explicit_path {
            Some(path) if path.exists() => path.to_path_buf(),
            Some(path) => {
                return Err(HuginnError::Configuration(format!(
                    "Config file not found: {path:?}"
                )));
            }
            None => find_in_search_path(CONFIG_FILE).ok_or_else(|| {
                HuginnError::Configuration(
                    "No config file found. Create ~/.huginn/config.toml or /etc/huginn/config.toml"
                        .to_string(),
                )
            })?,
        };

        let content = fs::read_to_string(&path).map_err(|e| {
            HuginnError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        Self::from_toml_str(&content).map_err(|e| match e {
            HuginnError::Configuration(msg) => {
                HuginnError::Configuration(format!("{msg} (in {path:?})"))
            }
            other => other,
        })
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| HuginnError::Configuration(format!("Failed to parse config: {e}")))
    }

    /// Gate builder carrying the configured limits.
    pub fn gate_builder(&self) -> ResponseGateBuilder {
        let mut builder = ResponseGateBuilder::new()
            .max_cache_entries(self.gate.max_cache_entries)
            .rate_window(Duration::from_millis(self.gate.rate_window_ms))
            .max_requests_per_window(self.gate.max_requests_per_window);
        if let Some(ttl) = self.gate.cache_ttl_secs {
            builder = builder.cache_ttl(Duration::from_secs(ttl));
        }
        builder
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig::new()
            .max_attempts(self.retry.max_attempts)
            .initial_delay(Duration::from_millis(self.retry.initial_delay_ms))
            .max_delay(Duration::from_millis(self.retry.max_delay_ms))
    }

    /// Build the provider fallback chain.
    ///
    /// A provider is registered only when its section is present AND an API
    /// key is available. Each provider is wrapped in a [`RetryingGenerator`].
    /// Fails with [`HuginnError::NoProvider`] when nothing is registered.
    pub fn generator(&self, secrets: &Secrets) -> Result<FallbackGenerator> {
        let presets: [(&str, &Option<ProviderConfig>, fn(String) -> ChatCompletionsClient); 3] = [
            ("groq", &self.providers.groq, |key| {
                ChatCompletionsClient::groq(key)
            }),
            ("openrouter", &self.providers.openrouter, |key| {
                ChatCompletionsClient::openrouter(key)
            }),
            ("huggingface", &self.providers.huggingface, |key| {
                ChatCompletionsClient::huggingface(key)
            }),
        ];

        let retry = self.retry_config();
        let mut chain = FallbackGenerator::new();
        for (name, section, preset) in presets {
            let (Some(section), Some(key)) = (section, secrets.api_key(name)) else {
                continue;
            };

            let mut client = preset(key);
            if let Some(ref model) = section.default_model {
                client = client.default_model(model.clone());
            }
            if let Some(ref url) = section.base_url {
                client = client.base_url(url.clone());
            }
            if let Some(secs) = section.timeout_secs {
                client = client.timeout(Duration::from_secs(secs));
            }

            let client: Arc<dyn ReplyGenerator> = Arc::new(client);
            chain.push(Arc::new(RetryingGenerator::new(client, retry.clone())));
        }

        if chain.is_empty() {
            return Err(HuginnError::NoProvider);
        }
        Ok(chain)
    }
}

impl Secrets {
    /// Load the first `secrets.toml` on the search path.
    ///
    /// A missing file is not an error: keys may come from the environment.
    pub fn load() -> Result<Self> {
        match find_in_search_path(SECRETS_FILE) {
            Some(path) => Self::load_from_file(&path),
            None => Ok(Secrets::default()),
        }
    }

    /// Parse an explicit secrets file. The file must not be readable by
    /// group or others.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        ensure_owner_only(path)?;
        let content = fs::read_to_string(path).map_err(|e| {
            HuginnError::Configuration(format!("Failed to read secrets file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            HuginnError::Configuration(format!("Failed to parse secrets file {path:?}: {e}"))
        })
    }

    fn secret(&self, provider: &str) -> Option<&ApiKeySecret> {
        match provider {
            "groq" => self.groq.as_ref(),
            "openrouter" => self.openrouter.as_ref(),
            "huggingface" => self.huggingface.as_ref(),
            _ => None,
        }
    }

    /// API key for `provider`: the secrets file wins, then the provider's
    /// environment variable. Empty values count as unset.
    pub fn api_key(&self, provider: &str) -> Option<String> {
        if let Some(secret) = self.secret(provider) {
            return Some(secret.api_key.clone());
        }
        let (_, var) = PROVIDER_ENV_VARS
            .iter()
            .find(|(name, _)| *name == provider)?;
        std::env::var(var).ok().filter(|key| !key.is_empty())
    }
}

#[cfg(unix)]
fn ensure_owner_only(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mode = fs::metadata(path)
        .map_err(|e| {
            HuginnError::Configuration(format!("Failed to stat secrets file {path:?}: {e}"))
        })?
        .permissions()
        .mode();

    match mode & 0o077 {
        0 => Ok(()),
        _ => Err(HuginnError::Configuration(format!(
            "Secrets file {path:?} has insecure permissions {:o}; use chmod 600",
            mode & 0o777
        ))),
    }
}

#[cfg(not(unix))]
fn ensure_owner_only(_path: &Path) -> Result<()> {
    Ok(())
}
