use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::str::FromStr;

/// Token ceiling for conversation turns.
const DEFAULT_MAX_TOKENS: u32 = 2048;

/// Token ceiling for one-shot drafts.
const DEFAULT_DRAFT_MAX_TOKENS: u32 = 1024;

/// Session used when a conversation request carries no `session_id`.
pub const DEFAULT_SESSION_ID: &str = "default_session";

/// Conversation records expire this long after their last write.
const DEFAULT_CONVERSATION_TTL_HOURS: i64 = 24;

#[derive(Debug, Clone, Deserialize)]
pub struct AssistantConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub store: StoreConfig,
    pub model: ModelConfig,
    pub conversation: ConversationConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Test,
    Prod,
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Ok(Environment::Dev),
            "test" => Ok(Environment::Test),
            "prod" | "production" => Ok(Environment::Prod),
            other => Err(format!("Unknown ENVIRONMENT '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Mongodb,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mongodb" | "mongo" => Ok(StoreBackend::Mongodb),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!("Unknown STORE_BACKEND '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub mongodb_uri: String,
    pub mongodb_database: String,
    pub collection: String,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ModelProviderKind {
    Gemini,
    Anthropic,
    Mock,
}

impl ModelProviderKind {
    pub fn default_model(&self) -> &'static str {
        match self {
            ModelProviderKind::Gemini => "gemini-2.0-flash",
            ModelProviderKind::Anthropic => "claude-3-5-sonnet-20240620",
            ModelProviderKind::Mock => "mock",
        }
    }
}

impl FromStr for ModelProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gemini" => Ok(ModelProviderKind::Gemini),
            "anthropic" => Ok(ModelProviderKind::Anthropic),
            "mock" => Ok(ModelProviderKind::Mock),
            other => Err(format!("Unknown MODEL_PROVIDER '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    pub provider: ModelProviderKind,
    pub model: String,
    pub api_key: String,
    /// Overrides the provider's public endpoint (proxies, local gateways).
    pub api_base: Option<String>,
    pub max_tokens: u32,
    pub draft_max_tokens: u32,
    /// Unset means no client-side timeout on model calls.
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConversationConfig {
    pub default_session_id: String,
    pub ttl_hours: i64,
}

impl ConversationConfig {
    /// Lifetime given to a conversation on every write.
    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::try_hours(self.ttl_hours)
            .unwrap_or_else(|| chrono::Duration::hours(DEFAULT_CONVERSATION_TTL_HOURS))
    }
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            default_session_id: DEFAULT_SESSION_ID.to_string(),
            ttl_hours: DEFAULT_CONVERSATION_TTL_HOURS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
}

impl AssistantConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;

        let environment: Environment = env::var("ENVIRONMENT")
            .unwrap_or_else(|_| "dev".to_string())
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;
        let is_prod = environment == Environment::Prod;

        let backend: StoreBackend = get_env("STORE_BACKEND", Some("mongodb"), is_prod)?
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let provider: ModelProviderKind = get_env("MODEL_PROVIDER", Some("gemini"), is_prod)?
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let api_key_default = if provider == ModelProviderKind::Mock {
            Some("")
        } else {
            None
        };

        Ok(AssistantConfig {
            common: common_config,
            environment,
            service_name: get_env("SERVICE_NAME", Some("invoice-assistant-service"), is_prod)?,
            service_version: get_env(
                "SERVICE_VERSION",
                Some(env!("CARGO_PKG_VERSION")),
                is_prod,
            )?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|s| !s.is_empty()),
            store: StoreConfig {
                backend,
                mongodb_uri: get_env("MONGODB_URI", Some("mongodb://localhost:27017"), is_prod)?,
                mongodb_database: get_env("MONGODB_DATABASE", Some("invoice_assistant"), is_prod)?,
                collection: get_env("MONGODB_COLLECTION", Some("tenant_records"), is_prod)?,
            },
            model: ModelConfig {
                provider,
                model: get_env("MODEL_NAME", Some(provider.default_model()), is_prod)?,
                api_key: get_env("MODEL_API_KEY", api_key_default, is_prod)?,
                api_base: env::var("MODEL_API_BASE").ok().filter(|s| !s.is_empty()),
                max_tokens: parse_or("MODEL_MAX_TOKENS", DEFAULT_MAX_TOKENS)?,
                draft_max_tokens: parse_or("DRAFT_MAX_TOKENS", DEFAULT_DRAFT_MAX_TOKENS)?,
                timeout_seconds: match env::var("MODEL_TIMEOUT_SECONDS") {
                    Ok(v) => Some(v.parse().map_err(|e| {
                        AppError::ConfigError(anyhow::anyhow!(
                            "MODEL_TIMEOUT_SECONDS must be an integer: {}",
                            e
                        ))
                    })?),
                    Err(_) => None,
                },
            },
            conversation: ConversationConfig {
                default_session_id: get_env("DEFAULT_SESSION_ID", Some(DEFAULT_SESSION_ID), false)?,
                ttl_hours: conversation_ttl_hours(parse_or(
                    "CONVERSATION_TTL_HOURS",
                    DEFAULT_CONVERSATION_TTL_HOURS,
                )?)?,
            },
            security: SecurityConfig {
                allowed_origins: get_env("ALLOWED_ORIGINS", Some("http://localhost:3000"), is_prod)?
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
        })
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

/// Optional numeric setting: absent means `default`, malformed is an error.
fn parse_or<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.parse().map_err(|e: T::Err| {
            AppError::ConfigError(anyhow::anyhow!("{} has an invalid value: {}", key, e))
        }),
        Err(_) => Ok(default),
    }
}

fn conversation_ttl_hours(hours: i64) -> Result<i64, AppError> {
    if hours <= 0 || chrono::Duration::try_hours(hours).is_none() {
        return Err(AppError::ConfigError(anyhow::anyhow!(
            "CONVERSATION_TTL_HOURS must be a positive number of hours, got {}",
            hours
        )));
    }
    Ok(hours)
}
