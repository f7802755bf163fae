use serde::{Deserialize, Serialize};

use std::{env, fmt, fs, path::Path};

const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_SMTP_PORT: u16 = 465;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    Yaml {
        path: String,
        source: serde_yaml::Error,
    },

    #[error("Failed to load configuration from environment variables: {0}")]
    Env(#[from] envy::Error),

    #[error("Unknown deployment mode '{0}', expected 'standalone' or 'serverless'")]
    Deployment(String),

    #[error("GEMINI_API_KEY not found. Set it in the environment or a .env file")]
    MissingApiKey,
}

/// Which flavour of the service is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(try_from = "String", into = "String")]
pub enum Deployment {
    /// Serves the frontend bundle and refuses to start without an API key.
    #[default]
    Standalone,
    /// API only. A missing API key disables `/api/analyze` instead of aborting.
    Serverless,
}

impl Deployment {
    pub const fn serves_frontend(self) -> bool {
        matches!(self, Self::Standalone)
    }

    pub const fn requires_api_key(self) -> bool {
        matches!(self, Self::Standalone)
    }
}

impl TryFrom<String> for Deployment {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "standalone" => Ok(Self::Standalone),
            "serverless" => Ok(Self::Serverless),
            _ => Err(ConfigError::Deployment(value)),
        }
    }
}

impl From<Deployment> for String {
    fn from(value: Deployment) -> Self {
        match value {
            Deployment::Standalone => "standalone".to_string(),
            Deployment::Serverless => "serverless".to_string(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub gemini_api_key: Option<String>,
    #[serde(default = "default_model")]
    pub gemini_model: String,
    #[serde(default = "default_base_url")]
    pub gemini_base_url: String,
    #[serde(default)]
    pub smtp_server: Option<String>,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: Option<u16>,
    #[serde(default)]
    pub sender_email: Option<String>,
    #[serde(default)]
    pub sender_password: Option<String>,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub deployment: Deployment,
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

#[allow(clippy::unnecessary_wraps)]
const fn default_smtp_port() -> Option<u16> {
    Some(DEFAULT_SMTP_PORT)
}

const fn default_port() -> u16 {
    5000
}

fn default_static_dir() -> String {
    "../frontend".to_string()
}

const fn default_request_timeout() -> u64 {
    60
}

/// Everything needed to open an authenticated SMTP session.
#[derive(Clone)]
pub struct SmtpSettings {
    pub server: String,
    pub port: u16,
    pub sender: String,
    pub password: String,
}

impl fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("server", &self.server)
            .field("port", &self.port)
            .field("sender", &self.sender)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field(
                "gemini_api_key",
                &self.gemini_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("gemini_model", &self.gemini_model)
            .field("gemini_base_url", &self.gemini_base_url)
            .field("smtp_server", &self.smtp_server)
            .field("smtp_port", &self.smtp_port)
            .field("sender_email", &self.sender_email)
            .field(
                "sender_password",
                &self.sender_password.as_ref().map(|_| "<redacted>"),
            )
            .field("port", &self.port)
            .field("deployment", &self.deployment)
            .field("static_dir", &self.static_dir)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

fn non_blank(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl Config {
    /// The API key, if one was configured and is not blank.
    pub fn api_key(&self) -> Option<String> {
        non_blank(self.gemini_api_key.as_ref())
    }

    /// SMTP settings, or `None` if any of server, port, account or password is unset.
    pub fn smtp(&self) -> Option<SmtpSettings> {
        Some(SmtpSettings {
            server: non_blank(self.smtp_server.as_ref())?,
            port: self.smtp_port.filter(|p| *p != 0)?,
            sender: non_blank(self.sender_email.as_ref())?,
            password: self
                .sender_password
                .clone()
                .filter(|p| !p.is_empty())?,
        })
    }

    /// Enforces the startup rules of the selected deployment.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.deployment.requires_api_key() && self.api_key().is_none() {
            return Err(ConfigError::MissingApiKey);
        }
        if self.api_key().is_none() {
            tracing::warn!("GEMINI_API_KEY is not set, /api/analyze is disabled");
        }
        if self.smtp().is_none() {
            tracing::warn!("SMTP configuration is incomplete, /api/send will fail");
        }
        Ok(())
    }
}

fn load_from_file(path: &str) -> Result<Config, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_string(),
        source,
    })?;
    serde_yaml::from_str(&contents).map_err(|source| ConfigError::Yaml {
        path: path.to_string(),
        source,
    })
}

/// Builds a config from `NAME=value` pairs, as found in the process environment.
pub fn load_from_vars<I>(vars: I) -> Result<Config, ConfigError>
where
    I: IntoIterator<Item = (String, String)>,
{
    envy::from_iter(vars).map_err(Into::into)
}

pub fn load_config() -> Result<Config, ConfigError> {
    // Pick up a local .env before anything reads the environment
    match dotenvy::dotenv() {
        Ok(path) => tracing::info!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!("Failed to read .env file: {e}"),
    }

    let config_path =
        env::var("DRAFT_POLISHER_CONFIG").unwrap_or_else(|_| "config.yaml".to_string());

    if Path::new(&config_path).exists() {
        tracing::info!("Loading configuration from '{}'", config_path);
        return load_from_file(&config_path);
    }

    if config_path != "config.yaml" && Path::new("config.yaml").exists() {
        tracing::warn!(
            "Config file '{}' not found, falling back to 'config.yaml'",
            config_path
        );
        return load_from_file("config.yaml");
    }

    tracing::info!("No config file found, loading configuration from environment variables");
    load_from_vars(env::vars())
}
