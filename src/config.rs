use crate::mileage::UnresolvedPolicy;
use serde::{Deserialize, Serialize};
use std::{env, path::Path, path::PathBuf, time::Duration};
use thiserror::Error;
use tokio::fs;
use tracing::{error, info};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_TABLE: &str = "loads";
pub const DEFAULT_CONFIG_PATH: &str = "data/store.json";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0}")]
    Invalid(String),
    #[error("could not access config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not encode config file: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Server settings resolved once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub port: u16,
    pub config_path: PathBuf,
    pub table: String,
    pub timeout: Duration,
    pub mileage_policy: UnresolvedPolicy,
    pub demo: bool,
    pub env_credentials: Option<StoreCredentials>,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port = match var("PORT") {
            Some(value) => value
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("PORT '{value}' is not a port number")))?,
            None => DEFAULT_PORT,
        };
        let timeout_secs = match var("STORE_TIMEOUT_SECS") {
            Some(value) => value.parse().map_err(|_| {
                ConfigError::Invalid(format!("STORE_TIMEOUT_SECS '{value}' is not a number of seconds"))
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };
        let mileage_policy = match var("MILEAGE_UNRESOLVED") {
            Some(value) => value.parse().map_err(ConfigError::Invalid)?,
            None => UnresolvedPolicy::default(),
        };

        let env_credentials = match (var("LOADS_STORE_URL"), var("LOADS_STORE_KEY")) {
            (Some(url), Some(api_key)) => Some(StoreCredentials { url, api_key }.validate()?),
            (None, None) => None,
            _ => {
                return Err(ConfigError::Invalid(
                    "LOADS_STORE_URL and LOADS_STORE_KEY must be set together".to_string(),
                ));
            }
        };

        Ok(Self {
            port,
            config_path: var("APP_CONFIG_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH)),
            table: var("LOADS_STORE_TABLE").unwrap_or_else(|| DEFAULT_TABLE.to_string()),
            timeout: Duration::from_secs(timeout_secs),
            mileage_policy,
            demo: matches!(var("LOADS_DEMO").as_deref(), Some("1") | Some("true")),
            env_credentials,
        })
    }
}

/// Endpoint URL and API key for the hosted load table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreCredentials {
    pub url: String,
    pub api_key: String,
}

impl StoreCredentials {
    pub fn validate(self) -> Result<Self, ConfigError> {
        let url = self.url.trim().trim_end_matches('/').to_string();
        let api_key = self.api_key.trim().to_string();
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(ConfigError::Invalid(
                "Database URL must start with http:// or https://".to_string(),
            ));
        }
        if api_key.is_empty() {
            return Err(ConfigError::Invalid("API key is required".to_string()));
        }
        Ok(Self { url, api_key })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialSource {
    Environment,
    File,
    Demo,
}

/// Environment wins over the persisted file.
pub async fn resolve_credentials(settings: &Settings) -> Option<(StoreCredentials, CredentialSource)> {
    if let Some(credentials) = settings.env_credentials.clone() {
        info!("using store credentials from environment");
        return Some((credentials, CredentialSource::Environment));
    }
    let credentials = load_credentials(&settings.config_path).await?;
    info!(path = %settings.config_path.display(), "using store credentials from config file");
    Some((credentials, CredentialSource::File))
}

pub async fn load_credentials(path: &Path) -> Option<StoreCredentials> {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice::<StoreCredentials>(&bytes) {
            Ok(credentials) => match credentials.validate() {
                Ok(credentials) => Some(credentials),
                Err(err) => {
                    error!("ignoring config file: {err}");
                    None
                }
            },
            Err(err) => {
                error!("failed to parse config file: {err}");
                None
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
        Err(err) => {
            error!("failed to read config file: {err}");
            None
        }
    }
}

pub async fn persist_credentials(path: &Path, credentials: &StoreCredentials) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    let payload = serde_json::to_vec_pretty(credentials)?;
    fs::write(path, payload).await?;
    Ok(())
}

pub async fn clear_credentials(path: &Path) -> Result<(), ConfigError> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}
