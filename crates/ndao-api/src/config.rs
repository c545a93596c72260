use std::path::PathBuf;
use std::time::Duration;

use oauth2::{ClientId, ClientSecret, RedirectUrl};
use serde::Deserialize;
use thiserror::Error;

use crate::endaoment::urls::{EndaomentEnvironment, EndaomentUrls};

/// Minimum length of `COOKIE_SECRET`, imposed by the private cookie key derivation.
pub const MIN_COOKIE_SECRET_LEN: usize = 64;

/// Longest a pending login attempt may be kept (one day).
pub const MAX_LOGIN_STATE_TTL_MINUTES: i64 = 24 * 60;

/// Deployment mode of this server (not of the Endaoment environment it talks to).
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub const fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    pub const fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Backend used to keep pending login attempts between `/init-login` and the callback.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoginStoreKind {
    #[default]
    Memory,
    File,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Env(#[from] envy::Error),
    #[error("Environment variable {0} is not set")]
    Empty(&'static str),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

fn default_port() -> u16 {
    5454
}

fn default_login_state_dir() -> PathBuf {
    PathBuf::from("login-states")
}

const fn default_login_state_ttl_minutes() -> i64 {
    10
}

const fn default_upstream_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize)]
struct RawEnv {
    endaoment_client_id: String,
    endaoment_client_secret: String,
    endaoment_redirect_uri: String,
    frontend_url: String,
    endaoment_environment: String,
    #[serde(default = "default_port")]
    port: u16,
    endaoment_wealth_advisor_id: Option<String>,
    endaoment_api_key: Option<String>,
    endaoment_auth_url: Option<String>,
    endaoment_api_url: Option<String>,
    cookie_secret: Option<String>,
    #[serde(default)]
    app_env: Environment,
    #[serde(default)]
    login_state_store: LoginStoreKind,
    #[serde(default = "default_login_state_dir")]
    login_state_dir: PathBuf,
    #[serde(default = "default_login_state_ttl_minutes")]
    login_state_ttl_minutes: i64,
    #[serde(default = "default_upstream_timeout_secs")]
    upstream_timeout_secs: u64,
}

/// Immutable server configuration, read once at startup.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub client_id: ClientId,
    pub client_secret: ClientSecret,
    pub redirect_url: RedirectUrl,
    pub frontend_url: String,
    pub endaoment_env: EndaomentEnvironment,
    pub endaoment_urls: EndaomentUrls,
    pub port: u16,
    /// Advisor attached to new funds instead of the directory lookup.
    pub wealth_advisor_id: Option<String>,
    /// Key for privileged collaborator management calls.
    pub api_key: Option<String>,
    pub cookie_secret: Option<String>,
    pub env: Environment,
    pub login_store: LoginStoreKind,
    pub login_state_dir: PathBuf,
    /// How long a pending login attempt stays valid.
    pub login_state_ttl: Duration,
    pub upstream_timeout_secs: u64,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_iter(std::env::vars())
    }

    /// Build the configuration from an explicit set of variables.
    pub fn from_iter<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let raw: RawEnv = envy::from_iter(vars)?;

        let client_id = required("ENDAOMENT_CLIENT_ID", raw.endaoment_client_id)?;
        let client_secret = required("ENDAOMENT_CLIENT_SECRET", raw.endaoment_client_secret)?;
        let redirect_uri = required("ENDAOMENT_REDIRECT_URI", raw.endaoment_redirect_uri)?;
        let frontend_url = required("FRONTEND_URL", raw.frontend_url)?;
        let env_name = required("ENDAOMENT_ENVIRONMENT", raw.endaoment_environment)?;

        let redirect_url = RedirectUrl::new(redirect_uri)
            .map_err(|e| ConfigError::Invalid(format!("ENDAOMENT_REDIRECT_URI: {e}")))?;

        let cookie_secret = optional(raw.cookie_secret);
        if let Some(secret) = &cookie_secret
            && secret.len() < MIN_COOKIE_SECRET_LEN
        {
            return Err(ConfigError::Invalid(format!(
                "COOKIE_SECRET must be at least {MIN_COOKIE_SECRET_LEN} bytes long"
            )));
        }

        let login_state_ttl = login_state_ttl(raw.login_state_ttl_minutes)?;

        let endaoment_env = EndaomentEnvironment::from_name(&env_name);
        let endaoment_urls = endaoment_env.urls().with_overrides(
            optional(raw.endaoment_auth_url),
            optional(raw.endaoment_api_url),
        );

        Ok(Self {
            client_id: ClientId::new(client_id),
            client_secret: ClientSecret::new(client_secret),
            redirect_url,
            frontend_url,
            endaoment_env,
            endaoment_urls,
            port: raw.port,
            wealth_advisor_id: optional(raw.endaoment_wealth_advisor_id),
            api_key: optional(raw.endaoment_api_key),
            cookie_secret,
            env: raw.app_env,
            login_store: raw.login_state_store,
            login_state_dir: raw.login_state_dir,
            login_state_ttl,
            upstream_timeout_secs: raw.upstream_timeout_secs,
        })
    }
}

fn required(name: &'static str, value: String) -> Result<String, ConfigError> {
    let value = value.trim().to_string();
    if value.is_empty() {
        return Err(ConfigError::Empty(name));
    }
    Ok(value)
}

fn login_state_ttl(minutes: i64) -> Result<Duration, ConfigError> {
    if !(1..=MAX_LOGIN_STATE_TTL_MINUTES).contains(&minutes) {
        return Err(ConfigError::Invalid(format!(
            "LOGIN_STATE_TTL_MINUTES must be between 1 and {MAX_LOGIN_STATE_TTL_MINUTES}, got {minutes}"
        )));
    }

    minutes
        .unsigned_abs()
        .checked_mul(60)
        .map(Duration::from_secs)
        .ok_or_else(|| ConfigError::Invalid(format!("LOGIN_STATE_TTL_MINUTES overflows: {minutes}")))
}

// An empty variable counts as unset.
fn optional(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
