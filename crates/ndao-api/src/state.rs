use std::sync::Arc;
use std::time::Duration;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;

use crate::{
    ApiConfig,
    auth::{
        oauth::OAuthSettings,
        store::{FileLoginStore, LoginStateStore, MemoryLoginStore},
    },
    config::{Environment, LoginStoreKind},
    endaoment::EndaomentClient,
};

#[derive(Clone)]
pub struct ApiState {
    pub oauth: OAuthSettings,
    pub endaoment: EndaomentClient,
    pub login_store: Arc<dyn LoginStateStore>,
    pub cookie_key: Key,
    pub frontend_url: String,
    pub environment: Environment,
    pub wealth_advisor_id: Option<String>,
    pub api_key: Option<String>,
}

impl std::fmt::Debug for ApiState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiState")
            .field("oauth", &self.oauth)
            .field("endaoment", &self.endaoment)
            .field("frontend_url", &self.frontend_url)
            .field("environment", &self.environment)
            .finish_non_exhaustive()
    }
}

impl ApiState {
    pub async fn new(config: ApiConfig) -> anyhow::Result<Self> {
        let ttl = config.login_state_ttl;

        let login_store: Arc<dyn LoginStateStore> = match config.login_store {
            LoginStoreKind::Memory => Arc::new(MemoryLoginStore::new(ttl)),
            LoginStoreKind::File => {
                let store = FileLoginStore::new(&config.login_state_dir, ttl).await?;
                tracing::info!("Storing login attempts under {}", store.dir().display());
                Arc::new(store)
            }
        };

        Self::with_login_store(config, login_store)
    }

    /// Build state around an existing login-state store.
    pub fn with_login_store(
        config: ApiConfig,
        login_store: Arc<dyn LoginStateStore>,
    ) -> anyhow::Result<Self> {
        let cookie_key = match &config.cookie_secret {
            Some(secret) => Key::from(secret.as_bytes()),
            None => {
                tracing::warn!(
                    "COOKIE_SECRET not set, generating a random key; sessions will not survive a restart"
                );
                Key::generate()
            }
        };

        let oauth = OAuthSettings::from_config(&config)?;
        let endaoment = EndaomentClient::new(
            config.endaoment_urls.clone(),
            Duration::from_secs(config.upstream_timeout_secs),
        )?;

        Ok(Self {
            oauth,
            endaoment,
            login_store,
            cookie_key,
            frontend_url: config.frontend_url,
            environment: config.env,
            wealth_advisor_id: config.wealth_advisor_id,
            api_key: config.api_key,
        })
    }
}

impl FromRef<ApiState> for Key {
    fn from_ref(state: &ApiState) -> Self {
        state.cookie_key.clone()
    }
}
