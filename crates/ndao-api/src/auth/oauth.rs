use oauth2::{AuthUrl, ClientId, ClientSecret, RedirectUrl, TokenUrl};

use super::pkce::LoginAttempt;
use crate::{config::ApiConfig, endaoment::EndaomentUrls};

/// Scopes requested at login. Add `offline_access` (and `prompt=login consent`)
/// to also receive a refresh token.
pub const LOGIN_SCOPES: &str = "openid accounts transactions profile";

/// Client credentials and endpoints for the Endaoment authorization server.
#[derive(Clone, Debug)]
pub struct OAuthSettings {
    pub client_id: ClientId,
    pub client_secret: ClientSecret,
    pub redirect_url: RedirectUrl,
    pub auth_url: AuthUrl,
    pub token_url: TokenUrl,
}

impl OAuthSettings {
    pub fn new(
        client_id: ClientId,
        client_secret: ClientSecret,
        redirect_url: RedirectUrl,
        urls: &EndaomentUrls,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            client_id,
            client_secret,
            redirect_url,
            auth_url: AuthUrl::new(urls.authorize_endpoint())?,
            token_url: TokenUrl::new(urls.token_endpoint())?,
        })
    }

    pub fn from_config(config: &ApiConfig) -> anyhow::Result<Self> {
        Self::new(
            config.client_id.clone(),
            config.client_secret.clone(),
            config.redirect_url.clone(),
            &config.endaoment_urls,
        )
    }

    /// Authorization URL the browser is sent to for `attempt`.
    ///
    /// Spaces are encoded as `%20`; the authorization server does not accept `+`.
    pub fn authorization_url(&self, attempt: &LoginAttempt) -> String {
        let mut url = self.auth_url.url().clone();

        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("prompt", "login")
            .append_pair("scope", LOGIN_SCOPES)
            .append_pair("client_id", self.client_id.as_str())
            .append_pair("redirect_uri", self.redirect_url.as_str())
            .append_pair("code_challenge", &attempt.code_challenge)
            .append_pair("code_challenge_method", "S256")
            .append_pair("state", &attempt.state);

        // Form encoding escapes literal '+' as %2B, so any '+' left is a space.
        url.to_string().replace('+', "%20")
    }
}
