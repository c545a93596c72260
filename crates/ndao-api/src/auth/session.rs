use axum_extra::extract::PrivateCookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use serde::{Deserialize, Serialize};

use crate::config::Environment;

/// Name of the cookie holding the Endaoment token response.
pub const ACCESS_TOKEN_NAME: &str = "ndao_token";

/// Cookie lifetime. Independent of the token's own `expires_in`.
pub const SESSION_MAX_AGE_HOURS: i64 = 24;

/// Token endpoint response, stored verbatim in the session cookie.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionToken {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    /// Only issued when the `offline_access` scope was granted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl SessionToken {
    /// Parse a cookie payload, rejecting anything that does not carry a usable access token.
    pub fn from_cookie_value(value: &str) -> Option<Self> {
        serde_json::from_str::<Self>(value)
            .ok()
            .filter(|token| !token.access_token.trim().is_empty())
    }
}

/// The session carried by `jar`, if any and well-formed.
pub fn session_from_jar(jar: &PrivateCookieJar) -> Option<SessionToken> {
    let cookie = jar.get(ACCESS_TOKEN_NAME)?;
    let session = SessionToken::from_cookie_value(cookie.value());

    if session.is_none() {
        tracing::warn!("Ignoring malformed {ACCESS_TOKEN_NAME} cookie");
    }

    session
}

/// Create the session cookie holding the serialized token response
///
/// HTTP-only so page scripts never see the token. Cookies are secure
/// (HTTPS-only) in production; in development they work over plain HTTP.
pub fn create_session_cookie(token_json: String, environment: &Environment) -> Cookie<'static> {
    Cookie::build((ACCESS_TOKEN_NAME, token_json))
        .path("/")
        .max_age(time::Duration::hours(SESSION_MAX_AGE_HOURS))
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(environment.is_production())
        .build()
}

/// Cookie matching the session cookie's path, for removal.
pub fn session_removal_cookie() -> Cookie<'static> {
    Cookie::build((ACCESS_TOKEN_NAME, "")).path("/").build()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token() -> SessionToken {
        SessionToken {
            access_token: "access".to_string(),
            token_type: "Bearer".to_string(),
            expires_in: 3600,
            id_token: Some("id".to_string()),
            refresh_token: None,
            scope: None,
        }
    }

    #[test]
    fn test_create_session_cookie_development() {
        let cookie = create_session_cookie("{}".to_string(), &Environment::Development);

        assert_eq!(cookie.name(), "ndao_token");
        assert_eq!(cookie.value(), "{}");
        assert_eq!(cookie.path(), Some("/"));
        assert!(cookie.http_only().unwrap_or(false));
        assert_eq!(cookie.max_age(), Some(time::Duration::hours(24)));
        assert!(
            !cookie.secure().unwrap_or(true),
            "Should not be secure in development"
        );
    }

    #[test]
    fn test_create_session_cookie_production() {
        let cookie = create_session_cookie("{}".to_string(), &Environment::Production);

        assert!(cookie.http_only().unwrap_or(false));
        assert!(
            cookie.secure().unwrap_or(false),
            "Should be secure in production"
        );
    }

    #[test]
    fn test_session_token_round_trip_omits_absent_fields() {
        let json = serde_json::to_value(token()).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "access_token": "access",
                "token_type": "Bearer",
                "expires_in": 3600,
                "id_token": "id",
            })
        );
    }

    #[test]
    fn test_from_cookie_value_validates_shape() {
        let valid = serde_json::to_string(&token()).unwrap();
        assert_eq!(SessionToken::from_cookie_value(&valid), Some(token()));

        assert_eq!(SessionToken::from_cookie_value("not json"), None);
        assert_eq!(SessionToken::from_cookie_value(r#"{"access_token":"a"}"#), None);
        assert_eq!(
            SessionToken::from_cookie_value(
                r#"{"access_token":"  ","token_type":"Bearer","expires_in":1}"#
            ),
            None
        );
    }
}
