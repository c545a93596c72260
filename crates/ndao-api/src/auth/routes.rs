use axum::{
    Json, Router,
    extract::{Query, State, rejection::QueryRejection},
    response::Redirect,
    routing::{get, post},
};
use axum_extra::extract::PrivateCookieJar;
use serde::Deserialize;
use serde_json::{Value, json};

use super::{
    pkce::LoginAttempt,
    session::{create_session_cookie, session_from_jar, session_removal_cookie},
};
use crate::{ApiState, error::ApiError, metrics, validation::require};

pub fn routes() -> Router<ApiState> {
    Router::new()
        .route("/", get(verify_login))
        .route("/init-login", get(init_login))
        .route("/check-login", get(check_login))
        .route("/logout", post(logout))
}

/// Create and store a login attempt, returning the authorization URL for it.
async fn begin_login(state: &ApiState) -> Result<String, ApiError> {
    let attempt = LoginAttempt::generate();
    let url = state.oauth.authorization_url(&attempt);

    state.login_store.put(attempt).await?;
    metrics::record_login_event("initiate", true);

    Ok(url)
}

async fn init_login(State(state): State<ApiState>) -> Result<Json<Value>, ApiError> {
    let url = begin_login(&state).await?;
    Ok(Json(json!({ "url": url })))
}

async fn check_login(
    State(state): State<ApiState>,
    jar: PrivateCookieJar,
) -> Result<Json<Value>, ApiError> {
    if session_from_jar(&jar).is_some() {
        return Ok(Json(json!({ "isSignedIn": true })));
    }

    let url = begin_login(&state).await?;
    Ok(Json(json!({ "isSignedIn": false, "url": url })))
}

#[derive(Debug, Deserialize)]
struct CallbackParams {
    state: Option<String>,
    code: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// OAuth redirect target: trade the code for tokens and start the session.
async fn verify_login(
    State(state): State<ApiState>,
    jar: PrivateCookieJar,
    params: Result<Query<CallbackParams>, QueryRejection>,
) -> Result<(PrivateCookieJar, Redirect), ApiError> {
    let Query(params) = params?;

    if let Some(error) = params.error {
        metrics::record_login_event("callback", false);
        let description = params.error_description.unwrap_or_default();
        return Err(ApiError::Validation(format!(
            "Authorization failed: {error} {description}"
        )
        .trim_end()
        .to_string()));
    }

    let login_state = require("state", params.state)?;
    let code = require("code", params.code)?;

    let Some(attempt) = state.login_store.take(&login_state).await? else {
        metrics::record_login_event("callback", false);
        return Err(ApiError::LoginState(
            "Unknown or expired login state".to_string(),
        ));
    };

    if !attempt.is_consistent(&login_state) {
        metrics::record_login_event("callback", false);
        return Err(ApiError::LoginState(
            "Stored login attempt failed verification".to_string(),
        ));
    }

    let token = match state
        .endaoment
        .exchange_code(&state.oauth, &code, &attempt.code_verifier)
        .await
    {
        Ok(token) => token,
        Err(e) => {
            metrics::record_login_event("callback", false);
            return Err(e);
        }
    };

    let token_json = serde_json::to_string(&token)
        .map_err(|e| ApiError::Internal(format!("Failed to serialize token: {e}")))?;

    let jar = jar.add(create_session_cookie(token_json, &state.environment));
    metrics::record_login_event("callback", true);
    tracing::info!("Login completed, redirecting to frontend");

    Ok((jar, Redirect::to(&state.frontend_url)))
}

async fn logout(jar: PrivateCookieJar) -> (PrivateCookieJar, Json<Value>) {
    let jar = jar.remove(session_removal_cookie());
    metrics::record_login_event("logout", true);

    (jar, Json(json!({ "message": "Logged out successfully" })))
}
