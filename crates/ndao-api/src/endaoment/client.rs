//! HTTP client for the Endaoment authorization server and REST API.

use std::time::{Duration, Instant};

use axum::{
    Json,
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
};
use reqwest::RequestBuilder;
use serde::Serialize;
use serde_json::{Value, json};

use super::urls::EndaomentUrls;
use crate::{
    auth::{oauth::OAuthSettings, session::SessionToken},
    error::ApiError,
    metrics,
};

/// Thin wrapper over one shared [`reqwest::Client`].
#[derive(Clone, Debug)]
pub struct EndaomentClient {
    http: reqwest::Client,
    urls: EndaomentUrls,
}

/// Status and JSON body of an Endaoment API response, relayed to the caller as-is.
#[derive(Clone, Debug, PartialEq)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl UpstreamResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

impl IntoResponse for UpstreamResponse {
    fn into_response(self) -> Response {
        let status = if self.status.is_success() {
            StatusCode::OK
        } else {
            self.status
        };

        (status, Json(self.body)).into_response()
    }
}

impl EndaomentClient {
    pub fn new(urls: EndaomentUrls, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, urls })
    }

    /// Exchange an authorization code (plus its PKCE verifier) for tokens.
    pub async fn exchange_code(
        &self,
        oauth: &OAuthSettings,
        code: &str,
        code_verifier: &str,
    ) -> Result<SessionToken, ApiError> {
        let request = self
            .http
            .post(oauth.token_url.as_str())
            .basic_auth(oauth.client_id.as_str(), Some(oauth.client_secret.secret()))
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("code_verifier", code_verifier),
                ("redirect_uri", oauth.redirect_url.as_str()),
            ]);

        let start = Instant::now();
        let result = request.send().await;
        let response = match result {
            Ok(response) => response,
            Err(e) => {
                metrics::record_upstream_call("token", "error", start.elapsed().as_secs_f64());
                return Err(ApiError::TokenExchange(e.to_string()));
            }
        };

        let status = response.status();
        metrics::record_upstream_call("token", status.as_str(), start.elapsed().as_secs_f64());

        let body = response
            .text()
            .await
            .map_err(|e| ApiError::TokenExchange(e.to_string()))?;

        if !status.is_success() {
            tracing::error!(status = %status, body = %body, "Token endpoint rejected the code exchange");
            return Err(ApiError::TokenExchange(format!(
                "token endpoint returned {status}"
            )));
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Unexpected token endpoint response: {e}");
            ApiError::TokenExchange("unexpected token response".to_string())
        })
    }

    /// Request against `{api}{path}`, carrying the user's bearer token when given.
    pub fn request(&self, method: Method, path: &str, bearer: Option<&str>) -> RequestBuilder {
        let request = self.http.request(method, self.urls.api_url(path));

        match bearer {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    pub async fn get(
        &self,
        operation: &'static str,
        path: &str,
        bearer: Option<&str>,
    ) -> Result<UpstreamResponse, ApiError> {
        self.send(operation, self.request(Method::GET, path, bearer))
            .await
    }

    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        operation: &'static str,
        path: &str,
        bearer: &str,
        body: &T,
    ) -> Result<UpstreamResponse, ApiError> {
        let request = self.request(Method::POST, path, Some(bearer)).json(body);
        self.send(operation, request).await
    }

    pub async fn delete(
        &self,
        operation: &'static str,
        path: &str,
        bearer: &str,
    ) -> Result<UpstreamResponse, ApiError> {
        self.send(operation, self.request(Method::DELETE, path, Some(bearer)))
            .await
    }

    /// Execute `request`, recording it under `operation`.
    ///
    /// Non-2xx statuses are returned, not raised. Only transport failures
    /// become errors.
    pub async fn send(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<UpstreamResponse, ApiError> {
        let start = Instant::now();

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                metrics::record_upstream_call(operation, "error", start.elapsed().as_secs_f64());
                tracing::error!(operation, "Endaoment request failed: {e}");
                return Err(e.into());
            }
        };

        let status = response.status();
        let bytes = response.bytes().await?;
        metrics::record_upstream_call(operation, status.as_str(), start.elapsed().as_secs_f64());

        if status.is_success() {
            tracing::debug!(operation, status = %status, "Endaoment request succeeded");
        } else {
            tracing::warn!(operation, status = %status, "Endaoment returned an error status");
        }

        Ok(UpstreamResponse {
            status,
            body: parse_body(&bytes),
        })
    }
}

// Empty bodies become `null`; anything that is not JSON is wrapped as a message.
fn parse_body(bytes: &[u8]) -> Value {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }

    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| json!({ "message": String::from_utf8_lossy(bytes) }))
}
