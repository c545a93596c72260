use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use axum_extra::extract::cookie::Key;
use cookie::{Cookie, CookieJar as RawCookieJar, Key as RawKey};
use http_body_util::BodyExt;
use ndao_api::{
    ApiConfig,
    auth::{session::ACCESS_TOKEN_NAME, store::MemoryLoginStore},
    router,
    state::ApiState,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::MockServer;

pub const CLIENT_ID: &str = "test-client";
pub const CLIENT_SECRET: &str = "test-secret";
pub const REDIRECT_URI: &str = "http://localhost:5454/";
pub const FRONTEND_URL: &str = "http://localhost:5173";
pub const ACCESS_TOKEN: &str = "access-123";
pub const API_KEY: &str = "test-api-key";
pub const ADVISOR_ID: &str = "advisor-42";
pub const COOKIE_SECRET: &str =
    "test_cookie_secret_minimum_64_characters_long_for_secure_encryption";

/// Token endpoint response used throughout the tests
pub fn token_response() -> Value {
    json!({
        "access_token": ACCESS_TOKEN,
        "token_type": "Bearer",
        "expires_in": 3600,
        "id_token": "header.payload.signature",
        "refresh_token": "refresh-456",
        "scope": "openid accounts transactions profile",
    })
}

/// Test state builder pointing the Endaoment client at a mock server
pub struct TestStateBuilder {
    vars: Vec<(String, String)>,
}

impl TestStateBuilder {
    pub fn new(endaoment_uri: &str) -> Self {
        let vars = [
            ("ENDAOMENT_CLIENT_ID", CLIENT_ID),
            ("ENDAOMENT_CLIENT_SECRET", CLIENT_SECRET),
            ("ENDAOMENT_REDIRECT_URI", REDIRECT_URI),
            ("FRONTEND_URL", FRONTEND_URL),
            ("ENDAOMENT_ENVIRONMENT", "dev"),
            ("ENDAOMENT_AUTH_URL", endaoment_uri),
            ("ENDAOMENT_API_URL", endaoment_uri),
            ("ENDAOMENT_API_KEY", API_KEY),
            ("ENDAOMENT_WEALTH_ADVISOR_ID", ADVISOR_ID),
            ("COOKIE_SECRET", COOKIE_SECRET),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self { vars }
    }

    /// Remove a variable, e.g. to simulate a missing API key
    pub fn without(mut self, key: &str) -> Self {
        self.vars.retain(|(k, _)| k != key);
        self
    }

    /// Set or override a variable
    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.vars.retain(|(k, _)| k != key);
        self.vars.push((key.to_string(), value.to_string()));
        self
    }

    pub fn build(self) -> anyhow::Result<(ApiState, Arc<MemoryLoginStore>)> {
        let config = ApiConfig::from_iter(self.vars)?;
        let store = Arc::new(MemoryLoginStore::new(config.login_state_ttl));
        let state = ApiState::with_login_store(config, store.clone())?;

        Ok((state, store))
    }

    /// Build state the way the server does, with the configured login store
    pub async fn build_from_config(self) -> anyhow::Result<ApiState> {
        let config = ApiConfig::from_iter(self.vars)?;
        ApiState::new(config).await
    }
}

/// Mock Endaoment, app state and a client for the router
pub struct TestContext {
    pub server: MockServer,
    pub state: ApiState,
    pub store: Arc<MemoryLoginStore>,
    pub client: TestClient,
}

impl TestContext {
    pub async fn new() -> Self {
        Self::with_builder(|builder| builder).await
    }

    pub async fn with_builder(customize: impl FnOnce(TestStateBuilder) -> TestStateBuilder) -> Self {
        let server = MockServer::start().await;
        let (state, store) = customize(TestStateBuilder::new(&server.uri()))
            .build()
            .expect("Failed to create test state");

        let client = TestClient::new(
            router::router().with_state(state.clone()),
            state.cookie_key.clone(),
        );

        Self {
            server,
            state,
            store,
            client,
        }
    }
}

/// Helper to make requests to the test app
pub struct TestClient {
    router: Router,
    cookie_key: Key,
}

impl TestClient {
    pub fn new(router: Router, cookie_key: Key) -> Self {
        Self { router, cookie_key }
    }

    /// Send a request and get the response
    pub async fn request(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to execute request");

        let status = response.status();
        let headers = response.headers().clone();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read response body")
            .to_bytes();

        TestResponse {
            status,
            body: body_bytes.to_vec(),
            headers,
        }
    }

    /// `Cookie` header carrying `session_json` in an encrypted `ndao_token` cookie
    pub fn session_cookie_header(&self, session_json: &str) -> String {
        let raw_key = RawKey::try_from(self.cookie_key.master()).expect("Invalid key");
        let mut raw_jar = RawCookieJar::new();
        raw_jar
            .private_mut(&raw_key)
            .add(Cookie::new(ACCESS_TOKEN_NAME, session_json.to_string()));

        let encrypted = raw_jar.get(ACCESS_TOKEN_NAME).expect("Cookie should exist");
        format!("{}={}", encrypted.name(), encrypted.value())
    }

    /// Decrypt a private cookie value set by the server
    pub fn decrypt_cookie(&self, name: &str, encrypted_value: &str) -> Option<String> {
        let raw_key = RawKey::try_from(self.cookie_key.master()).expect("Invalid key");
        let mut raw_jar = RawCookieJar::new();
        raw_jar.add_original(Cookie::new(name.to_string(), encrypted_value.to_string()));

        raw_jar
            .private(&raw_key)
            .get(name)
            .map(|cookie| cookie.value().to_string())
    }

    fn builder(&self, method: Method, uri: &str, session: Option<&str>) -> axum::http::request::Builder {
        let builder = Request::builder().method(method).uri(uri);

        match session {
            Some(session_json) => {
                builder.header(header::COOKIE, self.session_cookie_header(session_json))
            }
            None => builder,
        }
    }

    /// Send a GET request
    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Method::GET, uri, None, None).await
    }

    /// Send a GET request as a signed-in user
    pub async fn get_signed_in(&self, uri: &str) -> TestResponse {
        self.send(Method::GET, uri, None, Some(&default_session())).await
    }

    /// Send a POST request with JSON body as a signed-in user
    pub async fn post_json_signed_in(&self, uri: &str, body: &Value) -> TestResponse {
        self.send(Method::POST, uri, Some(body.to_string()), Some(&default_session()))
            .await
    }

    /// Send a DELETE request as a signed-in user
    pub async fn delete_signed_in(&self, uri: &str) -> TestResponse {
        self.send(Method::DELETE, uri, None, Some(&default_session()))
            .await
    }

    /// Send a request with an optional raw JSON body and optional session cookie
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<String>,
        session: Option<&str>,
    ) -> TestResponse {
        let builder = self.builder(method, uri, session);

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body)),
            None => builder.body(Body::empty()),
        }
        .expect("Failed to build request");

        self.request(request).await
    }
}

/// Serialized session of a signed-in user
pub fn default_session() -> String {
    token_response().to_string()
}

/// Test response wrapper
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
    pub headers: axum::http::HeaderMap,
}

impl TestResponse {
    /// Get response body as string
    pub fn text(&self) -> String {
        String::from_utf8(self.body.clone()).expect("Response body is not valid UTF-8")
    }

    /// Parse response body as JSON
    pub fn json<T: for<'de> Deserialize<'de>>(&self) -> T {
        serde_json::from_slice(&self.body).expect("Failed to parse JSON response")
    }

    /// Assert status code
    pub fn assert_status(&self, expected: StatusCode) {
        assert_eq!(
            self.status,
            expected,
            "Expected status {}, got {}. Body: {}",
            expected,
            self.status,
            self.text()
        );
    }

    /// The `Set-Cookie` entry for `name`, decoded
    pub fn get_cookie(&self, name: &str) -> Option<Cookie<'static>> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter_map(|value| Cookie::parse_encoded(value.to_string()).ok())
            .find(|cookie| cookie.name() == name)
    }

    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
    }
}
