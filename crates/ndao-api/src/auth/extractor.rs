use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};

use super::session::{SessionToken, session_from_jar};
use crate::error::ApiError;

/// Bearer token of the signed-in user
///
/// Add this to a handler's arguments to make the route require a session.
/// Requests without a readable, well-formed `ndao_token` cookie are rejected
/// with `401` before the handler runs.
///
/// # Example
/// ```
/// use axum::extract::State;
/// use ndao_api::{ApiState, auth::AccessToken, error::ApiError};
///
/// async fn protected_route(
///     token: AccessToken,
///     State(state): State<ApiState>,
/// ) -> Result<(), ApiError> {
///     let _bearer = token.bearer();
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub session: SessionToken,
}

impl AccessToken {
    pub fn bearer(&self) -> &str {
        &self.session.access_token
    }
}

impl<S> FromRequestParts<S> for AccessToken
where
    Key: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar = PrivateCookieJar::<Key>::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::Unauthorized("Failed to read cookies".to_string()))?;

        let session = session_from_jar(&jar)
            .ok_or_else(|| ApiError::Unauthorized("User not authenticated".to_string()))?;

        Ok(Self { session })
    }
}
