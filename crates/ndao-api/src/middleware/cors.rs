use axum::http::{HeaderName, HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, CorsLayer};

use super::request_id::REQUEST_ID_HEADER;

/// Creates a CORS layer for the frontend origin(s)
///
/// Credentials are allowed so the browser sends the session cookie along
/// with cross-origin calls from the frontend. Origins that are not valid
/// header values are skipped with a warning.
pub fn create_cors_layer<I, S>(allowed_origins: I) -> CorsLayer
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let origins = allowed_origins
        .into_iter()
        .filter_map(|origin| {
            let origin = origin.as_ref().trim_end_matches('/');
            match origin.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!("Ignoring invalid CORS origin {origin:?}");
                    None
                }
            }
        })
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
        .allow_credentials(true)
}
