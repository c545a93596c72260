pub mod extractor;
pub mod oauth;
pub mod pkce;
pub mod routes;
pub mod session;
pub mod store;

pub use extractor::AccessToken;
pub use routes::routes;
