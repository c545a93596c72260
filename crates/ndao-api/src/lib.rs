//! Backend for the Endaoment quickstart: signs users in with Endaoment over
//! OAuth2 + PKCE and proxies fund, grant, donation and collaborator calls to
//! the Endaoment API on their behalf.

pub mod auth;
pub mod collaborators;
pub mod config;
pub mod donations;
pub mod endaoment;
pub mod error;
pub mod funds;
pub mod jobs;
pub mod metrics;
pub mod middleware;
pub mod router;
pub mod state;
pub mod tracing;
pub mod validation;

pub use config::ApiConfig;
pub use state::ApiState;
