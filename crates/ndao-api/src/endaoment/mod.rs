pub mod client;
pub mod models;
pub mod urls;

pub use client::{EndaomentClient, UpstreamResponse};
pub use urls::{EndaomentEnvironment, EndaomentUrls};
