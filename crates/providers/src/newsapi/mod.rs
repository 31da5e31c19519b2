pub mod client;
pub mod config;

pub use client::NewsApiClient;
pub use config::NewsApiConfig;
