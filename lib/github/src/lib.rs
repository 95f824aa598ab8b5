//! GitHub identity API client for orggate.
//!
//! Implements [`orggate_access::IdentityApi`] over the GitHub REST API and
//! loads the user profile after the OAuth code exchange. Also owns the
//! GitHub OAuth app configuration consumed by the server.

mod client;
mod config;

pub use client::GithubClient;
pub use config::{GithubConfig, GithubConfigBuilder};
