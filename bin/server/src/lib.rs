//! orggate web server.
//!
//! Serves the GitHub OAuth login flow, gates it on organization membership
//! and keeps the authorized identity, with its team roles, in an encrypted
//! session cookie.

pub mod app;
pub mod auth;
pub mod config;
pub mod error;
