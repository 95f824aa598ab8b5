//! Core types and utilities shared by the orggate crates.
//!
//! This crate provides the foundational error alias and strongly-typed
//! identifiers used by the access core, the GitHub client and the server.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{AuthEventId, ParseIdError, SessionId};
