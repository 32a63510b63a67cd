//! Review service library
//!
//! Records reviewer decisions about posts. Every recorded decision is
//! published as a `ReviewDecisionEvent` after its row is durably stored, so
//! post-service can synchronize post status asynchronously. Also exposes
//! the idempotent purge endpoint post-service calls while cascading a post
//! deletion.

pub mod clients;
pub mod config;
pub mod error;
pub mod handlers;
pub mod kafka;
pub mod metrics;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};
