//! Notification service library
//!
//! Delivers email notifications over SMTP. Callers (review-service) treat
//! this service as best-effort; it treats the SMTP relay as the upstream
//! dependency whose failures map to 502.

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};
