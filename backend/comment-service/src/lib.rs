//! Comment service library
//!
//! Plain CRUD over reader comments attached to posts. No messaging and no
//! cross-service coordination; posts referenced by `post_id` live in
//! post-service and are not validated here.

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};
