//! Post service library
//!
//! Owns the post entities of the newsroom backend. Besides the plain CRUD
//! surface this service runs the review-status consumer (applies reviewer
//! decisions arriving over Kafka onto posts) and the cascading delete
//! coordinator (purges dependent reviews in review-service before a post
//! row is removed).

pub mod clients;
pub mod config;
pub mod consumers;
pub mod db;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};
