/// Configuration management for Notification Service
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// CORS configuration
    pub cors: CorsConfig,
    /// SMTP relay configuration
    pub smtp: SmtpConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (dev, staging, prod)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins
    pub allowed_origins: String,
}

/// SMTP relay configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    /// Use STARTTLS towards the relay
    pub starttls: bool,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Sender address on outgoing mail
    pub from: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        Ok(Config {
            app: AppConfig {
                env: app_env.clone(),
                host: std::env::var("NOTIFICATION_SERVICE_HOST")
                    .unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: std::env::var("NOTIFICATION_SERVICE_PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(8084),
            },
            cors: {
                let allowed_origins = match std::env::var("CORS_ALLOWED_ORIGINS") {
                    Ok(value) => value,
                    Err(_) if app_env.eq_ignore_ascii_case("production") => {
                        return Err("CORS_ALLOWED_ORIGINS must be set in production".to_string())
                    }
                    Err(_) => "http://localhost:4200".to_string(),
                };

                if app_env.eq_ignore_ascii_case("production") && allowed_origins.trim() == "*" {
                    return Err("CORS_ALLOWED_ORIGINS cannot be '*' in production".to_string());
                }

                CorsConfig { allowed_origins }
            },
            smtp: {
                let password = std::env::var("SMTP_PASSWORD").ok();
                if app_env.eq_ignore_ascii_case("production") && password.is_none() {
                    return Err("SMTP_PASSWORD must be set in production".to_string());
                }

                SmtpConfig {
                    host: std::env::var("SMTP_HOST").unwrap_or_else(|_| "localhost".to_string()),
                    port: std::env::var("SMTP_PORT")
                        .ok()
                        .and_then(|p| p.parse().ok())
                        .unwrap_or(587),
                    starttls: std::env::var("SMTP_STARTTLS")
                        .map(|v| v.eq_ignore_ascii_case("true"))
                        .unwrap_or(false),
                    username: std::env::var("SMTP_USERNAME").ok(),
                    password,
                    from: std::env::var("SMTP_FROM")
                        .unwrap_or_else(|_| "no-reply@newsroom.dev".to_string()),
                }
            },
        })
    }
}
