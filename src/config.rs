use std::env;

use crate::error::{AppError, Result};

pub const DEFAULT_SESSION_COOKIE: &str = "storefront_session";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: Option<DatabaseConfig>,
    pub nats_url: Option<String>,
    pub session_cookie: String,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

fn parse_or<T: std::str::FromStr>(var: &str, default: &str) -> Result<T> {
    env::var(var)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .map_err(|_| AppError::Config(format!("Invalid {var} value")))
}

fn non_empty(var: &str) -> Option<String> {
    env::var(var).ok().filter(|v| !v.trim().is_empty())
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let database = match non_empty("DATABASE_URL") {
            Some(url) => Some(DatabaseConfig { url, max_connections: parse_or("DB_MAX_CONNECTIONS", "10")? }),
            None => None,
        };

        let session_cookie = non_empty("SESSION_COOKIE").unwrap_or_else(|| DEFAULT_SESSION_COOKIE.to_string());
        if !session_cookie.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
            return Err(AppError::Config("Invalid SESSION_COOKIE value".to_string()));
        }

        Ok(Self {
            server: ServerConfig {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_or("PORT", "8083")?,
            },
            database,
            nats_url: non_empty("NATS_URL"),
            session_cookie,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
