// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read from the environment once at startup (after `.env`
//! is loaded, if present). A missing or malformed required value aborts
//! startup before the listener binds.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `ALLOWED_ORIGINS` | Comma-separated CORS allow-list | Required |
//! | `FIREBASE_KEY_B64` | Base64 service-account JSON (provides `project_id`) | Required |
//! | `DATABASE_URL` | Postgres connection string | Required |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `WEB_DIST_DIR` | Web client build output | `webdist` |
//! | `FIREBASE_JWKS_URL` | Signing-key endpoint (HTTPS) | Google secure-token JWKS |
//! | `AUTH_VERIFY_TIMEOUT_SECS` | Deadline for one token verification | `10` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use axum::http::HeaderValue;
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::Deserialize;

use crate::auth::FIREBASE_JWKS_URL;

pub const ALLOWED_ORIGINS_ENV: &str = "ALLOWED_ORIGINS";
pub const FIREBASE_KEY_ENV: &str = "FIREBASE_KEY_B64";
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const WEB_DIST_DIR_ENV: &str = "WEB_DIST_DIR";
pub const JWKS_URL_ENV: &str = "FIREBASE_JWKS_URL";
pub const VERIFY_TIMEOUT_ENV: &str = "AUTH_VERIFY_TIMEOUT_SECS";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_WEB_DIST_DIR: &str = "webdist";
const DEFAULT_VERIFY_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),
    #[error("invalid {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// The parts of a service-account key this server needs.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ServiceAccount {
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub client_email: Option<String>,
}

impl ServiceAccount {
    /// Decode the base64 (standard alphabet) service-account JSON.
    pub fn from_base64(encoded: &str) -> Result<Self, ConfigError> {
        let decoded = STANDARD
            .decode(encoded.trim())
            .map_err(|e| ConfigError::invalid(FIREBASE_KEY_ENV, format!("not base64: {e}")))?;

        let account: ServiceAccount = serde_json::from_slice(&decoded)
            .map_err(|e| ConfigError::invalid(FIREBASE_KEY_ENV, format!("not JSON: {e}")))?;

        if account.project_id.trim().is_empty() {
            return Err(ConfigError::invalid(FIREBASE_KEY_ENV, "project_id is missing"));
        }
        Ok(account)
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub allowed_origins: Vec<HeaderValue>,
    pub service_account: ServiceAccount,
    pub database_url: String,
    pub web_dist_dir: PathBuf,
    pub jwks_url: String,
    pub verify_timeout: Duration,
}

impl Config {
    /// Load from the process environment. The binary loads `.env` into it
    /// once at startup, before logging is configured.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through `lookup`; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let allowed_origins = parse_origins(&require(ALLOWED_ORIGINS_ENV)?)?;
        let service_account = ServiceAccount::from_base64(&require(FIREBASE_KEY_ENV)?)?;
        let database_url = require(DATABASE_URL_ENV)?;

        let host = get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match get(PORT_ENV) {
            Some(port) => port
                .trim()
                .parse::<u16>()
                .map_err(|e| ConfigError::invalid(PORT_ENV, e.to_string()))?,
            None => DEFAULT_PORT,
        };
        let addr: SocketAddr = format!("{host}:{port}")
            .parse()
            .map_err(|_| ConfigError::invalid(HOST_ENV, format!("cannot bind to {host}:{port}")))?;

        let web_dist_dir = get(WEB_DIST_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_WEB_DIST_DIR));

        let jwks_url = get(JWKS_URL_ENV).unwrap_or_else(|| FIREBASE_JWKS_URL.to_string());
        let parsed = url::Url::parse(&jwks_url)
            .map_err(|e| ConfigError::invalid(JWKS_URL_ENV, e.to_string()))?;
        if parsed.scheme() != "https" {
            return Err(ConfigError::invalid(JWKS_URL_ENV, "must use https"));
        }

        let verify_timeout = match get(VERIFY_TIMEOUT_ENV) {
            Some(secs) => match secs.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::invalid(
                        VERIFY_TIMEOUT_ENV,
                        "expected a positive number of seconds",
                    ))
                }
            },
            None => Duration::from_secs(DEFAULT_VERIFY_TIMEOUT_SECS),
        };

        Ok(Self {
            addr,
            allowed_origins,
            service_account,
            database_url,
            web_dist_dir,
            jwks_url,
            verify_timeout,
        })
    }
}

/// Split and trim the origin list; every entry must be a valid header value.
fn parse_origins(raw: &str) -> Result<Vec<HeaderValue>, ConfigError> {
    let origins = raw
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(|origin| {
            HeaderValue::from_str(origin)
                .map_err(|_| ConfigError::invalid(ALLOWED_ORIGINS_ENV, format!("bad origin {origin:?}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if origins.is_empty() {
        return Err(ConfigError::Missing(ALLOWED_ORIGINS_ENV));
    }
    Ok(origins)
}
