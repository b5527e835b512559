use crate::errors::{Error, Result};
use sqlx::postgres::{PgConnectOptions, PgSslMode};
use std::env;
use std::str::FromStr;

/// Runtime settings read from the environment at startup
#[derive(Debug, Clone)]
pub struct Config {
    pub db_host: String,
    pub db_port: u16,
    pub db_user: String,
    pub db_password: String,
    pub db_name: String,
    pub db_ssl: bool,
    /// Keep TLS but skip certificate verification. Opt-in only.
    pub db_accept_invalid_certs: bool,
    pub db_max_connections: u32,
    pub http_port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Self {
            db_host: text("DB_HOST", "localhost"),
            db_port: parsed(&lookup, "DB_PORT", 5432)?,
            db_user: text("DB_USER", "postgres"),
            db_password: text("DB_PASSWORD", ""),
            db_name: text("DB_NAME", "postgres"),
            db_ssl: flag(&lookup, "DB_SSL", true)?,
            db_accept_invalid_certs: flag(&lookup, "DB_ACCEPT_INVALID_CERTS", false)?,
            db_max_connections: parsed(&lookup, "DB_MAX_CONNECTIONS", 20)?,
            http_port: parsed(&lookup, "PORT", 3000)?,
        })
    }

    pub fn http_addr(&self) -> String {
        format!("0.0.0.0:{}", self.http_port)
    }

    pub fn ssl_mode(&self) -> PgSslMode {
        match (self.db_ssl, self.db_accept_invalid_certs) {
            (false, _) => PgSslMode::Disable,
            (true, true) => PgSslMode::Require,
            (true, false) => PgSslMode::VerifyFull,
        }
    }

    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.db_host)
            .port(self.db_port)
            .username(&self.db_user)
            .password(&self.db_password)
            .database(&self.db_name)
            .ssl_mode(self.ssl_mode())
    }
}

fn parsed<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("{} has an invalid value: {:?}", key, raw))),
        None => Ok(default),
    }
}

fn flag<F>(lookup: &F, key: &str, default: bool) -> Result<bool>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).as_deref().map(str::trim) {
        None | Some("") => Ok(default),
        Some("1") | Some("true") | Some("TRUE") | Some("yes") => Ok(true),
        Some("0") | Some("false") | Some("FALSE") | Some("no") => Ok(false),
        Some(other) => Err(Error::Config(format!(
            "{} must be a boolean, got {:?}",
            key, other
        ))),
    }
}
