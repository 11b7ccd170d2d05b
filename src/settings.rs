//! Process settings read from the environment at startup.
//! Invalid values fail fast instead of surfacing at request time.

use crate::error::ConfigError;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub backend: BackendKind,
    /// Required when `backend` is Postgres.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub bind_addr: String,
    pub log_format: LogFormat,
    pub max_body_bytes: usize,
    pub api_title: String,
    pub config_path: PathBuf,
}

fn invalid(var: &str, value: &str, why: &str) -> ConfigError {
    ConfigError::Validation(format!("{}='{}': {}", var, value, why))
}

fn parse_num<T: std::str::FromStr>(var: &str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(s) => s.trim().parse().map_err(|_| invalid(var, &s, "expected a positive number")),
    }
}

impl Settings {
    /// Read settings from the process environment, after loading `.env` if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build settings from any key lookup; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |k: &str| lookup(k).filter(|v| !v.trim().is_empty());

        let backend = match get("CRUD_BACKEND") {
            None => BackendKind::Memory,
            Some(s) if s.eq_ignore_ascii_case("memory") => BackendKind::Memory,
            Some(s) if s.eq_ignore_ascii_case("postgres") => BackendKind::Postgres,
            Some(s) => return Err(invalid("CRUD_BACKEND", &s, "expected memory or postgres")),
        };

        let database_url = get("DATABASE_URL");
        if backend == BackendKind::Postgres && database_url.is_none() {
            return Err(ConfigError::Validation(
                "DATABASE_URL is required when CRUD_BACKEND=postgres".into(),
            ));
        }

        let log_format = match get("LOG_FORMAT") {
            Some(s) if s.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        let database_max_connections = parse_num("DATABASE_MAX_CONNECTIONS", get("DATABASE_MAX_CONNECTIONS"), 5u32)?;
        if database_max_connections == 0 {
            return Err(invalid("DATABASE_MAX_CONNECTIONS", "0", "must be at least 1"));
        }

        Ok(Self {
            backend,
            database_url,
            database_max_connections,
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| "127.0.0.1:3000".into()),
            log_format,
            max_body_bytes: parse_num("MAX_BODY_BYTES", get("MAX_BODY_BYTES"), 1024 * 1024)?,
            api_title: get("API_TITLE").unwrap_or_else(|| "CRUD API".into()),
            config_path: PathBuf::from(get("CRUD_CONFIG_PATH").unwrap_or_else(|| "crud.json".into())),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Settings::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults() {
        let s = settings(&[]).unwrap();
        assert_eq!(s.backend, BackendKind::Memory);
        assert_eq!(s.bind_addr, "127.0.0.1:3000");
        assert_eq!(s.log_format, LogFormat::Pretty);
        assert_eq!(s.max_body_bytes, 1024 * 1024);
        assert_eq!(s.database_max_connections, 5);
        assert_eq!(s.config_path, PathBuf::from("crud.json"));
    }

    #[test]
    fn postgres_requires_url() {
        assert!(settings(&[("CRUD_BACKEND", "postgres")]).is_err());
        let s = settings(&[("CRUD_BACKEND", "Postgres"), ("DATABASE_URL", "postgres://localhost/crud")]).unwrap();
        assert_eq!(s.backend, BackendKind::Postgres);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(settings(&[("CRUD_BACKEND", "sqlite")]).is_err());
        assert!(settings(&[("MAX_BODY_BYTES", "lots")]).is_err());
        assert!(settings(&[("DATABASE_MAX_CONNECTIONS", "0")]).is_err());
        assert_eq!(settings(&[("LOG_FORMAT", "JSON")]).unwrap().log_format, LogFormat::Json);
    }
}
