//! Process settings, loaded from environment variables.
//!
//! `main` loads an optional `.env` file first (via `dotenvy`), so every
//! variable below can also live there.

use std::str::FromStr;

/// Which `OrderRepository` implementation the process wires in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    #[default]
    Postgres,
    Memory,
}

impl StoreBackend {
    /// Parse backend from string; anything unrecognised falls back to Postgres.
    #[must_use]
    pub fn from_str_case_insensitive(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "memory" | "in_memory" | "in-memory" => Self::Memory,
            _ => Self::Postgres,
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::Memory => "memory",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

/// Connection settings for the relational store.
#[derive(Clone)]
pub struct DatabaseSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    password: String,
    pub name: String,
    pub max_connections: u32,
    /// Full URL; takes precedence over the individual parts when set.
    explicit_url: Option<String>,
}

impl DatabaseSettings {
    /// Connection URL handed to the pool.
    pub fn url(&self) -> String {
        match &self.explicit_url {
            Some(url) => url.clone(),
            None => format!(
                "postgres://{}:{}@{}:{}/{}?sslmode=disable",
                self.user, self.password, self.host, self.port, self.name
            ),
        }
    }
}

impl std::fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("name", &self.name)
            .field("max_connections", &self.max_connections)
            .field("explicit_url", &self.explicit_url.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub backend: StoreBackend,
    pub database: DatabaseSettings,
    pub http: HttpSettings,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let database = DatabaseSettings {
            host: text("DB_HOST", "127.0.0.1"),
            port: parse(&lookup, "DB_PORT", 5432)?,
            user: text("DB_USER", "postgres"),
            password: text("DB_PASSWORD", "root"),
            name: text("DB_NAME", "assignment_2"),
            max_connections: parse(&lookup, "DB_MAX_CONNECTIONS", 5)?,
            explicit_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
        };

        let http = HttpSettings {
            host: text("HTTP_HOST", "0.0.0.0"),
            port: parse(&lookup, "HTTP_PORT", 8080)?,
        };

        let backend = lookup("STORE_BACKEND")
            .map(|s| StoreBackend::from_str_case_insensitive(&s))
            .unwrap_or_default();

        Ok(Self {
            backend,
            database,
            http,
        })
    }
}

fn parse<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
    }
}
