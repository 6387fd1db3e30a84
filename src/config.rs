use thiserror::Error;

/// Environment variable naming the backing store.
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("no database configured: pass --database-url or set {DATABASE_URL_ENV}")]
    MissingDatabaseUrl,
}

/// Runtime configuration resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: String,
}

impl Config {
    /// Resolve from an explicit value, falling back to `DATABASE_URL`.
    pub fn resolve(explicit: Option<String>) -> Result<Self, ConfigError> {
        Self::resolve_with(explicit, |key| std::env::var(key).ok())
    }

    /// Like [`Config::resolve`] but with a caller-supplied environment lookup.
    pub fn resolve_with<F>(explicit: Option<String>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = explicit
            .filter(|v| !v.trim().is_empty())
            .or_else(|| lookup(DATABASE_URL_ENV).filter(|v| !v.trim().is_empty()))
            .ok_or(ConfigError::MissingDatabaseUrl)?;

        Ok(Self {
            database_url: database_url.trim().to_string(),
        })
    }
}
