use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { var: &'static str, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(var) => write!(f, "{var} must be set"),
            ConfigError::Invalid { var, reason } => write!(f, "{var} is invalid: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Process configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub data_dir: PathBuf,
    pub session_key: Option<String>,
    pub org_name: String,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl AppConfig {
    /// Load `.env` if present, then read the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                log::warn!("Ignoring unreadable .env file: {e}");
            }
        }
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        if !database_url.starts_with("postgres://") && !database_url.starts_with("postgresql://") {
            return Err(ConfigError::Invalid {
                var: "DATABASE_URL",
                reason: "expected a postgres:// URL".to_string(),
            });
        }

        let admin_email = get("ADMIN_EMAIL");
        let admin_password = get("ADMIN_PASSWORD");
        if admin_email.is_some() != admin_password.is_some() {
            return Err(ConfigError::Invalid {
                var: "ADMIN_EMAIL",
                reason: "ADMIN_EMAIL and ADMIN_PASSWORD must be set together".to_string(),
            });
        }

        Ok(Self {
            database_url,
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| "127.0.0.1:8080".to_string()),
            data_dir: get("DATA_DIR").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("data")),
            session_key: get("SESSION_KEY"),
            org_name: get("ORG_NAME").unwrap_or_else(|| "Field Operations".to_string()),
            admin_email,
            admin_password,
        })
    }
}
