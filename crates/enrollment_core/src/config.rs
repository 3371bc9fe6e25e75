//! Process configuration.
//!
//! # Responsibility
//! - Provide defaults for every setting.
//! - Layer an optional JSON file and `ENROLLMENT_*` environment variables
//!   on top of the defaults, in that order.
//!
//! # Invariants
//! - `validate()` passes before the configuration is handed to the
//!   storage, logging or bootstrap layers.
//! - The admin password is never printed through `Debug`.

use crate::auth::credential::CredentialConfig;
use crate::logging::{default_log_level, normalize_level};
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const ENV_DB_PATH: &str = "ENROLLMENT_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "ENROLLMENT_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "ENROLLMENT_LOG_DIR";
pub const ENV_ADMIN_USERNAME: &str = "ENROLLMENT_ADMIN_USERNAME";
pub const ENV_ADMIN_EMAIL: &str = "ENROLLMENT_ADMIN_EMAIL";
pub const ENV_ADMIN_PASSWORD: &str = "ENROLLMENT_ADMIN_PASSWORD";

/// Password seeded when none is configured. Operators are warned about it.
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin-password";

/// Configuration loading failure.
#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, source: serde_json::Error },
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "failed to parse config `{}`: {source}", path.display())
            }
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::Invalid(_) => None,
        }
    }
}

/// Administrator identity seeded at startup.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AdminBootstrapConfig {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

impl Default for AdminBootstrapConfig {
    fn default() -> Self {
        Self {
            name: "Administrator".to_string(),
            username: "admin".to_string(),
            email: "admin@system.com".to_string(),
            password: DEFAULT_ADMIN_PASSWORD.to_string(),
        }
    }
}

impl std::fmt::Debug for AdminBootstrapConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminBootstrapConfig")
            .field("name", &self.name)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl AdminBootstrapConfig {
    pub fn uses_default_password(&self) -> bool {
        self.password == DEFAULT_ADMIN_PASSWORD
    }
}

/// Top-level process configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EnrollmentConfig {
    pub database_path: PathBuf,
    pub log_level: String,
    /// Logging stays off when unset.
    pub log_dir: Option<PathBuf>,
    pub admin: AdminBootstrapConfig,
    pub credential: CredentialConfig,
}

impl Default for EnrollmentConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("enrollment.sqlite3"),
            log_level: default_log_level().to_string(),
            log_dir: None,
            admin: AdminBootstrapConfig::default(),
            credential: CredentialConfig::default(),
        }
    }
}

impl EnrollmentConfig {
    /// Defaults, then `path` (if any), then process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    /// Same as `load`, with overrides read through `lookup`.
    pub fn load_with(
        path: Option<&Path>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_json_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(lookup);
        config.validate()?;
        Ok(config)
    }

    /// Reads a JSON file; missing keys keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Applies `ENROLLMENT_*` overrides read through `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(value) = lookup(ENV_DB_PATH) {
            self.database_path = PathBuf::from(value);
        }
        if let Some(value) = lookup(ENV_LOG_LEVEL) {
            self.log_level = value;
        }
        if let Some(value) = lookup(ENV_LOG_DIR) {
            self.log_dir = Some(PathBuf::from(value));
        }
        if let Some(value) = lookup(ENV_ADMIN_USERNAME) {
            self.admin.username = value;
        }
        if let Some(value) = lookup(ENV_ADMIN_EMAIL) {
            self.admin.email = value;
        }
        if let Some(value) = lookup(ENV_ADMIN_PASSWORD) {
            self.admin.password = value;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        normalize_level(&self.log_level).map_err(ConfigError::Invalid)?;

        if self.database_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("database_path cannot be empty".to_string()));
        }
        if let Some(log_dir) = &self.log_dir {
            if !log_dir.is_absolute() {
                return Err(ConfigError::Invalid(format!(
                    "log_dir must be an absolute path, got `{}`",
                    log_dir.display()
                )));
            }
        }

        for (field, value) in [
            ("admin.username", &self.admin.username),
            ("admin.email", &self.admin.email),
            ("admin.password", &self.admin.password),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{field} cannot be blank")));
            }
        }
        Ok(())
    }
}
