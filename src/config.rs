use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::domain::{Language, LockoutPolicy, Theme};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub security: SecurityConfig,

    pub bootstrap: BootstrapConfig,

    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Argon2 memory cost in KiB (default: 8192 = 8MB)
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations)
    pub argon2_time_cost: u32,

    /// Argon2 parallelism (default: 1)
    pub argon2_parallelism: u32,

    /// Rehash stored passwords with the current argon2 params on login
    pub auto_migrate_password_hashes: bool,

    /// Minimum accepted password length for new passwords.
    pub min_password_length: usize,

    pub login_lockout: LoginLockoutConfig,
}

/// Upper bound for `security.login_lockout.lockout_minutes` (one year).
pub const MAX_LOCKOUT_MINUTES: i64 = 525_600;

/// Upper bound for `server.session_lifetime_days` (ten years).
pub const MAX_SESSION_LIFETIME_DAYS: i64 = 3650;

/// Consecutive failed logins that lock an account, and for how long.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginLockoutConfig {
    pub max_failures: u32,

    pub lockout_minutes: i64,
}

impl Default for LoginLockoutConfig {
    fn default() -> Self {
        Self {
            max_failures: 5,
            lockout_minutes: 30,
        }
    }
}

impl LoginLockoutConfig {
    #[must_use]
    pub fn policy(&self) -> LockoutPolicy {
        let minutes = self.lockout_minutes.clamp(1, MAX_LOCKOUT_MINUTES);
        LockoutPolicy::new(
            self.max_failures,
            chrono::Duration::try_minutes(minutes).unwrap_or(chrono::Duration::MAX),
        )
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
            auto_migrate_password_hashes: true,
            min_password_length: 10,
            login_lockout: LoginLockoutConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,

    /// Emit log lines as JSON objects instead of plain text.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
            json_logs: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,

    pub cors_allowed_origins: Vec<String>,

    /// Whether to set the Secure flag on session cookies.
    /// Set to false for local development without HTTPS.
    pub secure_cookies: bool,

    /// Lifetime of a "remember me" session, in days.
    pub session_lifetime_days: i64,
}

impl ServerConfig {
    /// Idle lifetime of a "remember me" session, clamped to the accepted range.
    #[must_use]
    pub fn session_lifetime(&self) -> time::Duration {
        time::Duration::days(
            self.session_lifetime_days
                .clamp(1, MAX_SESSION_LIFETIME_DAYS),
        )
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            cors_allowed_origins: vec![
                "http://localhost:5000".to_string(),
                "http://127.0.0.1:5000".to_string(),
            ],
            secure_cookies: true,
            session_lifetime_days: 14,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    pub max_db_connections: u32,

    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/ffe.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

/// Administrator created by `ffe-tracker bootstrap`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    pub admin_username: String,

    pub admin_nickname: String,

    pub admin_email: String,

    /// Generated and printed once when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_password: Option<String>,

    pub theme: Theme,

    pub notifications_enabled: bool,

    pub preferred_language: Language,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            admin_username: "admin".to_string(),
            admin_nickname: "Administrator".to_string(),
            admin_email: "admin@example.com".to_string(),
            admin_password: None,
            theme: Theme::Default,
            notifications_enabled: true,
            preferred_language: Language::Zh,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                let mut config = Self::load_from_path(path)?;
                config.apply_env_overrides();
                return Ok(config);
            }
        }

        info!("No config file found, using defaults");
        let mut config = Self::default();
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    /// Applies `FFE_*` environment variables on top of file values.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(url) = var("FFE_DATABASE_URL") {
            self.general.database_path = url;
        }
        if let Some(level) = var("FFE_LOG_LEVEL") {
            self.general.log_level = level;
        }
        if let Some(port) = var("FFE_PORT") {
            match port.trim().parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!(value = %port, "Ignoring invalid FFE_PORT"),
            }
        }
        if let Some(username) = var("FFE_ADMIN_USERNAME") {
            self.bootstrap.admin_username = username;
        }
        if let Some(password) = var("FFE_ADMIN_PASSWORD") {
            self.bootstrap.admin_password = Some(password);
        }
        if let Some(email) = var("FFE_ADMIN_EMAIL") {
            self.bootstrap.admin_email = email;
        }
        if let Some(nickname) = var("FFE_ADMIN_NICKNAME") {
            self.bootstrap.admin_nickname = nickname;
        }
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("ffe-tracker").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".ffe-tracker").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.security.login_lockout.max_failures == 0 {
            anyhow::bail!("security.login_lockout.max_failures must be > 0");
        }

        if !(1..=MAX_LOCKOUT_MINUTES).contains(&self.security.login_lockout.lockout_minutes) {
            anyhow::bail!(
                "security.login_lockout.lockout_minutes must be between 1 and {MAX_LOCKOUT_MINUTES}"
            );
        }

        if self.security.min_password_length == 0 {
            anyhow::bail!("security.min_password_length must be > 0");
        }

        argon2::Params::new(
            self.security.argon2_memory_cost_kib,
            self.security.argon2_time_cost,
            self.security.argon2_parallelism,
            None,
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;

        if !(1..=MAX_SESSION_LIFETIME_DAYS).contains(&self.server.session_lifetime_days) {
            anyhow::bail!(
                "server.session_lifetime_days must be between 1 and {MAX_SESSION_LIFETIME_DAYS}"
            );
        }

        if self.general.max_db_connections == 0 {
            anyhow::bail!("general.max_db_connections must be > 0");
        }

        Ok(())
    }
}
