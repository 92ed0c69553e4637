use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Server address (e.g., "0.0.0.0:3001")
    #[serde(default = "default_addr")]
    pub addr: String,
    /// Directory uploaded attachments are written to, served under /upload
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
    /// Maximum upload file size in bytes (default: 10MB)
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: usize,
    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Approval workflow configuration
    #[serde(default)]
    pub approval: ApprovalConfig,
    /// Orphaned attachment cleanup
    #[serde(default)]
    pub cleanup: CleanupConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LogConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Database host
    #[serde(default = "default_db_host")]
    pub host: String,
    /// Database port
    #[serde(default = "default_db_port")]
    pub port: u16,
    /// Database name
    #[serde(default = "default_db_name", rename = "database")]
    pub name: String,
    /// Database user
    #[serde(default = "default_db_user", rename = "username")]
    pub user: String,
    /// Database password
    #[serde(default)]
    pub password: String,
    /// Maximum pool size
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApprovalConfig {
    /// User id assumed when a request carries no `userId`
    #[serde(default = "default_user_id")]
    pub default_user_id: i64,
    /// Approver every new form is routed to
    #[serde(default = "default_approver_id")]
    pub default_approver_id: i64,
}

impl Default for ApprovalConfig {
    fn default() -> Self {
        Self {
            default_user_id: default_user_id(),
            default_approver_id: default_approver_id(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CleanupConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Local hour of day the sweep runs at (0-23)
    #[serde(default = "default_cleanup_hour")]
    pub hour: u32,
    /// Unlinked attachments older than this are removed
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            hour: default_cleanup_hour(),
            retention_days: default_retention_days(),
        }
    }
}

// Default value functions
fn default_addr() -> String {
    "0.0.0.0:3001".to_string()
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("./public/upload")
}

fn default_max_upload_size() -> usize {
    10 * 1024 * 1024 // 10MB
}

fn default_db_host() -> String {
    "localhost".to_string()
}

fn default_db_port() -> u16 {
    5432
}

fn default_db_name() -> String {
    "approval".to_string()
}

fn default_db_user() -> String {
    "postgres".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_user_id() -> i64 {
    101
}

fn default_approver_id() -> i64 {
    102
}

fn default_true() -> bool {
    true
}

fn default_cleanup_hour() -> u32 {
    3
}

fn default_retention_days() -> i64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            upload_dir: default_upload_dir(),
            max_upload_size: default_max_upload_size(),
            log: LogConfig::default(),
            database: DatabaseConfig::default(),
            approval: ApprovalConfig::default(),
            cleanup: CleanupConfig::default(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: default_db_host(),
            port: default_db_port(),
            name: default_db_name(),
            user: default_db_user(),
            password: String::new(),
            max_connections: default_max_connections(),
        }
    }
}

impl DatabaseConfig {
    /// Generate database connection URL
    pub fn connection_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.name
        )
    }
}

/// Upper bound for `cleanup.retention_days`
pub const MAX_RETENTION_DAYS: i64 = 36_500;

impl Config {
    /// Load configuration from TOML file
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.cleanup.hour > 23 {
            anyhow::bail!("cleanup.hour must be within 0-23, got {}", self.cleanup.hour);
        }
        if !(0..=MAX_RETENTION_DAYS).contains(&self.cleanup.retention_days) {
            anyhow::bail!(
                "cleanup.retention_days must be within 0-{}, got {}",
                MAX_RETENTION_DAYS,
                self.cleanup.retention_days
            );
        }
        Ok(())
    }
}
