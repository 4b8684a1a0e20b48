use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

// =============================================================================
// Pipeline constants
// =============================================================================

/// Number of applications handled by one batch
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Number of batches processed concurrently
pub const DEFAULT_MAX_WORKERS: usize = 4;

/// Minimum fuzzy score (exclusive) for a catalog name to count as a match
pub const DEFAULT_MATCH_THRESHOLD: u8 = 75;

/// Failed batches tolerated before the whole audit is aborted
pub const MAX_BATCH_ERRORS: usize = 3;

// =============================================================================
// Time-related constants
// =============================================================================

/// Timeout for a single catalog lookup in milliseconds (30 seconds)
pub const LOOKUP_TIMEOUT_MS: u64 = 30_000;

/// Lower bound of the adaptive delay between catalog calls
pub const DEFAULT_MIN_DELAY_MS: u64 = 0;

/// Upper bound of the adaptive delay between catalog calls
pub const DEFAULT_MAX_DELAY_MS: u64 = 5_000;

/// Delay used when backing off from zero
pub const DEFAULT_DELAY_STEP_MS: u64 = 100;

/// Consecutive successes before the delay is lowered
pub const DEFAULT_SUCCESS_STREAK: u32 = 5;

/// Consecutive failures before the delay is raised
pub const DEFAULT_FAILURE_STREAK: u32 = 2;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Audit configuration structure
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct AuditConfig {
    pub batch_size: usize,
    pub max_workers: usize,
    pub match_threshold: u8,
    /// Catalog lookup timeout in milliseconds
    pub lookup_timeout_ms: u64,
    pub rate_limit: RateLimitConfig,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            max_workers: DEFAULT_MAX_WORKERS,
            match_threshold: DEFAULT_MATCH_THRESHOLD,
            lookup_timeout_ms: LOOKUP_TIMEOUT_MS,
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl AuditConfig {
    /// Load configuration from a JSON file; missing fields use defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str::<Self>(&content)?.normalized())
    }

    /// Clamp values that would stall the pipeline (zero batch size or workers)
    pub fn normalized(mut self) -> Self {
        self.batch_size = self.batch_size.max(1);
        self.max_workers = self.max_workers.max(1);
        self.lookup_timeout_ms = self.lookup_timeout_ms.max(1);
        self
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }
}

/// Adaptive rate limiter configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
    pub step_ms: u64,
    pub success_streak: u32,
    pub failure_streak: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_delay_ms: DEFAULT_MIN_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
            step_ms: DEFAULT_DELAY_STEP_MS,
            success_streak: DEFAULT_SUCCESS_STREAK,
            failure_streak: DEFAULT_FAILURE_STREAK,
        }
    }
}

/// Returns the path to the data directory for app-version-audit.
/// Uses $XDG_DATA_HOME/app-version-audit if XDG_DATA_HOME is set,
/// otherwise falls back to ~/.local/share/app-version-audit,
/// or ./app-version-audit if neither is available.
pub fn data_dir() -> PathBuf {
    data_dir_with_env(std::env::var("XDG_DATA_HOME").ok(), dirs::home_dir())
}

/// Returns the path to the log file.
pub fn log_path() -> PathBuf {
    data_dir().join("app-version-audit.log")
}

fn data_dir_with_env(xdg_data_home: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    let data_dir = xdg_data_home
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));

    data_dir.join("app-version-audit")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn audit_config_from_partial_object_uses_defaults_for_missing_fields() {
        let result = serde_json::from_value::<AuditConfig>(json!({
            "batchSize": 10
        }))
        .unwrap();

        assert_eq!(result.batch_size, 10);
        assert_eq!(result.max_workers, DEFAULT_MAX_WORKERS);
        assert_eq!(result.rate_limit, RateLimitConfig::default());
    }

    #[test]
    fn audit_config_from_full_object_parses_all_fields() {
        let result = serde_json::from_value::<AuditConfig>(json!({
            "batchSize": 20,
            "maxWorkers": 2,
            "matchThreshold": 80,
            "lookupTimeoutMs": 1000,
            "rateLimit": {
                "enabled": false,
                "minDelayMs": 10,
                "maxDelayMs": 500,
                "stepMs": 50,
                "successStreak": 3,
                "failureStreak": 1
            }
        }))
        .unwrap();

        assert_eq!(
            result,
            AuditConfig {
                batch_size: 20,
                max_workers: 2,
                match_threshold: 80,
                lookup_timeout_ms: 1000,
                rate_limit: RateLimitConfig {
                    enabled: false,
                    min_delay_ms: 10,
                    max_delay_ms: 500,
                    step_ms: 50,
                    success_streak: 3,
                    failure_streak: 1,
                },
            }
        );
    }

    #[test]
    fn load_reads_json_file_and_clamps_zero_values() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"batchSize": 0, "maxWorkers": 0}}"#).unwrap();

        let config = AuditConfig::load(file.path()).unwrap();

        assert_eq!(config.batch_size, 1);
        assert_eq!(config.max_workers, 1);
    }

    #[test]
    fn load_returns_error_for_invalid_json() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        assert!(matches!(
            AuditConfig::load(file.path()),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn data_dir_with_env_uses_xdg_data_home_when_set() {
        let path = data_dir_with_env(
            Some("/tmp/test-data".to_string()),
            Some(PathBuf::from("/home/user")),
        );

        assert_eq!(path, PathBuf::from("/tmp/test-data/app-version-audit"));
    }

    #[test]
    fn data_dir_with_env_falls_back_to_home_local_share() {
        let path = data_dir_with_env(None, Some(PathBuf::from("/home/user")));

        assert_eq!(
            path,
            PathBuf::from("/home/user/.local/share/app-version-audit")
        );
    }

    #[test]
    fn data_dir_with_env_falls_back_to_current_dir_when_no_dirs_available() {
        let path = data_dir_with_env(None, None);
        assert_eq!(path, PathBuf::from("./app-version-audit"));
    }
}
